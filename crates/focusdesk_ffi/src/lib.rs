//! Flutter-facing bindings for focusdesk core.
//!
//! # Responsibility
//! - Host FRB-exported use-case functions in `api`.
//! - Keep core types behind plain response envelopes.

pub mod api;
