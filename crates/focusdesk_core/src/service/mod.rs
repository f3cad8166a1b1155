//! Read-side use-case services over store state.
//!
//! # Responsibility
//! - Derive dashboard views (today's tasks, weekly report) from `StoreState`.
//! - Keep UI/FFI layers free of date arithmetic.

pub mod report_service;
