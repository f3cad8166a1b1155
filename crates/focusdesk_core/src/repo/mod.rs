//! Durable key-value storage behind the task store.
//!
//! # Responsibility
//! - Define the opaque `get/set/remove` contract the store persists through.
//! - Isolate SQLite details from store orchestration.
//!
//! # Invariants
//! - Values are opaque UTF-8 text; the store owns their format.
//! - A missing key is `Ok(None)`, never an error.

pub mod kv_repo;
pub mod memory_repo;
