//! Domain model for the task/focus store.
//!
//! # Responsibility
//! - Define canonical data structures owned by the store.
//! - Keep the persisted snapshot shape in one place.
//!
//! # Invariants
//! - Every task is identified by a stable `TaskId`.
//! - Focus time is only ever accumulated, never overwritten.

pub mod focus;
pub mod snapshot;
pub mod task;
