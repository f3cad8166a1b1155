//! Tagged results returned by store operations.

use crate::model::snapshot::SnapshotError;
use crate::model::task::{TaskId, TaskValidationError};
use crate::repo::kv_repo::StorageError;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Result of one store mutation.
///
/// Mutations never fail on storage problems; those surface through
/// `TaskStore::last_persist_error` and `TaskStore::flush`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Created(TaskId),
    Toggled { done: bool },
    Updated,
    /// Target exists but the patch left it identical.
    Unchanged,
    Deleted,
    FocusAdded { total: i64 },
    NotFound(TaskId),
    Rejected(RejectReason),
    /// Store has not loaded its snapshot yet; nothing was applied.
    NotHydrated,
}

impl MutationOutcome {
    /// Returns whether in-memory state changed.
    pub fn is_applied(&self) -> bool {
        matches!(
            self,
            Self::Created(_)
                | Self::Toggled { .. }
                | Self::Updated
                | Self::Deleted
                | Self::FocusAdded { .. }
        )
    }

    pub fn created_id(&self) -> Option<&str> {
        match self {
            Self::Created(id) => Some(id.as_str()),
            _ => None,
        }
    }
}

/// Why strict input policy refused an operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    Task(TaskValidationError),
    InvalidDayKey(String),
    NegativeFocus(i64),
}

impl Display for RejectReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Task(err) => write!(f, "{err}"),
            Self::InvalidDayKey(value) => write!(f, "day key `{value}` is not YYYY-MM-DD"),
            Self::NegativeFocus(seconds) => {
                write!(f, "focus seconds must not be negative, got {seconds}")
            }
        }
    }
}

impl From<TaskValidationError> for RejectReason {
    fn from(value: TaskValidationError) -> Self {
        Self::Task(value)
    }
}

/// What `TaskStore::hydrate` found in storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HydrationReport {
    Restored { tasks: usize, focus_days: usize },
    /// No snapshot stored under the key.
    Empty,
    /// Storage read failed; treated as empty.
    ReadFailed(String),
    /// Stored text could not be decoded; treated as empty.
    Malformed(String),
    AlreadyHydrated,
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure writing a snapshot during `flush`/`shutdown`.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Snapshot(SnapshotError),
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Snapshot(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Snapshot(err) => Some(err),
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<SnapshotError> for StoreError {
    fn from(value: SnapshotError) -> Self {
        Self::Snapshot(value)
    }
}
