//! Persisted store snapshot and its JSON codec.
//!
//! # Responsibility
//! - Define the unit written to durable storage after each mutation.
//! - Decode older layouts defensively (`todos` field name, versioned
//!   `{ state, version }` envelope).
//!
//! # Invariants
//! - Only tasks and the focus ledger are persisted; hydration state never is.
//! - Encoding always writes the bare `{ tasks, totalFocus }` object.

use crate::model::focus::FocusLedger;
use crate::model::task::Task;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Full serializable store state.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub tasks: Vec<Task>,
    #[serde(rename = "totalFocus")]
    pub total_focus: FocusLedger,
}

/// Snapshot as found in storage. Missing fields stay `None` so the loader
/// can tell a partial record from an empty one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersistedSnapshot {
    pub tasks: Option<Vec<Task>>,
    pub total_focus: Option<FocusLedger>,
}

impl PersistedSnapshot {
    /// Fills absent fields with empty defaults.
    pub fn into_snapshot(self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks.unwrap_or_default(),
            total_focus: self.total_focus.unwrap_or_default(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct PersistedState {
    #[serde(default, alias = "todos")]
    tasks: Option<Vec<Task>>,
    #[serde(default, rename = "totalFocus")]
    total_focus: Option<FocusLedger>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum PersistedValue {
    Envelope {
        state: PersistedState,
        #[allow(dead_code)]
        #[serde(default)]
        version: Option<u32>,
    },
    Bare(PersistedState),
}

pub type SnapshotResult<T> = Result<T, SnapshotError>;

/// Snapshot encode/decode failure.
#[derive(Debug)]
pub enum SnapshotError {
    Encode(serde_json::Error),
    Decode(serde_json::Error),
}

impl Display for SnapshotError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Encode(err) => write!(f, "failed to encode store snapshot: {err}"),
            Self::Decode(err) => write!(f, "failed to decode store snapshot: {err}"),
        }
    }
}

impl Error for SnapshotError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Encode(err) | Self::Decode(err) => Some(err),
        }
    }
}

/// Serializes a snapshot into its persisted JSON text.
pub fn encode_snapshot(snapshot: &StoreSnapshot) -> SnapshotResult<String> {
    serde_json::to_string(snapshot).map_err(SnapshotError::Encode)
}

/// Parses persisted JSON text, accepting current and legacy layouts.
pub fn decode_snapshot(raw: &str) -> SnapshotResult<PersistedSnapshot> {
    let value: PersistedValue = serde_json::from_str(raw).map_err(SnapshotError::Decode)?;
    let state = match value {
        PersistedValue::Envelope { state, .. } => state,
        PersistedValue::Bare(state) => state,
    };
    Ok(PersistedSnapshot {
        tasks: state.tasks,
        total_focus: state.total_focus,
    })
}
