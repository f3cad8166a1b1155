//! Store configuration.
//!
//! # Invariants
//! - Defaults reproduce the dashboard's historical behavior: fixed key
//!   `todo-storage`, save after every mutation, accept any input.

/// Storage key the snapshot is written under unless configured otherwise.
pub const DEFAULT_STORAGE_KEY: &str = "todo-storage";

/// When mutations reach durable storage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PersistMode {
    /// Write the full snapshot after every effective mutation.
    #[default]
    Immediate,
    /// Mark the store dirty; write on `flush`/`shutdown` only.
    Deferred,
}

/// How strictly operations check caller input.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InputPolicy {
    /// Store whatever the caller sends; validation belongs to the UI.
    #[default]
    Lenient,
    /// Reject blank titles, unparsable dates/day keys, negative focus time
    /// and patches that break the `done`/`doneAt` pairing.
    Strict,
}

impl InputPolicy {
    pub fn is_strict(self) -> bool {
        matches!(self, Self::Strict)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub storage_key: String,
    pub persist_mode: PersistMode,
    pub input_policy: InputPolicy,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            persist_mode: PersistMode::default(),
            input_policy: InputPolicy::default(),
        }
    }
}

impl StoreConfig {
    pub fn with_storage_key(mut self, key: impl Into<String>) -> Self {
        self.storage_key = key.into();
        self
    }

    pub fn with_persist_mode(mut self, mode: PersistMode) -> Self {
        self.persist_mode = mode;
        self
    }

    pub fn with_input_policy(mut self, policy: InputPolicy) -> Self {
        self.input_policy = policy;
        self
    }
}
