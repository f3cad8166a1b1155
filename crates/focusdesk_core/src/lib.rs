//! Core domain logic for the focusdesk dashboard.
//! This crate is the single source of truth for task and focus-time state.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{InputPolicy, PersistMode, StoreConfig, DEFAULT_STORAGE_KEY};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::focus::FocusLedger;
pub use model::snapshot::{decode_snapshot, encode_snapshot, SnapshotError, StoreSnapshot};
pub use model::task::{Task, TaskId, TaskPatch, TaskValidationError, TODAY_SENTINEL};
pub use repo::kv_repo::{SnapshotStorage, SqliteSnapshotStorage, StorageError, StorageResult};
pub use repo::memory_repo::{MemoryStorage, UnavailableStorage};
pub use service::report_service::{
    day_key, day_summary, scheduled_day, tasks_for_day, weekly_report, DayReport, DaySummary,
    WeeklyReport,
};
pub use store::{
    HydrationReport, MutationOutcome, RejectReason, StoreChange, StoreError, StoreResult,
    StoreState, SubscriptionId, TaskStore,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
