//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Own the one `TaskStore` instance the UI talks to.
//! - Expose store operations as sync calls with plain response envelopes.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - `store_init` returns before hydration finishes; the UI must wait for
//!   `store_is_hydrated()` before rendering task lists.
//! - All store access is serialized through one mutex.

use chrono::Utc;
use focusdesk_core::{
    core_version as core_version_inner, init_logging as init_logging_inner, ping as ping_inner,
    weekly_report as weekly_report_inner, MutationOutcome, SqliteSnapshotStorage, StoreConfig,
    Task, TaskPatch, TaskStore,
};
use log::{info, warn};
use std::path::PathBuf;
use std::sync::{Mutex, MutexGuard};

const STORE_DB_FILE_NAME: &str = "focusdesk_store.sqlite3";
const STORE_DB_PATH_ENV: &str = "FOCUSDESK_DB_PATH";

type FfiStore = TaskStore<SqliteSnapshotStorage>;

struct StoreSlot {
    db_path: PathBuf,
    store: FfiStore,
}

static STORE: Mutex<Option<StoreSlot>> = Mutex::new(None);

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and the error message otherwise.
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    match init_logging_inner(level.as_str(), log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err.to_string(),
    }
}

/// Task row as rendered by the UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskItem {
    pub id: String,
    pub title: String,
    pub done: bool,
    pub date: String,
    pub created_at: String,
    pub done_at: Option<String>,
}

/// Response envelope for store mutations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskActionResponse {
    /// True when the operation applied or found nothing to change.
    pub ok: bool,
    /// `created|toggled|updated|unchanged|deleted|focus_added|not_found|rejected|not_hydrated|unavailable`.
    pub outcome: String,
    pub task_id: Option<String>,
    pub message: String,
}

impl TaskActionResponse {
    fn from_outcome(outcome: MutationOutcome, task_id: Option<&str>) -> Self {
        let task_id = task_id.map(str::to_string);
        match outcome {
            MutationOutcome::Created(id) => Self::ok("created", Some(id), "Task created."),
            MutationOutcome::Toggled { done: true } => {
                Self::ok("toggled", task_id, "Task completed.")
            }
            MutationOutcome::Toggled { done: false } => {
                Self::ok("toggled", task_id, "Task reopened.")
            }
            MutationOutcome::Updated => Self::ok("updated", task_id, "Task updated."),
            MutationOutcome::Unchanged => Self::ok("unchanged", task_id, "Nothing to update."),
            MutationOutcome::Deleted => Self::ok("deleted", task_id, "Task deleted."),
            MutationOutcome::FocusAdded { total } => {
                Self::ok("focus_added", None, format!("Focus total {total}s."))
            }
            MutationOutcome::NotFound(id) => Self {
                ok: false,
                outcome: "not_found".to_string(),
                message: format!("task not found: {id}"),
                task_id: Some(id),
            },
            MutationOutcome::Rejected(reason) => Self {
                ok: false,
                outcome: "rejected".to_string(),
                task_id,
                message: reason.to_string(),
            },
            MutationOutcome::NotHydrated => Self {
                ok: false,
                outcome: "not_hydrated".to_string(),
                task_id,
                message: "store is still loading; retry once store_is_hydrated is true".to_string(),
            },
        }
    }

    fn ok(outcome: &str, task_id: Option<String>, message: impl Into<String>) -> Self {
        Self {
            ok: true,
            outcome: outcome.to_string(),
            task_id,
            message: message.into(),
        }
    }

    fn unavailable(message: String) -> Self {
        Self {
            ok: false,
            outcome: "unavailable".to_string(),
            task_id: None,
            message,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FocusEntry {
    pub day_key: String,
    pub seconds: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReportDay {
    pub day_key: String,
    pub label: String,
    pub created: u32,
    pub completed: u32,
    pub focus_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReportResponse {
    pub week_start: String,
    pub days: Vec<WeeklyReportDay>,
    pub total_focus_minutes: i64,
    /// Empty on success.
    pub message: String,
}

/// Opens the store database and starts background hydration.
///
/// `db_path` falls back to `$FOCUSDESK_DB_PATH`, then the temp directory.
/// Calling again with the same path is a no-op; another path is rejected
/// until `store_shutdown`. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn store_init(db_path: Option<String>) -> String {
    let db_path = resolve_db_path(db_path);
    let mut guard = match lock_store() {
        Ok(guard) => guard,
        Err(err) => return err,
    };

    if let Some(slot) = guard.as_ref() {
        if slot.db_path == db_path {
            return String::new();
        }
        return format!(
            "store already open at `{}`; call store_shutdown first",
            slot.db_path.display()
        );
    }

    let storage = match SqliteSnapshotStorage::open(&db_path) {
        Ok(storage) => storage,
        Err(err) => return format!("store_init failed: {err}"),
    };
    *guard = Some(StoreSlot {
        db_path: db_path.clone(),
        store: TaskStore::new(storage, StoreConfig::default()),
    });
    drop(guard);

    info!(
        "event=store_init module=ffi status=ok db_path={}",
        db_path.display()
    );
    std::thread::spawn(|| {
        if let Ok(mut guard) = STORE.lock() {
            if let Some(slot) = guard.as_mut() {
                slot.store.hydrate();
            }
        }
    });
    String::new()
}

/// Whether the stored snapshot has been loaded.
#[flutter_rust_bridge::frb(sync)]
pub fn store_is_hydrated() -> bool {
    with_store(|store| store.is_hydrated()).unwrap_or(false)
}

/// Flushes and closes the store. Returns an empty string on success.
#[flutter_rust_bridge::frb(sync)]
pub fn store_shutdown() -> String {
    let slot = match lock_store() {
        Ok(mut guard) => guard.take(),
        Err(err) => return err,
    };
    match slot {
        Some(slot) => match slot.store.shutdown() {
            Ok(()) => String::new(),
            Err(err) => format!("store_shutdown failed: {err}"),
        },
        None => String::new(),
    }
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_create(title: String, date: String) -> TaskActionResponse {
    action(None, |store| store.create_task(title.trim(), date.trim()))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_toggle_done(id: String) -> TaskActionResponse {
    action(Some(&id), |store| store.toggle_done(&id))
}

/// Updates title and/or date of task `id`.
///
/// Completion changes go through `task_toggle_done`, which keeps `done_at`
/// in step with `done`.
#[flutter_rust_bridge::frb(sync)]
pub fn task_update(id: String, title: Option<String>, date: Option<String>) -> TaskActionResponse {
    let patch = TaskPatch {
        title: title.map(|value| value.trim().to_string()),
        date,
        ..TaskPatch::default()
    };
    action(Some(&id), |store| store.update_task(&id, &patch))
}

#[flutter_rust_bridge::frb(sync)]
pub fn task_delete(id: String) -> TaskActionResponse {
    action(Some(&id), |store| store.delete_task(&id))
}

/// Lists tasks in insertion order. Empty until initialized.
#[flutter_rust_bridge::frb(sync)]
pub fn task_list() -> Vec<TaskItem> {
    with_store(|store| store.tasks().iter().map(to_task_item).collect()).unwrap_or_default()
}

#[flutter_rust_bridge::frb(sync)]
pub fn focus_add(day_key: String, seconds: i64) -> TaskActionResponse {
    action(None, |store| store.add_focus_seconds(day_key.trim(), seconds))
}

#[flutter_rust_bridge::frb(sync)]
pub fn focus_ledger() -> Vec<FocusEntry> {
    with_store(|store| {
        store
            .focus_ledger()
            .iter()
            .map(|(day_key, seconds)| FocusEntry {
                day_key: day_key.to_string(),
                seconds,
            })
            .collect()
    })
    .unwrap_or_default()
}

/// Builds the report for the current UTC week (Sunday start).
#[flutter_rust_bridge::frb(sync)]
pub fn weekly_report() -> WeeklyReportResponse {
    let today = Utc::now().date_naive();
    match with_store(|store| weekly_report_inner(store.state(), today)) {
        Ok(report) => WeeklyReportResponse {
            week_start: report.week_start.format("%Y-%m-%d").to_string(),
            days: report
                .days
                .into_iter()
                .map(|day| WeeklyReportDay {
                    day_key: day.day.format("%Y-%m-%d").to_string(),
                    label: day.label,
                    created: saturating_u32(day.created),
                    completed: saturating_u32(day.completed),
                    focus_minutes: day.focus_minutes,
                })
                .collect(),
            total_focus_minutes: report.total_focus_minutes,
            message: String::new(),
        },
        Err(err) => WeeklyReportResponse {
            week_start: String::new(),
            days: Vec::new(),
            total_focus_minutes: 0,
            message: format!("weekly_report failed: {err}"),
        },
    }
}

fn action(
    task_id: Option<&str>,
    f: impl FnOnce(&mut FfiStore) -> MutationOutcome,
) -> TaskActionResponse {
    match with_store(f) {
        Ok(outcome) => TaskActionResponse::from_outcome(outcome, task_id),
        Err(err) => TaskActionResponse::unavailable(err),
    }
}

fn with_store<T>(f: impl FnOnce(&mut FfiStore) -> T) -> Result<T, String> {
    let mut guard = lock_store()?;
    match guard.as_mut() {
        Some(slot) => Ok(f(&mut slot.store)),
        None => Err("store not initialized; call store_init first".to_string()),
    }
}

fn lock_store() -> Result<MutexGuard<'static, Option<StoreSlot>>, String> {
    STORE.lock().map_err(|_| {
        warn!("event=store_lock module=ffi status=error error_code=lock_poisoned");
        "store lock poisoned".to_string()
    })
}

fn resolve_db_path(db_path: Option<String>) -> PathBuf {
    if let Some(raw) = db_path.as_deref().map(str::trim).filter(|raw| !raw.is_empty()) {
        return PathBuf::from(raw);
    }
    if let Ok(raw) = std::env::var(STORE_DB_PATH_ENV) {
        let trimmed = raw.trim();
        if !trimmed.is_empty() {
            return PathBuf::from(trimmed);
        }
    }
    std::env::temp_dir().join(STORE_DB_FILE_NAME)
}

fn to_task_item(task: &Task) -> TaskItem {
    TaskItem {
        id: task.id.clone(),
        title: task.title.clone(),
        done: task.done,
        date: task.date.clone(),
        created_at: task.created_at.clone(),
        done_at: task.done_at.clone(),
    }
}

fn saturating_u32(value: usize) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX)
}
