//! Task and focus-time store.
//!
//! # Responsibility
//! - Own the ordered task list and the per-day focus ledger.
//! - Persist full snapshots through `SnapshotStorage` and rehydrate them.
//! - Broadcast every applied change to subscribers synchronously.
//!
//! # Invariants
//! - Insertion order is preserved; only `delete_task` removes entries.
//! - `toggle_done` keeps `done` and `done_at` paired.
//! - Mutations before `hydrate` return `NotHydrated` and change nothing, so
//!   no caller-visible write can be lost to the snapshot load.
//! - Hydration completes at most once per store instance.
//! - `NotFound`/`Rejected`/`Unchanged`/`NotHydrated` outcomes leave state,
//!   storage and subscribers untouched.

mod outcome;
mod subscribers;

pub use outcome::{
    HydrationReport, MutationOutcome, RejectReason, StoreError, StoreResult,
};
pub use subscribers::{Listener, StoreChange, SubscriptionId};

use crate::clock::{Clock, SystemClock};
use crate::config::{PersistMode, StoreConfig};
use crate::model::focus::FocusLedger;
use crate::model::snapshot::{decode_snapshot, encode_snapshot, PersistedSnapshot, StoreSnapshot};
use crate::model::task::{parse_day_key, Task, TaskPatch};
use crate::repo::kv_repo::SnapshotStorage;
use log::{debug, info, warn};
use std::time::Instant;
use subscribers::Subscribers;

/// Read view of store state handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoreState {
    tasks: Vec<Task>,
    total_focus: FocusLedger,
    hydrated: bool,
}

impl StoreState {
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn focus_ledger(&self) -> &FocusLedger {
        &self.total_focus
    }

    pub fn is_hydrated(&self) -> bool {
        self.hydrated
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Copies the persistable part of the state.
    pub fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            tasks: self.tasks.clone(),
            total_focus: self.total_focus.clone(),
        }
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.tasks.iter().position(|task| task.id == id)
    }
}

/// Single-writer store over a snapshot storage backend.
pub struct TaskStore<S: SnapshotStorage> {
    storage: S,
    config: StoreConfig,
    clock: Box<dyn Clock + Send>,
    state: StoreState,
    subscribers: Subscribers,
    dirty: bool,
    last_persist_error: Option<String>,
    shut_down: bool,
}

impl<S: SnapshotStorage> TaskStore<S> {
    /// Creates an empty, not yet hydrated store using the wall clock.
    pub fn new(storage: S, config: StoreConfig) -> Self {
        Self::with_clock(storage, config, SystemClock)
    }

    pub fn with_clock(storage: S, config: StoreConfig, clock: impl Clock + Send + 'static) -> Self {
        Self {
            storage,
            config,
            clock: Box::new(clock),
            state: StoreState::default(),
            subscribers: Subscribers::default(),
            dirty: false,
            last_persist_error: None,
            shut_down: false,
        }
    }

    /// Loads the stored snapshot and marks the store hydrated.
    ///
    /// Fields absent from the snapshot start empty. Read and decode failures
    /// count as "no prior data". Subsequent calls return `AlreadyHydrated`
    /// and do nothing.
    pub fn hydrate(&mut self) -> HydrationReport {
        if self.state.hydrated {
            return HydrationReport::AlreadyHydrated;
        }

        let started_at = Instant::now();
        let key = self.config.storage_key.clone();
        let report = match self.storage.get_item(&key) {
            Ok(None) => HydrationReport::Empty,
            Ok(Some(raw)) => match decode_snapshot(&raw) {
                Ok(persisted) => self.merge(persisted),
                Err(err) => HydrationReport::Malformed(err.to_string()),
            },
            Err(err) => HydrationReport::ReadFailed(err.to_string()),
        };
        self.state.hydrated = true;

        match &report {
            HydrationReport::ReadFailed(reason) | HydrationReport::Malformed(reason) => warn!(
                "event=store_hydrate module=store status=error key={key} duration_ms={} error={reason}",
                started_at.elapsed().as_millis()
            ),
            _ => info!(
                "event=store_hydrate module=store status=ok key={key} duration_ms={} tasks={} focus_days={}",
                started_at.elapsed().as_millis(),
                self.state.tasks.len(),
                self.state.total_focus.len()
            ),
        }

        self.subscribers.notify(&StoreChange::Hydrated, &self.state);
        report
    }

    fn merge(&mut self, persisted: PersistedSnapshot) -> HydrationReport {
        let StoreSnapshot { tasks, total_focus } = persisted.into_snapshot();
        self.state.tasks = tasks;
        self.state.total_focus = total_focus;
        HydrationReport::Restored {
            tasks: self.state.tasks.len(),
            focus_days: self.state.total_focus.len(),
        }
    }

    /// Appends a new open task.
    pub fn create_task(&mut self, title: &str, date: &str) -> MutationOutcome {
        if !self.state.hydrated {
            return not_hydrated("task_create");
        }
        let task = Task::new(title, date, self.clock.now());
        if self.config.input_policy.is_strict() {
            if let Err(err) = task.validate() {
                return self.reject("task_create", err.into());
            }
        }

        let id = task.id.clone();
        self.state.tasks.push(task);
        debug!("event=task_create module=store status=ok task_id={id}");
        self.commit(StoreChange::TaskCreated(id.clone()));
        MutationOutcome::Created(id)
    }

    /// Flips completion of `id`, stamping or clearing `done_at`.
    pub fn toggle_done(&mut self, id: &str) -> MutationOutcome {
        if !self.state.hydrated {
            return not_hydrated("task_toggle");
        }
        let Some(index) = self.state.position(id) else {
            return not_found("task_toggle", id);
        };

        let now = self.clock.now();
        let task = &mut self.state.tasks[index];
        task.toggle(now);
        let done = task.done;
        debug!("event=task_toggle module=store status=ok task_id={id} done={done}");
        self.commit(StoreChange::TaskToggled {
            id: id.to_string(),
            done,
        });
        MutationOutcome::Toggled { done }
    }

    /// Merges `patch` into task `id`.
    ///
    /// `done_at` is never re-derived here: a patch that sets `done` without
    /// `done_at` is stored as given under lenient policy.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> MutationOutcome {
        if !self.state.hydrated {
            return not_hydrated("task_update");
        }
        let Some(index) = self.state.position(id) else {
            return not_found("task_update", id);
        };

        let mut patched = self.state.tasks[index].clone();
        patched.apply(patch);
        if self.config.input_policy.is_strict() {
            if let Err(err) = patch.validate_against(&patched) {
                return self.reject("task_update", err.into());
            }
        }
        if patched == self.state.tasks[index] {
            return MutationOutcome::Unchanged;
        }

        self.state.tasks[index] = patched;
        debug!("event=task_update module=store status=ok task_id={id}");
        self.commit(StoreChange::TaskUpdated(id.to_string()));
        MutationOutcome::Updated
    }

    pub fn delete_task(&mut self, id: &str) -> MutationOutcome {
        if !self.state.hydrated {
            return not_hydrated("task_delete");
        }
        let Some(index) = self.state.position(id) else {
            return not_found("task_delete", id);
        };

        self.state.tasks.remove(index);
        debug!("event=task_delete module=store status=ok task_id={id}");
        self.commit(StoreChange::TaskDeleted(id.to_string()));
        MutationOutcome::Deleted
    }

    /// Adds `seconds` to the ledger entry for `day_key`.
    pub fn add_focus_seconds(&mut self, day_key: &str, seconds: i64) -> MutationOutcome {
        if !self.state.hydrated {
            return not_hydrated("focus_add");
        }
        if self.config.input_policy.is_strict() {
            if parse_day_key(day_key).is_none() {
                return self.reject(
                    "focus_add",
                    RejectReason::InvalidDayKey(day_key.to_string()),
                );
            }
            if seconds < 0 {
                return self.reject("focus_add", RejectReason::NegativeFocus(seconds));
            }
        }

        // Timers report zero on every idle pause; skip those writes.
        if seconds == 0 && self.state.total_focus.contains(day_key) {
            return MutationOutcome::FocusAdded {
                total: self.state.total_focus.seconds(day_key),
            };
        }

        let total = self.state.total_focus.add(day_key, seconds);
        debug!("event=focus_add module=store status=ok day={day_key} seconds={seconds} total={total}");
        self.commit(StoreChange::FocusAdded {
            day_key: day_key.to_string(),
            total,
        });
        MutationOutcome::FocusAdded { total }
    }

    /// Writes pending changes. No-op when clean.
    ///
    /// # Errors
    /// - Returns the storage or encode failure; the store stays dirty.
    pub fn flush(&mut self) -> StoreResult<()> {
        if !self.dirty {
            return Ok(());
        }
        self.persist()
    }

    /// Flushes pending changes and drops the store.
    ///
    /// A failed flush is returned here and not retried on drop.
    pub fn shutdown(mut self) -> StoreResult<()> {
        let result = self.flush();
        self.shut_down = true;
        info!(
            "event=store_shutdown module=store status={} tasks={}",
            if result.is_ok() { "ok" } else { "error" },
            self.state.tasks.len()
        );
        result
    }

    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreChange, &StoreState) + Send + 'static,
    ) -> SubscriptionId {
        self.subscribers.add(Box::new(listener))
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.subscribers.remove(id)
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    pub fn state(&self) -> &StoreState {
        &self.state
    }

    pub fn tasks(&self) -> &[Task] {
        self.state.tasks()
    }

    pub fn task(&self, id: &str) -> Option<&Task> {
        self.state.task(id)
    }

    pub fn focus_ledger(&self) -> &FocusLedger {
        self.state.focus_ledger()
    }

    pub fn focus_seconds(&self, day_key: &str) -> i64 {
        self.state.total_focus.seconds(day_key)
    }

    pub fn is_hydrated(&self) -> bool {
        self.state.hydrated
    }

    /// Returns whether applied changes have not reached storage yet.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Last write failure message, cleared by the next successful write.
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn commit(&mut self, change: StoreChange) {
        self.dirty = true;
        if self.config.persist_mode == PersistMode::Immediate {
            // Failure is recorded in `last_persist_error`.
            let _ = self.persist();
        }
        self.subscribers.notify(&change, &self.state);
    }

    fn persist(&mut self) -> StoreResult<()> {
        let key = self.config.storage_key.as_str();
        let result = encode_snapshot(&self.state.snapshot())
            .map_err(StoreError::from)
            .and_then(|encoded| {
                self.storage
                    .set_item(key, &encoded)
                    .map(|()| encoded.len())
                    .map_err(StoreError::from)
            });

        match result {
            Ok(bytes) => {
                debug!("event=store_persist module=store status=ok key={key} bytes={bytes}");
                self.dirty = false;
                self.last_persist_error = None;
                Ok(())
            }
            Err(err) => {
                warn!("event=store_persist module=store status=error key={key} error={err}");
                self.last_persist_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    fn reject(&self, event: &str, reason: RejectReason) -> MutationOutcome {
        debug!("event={event} module=store status=rejected reason={reason}");
        MutationOutcome::Rejected(reason)
    }
}

impl<S: SnapshotStorage> Drop for TaskStore<S> {
    fn drop(&mut self) {
        if self.shut_down || !self.dirty {
            return;
        }
        if let Err(err) = self.persist() {
            warn!("event=store_drop module=store status=error pending=true error={err}");
        }
    }
}

fn not_hydrated(event: &str) -> MutationOutcome {
    debug!("event={event} module=store status=not_hydrated");
    MutationOutcome::NotHydrated
}

fn not_found(event: &str, id: &str) -> MutationOutcome {
    debug!("event={event} module=store status=not_found task_id={id}");
    MutationOutcome::NotFound(id.to_string())
}
