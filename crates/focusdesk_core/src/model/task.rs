//! Task domain model.
//!
//! # Responsibility
//! - Define the canonical task record persisted in the store snapshot.
//! - Provide partial-update (`TaskPatch`) and strict-input validation helpers.
//!
//! # Invariants
//! - `id` is stable and never reused for another task.
//! - `created_at` is set once; `TaskPatch` cannot carry it.
//! - `done_at.is_some() == done` after create/toggle. Raw patches may break
//!   this unless the store runs with strict input policy.

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Scheduled-date marker stored when the caller provides no date.
pub const TODAY_SENTINEL: &str = "Today";

/// Stable identifier of a task, kept as opaque text in the snapshot.
pub type TaskId = String;

/// Canonical task record.
///
/// Field names serialize in camelCase to keep the persisted layout
/// readable by the dashboard front end.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    pub done: bool,
    /// ISO-8601 date-time or [`TODAY_SENTINEL`]. Opaque at store level.
    pub date: String,
    pub created_at: String,
    pub done_at: Option<String>,
}

impl Task {
    /// Creates an open task with a generated id.
    ///
    /// Empty `date` falls back to [`TODAY_SENTINEL`].
    pub fn new(title: impl Into<String>, date: impl Into<String>, now: DateTime<Utc>) -> Self {
        Self::with_id(Uuid::new_v4().to_string(), title, date, now)
    }

    /// Creates an open task with a caller-provided id.
    pub fn with_id(
        id: impl Into<TaskId>,
        title: impl Into<String>,
        date: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        let date = date.into();
        Self {
            id: id.into(),
            title: title.into(),
            done: false,
            date: if date.is_empty() {
                TODAY_SENTINEL.to_string()
            } else {
                date
            },
            created_at: format_timestamp(now),
            done_at: None,
        }
    }

    /// Flips completion and keeps `done_at` in step with it.
    pub fn toggle(&mut self, now: DateTime<Utc>) {
        self.done = !self.done;
        self.done_at = if self.done {
            Some(format_timestamp(now))
        } else {
            None
        };
    }

    /// Overwrites only the fields present in `patch`.
    ///
    /// Does not re-derive `done_at` when `done` changes.
    pub fn apply(&mut self, patch: &TaskPatch) {
        if let Some(title) = &patch.title {
            self.title = title.clone();
        }
        if let Some(date) = &patch.date {
            self.date = date.clone();
        }
        if let Some(done) = patch.done {
            self.done = done;
        }
        if let Some(done_at) = &patch.done_at {
            self.done_at = done_at.clone();
        }
    }

    /// Returns whether `done` and `done_at` agree.
    pub fn completion_is_consistent(&self) -> bool {
        self.done == self.done_at.is_some()
    }

    /// Validates fields that strict input policy refuses to store.
    ///
    /// # Errors
    /// - `BlankTitle` when the title is empty after trim.
    /// - `InvalidDate` when `date` is neither the sentinel nor RFC 3339.
    /// - `InvalidDoneAt` when `done_at` is set but not RFC 3339.
    /// - `InconsistentCompletion` when `done` and `done_at` disagree.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_title(&self.title)?;
        validate_date(&self.date)?;
        if let Some(done_at) = &self.done_at {
            if parse_timestamp(done_at).is_none() {
                return Err(TaskValidationError::InvalidDoneAt(done_at.clone()));
            }
        }
        if !self.completion_is_consistent() {
            return Err(TaskValidationError::InconsistentCompletion { done: self.done });
        }
        Ok(())
    }
}

/// Partial task update. `None` leaves the field untouched.
///
/// `done_at` is doubly optional: `Some(None)` clears the timestamp.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub done: Option<bool>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "double_option"
    )]
    pub done_at: Option<Option<String>>,
}

impl TaskPatch {
    pub fn title(value: impl Into<String>) -> Self {
        Self {
            title: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn date(value: impl Into<String>) -> Self {
        Self {
            date: Some(value.into()),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.date.is_none() && self.done.is_none() && self.done_at.is_none()
    }

    /// Strict-policy check of the fields this patch touches, given the task
    /// it would produce. Untouched fields of older records are not re-checked.
    pub fn validate_against(&self, patched: &Task) -> Result<(), TaskValidationError> {
        if let Some(title) = &self.title {
            validate_title(title)?;
        }
        if let Some(date) = &self.date {
            validate_date(date)?;
        }
        if let Some(Some(done_at)) = &self.done_at {
            if parse_timestamp(done_at).is_none() {
                return Err(TaskValidationError::InvalidDoneAt(done_at.clone()));
            }
        }
        if (self.done.is_some() || self.done_at.is_some()) && !patched.completion_is_consistent() {
            return Err(TaskValidationError::InconsistentCompletion { done: patched.done });
        }
        Ok(())
    }
}

// serde collapses `Some(None)` into `None` without this.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

/// Strict-input validation failures for task fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskValidationError {
    BlankTitle,
    InvalidDate(String),
    InvalidDoneAt(String),
    InconsistentCompletion { done: bool },
}

impl Display for TaskValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BlankTitle => write!(f, "task title must not be blank"),
            Self::InvalidDate(value) => write!(
                f,
                "task date `{value}` is neither `{TODAY_SENTINEL}` nor an RFC 3339 timestamp"
            ),
            Self::InvalidDoneAt(value) => {
                write!(f, "task doneAt `{value}` is not an RFC 3339 timestamp")
            }
            Self::InconsistentCompletion { done: true } => {
                write!(f, "task marked done without a doneAt timestamp")
            }
            Self::InconsistentCompletion { done: false } => {
                write!(f, "task marked open but still carries a doneAt timestamp")
            }
        }
    }
}

impl Error for TaskValidationError {}

pub(crate) fn validate_title(title: &str) -> Result<(), TaskValidationError> {
    if title.trim().is_empty() {
        return Err(TaskValidationError::BlankTitle);
    }
    Ok(())
}

pub(crate) fn validate_date(date: &str) -> Result<(), TaskValidationError> {
    if date == TODAY_SENTINEL || parse_timestamp(date).is_some() {
        return Ok(());
    }
    Err(TaskValidationError::InvalidDate(date.to_string()))
}

/// Formats an instant the way browsers print `Date#toISOString`.
pub fn format_timestamp(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Parses an RFC 3339 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|parsed| parsed.with_timezone(&Utc))
}

/// Parses a `YYYY-MM-DD` day key.
pub fn parse_day_key(value: &str) -> Option<NaiveDate> {
    if value.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::{
        format_timestamp, parse_day_key, Task, TaskPatch, TaskValidationError, TODAY_SENTINEL,
    };
    use chrono::{TimeZone, Utc};

    fn at(hour: u32) -> chrono::DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 3, hour, 0, 0).unwrap()
    }

    #[test]
    fn new_task_starts_open_with_sentinel_date() {
        let task = Task::new("Write report", "", at(9));
        assert!(!task.id.is_empty());
        assert!(!task.done);
        assert_eq!(task.done_at, None);
        assert_eq!(task.date, TODAY_SENTINEL);
        assert_eq!(task.created_at, "2024-06-03T09:00:00.000Z");
    }

    #[test]
    fn toggle_sets_and_clears_done_at() {
        let mut task = Task::new("Write report", "2024-06-03T00:00:00.000Z", at(9));
        task.toggle(at(10));
        assert!(task.done);
        assert_eq!(task.done_at.as_deref(), Some("2024-06-03T10:00:00.000Z"));
        task.toggle(at(11));
        assert!(!task.done);
        assert_eq!(task.done_at, None);
    }

    #[test]
    fn apply_only_overwrites_given_fields() {
        let mut task = Task::new("draft", "2024-06-03T00:00:00.000Z", at(9));
        let before = task.clone();
        task.apply(&TaskPatch::title("final"));
        assert_eq!(task.title, "final");
        assert_eq!(task.date, before.date);
        assert_eq!(task.created_at, before.created_at);
        assert_eq!(task.id, before.id);
    }

    #[test]
    fn apply_can_clear_done_at_explicitly() {
        let mut task = Task::new("draft", "", at(9));
        task.toggle(at(10));
        task.apply(&TaskPatch {
            done: Some(false),
            done_at: Some(None),
            ..TaskPatch::default()
        });
        assert!(task.completion_is_consistent());
        assert_eq!(task.done_at, None);
    }

    #[test]
    fn patch_json_distinguishes_clear_from_absent() {
        let clear: TaskPatch = serde_json::from_str(r#"{"doneAt":null}"#).unwrap();
        assert_eq!(clear.done_at, Some(None));
        let absent: TaskPatch = serde_json::from_str(r#"{"title":"x"}"#).unwrap();
        assert_eq!(absent.done_at, None);
        assert!(!absent.is_empty());
        assert!(TaskPatch::default().is_empty());
    }

    #[test]
    fn validate_reports_each_failure() {
        let mut task = Task::new("  ", "", at(9));
        assert_eq!(task.validate(), Err(TaskValidationError::BlankTitle));

        task.title = "ok".to_string();
        task.date = "next tuesday".to_string();
        assert!(matches!(
            task.validate(),
            Err(TaskValidationError::InvalidDate(_))
        ));

        task.date = "2024-06-03T00:00:00.000Z".to_string();
        task.done = true;
        assert_eq!(
            task.validate(),
            Err(TaskValidationError::InconsistentCompletion { done: true })
        );
    }

    #[test]
    fn patch_validation_only_checks_touched_fields() {
        let mut legacy = Task::new("", "not a date", at(9));
        let patch = TaskPatch::title("renamed");
        legacy.apply(&patch);
        assert_eq!(patch.validate_against(&legacy), Ok(()));

        let done_only = TaskPatch {
            done: Some(true),
            ..TaskPatch::default()
        };
        let mut task = Task::new("ok", "", at(9));
        task.apply(&done_only);
        assert_eq!(
            done_only.validate_against(&task),
            Err(TaskValidationError::InconsistentCompletion { done: true })
        );
    }

    #[test]
    fn timestamp_format_matches_iso_millis() {
        assert_eq!(format_timestamp(at(0)), "2024-06-03T00:00:00.000Z");
    }

    #[test]
    fn day_key_parser_is_strict() {
        assert!(parse_day_key("2024-06-01").is_some());
        assert!(parse_day_key("2024-6-1").is_none());
        assert!(parse_day_key("2024-06-01T00:00").is_none());
    }
}
