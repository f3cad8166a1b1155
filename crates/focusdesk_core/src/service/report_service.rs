//! Derived views over store state: today's tasks and the weekly report.
//!
//! # Responsibility
//! - Resolve a task's scheduled day from its opaque `date` string.
//! - Bucket created/completed tasks and focus time into a Sunday-start week.
//!
//! # Invariants
//! - All day arithmetic is UTC, matching how day keys are produced.
//! - Tasks with unparsable dates are never scheduled on any day.
//! - Views are pure: they read `StoreState` and never mutate it.

use crate::model::focus::FocusLedger;
use crate::model::task::{parse_timestamp, Task, TODAY_SENTINEL};
use crate::store::StoreState;
use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc};

const DAYS_PER_WEEK: i64 = 7;

/// Returns the `YYYY-MM-DD` ledger key for `instant`.
pub fn day_key(instant: DateTime<Utc>) -> String {
    format_day_key(instant.date_naive())
}

pub fn format_day_key(day: NaiveDate) -> String {
    day.format("%Y-%m-%d").to_string()
}

/// Resolves the day a task is scheduled on.
///
/// The `"Today"` sentinel means the day the task was created.
pub fn scheduled_day(task: &Task) -> Option<NaiveDate> {
    let source = if task.date == TODAY_SENTINEL {
        task.created_at.as_str()
    } else {
        task.date.as_str()
    };
    parse_timestamp(source).map(|instant| instant.date_naive())
}

/// Tasks scheduled on `day`, in store order.
pub fn tasks_for_day(tasks: &[Task], day: NaiveDate) -> Vec<&Task> {
    tasks
        .iter()
        .filter(|task| scheduled_day(task) == Some(day))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DaySummary {
    pub day: NaiveDate,
    pub total: usize,
    pub done: usize,
    /// True only when at least one task is scheduled and all are done.
    pub all_done: bool,
}

pub fn day_summary(tasks: &[Task], day: NaiveDate) -> DaySummary {
    let scheduled = tasks_for_day(tasks, day);
    let done = scheduled.iter().filter(|task| task.done).count();
    DaySummary {
        day,
        total: scheduled.len(),
        done,
        all_done: !scheduled.is_empty() && done == scheduled.len(),
    }
}

/// One day column of the weekly report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayReport {
    pub day: NaiveDate,
    /// Short weekday name (`Sun`..`Sat`).
    pub label: String,
    pub created: usize,
    pub completed: usize,
    pub focus_minutes: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeeklyReport {
    pub week_start: NaiveDate,
    pub days: Vec<DayReport>,
    pub total_focus_minutes: i64,
}

/// Returns the Sunday starting the week that contains `day`.
pub fn week_start(day: NaiveDate) -> NaiveDate {
    day - Duration::days(i64::from(day.weekday().num_days_from_sunday()))
}

/// Builds the Sunday-start weekly report for the week containing `reference`.
pub fn weekly_report(state: &StoreState, reference: NaiveDate) -> WeeklyReport {
    let start = week_start(reference);
    let days = (0..DAYS_PER_WEEK)
        .map(|offset| {
            let day = start + Duration::days(offset);
            day_report(state.tasks(), state.focus_ledger(), day)
        })
        .collect::<Vec<_>>();
    let total_focus_minutes = days.iter().map(|day| day.focus_minutes).sum();

    WeeklyReport {
        week_start: start,
        days,
        total_focus_minutes,
    }
}

fn day_report(tasks: &[Task], ledger: &FocusLedger, day: NaiveDate) -> DayReport {
    let created = tasks
        .iter()
        .filter(|task| timestamp_day(&task.created_at) == Some(day))
        .count();
    let completed = tasks
        .iter()
        .filter(|task| task.done_at.as_deref().and_then(timestamp_day) == Some(day))
        .count();

    DayReport {
        day,
        label: day.format("%a").to_string(),
        created,
        completed,
        focus_minutes: ledger.seconds(&format_day_key(day)).div_euclid(60),
    }
}

fn timestamp_day(value: &str) -> Option<NaiveDate> {
    parse_timestamp(value).map(|instant| instant.date_naive())
}

#[cfg(test)]
mod tests {
    use super::{day_key, day_summary, scheduled_day, week_start};
    use crate::model::task::Task;
    use chrono::{NaiveDate, TimeZone, Utc};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn day_key_is_utc_date() {
        let instant = Utc.with_ymd_and_hms(2024, 6, 1, 23, 59, 59).unwrap();
        assert_eq!(day_key(instant), "2024-06-01");
    }

    #[test]
    fn week_starts_on_sunday() {
        // 2024-06-05 is a Wednesday.
        assert_eq!(week_start(date(2024, 6, 5)), date(2024, 6, 2));
        assert_eq!(week_start(date(2024, 6, 2)), date(2024, 6, 2));
        assert_eq!(week_start(date(2024, 6, 8)), date(2024, 6, 2));
    }

    #[test]
    fn sentinel_date_resolves_to_creation_day() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let task = Task::new("x", "", now);
        assert_eq!(scheduled_day(&task), Some(date(2024, 6, 3)));

        let unparsable = Task::new("x", "someday", now);
        assert_eq!(scheduled_day(&unparsable), None);
    }

    #[test]
    fn summary_requires_at_least_one_task_for_all_done() {
        let now = Utc.with_ymd_and_hms(2024, 6, 3, 12, 0, 0).unwrap();
        let empty = day_summary(&[], date(2024, 6, 3));
        assert!(!empty.all_done);

        let mut task = Task::new("x", "2024-06-03T00:00:00.000Z", now);
        task.toggle(now);
        let summary = day_summary(&[task], date(2024, 6, 3));
        assert_eq!(summary.total, 1);
        assert_eq!(summary.done, 1);
        assert!(summary.all_done);
    }
}
