use chrono::{DateTime, Duration, TimeZone, Utc};
use focusdesk_core::{
    InputPolicy, ManualClock, MemoryStorage, MutationOutcome, RejectReason, StoreChange,
    StoreConfig, TaskPatch, TaskStore, TaskValidationError, TODAY_SENTINEL,
};
use std::sync::{Arc, Mutex};

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 3, 9, 0, 0).unwrap()
}

fn setup() -> (TaskStore<MemoryStorage>, ManualClock) {
    setup_with(StoreConfig::default())
}

fn setup_with(config: StoreConfig) -> (TaskStore<MemoryStorage>, ManualClock) {
    let clock = ManualClock::new(start());
    let mut store = TaskStore::with_clock(MemoryStorage::new(), config, clock.clone());
    store.hydrate();
    (store, clock)
}

fn create(store: &mut TaskStore<MemoryStorage>, title: &str) -> String {
    store
        .create_task(title, "2024-06-03T00:00:00.000Z")
        .created_id()
        .unwrap()
        .to_string()
}

fn assert_completion_invariant(store: &TaskStore<MemoryStorage>) {
    for task in store.tasks() {
        assert_eq!(task.done, task.done_at.is_some(), "task {}", task.id);
    }
}

#[test]
fn create_toggle_toggle_end_to_end() {
    let (mut store, clock) = setup();

    let outcome = store.create_task("Write report", "2024-06-03T00:00:00.000Z");
    let id = outcome.created_id().unwrap().to_string();
    assert!(!id.is_empty());

    let task = store.task(&id).unwrap();
    assert_eq!(task.title, "Write report");
    assert_eq!(task.date, "2024-06-03T00:00:00.000Z");
    assert!(!task.done);
    assert_eq!(task.done_at, None);
    assert_eq!(task.created_at, "2024-06-03T09:00:00.000Z");

    clock.advance(Duration::minutes(30));
    assert_eq!(store.toggle_done(&id), MutationOutcome::Toggled { done: true });
    let task = store.task(&id).unwrap();
    assert!(task.done);
    assert_eq!(task.done_at.as_deref(), Some("2024-06-03T09:30:00.000Z"));

    assert_eq!(store.toggle_done(&id), MutationOutcome::Toggled { done: false });
    let task = store.task(&id).unwrap();
    assert!(!task.done);
    assert_eq!(task.done_at, None);
}

#[test]
fn create_uses_wall_clock_by_default() {
    let mut store = TaskStore::new(MemoryStorage::new(), StoreConfig::default());
    store.hydrate();
    let before = Utc::now();
    let id = create(&mut store, "Write report");
    let created_at = DateTime::parse_from_rfc3339(&store.task(&id).unwrap().created_at)
        .unwrap()
        .with_timezone(&Utc);
    assert!((created_at - before).num_seconds().abs() < 5);
}

#[test]
fn empty_date_falls_back_to_today_sentinel() {
    let (mut store, _) = setup();
    let id = store.create_task("no date", "").created_id().unwrap().to_string();
    assert_eq!(store.task(&id).unwrap().date, TODAY_SENTINEL);
}

#[test]
fn lenient_store_accepts_degenerate_input() {
    let (mut store, _) = setup();
    let outcome = store.create_task("", "not a date");
    assert!(outcome.is_applied());
    assert_eq!(store.tasks().len(), 1);
    assert_eq!(
        store.add_focus_seconds("whenever", -10),
        MutationOutcome::FocusAdded { total: -10 }
    );
}

#[test]
fn ids_are_unique_and_order_is_stable() {
    let (mut store, _) = setup();
    let ids: Vec<String> = (0..5).map(|i| create(&mut store, &format!("t{i}"))).collect();

    let mut unique = ids.clone();
    unique.sort();
    unique.dedup();
    assert_eq!(unique.len(), ids.len());

    store.toggle_done(&ids[1]);
    store.update_task(&ids[3], &TaskPatch::title("renamed"));
    store.delete_task(&ids[2]);

    let remaining: Vec<&str> = store.tasks().iter().map(|task| task.id.as_str()).collect();
    assert_eq!(
        remaining,
        vec![ids[0].as_str(), ids[1].as_str(), ids[3].as_str(), ids[4].as_str()]
    );
}

#[test]
fn toggle_twice_restores_original_fields() {
    let (mut store, clock) = setup();
    let id = create(&mut store, "flip");
    let original = store.task(&id).unwrap().clone();

    store.toggle_done(&id);
    clock.advance(Duration::seconds(5));
    store.toggle_done(&id);
    assert_eq!(store.task(&id).unwrap(), &original);
    assert_completion_invariant(&store);
}

#[test]
fn missing_ids_report_not_found_and_leave_tasks_untouched() {
    let (mut store, _) = setup();
    create(&mut store, "a");
    create(&mut store, "b");
    let before = store.tasks().to_vec();

    assert_eq!(
        store.delete_task("missing"),
        MutationOutcome::NotFound("missing".to_string())
    );
    assert_eq!(
        store.toggle_done("missing"),
        MutationOutcome::NotFound("missing".to_string())
    );
    assert_eq!(
        store.update_task("missing", &TaskPatch::title("x")),
        MutationOutcome::NotFound("missing".to_string())
    );
    assert_eq!(store.tasks(), before.as_slice());
}

#[test]
fn update_overwrites_only_given_fields() {
    let (mut store, _) = setup();
    let id = create(&mut store, "draft");
    let before = store.task(&id).unwrap().clone();

    let outcome = store.update_task(
        &id,
        &TaskPatch {
            title: Some("final".to_string()),
            date: Some("2024-06-04T00:00:00.000Z".to_string()),
            ..TaskPatch::default()
        },
    );
    assert_eq!(outcome, MutationOutcome::Updated);

    let after = store.task(&id).unwrap();
    assert_eq!(after.title, "final");
    assert_eq!(after.date, "2024-06-04T00:00:00.000Z");
    assert_eq!(after.id, before.id);
    assert_eq!(after.created_at, before.created_at);
    assert_eq!(after.done, before.done);
}

#[test]
fn identical_patch_reports_unchanged() {
    let (mut store, _) = setup();
    let id = create(&mut store, "same");
    assert_eq!(
        store.update_task(&id, &TaskPatch::title("same")),
        MutationOutcome::Unchanged
    );
    assert_eq!(store.update_task(&id, &TaskPatch::default()), MutationOutcome::Unchanged);
}

#[test]
fn lenient_update_of_done_does_not_stamp_done_at() {
    let (mut store, _) = setup();
    let id = create(&mut store, "raw");
    store.update_task(
        &id,
        &TaskPatch {
            done: Some(true),
            ..TaskPatch::default()
        },
    );
    let task = store.task(&id).unwrap();
    assert!(task.done);
    assert_eq!(task.done_at, None);
}

#[test]
fn strict_policy_rejects_bad_input_without_side_effects() {
    let (mut store, _) =
        setup_with(StoreConfig::default().with_input_policy(InputPolicy::Strict));

    assert_eq!(
        store.create_task("   ", ""),
        MutationOutcome::Rejected(RejectReason::Task(TaskValidationError::BlankTitle))
    );
    assert!(matches!(
        store.create_task("ok", "next week"),
        MutationOutcome::Rejected(RejectReason::Task(TaskValidationError::InvalidDate(_)))
    ));
    assert!(store.tasks().is_empty());

    let id = create(&mut store, "valid");
    assert_eq!(
        store.update_task(
            &id,
            &TaskPatch {
                done: Some(true),
                ..TaskPatch::default()
            }
        ),
        MutationOutcome::Rejected(RejectReason::Task(
            TaskValidationError::InconsistentCompletion { done: true }
        ))
    );
    assert!(!store.task(&id).unwrap().done);

    assert_eq!(
        store.update_task(
            &id,
            &TaskPatch {
                done: Some(true),
                done_at: Some(Some("2024-06-03T10:00:00.000Z".to_string())),
                ..TaskPatch::default()
            }
        ),
        MutationOutcome::Updated
    );
    assert_completion_invariant(&store);

    assert_eq!(
        store.add_focus_seconds("June 1st", 60),
        MutationOutcome::Rejected(RejectReason::InvalidDayKey("June 1st".to_string()))
    );
    assert_eq!(
        store.add_focus_seconds("2024-06-01", -60),
        MutationOutcome::Rejected(RejectReason::NegativeFocus(-60))
    );
    assert!(store.focus_ledger().is_empty());
}

#[test]
fn focus_seconds_accumulate_per_day() {
    let (mut store, _) = setup();
    assert_eq!(store.focus_seconds("2024-06-01"), 0);
    assert_eq!(
        store.add_focus_seconds("2024-06-01", 120),
        MutationOutcome::FocusAdded { total: 120 }
    );
    assert_eq!(
        store.add_focus_seconds("2024-06-01", 30),
        MutationOutcome::FocusAdded { total: 150 }
    );
    store.add_focus_seconds("2024-06-02", 10);
    assert_eq!(store.focus_seconds("2024-06-01"), 150);
    assert_eq!(store.focus_seconds("2024-06-02"), 10);
}

#[test]
fn zero_seconds_creates_entry_once() {
    let (mut store, _) = setup();
    assert_eq!(
        store.add_focus_seconds("2024-06-01", 0),
        MutationOutcome::FocusAdded { total: 0 }
    );
    assert!(store.focus_ledger().contains("2024-06-01"));
    assert!(!store.is_dirty());
}

#[test]
fn invariant_holds_across_mixed_sequence() {
    let (mut store, clock) = setup();
    let ids: Vec<String> = (0..6).map(|i| create(&mut store, &format!("t{i}"))).collect();
    for (step, id) in ids.iter().cycle().take(20).enumerate() {
        clock.advance(Duration::seconds(1));
        if step % 7 == 6 {
            store.delete_task(id);
        } else {
            store.toggle_done(id);
        }
        assert_completion_invariant(&store);
    }
}

#[test]
fn subscribers_see_each_applied_change_in_order() {
    let (mut store, _) = setup();
    let seen = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&seen);
    let subscription = store.subscribe(move |change, state| {
        sink.lock().unwrap().push((change.clone(), state.tasks().len()));
    });

    let id = create(&mut store, "watched");
    store.toggle_done(&id);
    store.toggle_done("missing");
    store.update_task(&id, &TaskPatch::title("watched"));
    store.add_focus_seconds("2024-06-03", 60);
    store.delete_task(&id);

    assert!(store.unsubscribe(subscription));
    assert!(!store.unsubscribe(subscription));
    create(&mut store, "unwatched");

    let seen = seen.lock().unwrap();
    assert_eq!(
        *seen,
        vec![
            (StoreChange::TaskCreated(id.clone()), 1),
            (
                StoreChange::TaskToggled {
                    id: id.clone(),
                    done: true
                },
                1
            ),
            (
                StoreChange::FocusAdded {
                    day_key: "2024-06-03".to_string(),
                    total: 60
                },
                1
            ),
            (StoreChange::TaskDeleted(id), 0),
        ]
    );
}
