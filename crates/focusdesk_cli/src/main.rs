//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `focusdesk_core` linkage and print core metadata.
//! - With a database path argument, hydrate that store and print a summary.

use focusdesk_core::{
    day_key, day_summary, Clock, HydrationReport, SqliteSnapshotStorage, StoreConfig, SystemClock,
    TaskStore,
};
use std::process::ExitCode;

fn main() -> ExitCode {
    println!("focusdesk_core ping={}", focusdesk_core::ping());
    println!("focusdesk_core version={}", focusdesk_core::core_version());

    let Some(db_path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let storage = match SqliteSnapshotStorage::open(&db_path) {
        Ok(storage) => storage,
        Err(err) => {
            eprintln!("failed to open `{db_path}`: {err}");
            return ExitCode::FAILURE;
        }
    };
    let mut store = TaskStore::new(storage, StoreConfig::default());
    match store.hydrate() {
        HydrationReport::ReadFailed(reason) | HydrationReport::Malformed(reason) => {
            eprintln!("stored snapshot unreadable, treated as empty: {reason}");
        }
        report => println!("hydration={report:?}"),
    }

    let now = SystemClock.now();
    let summary = day_summary(store.tasks(), now.date_naive());
    println!(
        "tasks={} today_total={} today_done={} focus_today_s={}",
        store.tasks().len(),
        summary.total,
        summary.done,
        store.focus_seconds(&day_key(now))
    );
    ExitCode::SUCCESS
}
