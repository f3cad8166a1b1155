//! Per-day focus-time ledger.
//!
//! # Invariants
//! - Entries change only through additive accumulation.
//! - A day without an entry reads as `0` seconds.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Accumulated focus seconds keyed by `YYYY-MM-DD` day key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FocusLedger {
    entries: BTreeMap<String, i64>,
}

impl FocusLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `seconds` to `day_key` and returns the new total.
    ///
    /// No clamping: negative input lowers the total.
    pub fn add(&mut self, day_key: &str, seconds: i64) -> i64 {
        let entry = self.entries.entry(day_key.to_string()).or_insert(0);
        *entry = entry.saturating_add(seconds);
        *entry
    }

    pub fn seconds(&self, day_key: &str) -> i64 {
        self.entries.get(day_key).copied().unwrap_or(0)
    }

    pub fn contains(&self, day_key: &str) -> bool {
        self.entries.contains_key(day_key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates entries in ascending day-key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, i64)> {
        self.entries.iter().map(|(day, seconds)| (day.as_str(), *seconds))
    }
}

impl From<BTreeMap<String, i64>> for FocusLedger {
    fn from(entries: BTreeMap<String, i64>) -> Self {
        Self { entries }
    }
}

impl FromIterator<(String, i64)> for FocusLedger {
    fn from_iter<I: IntoIterator<Item = (String, i64)>>(iter: I) -> Self {
        let mut ledger = Self::new();
        for (day, seconds) in iter {
            ledger.add(&day, seconds);
        }
        ledger
    }
}
