//! Synchronous change listeners.

use crate::model::task::TaskId;
use crate::store::StoreState;

/// State change broadcast to subscribers after it is applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Hydrated,
    TaskCreated(TaskId),
    TaskToggled { id: TaskId, done: bool },
    TaskUpdated(TaskId),
    TaskDeleted(TaskId),
    FocusAdded { day_key: String, total: i64 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

pub type Listener = Box<dyn FnMut(&StoreChange, &StoreState) + Send>;

#[derive(Default)]
pub(crate) struct Subscribers {
    next_id: u64,
    listeners: Vec<(SubscriptionId, Listener)>,
}

impl Subscribers {
    pub(crate) fn add(&mut self, listener: Listener) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.listeners.push((id, listener));
        id
    }

    pub(crate) fn remove(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(existing, _)| *existing != id);
        self.listeners.len() != before
    }

    pub(crate) fn len(&self) -> usize {
        self.listeners.len()
    }

    /// Invokes listeners in subscription order.
    pub(crate) fn notify(&mut self, change: &StoreChange, state: &StoreState) {
        for (_, listener) in &mut self.listeners {
            listener(change, state);
        }
    }
}
