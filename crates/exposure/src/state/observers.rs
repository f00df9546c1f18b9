//! Weakly held snapshot observers

use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use crate::models::UiStateSnapshot;

/// Receives every published [`UiStateSnapshot`]
pub trait StateObserver: Send + Sync {
    fn on_state_changed(&self, snapshot: &UiStateSnapshot);
}

impl<F> StateObserver for F
where
    F: Fn(&UiStateSnapshot) + Send + Sync,
{
    fn on_state_changed(&self, snapshot: &UiStateSnapshot) {
        self(snapshot)
    }
}

/// Observers in subscription order
///
/// Only weak references are kept: an observer whose owner dropped it is
/// skipped and pruned on the next call to [`live`](Self::live). Callers invoke
/// the observers themselves, with no lock held, since observers may call back
/// into the reconciler.
#[derive(Default)]
pub struct ObserverRegistry {
    entries: Mutex<Vec<(String, Weak<dyn StateObserver>)>>,
}

impl ObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, Vec<(String, Weak<dyn StateObserver>)>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register under `id`. Re-registering an id replaces the observer but
    /// keeps its position.
    pub fn add(&self, id: &str, observer: &Arc<dyn StateObserver>) {
        let weak = Arc::downgrade(observer);
        let mut entries = self.entries();
        match entries.iter_mut().find(|(existing, _)| existing == id) {
            Some(entry) => entry.1 = weak,
            None => entries.push((id.to_string(), weak)),
        }
    }

    /// Returns whether the id was registered
    pub fn remove(&self, id: &str) -> bool {
        let mut entries = self.entries();
        let before = entries.len();
        entries.retain(|(existing, _)| existing != id);
        entries.len() != before
    }

    /// Live observers in subscription order; dead ones are dropped
    pub fn live(&self) -> Vec<Arc<dyn StateObserver>> {
        let mut entries = self.entries();
        entries.retain(|(_, weak)| weak.strong_count() > 0);
        entries.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
