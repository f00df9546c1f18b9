//! Derivation of the UI state snapshot
//!
//! [`reconcile`] is the only producer of [`UiStateSnapshot`] values.
//! [`StateReconciler`] keeps its latest inputs, republishes when the derived
//! value changes and fans snapshots out to observers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Duration;
use log::debug;

use super::{ObserverRegistry, StateObserver};
use crate::error::{ErrorKind, classify};
use crate::models::{
    DebugOverride, ExposureBanner, InfectionStatus, PersistedMarkers, TrackingState,
    TracingHealth, TracingStatus, UiStateSnapshot,
};
use crate::storage::MarkerStore;
use crate::sync::sustained_failure;

/// Everything a snapshot is derived from
#[derive(Debug, Clone, Copy)]
pub struct ReconcileInput<'a> {
    pub status: &'a TracingStatus,
    pub markers: &'a PersistedMarkers,
    pub debug_override: Option<DebugOverride>,
    pub push_permission_granted: bool,
    pub sync_problem_interval: Duration,
}

/// Derive the UI state. Total and deterministic.
pub fn reconcile(input: &ReconcileInput<'_>) -> UiStateSnapshot {
    let mut tracing_health = match &input.status.tracking_state {
        TrackingState::Active
        | TrackingState::ActiveAdvertisingOnly
        | TrackingState::ActiveReceivingOnly => TracingHealth::Active,
        TrackingState::Stopped => TracingHealth::Inactive,
        TrackingState::Inactive(error) => match classify(error) {
            ErrorKind::BluetoothOff => TracingHealth::BluetoothOff,
            ErrorKind::Permission => TracingHealth::PermissionError,
            _ => TracingHealth::Inactive,
        },
    };

    let sync_problem = sustained_failure(
        input.markers.first_sync_failure_time,
        input.markers.last_sync_failure_time,
        input.sync_problem_interval,
    );

    let infection_status = match input.debug_override {
        Some(debug_override) => debug_override.infection_status(),
        None => input.status.infection_status.clone(),
    };

    let exposure_banner = match infection_status {
        InfectionStatus::Infected => {
            tracing_health = TracingHealth::Ended;
            ExposureBanner::Infected
        }
        InfectionStatus::Exposed(_) => ExposureBanner::Exposed,
        InfectionStatus::Healthy => ExposureBanner::None,
    };

    UiStateSnapshot {
        tracing_health,
        exposure_banner,
        push_problem: !input.push_permission_granted,
        sync_problem,
        time_inconsistency: input.markers.time_inconsistency_flag,
        debug_override: input.debug_override,
    }
}

struct ReconcilerState {
    status: TracingStatus,
    debug_override: Option<DebugOverride>,
    push_permission_granted: bool,
    published: UiStateSnapshot,
    /// Published but not yet handed to observers
    undelivered: Option<UiStateSnapshot>,
    /// Some caller is currently draining `undelivered`
    delivering: bool,
}

/// Holds the latest inputs and publishes snapshot changes
pub struct StateReconciler {
    markers: MarkerStore,
    sync_problem_interval: Duration,
    state: Mutex<ReconcilerState>,
    observers: ObserverRegistry,
}

/// Releases the delivery slot if an observer panics mid-drain
struct DrainGuard<'a> {
    reconciler: &'a StateReconciler,
    finished: bool,
}

impl Drop for DrainGuard<'_> {
    fn drop(&mut self) {
        if !self.finished {
            self.reconciler.state().delivering = false;
        }
    }
}

impl StateReconciler {
    pub fn new(
        markers: MarkerStore,
        sync_problem_interval: Duration,
        status: TracingStatus,
        push_permission_granted: bool,
    ) -> Self {
        let persisted = markers.load();
        let published = reconcile(&ReconcileInput {
            status: &status,
            markers: &persisted,
            debug_override: None,
            push_permission_granted,
            sync_problem_interval,
        });

        Self {
            markers,
            sync_problem_interval,
            state: Mutex::new(ReconcilerState {
                status,
                debug_override: None,
                push_permission_granted,
                published,
                undelivered: None,
                delivering: false,
            }),
            observers: ObserverRegistry::new(),
        }
    }

    fn state(&self) -> MutexGuard<'_, ReconcilerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Recompute from the current inputs and markers.
    ///
    /// Observers are only notified when the snapshot value changed. Returns
    /// whether it did.
    pub fn refresh(&self) -> bool {
        self.apply(|_| {})
    }

    pub fn update_status(&self, status: TracingStatus) -> bool {
        self.apply(|state| state.status = status)
    }

    pub fn set_debug_override(&self, debug_override: Option<DebugOverride>) -> bool {
        self.apply(|state| state.debug_override = debug_override)
    }

    pub fn set_push_permission_granted(&self, granted: bool) -> bool {
        self.apply(|state| state.push_permission_granted = granted)
    }

    fn apply(&self, update: impl FnOnce(&mut ReconcilerState)) -> bool {
        let markers = self.markers.load();

        let drain = {
            let mut state = self.state();
            update(&mut state);
            let next = reconcile(&ReconcileInput {
                status: &state.status,
                markers: &markers,
                debug_override: state.debug_override,
                push_permission_granted: state.push_permission_granted,
                sync_problem_interval: self.sync_problem_interval,
            });
            if next == state.published {
                return false;
            }
            debug!("Publishing UI state {:?}", next);
            state.published = next.clone();
            state.undelivered = Some(next);

            // An active drain (another thread, or an observer calling back
            // into us) picks the new snapshot up.
            let drain = !state.delivering;
            state.delivering = true;
            drain
        };

        if drain {
            self.deliver();
        }
        true
    }

    /// Hand snapshots to observers in publish order until none is pending.
    ///
    /// A snapshot superseded mid-delivery is abandoned; the remaining
    /// observers only see the newer one.
    fn deliver(&self) {
        let mut drain = DrainGuard {
            reconciler: self,
            finished: false,
        };

        loop {
            let snapshot = {
                let mut state = self.state();
                match state.undelivered.take() {
                    Some(snapshot) => snapshot,
                    None => {
                        state.delivering = false;
                        drain.finished = true;
                        return;
                    }
                }
            };

            for observer in self.observers.live() {
                if self.state().undelivered.is_some() {
                    debug!("Snapshot superseded during delivery");
                    break;
                }
                observer.on_state_changed(&snapshot);
            }
        }
    }

    pub fn current_snapshot(&self) -> UiStateSnapshot {
        self.state().published.clone()
    }

    /// Subscribe and receive the current snapshot right away
    pub fn add_observer(&self, id: &str, observer: &Arc<dyn StateObserver>) {
        self.observers.add(id, observer);
        observer.on_state_changed(&self.current_snapshot());
    }

    pub fn remove_observer(&self, id: &str) -> bool {
        self.observers.remove(id)
    }
}
