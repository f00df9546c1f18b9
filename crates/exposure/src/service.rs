//! Composition of SDK, sync, notifications and UI state
//!
//! [`TracingService`] is constructed once by the host's composition root and
//! shared by handle. It owns the three components and routes every SDK event
//! through them in a fixed order: markers are written first, the snapshot is
//! derived afterwards.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use log::info;

use crate::config::CoreConfig;
use crate::error::classify;
use crate::models::{DebugOverride, PersistedMarkers, SyncOutcome, TracingStatus, UiStateSnapshot};
use crate::notify::{ErrorNotificationKind, NotificationScheduler};
use crate::ports::{Clock, NotificationCenter, Platform, SystemClock, TracingSdk};
use crate::state::{StateObserver, StateReconciler};
use crate::storage::{KeyValueStore, MarkerStore};
use crate::sync::SyncCoordinator;

pub struct TracingService {
    sdk: Arc<dyn TracingSdk>,
    platform: Arc<dyn Platform>,
    clock: Arc<dyn Clock>,
    markers: MarkerStore,
    scheduler: Arc<NotificationScheduler>,
    coordinator: SyncCoordinator,
    reconciler: StateReconciler,
}

impl TracingService {
    pub fn new(
        config: CoreConfig,
        sdk: Arc<dyn TracingSdk>,
        store: Arc<dyn KeyValueStore>,
        center: Arc<dyn NotificationCenter>,
        platform: Arc<dyn Platform>,
    ) -> Self {
        Self::with_clock(config, sdk, store, center, platform, Arc::new(SystemClock))
    }

    pub fn with_clock(
        config: CoreConfig,
        sdk: Arc<dyn TracingSdk>,
        store: Arc<dyn KeyValueStore>,
        center: Arc<dyn NotificationCenter>,
        platform: Arc<dyn Platform>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let markers = MarkerStore::new(store);
        let scheduler = Arc::new(NotificationScheduler::new(
            config.clone(),
            center,
            platform.clone(),
            markers.clone(),
        ));
        let coordinator = SyncCoordinator::new(
            sdk.clone(),
            platform.clone(),
            markers.clone(),
            scheduler.clone(),
            config.min_sync_interval(),
        );
        let reconciler = StateReconciler::new(
            markers.clone(),
            config.sync_problem_interval(),
            sdk.status(),
            platform.push_permission_granted(),
        );

        Self {
            sdk,
            platform,
            clock,
            markers,
            scheduler,
            coordinator,
            reconciler,
        }
    }

    /// Notification scheduler, for the check-in reminder family
    pub fn scheduler(&self) -> &NotificationScheduler {
        &self.scheduler
    }

    pub fn persisted_markers(&self) -> PersistedMarkers {
        self.markers.load()
    }

    /// App launch: register notification categories, re-arm the background
    /// warnings and load the current state
    pub fn initialize(&self) {
        info!("Initializing tracing service");
        self.scheduler.register_categories();
        self.scheduler.reset_background_task_warning_triggers();
        self.refresh_push_permission();
        self.reload_status();
    }

    // ========================================================================
    // SDK events
    // ========================================================================

    /// Pushed status from the SDK
    pub fn on_status_changed(&self, status: TracingStatus) {
        let now = self.clock.now();
        self.scheduler.handle_tracking_state(&status.tracking_state, now);
        if let Some(events) = status.infection_status.exposures() {
            self.scheduler.handle_exposures(events);
        }
        self.reconciler.update_status(status);
    }

    /// Poll the SDK status, optionally syncing first
    pub async fn update_status(&self, should_sync: bool) {
        if should_sync {
            self.sync_if_needed().await;
        } else {
            self.reload_status();
        }
    }

    fn reload_status(&self) {
        self.on_status_changed(self.sdk.status());
    }

    // ========================================================================
    // Sync
    // ========================================================================

    pub async fn sync_if_needed(&self) -> SyncOutcome {
        let outcome = self.coordinator.sync_if_needed(self.clock.now()).await;
        self.after_sync(&outcome);
        outcome
    }

    pub async fn trigger_force_sync(&self) -> SyncOutcome {
        let outcome = self.coordinator.force_sync(self.clock.now()).await;
        self.after_sync(&outcome);
        outcome
    }

    /// OS background wake-up
    pub async fn perform_background_tasks(&self) -> SyncOutcome {
        self.scheduler.reset_background_task_warning_triggers();
        self.sync_if_needed().await
    }

    fn after_sync(&self, outcome: &SyncOutcome) {
        match outcome {
            // New exposures may have arrived
            SyncOutcome::Success => self.reload_status(),
            // Bluetooth or permission trouble is already visible in the SDK
            // status; show it now instead of on the next status push
            SyncOutcome::Failure(error) if classify(error).surfaces_immediately() => {
                self.reload_status()
            }
            SyncOutcome::Failure(_) => {
                self.reconciler.refresh();
            }
            SyncOutcome::Skipped => {}
        }
    }

    // ========================================================================
    // Tracing control
    // ========================================================================

    pub fn start_tracing(&self) {
        info!("Starting tracing");
        self.sdk.start_tracing();
        self.scheduler.reset_tracing_reminder();
        self.scheduler.reset_background_task_warning_triggers();
        self.reload_status();
    }

    /// Stop tracing, optionally reminding the user after `reminder`
    pub fn stop_tracing(&self, reminder: Option<Duration>) {
        info!("Stopping tracing");
        self.sdk.stop_tracing();
        self.scheduler.remove_sync_warning_triggers();
        if let Some(after) = reminder {
            self.scheduler.schedule_tracing_reminder(after);
        }
        self.reload_status();
    }

    /// Wipe SDK data, notifications and every marker
    pub fn reset(&self) -> Result<()> {
        info!("Resetting all tracing data");
        self.sdk.reset();
        self.scheduler.clear_all();
        self.scheduler
            .reset_error_notifications(&ErrorNotificationKind::ALL);
        self.scheduler.remove_sync_warning_triggers();
        self.markers.clear().context("Failed to clear persisted markers")?;
        self.reload_status();
        Ok(())
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub fn set_debug_override(&self, debug_override: Option<DebugOverride>) {
        self.reconciler.set_debug_override(debug_override);
    }

    pub fn refresh_push_permission(&self) {
        self.reconciler
            .set_push_permission_granted(self.platform.push_permission_granted());
    }

    pub fn add_observer(&self, id: &str, observer: &Arc<dyn StateObserver>) {
        self.reconciler.add_observer(id, observer);
    }

    pub fn remove_observer(&self, id: &str) -> bool {
        self.reconciler.remove_observer(id)
    }

    pub fn current_snapshot(&self) -> UiStateSnapshot {
        self.reconciler.current_snapshot()
    }
}
