//! Headless implementations of the host ports
//!
//! Nothing here talks to a real radio or notification center; everything is
//! logged so a run can be followed on the console.

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use exposure::{
    BackgroundTaskId, NotificationCategory, NotificationCenter, NotificationRequest, Platform,
    SyncOutcome, TrackingState, TracingSdk, TracingStatus,
};
use log::{debug, info};

use crate::scenario::Scenario;

/// Tracing SDK answering from a [`Scenario`]
pub struct SimulatedSdk {
    scenario: Scenario,
    tick: AtomicUsize,
    /// Set by start/stop and reset, overrides the scenario's tracking state
    tracking_override: Mutex<Option<TrackingState>>,
}

impl SimulatedSdk {
    pub fn new(scenario: Scenario) -> Self {
        Self {
            scenario,
            tick: AtomicUsize::new(0),
            tracking_override: Mutex::new(None),
        }
    }

    /// Move to the next scenario step
    pub fn advance(&self) -> usize {
        self.tick.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn current_tick(&self) -> usize {
        self.tick.load(Ordering::SeqCst)
    }

    fn set_tracking_override(&self, state: Option<TrackingState>) {
        if let Ok(mut guard) = self.tracking_override.lock() {
            *guard = state;
        }
    }
}

#[async_trait]
impl TracingSdk for SimulatedSdk {
    fn status(&self) -> TracingStatus {
        let mut status = self
            .scenario
            .step(self.current_tick())
            .map(|step| step.status.clone())
            .unwrap_or_default();
        if let Some(state) = self
            .tracking_override
            .lock()
            .ok()
            .and_then(|guard| guard.clone())
        {
            status.tracking_state = state;
        }
        status
    }

    async fn sync(&self) -> SyncOutcome {
        let outcome = self
            .scenario
            .step(self.current_tick())
            .map(|step| step.sync_outcome())
            .unwrap_or(SyncOutcome::Success);
        info!("SDK sync -> {:?}", outcome);
        outcome
    }

    fn start_tracing(&self) {
        info!("SDK tracing started");
        self.set_tracking_override(None);
    }

    fn stop_tracing(&self) {
        info!("SDK tracing stopped");
        self.set_tracking_override(Some(TrackingState::Stopped));
    }

    fn reset(&self) {
        info!("SDK data reset");
        self.set_tracking_override(None);
    }
}

/// Notification center that only logs
#[derive(Default)]
pub struct LoggingNotificationCenter;

impl NotificationCenter for LoggingNotificationCenter {
    fn schedule(&self, request: NotificationRequest) {
        match request.delay {
            Some(delay) => info!(
                "Notification {} scheduled in {}s: {}",
                request.id,
                delay.as_secs(),
                request.title
            ),
            None => info!("Notification {} shown: {}", request.id, request.title),
        }
    }

    fn cancel_pending(&self, ids: &[String]) {
        debug!("Cancelled pending notifications {:?}", ids);
    }

    fn cancel_delivered(&self, ids: &[String]) {
        debug!("Removed delivered notifications {:?}", ids);
    }

    fn cancel_all_delivered(&self) {
        debug!("Removed all delivered notifications");
    }

    fn register_categories(&self, categories: Vec<NotificationCategory>) {
        info!("Registered {} notification categories", categories.len());
    }
}

/// Foreground process with notifications allowed
#[derive(Default)]
pub struct HeadlessPlatform {
    next_task: AtomicU64,
}

impl Platform for HeadlessPlatform {
    fn push_permission_granted(&self) -> bool {
        true
    }

    fn is_backgrounded(&self) -> bool {
        false
    }

    fn begin_background_task(&self, name: &str) -> BackgroundTaskId {
        let id = self.next_task.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Background task {} ({}) began", id, name);
        id
    }

    fn end_background_task(&self, id: BackgroundTaskId) {
        debug!("Background task {} ended", id);
    }
}
