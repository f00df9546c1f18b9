//! Boundaries to the outside world
//!
//! The core never talks to the tracing SDK, the OS notification center or the
//! platform directly. Hosts implement these traits and hand them to
//! [`TracingService`](crate::TracingService).

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::models::{SyncOutcome, TracingStatus};
use crate::notify::{NotificationCategory, NotificationRequest};

/// The external tracing SDK, consumed as a black box
#[async_trait]
pub trait TracingSdk: Send + Sync {
    /// Current status. Cheap to call.
    fn status(&self) -> TracingStatus;

    /// One sync attempt against the backend. Never retries internally.
    async fn sync(&self) -> SyncOutcome;

    fn start_tracing(&self);

    fn stop_tracing(&self);

    /// Wipe all SDK data
    fn reset(&self);
}

/// Source of the current time
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Opaque handle for a platform background task
pub type BackgroundTaskId = u64;

/// Host platform services
pub trait Platform: Send + Sync {
    /// Whether the user allowed local notifications
    fn push_permission_granted(&self) -> bool;

    /// Whether the app is currently not in the foreground
    fn is_backgrounded(&self) -> bool;

    /// Ask the OS to keep the process running until the task is ended
    fn begin_background_task(&self, name: &str) -> BackgroundTaskId;

    fn end_background_task(&self, id: BackgroundTaskId);
}

/// Platform "keep running in background" token
///
/// Ends the task when dropped, so every exit path of the holder releases it.
pub struct BackgroundTask {
    platform: Arc<dyn Platform>,
    id: BackgroundTaskId,
}

impl BackgroundTask {
    pub fn begin(platform: Arc<dyn Platform>, name: &str) -> Self {
        let id = platform.begin_background_task(name);
        log::debug!("Began background task {} ({})", id, name);
        Self { platform, id }
    }

    pub fn id(&self) -> BackgroundTaskId {
        self.id
    }
}

impl Drop for BackgroundTask {
    fn drop(&mut self) {
        log::debug!("Ending background task {}", self.id);
        self.platform.end_background_task(self.id);
    }
}

/// OS local-notification delivery
pub trait NotificationCenter: Send + Sync {
    /// Schedule a one-shot notification. An existing request with the same id
    /// is replaced.
    fn schedule(&self, request: NotificationRequest);

    fn cancel_pending(&self, ids: &[String]);

    fn cancel_delivered(&self, ids: &[String]);

    fn cancel_all_delivered(&self);

    fn register_categories(&self, categories: Vec<NotificationCategory>);
}
