//! ExposureService facade for UniFFI export
//!
//! Wraps [`TracingService`] behind a blocking, FFI-friendly API. Host
//! callbacks are adapted onto the core ports, and a private tokio runtime
//! drives the async sync path.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use log::warn;

use crate::config::CoreConfig;
use crate::error::SdkError;
use crate::ffi::types::*;
use crate::models::{SyncOutcome, TracingStatus, UiStateSnapshot};
use crate::notify::{CheckoutAction, NotificationCategory, NotificationRequest};
use crate::ports::{BackgroundTaskId, NotificationCenter, Platform, TracingSdk};
use crate::service::TracingService;
use crate::state::StateObserver;
use crate::storage::SqliteKeyValueStore;

// ============================================================================
// Port adapters
// ============================================================================

struct HostSdk {
    callback: Arc<dyn SdkCallback>,
}

#[async_trait]
impl TracingSdk for HostSdk {
    fn status(&self) -> TracingStatus {
        self.callback.status().into()
    }

    async fn sync(&self) -> SyncOutcome {
        let callback = self.callback.clone();
        match tokio::task::spawn_blocking(move || callback.sync()).await {
            Ok(outcome) => outcome.into(),
            Err(e) => {
                warn!("Host sync did not complete: {}", e);
                SyncOutcome::Failure(SdkError::Cancelled)
            }
        }
    }

    fn start_tracing(&self) {
        self.callback.start_tracing();
    }

    fn stop_tracing(&self) {
        self.callback.stop_tracing();
    }

    fn reset(&self) {
        self.callback.reset();
    }
}

struct HostNotificationCenter {
    callback: Box<dyn NotificationCallback>,
}

impl NotificationCenter for HostNotificationCenter {
    fn schedule(&self, request: NotificationRequest) {
        self.callback.schedule(request.into());
    }

    fn cancel_pending(&self, ids: &[String]) {
        self.callback.cancel_pending(ids.to_vec());
    }

    fn cancel_delivered(&self, ids: &[String]) {
        self.callback.cancel_delivered(ids.to_vec());
    }

    fn cancel_all_delivered(&self) {
        self.callback.cancel_all_delivered();
    }

    fn register_categories(&self, categories: Vec<NotificationCategory>) {
        self.callback.register_categories(
            categories
                .into_iter()
                .map(FfiNotificationCategory::from)
                .collect(),
        );
    }
}

struct HostPlatform {
    callback: Box<dyn PlatformCallback>,
}

impl Platform for HostPlatform {
    fn push_permission_granted(&self) -> bool {
        self.callback.push_permission_granted()
    }

    fn is_backgrounded(&self) -> bool {
        self.callback.is_backgrounded()
    }

    fn begin_background_task(&self, name: &str) -> BackgroundTaskId {
        self.callback.begin_background_task(name.to_string())
    }

    fn end_background_task(&self, id: BackgroundTaskId) {
        self.callback.end_background_task(id);
    }
}

struct HostObserver {
    callback: Box<dyn SnapshotObserver>,
}

impl StateObserver for HostObserver {
    fn on_state_changed(&self, snapshot: &UiStateSnapshot) {
        self.callback.on_state_changed(snapshot.clone().into());
    }
}

// ============================================================================
// Service
// ============================================================================

/// Main service object for the tracing core
///
/// Methods block the calling thread; call sync methods off the main thread.
#[derive(uniffi::Object)]
pub struct ExposureService {
    runtime: tokio::runtime::Runtime,
    service: Arc<TracingService>,
    /// Foreign observers have no weak references of their own, so the
    /// service keeps them alive until `remove_observer`.
    observers: Mutex<HashMap<String, Arc<dyn StateObserver>>>,
}

#[uniffi::export]
impl ExposureService {
    /// Create the service
    ///
    /// # Arguments
    /// * `db_path` - Path to the SQLite marker database
    /// * `config_json` - Optional JSON overriding the default tunables
    /// * `sdk` - The host's tracing SDK
    /// * `notifications` - The OS notification center
    /// * `platform` - App lifecycle and permission queries
    #[uniffi::constructor]
    pub fn new(
        db_path: String,
        config_json: Option<String>,
        sdk: Box<dyn SdkCallback>,
        notifications: Box<dyn NotificationCallback>,
        platform: Box<dyn PlatformCallback>,
    ) -> Result<Arc<Self>, ExposureError> {
        let config = match config_json {
            Some(json) => CoreConfig::from_json(&json).map_err(|e| ExposureError::Config {
                message: format!("{:#}", e),
            })?,
            None => CoreConfig::default(),
        };

        if let Some(parent) = PathBuf::from(&db_path).parent() {
            std::fs::create_dir_all(parent).map_err(|e| ExposureError::Storage {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }
        let store = SqliteKeyValueStore::new(&db_path)?;

        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(1)
            .thread_name("exposure-sync")
            .enable_all()
            .build()
            .map_err(|e| ExposureError::Runtime {
                message: format!("Failed to start runtime: {}", e),
            })?;

        let service = TracingService::new(
            config,
            Arc::new(HostSdk {
                callback: Arc::from(sdk),
            }),
            Arc::new(store),
            Arc::new(HostNotificationCenter {
                callback: notifications,
            }),
            Arc::new(HostPlatform { callback: platform }),
        );

        Ok(Arc::new(Self {
            runtime,
            service: Arc::new(service),
            observers: Mutex::new(HashMap::new()),
        }))
    }

    /// Call once after launch
    pub fn initialize(&self) {
        self.service.initialize();
    }

    // ========================================================================
    // SDK events
    // ========================================================================

    /// Forward a status pushed by the SDK
    pub fn on_status_changed(&self, status: FfiTracingStatus) {
        self.service.on_status_changed(status.into());
    }

    pub fn update_status(&self, should_sync: bool) {
        self.runtime.block_on(self.service.update_status(should_sync));
    }

    // ========================================================================
    // Sync
    // ========================================================================

    pub fn sync_if_needed(&self) -> FfiSyncResult {
        let outcome = self.runtime.block_on(self.service.sync_if_needed());
        FfiSyncResult::from(&outcome)
    }

    pub fn trigger_force_sync(&self) -> FfiSyncResult {
        let outcome = self.runtime.block_on(self.service.trigger_force_sync());
        FfiSyncResult::from(&outcome)
    }

    /// Entry point for OS background wake-ups
    pub fn perform_background_tasks(&self) -> FfiSyncResult {
        let outcome = self.runtime.block_on(self.service.perform_background_tasks());
        FfiSyncResult::from(&outcome)
    }

    // ========================================================================
    // Tracing control
    // ========================================================================

    pub fn start_tracing(&self) {
        self.service.start_tracing();
    }

    /// Stop tracing, reminding the user after `reminder_secs` if given
    pub fn stop_tracing(&self, reminder_secs: Option<u64>) {
        self.service.stop_tracing(reminder_secs.map(Duration::from_secs));
    }

    /// Delete all tracing data
    pub fn reset(&self) -> Result<(), ExposureError> {
        self.service.reset()?;
        Ok(())
    }

    // ========================================================================
    // UI state
    // ========================================================================

    pub fn current_snapshot(&self) -> FfiUiStateSnapshot {
        self.service.current_snapshot().into()
    }

    /// Register an observer; it is called right away with the current state
    pub fn add_observer(&self, id: String, observer: Box<dyn SnapshotObserver>) {
        let observer: Arc<dyn StateObserver> = Arc::new(HostObserver { callback: observer });
        self.service.add_observer(&id, &observer);
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id, observer);
    }

    pub fn remove_observer(&self, id: String) -> bool {
        self.observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&id);
        self.service.remove_observer(&id)
    }

    pub fn set_debug_override(&self, debug_override: Option<FfiDebugOverride>) {
        self.service
            .set_debug_override(debug_override.map(Into::into));
    }

    /// Call when returning to the foreground, permissions may have changed
    pub fn refresh_push_permission(&self) {
        self.service.refresh_push_permission();
    }

    // ========================================================================
    // Check-in reminders
    // ========================================================================

    pub fn schedule_check_in_reminder(&self, after_secs: u64) {
        self.service
            .scheduler()
            .schedule_check_in_reminder(Duration::from_secs(after_secs));
    }

    pub fn schedule_automatic_reminder_and_checkout(
        &self,
        reminder_after_secs: Option<u64>,
        checkout_after_secs: Option<u64>,
    ) {
        self.service.scheduler().schedule_automatic_reminder_and_checkout(
            reminder_after_secs.map(Duration::from_secs),
            checkout_after_secs.map(Duration::from_secs),
        );
    }

    pub fn schedule_checkout_error_notification(&self) {
        self.service.scheduler().schedule_checkout_error_notification();
    }

    pub fn remove_all_check_in_reminders(&self) {
        self.service.scheduler().remove_all_check_in_reminders();
    }
}

// ============================================================================
// Free Functions
// ============================================================================

/// Map a notification action identifier back to its checkout action
#[uniffi::export]
pub fn checkout_action_from_identifier(identifier: String) -> Option<FfiCheckoutAction> {
    CheckoutAction::from_identifier(&identifier).map(FfiCheckoutAction::from)
}

/// Snooze length of an action in seconds, `None` for an immediate checkout
#[uniffi::export]
pub fn checkout_action_snooze_secs(action: FfiCheckoutAction) -> Option<u64> {
    CheckoutAction::from(action)
        .snooze_duration()
        .map(|d| d.as_secs())
}
