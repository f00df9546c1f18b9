//! FFI-friendly type wrappers for UniFFI export
//!
//! These types convert internal Rust types to FFI-compatible versions:
//! - `DateTime<Utc>` → `i64` (Unix timestamp)
//! - `std::time::Duration` → `u64` seconds
//! - Tuple enum variants → struct variants

use chrono::{DateTime, Utc};
use log::warn;

use crate::error::{FrameworkCode, SdkError};
use crate::models::{
    DebugOverride, ExposureBanner, ExposureEvent, InfectionStatus, SyncOutcome, TrackingState,
    TracingHealth, TracingStatus, UiStateSnapshot,
};
use crate::notify::{CheckoutAction, NotificationCategory, NotificationRequest};

/// `None` (and a warning) for timestamps chrono cannot represent
fn from_timestamp(secs: i64) -> Option<DateTime<Utc>> {
    let date = DateTime::from_timestamp(secs, 0);
    if date.is_none() {
        warn!("Ignoring out-of-range timestamp {} from host", secs);
    }
    date
}

// ============================================================================
// Error Types
// ============================================================================

/// FFI-friendly error type
#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum ExposureError {
    #[error("Storage error: {message}")]
    Storage { message: String },

    #[error("Invalid configuration: {message}")]
    Config { message: String },

    #[error("Runtime error: {message}")]
    Runtime { message: String },
}

impl From<anyhow::Error> for ExposureError {
    fn from(e: anyhow::Error) -> Self {
        ExposureError::Storage {
            message: format!("{:#}", e),
        }
    }
}

// ============================================================================
// SDK Errors
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiFrameworkCode {
    BluetoothOff,
    NotAuthorized,
    NotEnabled,
    Restricted,
    RateLimited,
    Other { code: i32 },
}

impl From<FfiFrameworkCode> for FrameworkCode {
    fn from(code: FfiFrameworkCode) -> Self {
        match code {
            FfiFrameworkCode::BluetoothOff => FrameworkCode::BluetoothOff,
            FfiFrameworkCode::NotAuthorized => FrameworkCode::NotAuthorized,
            FfiFrameworkCode::NotEnabled => FrameworkCode::NotEnabled,
            FfiFrameworkCode::Restricted => FrameworkCode::Restricted,
            FfiFrameworkCode::RateLimited => FrameworkCode::RateLimited,
            FfiFrameworkCode::Other { code } => FrameworkCode::Other(code),
        }
    }
}

/// Failure reason reported by the host's tracing SDK
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSdkError {
    Networking { status: Option<u16>, message: String },
    Database { message: String },
    Cryptography { message: String },
    BluetoothTurnedOff,
    PermissionError,
    AuthorizationUnknown,
    ExposureNotification { code: FfiFrameworkCode },
    TimeInconsistency,
    CaseSynchronization,
    Cancelled,
}

impl From<FfiSdkError> for SdkError {
    fn from(e: FfiSdkError) -> Self {
        match e {
            FfiSdkError::Networking { status, message } => SdkError::Networking { status, message },
            FfiSdkError::Database { message } => SdkError::Database(message),
            FfiSdkError::Cryptography { message } => SdkError::Cryptography(message),
            FfiSdkError::BluetoothTurnedOff => SdkError::BluetoothTurnedOff,
            FfiSdkError::PermissionError => SdkError::PermissionError,
            FfiSdkError::AuthorizationUnknown => SdkError::AuthorizationUnknown,
            FfiSdkError::ExposureNotification { code } => {
                SdkError::ExposureNotification(code.into())
            }
            FfiSdkError::TimeInconsistency => SdkError::TimeInconsistency,
            FfiSdkError::CaseSynchronization => SdkError::CaseSynchronization,
            FfiSdkError::Cancelled => SdkError::Cancelled,
        }
    }
}

// ============================================================================
// Tracing Status
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTrackingState {
    Active,
    Stopped,
    Inactive { error: FfiSdkError },
    ActiveAdvertisingOnly,
    ActiveReceivingOnly,
}

impl From<FfiTrackingState> for TrackingState {
    fn from(state: FfiTrackingState) -> Self {
        match state {
            FfiTrackingState::Active => TrackingState::Active,
            FfiTrackingState::Stopped => TrackingState::Stopped,
            FfiTrackingState::Inactive { error } => TrackingState::Inactive(error.into()),
            FfiTrackingState::ActiveAdvertisingOnly => TrackingState::ActiveAdvertisingOnly,
            FfiTrackingState::ActiveReceivingOnly => TrackingState::ActiveReceivingOnly,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiExposureEvent {
    pub identifier: String,
    /// Unix timestamp (seconds since epoch)
    pub date: i64,
}

impl FfiExposureEvent {
    /// Events with an unusable date are dropped. They stay unseen, so a
    /// corrected report of the same identifier still notifies.
    fn into_event(self) -> Option<ExposureEvent> {
        let date = from_timestamp(self.date)?;
        Some(ExposureEvent::new(self.identifier, date))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiInfectionStatus {
    Healthy,
    Exposed { events: Vec<FfiExposureEvent> },
    Infected,
}

impl From<FfiInfectionStatus> for InfectionStatus {
    fn from(status: FfiInfectionStatus) -> Self {
        match status {
            FfiInfectionStatus::Healthy => InfectionStatus::Healthy,
            FfiInfectionStatus::Exposed { events } => {
                InfectionStatus::Exposed(
                    events
                        .into_iter()
                        .filter_map(FfiExposureEvent::into_event)
                        .collect(),
                )
            }
            FfiInfectionStatus::Infected => InfectionStatus::Infected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiTracingStatus {
    pub tracking_state: FfiTrackingState,
    pub infection_status: FfiInfectionStatus,
    /// Unix timestamp (seconds since epoch)
    pub last_sync_time: Option<i64>,
    pub handshake_count: u32,
}

impl From<FfiTracingStatus> for TracingStatus {
    fn from(s: FfiTracingStatus) -> Self {
        Self {
            tracking_state: s.tracking_state.into(),
            infection_status: s.infection_status.into(),
            last_sync_time: s.last_sync_time.and_then(from_timestamp),
            handshake_count: s.handshake_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSyncOutcome {
    Success,
    Failure { error: FfiSdkError },
    Skipped,
}

impl From<FfiSyncOutcome> for SyncOutcome {
    fn from(outcome: FfiSyncOutcome) -> Self {
        match outcome {
            FfiSyncOutcome::Success => SyncOutcome::Success,
            FfiSyncOutcome::Failure { error } => SyncOutcome::Failure(error.into()),
            FfiSyncOutcome::Skipped => SyncOutcome::Skipped,
        }
    }
}

/// Only the kind of outcome crosses back; the host already knows the error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiSyncResult {
    Success,
    Failure,
    Skipped,
}

impl From<&SyncOutcome> for FfiSyncResult {
    fn from(outcome: &SyncOutcome) -> Self {
        match outcome {
            SyncOutcome::Success => FfiSyncResult::Success,
            SyncOutcome::Failure(_) => FfiSyncResult::Failure,
            SyncOutcome::Skipped => FfiSyncResult::Skipped,
        }
    }
}

// ============================================================================
// UI State
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiTracingHealth {
    Active,
    Inactive,
    BluetoothOff,
    PermissionError,
    Ended,
}

impl From<TracingHealth> for FfiTracingHealth {
    fn from(h: TracingHealth) -> Self {
        match h {
            TracingHealth::Active => FfiTracingHealth::Active,
            TracingHealth::Inactive => FfiTracingHealth::Inactive,
            TracingHealth::BluetoothOff => FfiTracingHealth::BluetoothOff,
            TracingHealth::PermissionError => FfiTracingHealth::PermissionError,
            TracingHealth::Ended => FfiTracingHealth::Ended,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiExposureBanner {
    None,
    Exposed,
    Infected,
}

impl From<ExposureBanner> for FfiExposureBanner {
    fn from(b: ExposureBanner) -> Self {
        match b {
            ExposureBanner::None => FfiExposureBanner::None,
            ExposureBanner::Exposed => FfiExposureBanner::Exposed,
            ExposureBanner::Infected => FfiExposureBanner::Infected,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiDebugOverride {
    Healthy,
    Exposed,
    Infected,
}

impl From<FfiDebugOverride> for DebugOverride {
    fn from(d: FfiDebugOverride) -> Self {
        match d {
            FfiDebugOverride::Healthy => DebugOverride::Healthy,
            FfiDebugOverride::Exposed => DebugOverride::Exposed,
            FfiDebugOverride::Infected => DebugOverride::Infected,
        }
    }
}

impl From<DebugOverride> for FfiDebugOverride {
    fn from(d: DebugOverride) -> Self {
        match d {
            DebugOverride::Healthy => FfiDebugOverride::Healthy,
            DebugOverride::Exposed => FfiDebugOverride::Exposed,
            DebugOverride::Infected => FfiDebugOverride::Infected,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiUiStateSnapshot {
    pub tracing_health: FfiTracingHealth,
    pub exposure_banner: FfiExposureBanner,
    pub push_problem: bool,
    pub sync_problem: bool,
    pub time_inconsistency: bool,
    pub debug_override: Option<FfiDebugOverride>,
}

impl From<UiStateSnapshot> for FfiUiStateSnapshot {
    fn from(s: UiStateSnapshot) -> Self {
        Self {
            tracing_health: s.tracing_health.into(),
            exposure_banner: s.exposure_banner.into(),
            push_problem: s.push_problem,
            sync_problem: s.sync_problem,
            time_inconsistency: s.time_inconsistency,
            debug_override: s.debug_override.map(FfiDebugOverride::from),
        }
    }
}

// ============================================================================
// Notifications
// ============================================================================

/// Local notification to schedule. Title and body are localization keys.
#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiNotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    /// Seconds until delivery, `None` for immediate
    pub delay_secs: Option<u64>,
    pub category: Option<String>,
}

impl From<NotificationRequest> for FfiNotificationRequest {
    fn from(r: NotificationRequest) -> Self {
        Self {
            id: r.id,
            title: r.title,
            body: r.body,
            delay_secs: r.delay.map(|d| d.as_secs()),
            category: r.category,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum FfiCheckoutAction {
    CheckOut,
    Snooze30Minutes,
    Snooze1Hour,
    Snooze2Hours,
}

impl From<CheckoutAction> for FfiCheckoutAction {
    fn from(a: CheckoutAction) -> Self {
        match a {
            CheckoutAction::CheckOut => FfiCheckoutAction::CheckOut,
            CheckoutAction::Snooze30Minutes => FfiCheckoutAction::Snooze30Minutes,
            CheckoutAction::Snooze1Hour => FfiCheckoutAction::Snooze1Hour,
            CheckoutAction::Snooze2Hours => FfiCheckoutAction::Snooze2Hours,
        }
    }
}

impl From<FfiCheckoutAction> for CheckoutAction {
    fn from(a: FfiCheckoutAction) -> Self {
        match a {
            FfiCheckoutAction::CheckOut => CheckoutAction::CheckOut,
            FfiCheckoutAction::Snooze30Minutes => CheckoutAction::Snooze30Minutes,
            FfiCheckoutAction::Snooze1Hour => CheckoutAction::Snooze1Hour,
            FfiCheckoutAction::Snooze2Hours => CheckoutAction::Snooze2Hours,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiNotificationAction {
    pub identifier: String,
    /// Localization key
    pub title: String,
}

#[derive(Debug, Clone, PartialEq, Eq, uniffi::Record)]
pub struct FfiNotificationCategory {
    pub identifier: String,
    pub actions: Vec<FfiNotificationAction>,
}

impl From<NotificationCategory> for FfiNotificationCategory {
    fn from(c: NotificationCategory) -> Self {
        Self {
            identifier: c.identifier,
            actions: c
                .actions
                .into_iter()
                .map(|a| FfiNotificationAction {
                    identifier: a.identifier().to_string(),
                    title: a.title_key().to_string(),
                })
                .collect(),
        }
    }
}

// ============================================================================
// Callback Traits
// ============================================================================

/// The host's tracing SDK
///
/// `sync` may block; it is called from a blocking worker thread.
#[uniffi::export(callback_interface)]
pub trait SdkCallback: Send + Sync {
    fn status(&self) -> FfiTracingStatus;
    fn sync(&self) -> FfiSyncOutcome;
    fn start_tracing(&self);
    fn stop_tracing(&self);
    fn reset(&self);
}

/// The OS notification center
#[uniffi::export(callback_interface)]
pub trait NotificationCallback: Send + Sync {
    fn schedule(&self, request: FfiNotificationRequest);
    fn cancel_pending(&self, ids: Vec<String>);
    fn cancel_delivered(&self, ids: Vec<String>);
    fn cancel_all_delivered(&self);
    fn register_categories(&self, categories: Vec<FfiNotificationCategory>);
}

/// App lifecycle and permission queries
#[uniffi::export(callback_interface)]
pub trait PlatformCallback: Send + Sync {
    fn push_permission_granted(&self) -> bool;
    fn is_backgrounded(&self) -> bool;
    fn begin_background_task(&self, name: String) -> u64;
    fn end_background_task(&self, id: u64);
}

/// Receives UI state snapshots
#[uniffi::export(callback_interface)]
pub trait SnapshotObserver: Send + Sync {
    fn on_state_changed(&self, snapshot: FfiUiStateSnapshot);
}

// ============================================================================
// Log Callback
// ============================================================================

/// Log level for FFI callback
#[derive(Debug, Clone, Copy, uniffi::Enum)]
pub enum FfiLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<log::Level> for FfiLogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => FfiLogLevel::Error,
            log::Level::Warn => FfiLogLevel::Warn,
            log::Level::Info => FfiLogLevel::Info,
            log::Level::Debug => FfiLogLevel::Debug,
            log::Level::Trace => FfiLogLevel::Trace,
        }
    }
}

impl From<FfiLogLevel> for log::Level {
    fn from(level: FfiLogLevel) -> Self {
        match level {
            FfiLogLevel::Error => log::Level::Error,
            FfiLogLevel::Warn => log::Level::Warn,
            FfiLogLevel::Info => log::Level::Info,
            FfiLogLevel::Debug => log::Level::Debug,
            FfiLogLevel::Trace => log::Level::Trace,
        }
    }
}

/// Callback interface for receiving log messages from Rust
///
/// Swift should implement this using os_log/Logger for unified logging.
#[uniffi::export(callback_interface)]
pub trait LogCallback: Send + Sync {
    /// Called when a log message is emitted
    ///
    /// # Arguments
    /// * `level` - The log level (error, warn, info, debug, trace)
    /// * `target` - The logging target (typically module path, e.g., "exposure::sync")
    /// * `message` - The log message
    fn on_log(&self, level: FfiLogLevel, target: String, message: String);
}
