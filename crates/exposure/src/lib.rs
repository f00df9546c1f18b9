//! Exposure crate - Sync, notification and UI state core for contact tracing
//!
//! The proximity tracing itself lives in an external SDK. This crate holds
//! the logic around it:
//! - Throttled, single-flight sync against the SDK ([`SyncCoordinator`])
//! - Deduplicated local notifications with quiet hours ([`NotificationScheduler`])
//! - A pure mapping from SDK status and persisted markers to one UI snapshot,
//!   fanned out to observers ([`StateReconciler`])
//!
//! This crate has zero UI dependencies. Hosts plug in through the traits in
//! [`ports`]; mobile apps use the UniFFI surface in [`ffi`].

pub mod config;
pub mod error;
pub mod ffi;
pub mod models;
pub mod notify;
pub mod ports;
pub mod service;
pub mod state;
pub mod storage;
pub mod sync;

#[cfg(test)]
mod test_support;

uniffi::setup_scaffolding!();

pub use crate::config::{CoreConfig, QuietHoursConfig};
pub use error::{ErrorKind, FrameworkCode, SdkError, classify};
pub use models::{
    DebugOverride, ExposureBanner, ExposureEvent, InfectionStatus, PersistedMarkers, SyncOutcome,
    TrackingState, TracingHealth, TracingStatus, UiStateSnapshot,
};
pub use notify::{
    CheckoutAction, ErrorNotificationKind, NotificationCategory, NotificationRequest,
    NotificationScheduler, QuietHours,
};
pub use ports::{
    BackgroundTask, BackgroundTaskId, Clock, NotificationCenter, Platform, SystemClock, TracingSdk,
};
pub use service::TracingService;
pub use state::{ObserverRegistry, ReconcileInput, StateObserver, StateReconciler, reconcile};
pub use storage::{InMemoryKeyValueStore, KeyValueStore, MarkerStore, SqliteKeyValueStore};
pub use sync::{SyncCoordinator, cooldown_elapsed, sustained_failure};
