//! Durable markers shared by the sync and notification components

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::notify::ErrorNotificationKind;

/// Everything that must survive a process restart
///
/// Sync fields are written by the [`SyncCoordinator`](crate::sync::SyncCoordinator),
/// exposure and error-notification fields by the
/// [`NotificationScheduler`](crate::notify::NotificationScheduler). The
/// reconciler only reads.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PersistedMarkers {
    pub last_successful_sync_time: Option<DateTime<Utc>>,
    /// Anchor of the current failure window
    pub first_sync_failure_time: Option<DateTime<Utc>>,
    pub last_sync_failure_time: Option<DateTime<Utc>>,
    /// Ordered newest first, as handed over by the SDK
    pub seen_exposure_identifiers: Vec<String>,
    pub latest_handled_exposure_date: Option<DateTime<Utc>>,
    pub scheduled_error_notification_kinds: BTreeSet<ErrorNotificationKind>,
    pub time_inconsistency_flag: bool,
}
