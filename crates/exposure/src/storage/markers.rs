//! Typed access to the persisted markers
//!
//! Each [`PersistedMarkers`] field lives under its own key, JSON encoded, so
//! fields can be read and written independently. Absent values are stored as
//! missing keys rather than `null`.

use std::collections::BTreeSet;
use std::sync::Arc;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;

use super::KeyValueStore;
use crate::models::PersistedMarkers;
use crate::notify::ErrorNotificationKind;

/// Storage keys, one per marker field
pub mod keys {
    pub const LAST_SUCCESSFUL_SYNC_TIME: &str = "last_successful_sync_time";
    pub const FIRST_SYNC_FAILURE_TIME: &str = "first_sync_failure_time";
    pub const LAST_SYNC_FAILURE_TIME: &str = "last_sync_failure_time";
    pub const SEEN_EXPOSURE_IDENTIFIERS: &str = "seen_exposure_identifiers";
    pub const LATEST_HANDLED_EXPOSURE_DATE: &str = "latest_handled_exposure_date";
    pub const SCHEDULED_ERROR_NOTIFICATION_KINDS: &str = "scheduled_error_notification_kinds";
    pub const TIME_INCONSISTENCY_FLAG: &str = "time_inconsistency_flag";

    pub const ALL: [&str; 7] = [
        LAST_SUCCESSFUL_SYNC_TIME,
        FIRST_SYNC_FAILURE_TIME,
        LAST_SYNC_FAILURE_TIME,
        SEEN_EXPOSURE_IDENTIFIERS,
        LATEST_HANDLED_EXPOSURE_DATE,
        SCHEDULED_ERROR_NOTIFICATION_KINDS,
        TIME_INCONSISTENCY_FLAG,
    ];
}

/// Marker accessors over an injected [`KeyValueStore`]
#[derive(Clone)]
pub struct MarkerStore {
    store: Arc<dyn KeyValueStore>,
}

impl MarkerStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Read every marker.
    ///
    /// Unreadable fields are logged and fall back to their defaults, so a
    /// corrupt value never blocks sync or notifications.
    pub fn load(&self) -> PersistedMarkers {
        PersistedMarkers {
            last_successful_sync_time: self.read_or_default(keys::LAST_SUCCESSFUL_SYNC_TIME),
            first_sync_failure_time: self.read_or_default(keys::FIRST_SYNC_FAILURE_TIME),
            last_sync_failure_time: self.read_or_default(keys::LAST_SYNC_FAILURE_TIME),
            seen_exposure_identifiers: self
                .read_or_default::<Option<Vec<String>>>(keys::SEEN_EXPOSURE_IDENTIFIERS)
                .unwrap_or_default(),
            latest_handled_exposure_date: self
                .read_or_default(keys::LATEST_HANDLED_EXPOSURE_DATE),
            scheduled_error_notification_kinds: self
                .read_or_default::<Option<BTreeSet<ErrorNotificationKind>>>(
                    keys::SCHEDULED_ERROR_NOTIFICATION_KINDS,
                )
                .unwrap_or_default(),
            time_inconsistency_flag: self
                .read_or_default::<Option<bool>>(keys::TIME_INCONSISTENCY_FLAG)
                .unwrap_or(false),
        }
    }

    // ========================================================================
    // Sync markers
    // ========================================================================

    pub fn last_successful_sync_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.read(keys::LAST_SUCCESSFUL_SYNC_TIME)
    }

    pub fn set_last_successful_sync_time(&self, time: Option<DateTime<Utc>>) -> Result<()> {
        self.write(keys::LAST_SUCCESSFUL_SYNC_TIME, time.as_ref())
    }

    pub fn first_sync_failure_time(&self) -> Result<Option<DateTime<Utc>>> {
        self.read(keys::FIRST_SYNC_FAILURE_TIME)
    }

    pub fn set_first_sync_failure_time(&self, time: Option<DateTime<Utc>>) -> Result<()> {
        self.write(keys::FIRST_SYNC_FAILURE_TIME, time.as_ref())
    }

    pub fn set_last_sync_failure_time(&self, time: Option<DateTime<Utc>>) -> Result<()> {
        self.write(keys::LAST_SYNC_FAILURE_TIME, time.as_ref())
    }

    pub fn set_time_inconsistency_flag(&self, flag: bool) -> Result<()> {
        self.write(keys::TIME_INCONSISTENCY_FLAG, flag.then_some(&true))
    }

    // ========================================================================
    // Notification markers
    // ========================================================================

    pub fn set_seen_exposure_identifiers(&self, identifiers: Option<&[String]>) -> Result<()> {
        self.write(keys::SEEN_EXPOSURE_IDENTIFIERS, identifiers)
    }

    pub fn set_latest_handled_exposure_date(&self, date: Option<DateTime<Utc>>) -> Result<()> {
        self.write(keys::LATEST_HANDLED_EXPOSURE_DATE, date.as_ref())
    }

    pub fn set_scheduled_error_notification_kinds(
        &self,
        kinds: &BTreeSet<ErrorNotificationKind>,
    ) -> Result<()> {
        self.write(
            keys::SCHEDULED_ERROR_NOTIFICATION_KINDS,
            (!kinds.is_empty()).then_some(kinds),
        )
    }

    /// Remove every marker (data wipe)
    pub fn clear(&self) -> Result<()> {
        for key in keys::ALL {
            self.store.remove(key)?;
        }
        Ok(())
    }

    fn read<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>> {
        match self.store.get(key)? {
            Some(raw) => {
                let value = serde_json::from_str(&raw)
                    .with_context(|| format!("Failed to decode marker {key}"))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn read_or_default<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        match self.read::<T>(key) {
            Ok(value) => value.unwrap_or_default(),
            Err(e) => {
                log::warn!("Ignoring unreadable marker {}: {:#}", key, e);
                T::default()
            }
        }
    }

    fn write<T: Serialize + ?Sized>(&self, key: &str, value: Option<&T>) -> Result<()> {
        match value {
            Some(value) => {
                let raw = serde_json::to_string(value)
                    .with_context(|| format!("Failed to encode marker {key}"))?;
                self.store.set(key, &raw)
            }
            None => self.store.remove(key),
        }
    }
}
