//! Tunables for sync throttling and notification scheduling
//!
//! Loaded (in order of priority) from:
//! 1. A JSON string handed over by the host
//! 2. `exposure.json` in the Beacon config directory
//! 3. Built-in defaults
//!
//! Every field has a default, so a config file only needs the values it
//! overrides. Parsed values are range-checked before use.

use anyhow::{Context, Result, bail};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Config filename in the Beacon config directory
const CONFIG_FILE: &str = "exposure.json";

const HOUR: u64 = 60 * 60;
const DAY: u64 = 24 * HOUR;

/// Upper bound for every configured duration
const MAX_DURATION_SECS: u64 = 10 * 365 * DAY;

/// Local-time window in which error notifications are dropped
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuietHoursConfig {
    /// First quiet hour (inclusive)
    pub start_hour: u32,
    /// Last quiet hour (inclusive)
    pub end_hour: u32,
    /// Fixed UTC offset for the hour check; system local time when absent
    pub utc_offset_secs: Option<i32>,
}

impl Default for QuietHoursConfig {
    fn default() -> Self {
        Self {
            start_hour: 23,
            end_hour: 7,
            utc_offset_secs: None,
        }
    }
}

/// Core configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Minimum time between two successful syncs
    pub min_sync_interval_secs: u64,
    /// Failure window after which sync problems become visible
    pub sync_problem_interval_secs: u64,
    /// Delay before a bluetooth/permission notification fires
    pub error_notification_delay_secs: u64,
    /// Delay of the "sync keeps failing" notification
    pub sync_error_notification_delay_secs: u64,
    /// Delays of the "app has not run in the background" warnings
    pub background_warning_delays_secs: Vec<u64>,
    /// Repeat reminders scheduled after an exposure while backgrounded
    pub exposure_reminder_count: u32,
    pub exposure_reminder_interval_secs: u64,
    pub quiet_hours: QuietHoursConfig,
    /// Check-in reminder before the automatic checkout
    pub checkout_warning_secs: u64,
    pub automatic_checkout_secs: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            min_sync_interval_secs: 10,
            sync_problem_interval_secs: DAY,
            error_notification_delay_secs: 60,
            sync_error_notification_delay_secs: DAY,
            background_warning_delays_secs: vec![2 * DAY, 7 * DAY],
            exposure_reminder_count: 12,
            exposure_reminder_interval_secs: 4 * HOUR,
            quiet_hours: QuietHoursConfig::default(),
            checkout_warning_secs: 8 * HOUR,
            automatic_checkout_secs: 12 * HOUR,
        }
    }
}

impl CoreConfig {
    /// Load `exposure.json` from the config directory, or defaults if absent
    pub fn load() -> Result<Self> {
        let config: Self = config::load_json_or_default(CONFIG_FILE)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a JSON string
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).context("Failed to parse exposure config JSON")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the schedulers cannot represent
    pub fn validate(&self) -> Result<()> {
        let durations = [
            ("min_sync_interval_secs", self.min_sync_interval_secs),
            ("sync_problem_interval_secs", self.sync_problem_interval_secs),
            ("error_notification_delay_secs", self.error_notification_delay_secs),
            (
                "sync_error_notification_delay_secs",
                self.sync_error_notification_delay_secs,
            ),
            (
                "exposure_reminder_interval_secs",
                self.exposure_reminder_interval_secs,
            ),
            ("checkout_warning_secs", self.checkout_warning_secs),
            ("automatic_checkout_secs", self.automatic_checkout_secs),
        ];
        for (name, secs) in durations {
            if secs > MAX_DURATION_SECS {
                bail!("{} is {}s, at most {}s allowed", name, secs, MAX_DURATION_SECS);
            }
        }
        if let Some(secs) = self
            .background_warning_delays_secs
            .iter()
            .find(|secs| **secs > MAX_DURATION_SECS)
        {
            bail!("background warning delay {}s exceeds {}s", secs, MAX_DURATION_SECS);
        }
        if self.quiet_hours.start_hour > 23 || self.quiet_hours.end_hour > 23 {
            bail!(
                "quiet hours {}..{} are not hours of the day",
                self.quiet_hours.start_hour,
                self.quiet_hours.end_hour
            );
        }
        Ok(())
    }

    pub fn min_sync_interval(&self) -> chrono::Duration {
        seconds(self.min_sync_interval_secs)
    }

    pub fn sync_problem_interval(&self) -> chrono::Duration {
        seconds(self.sync_problem_interval_secs)
    }

    pub fn error_notification_delay(&self) -> Duration {
        Duration::from_secs(self.error_notification_delay_secs)
    }

    pub fn sync_error_notification_delay(&self) -> Duration {
        Duration::from_secs(self.sync_error_notification_delay_secs)
    }

    pub fn exposure_reminder_interval(&self) -> Duration {
        Duration::from_secs(self.exposure_reminder_interval_secs)
    }

    pub fn checkout_warning(&self) -> Duration {
        Duration::from_secs(self.checkout_warning_secs)
    }

    pub fn automatic_checkout(&self) -> Duration {
        Duration::from_secs(self.automatic_checkout_secs)
    }
}

fn seconds(secs: u64) -> chrono::Duration {
    i64::try_from(secs)
        .ok()
        .and_then(chrono::Duration::try_seconds)
        .unwrap_or(chrono::Duration::MAX)
}
