//! Local-time window in which error notifications are dropped

use chrono::{DateTime, FixedOffset, Local, Timelike, Utc};

use crate::config::QuietHoursConfig;

/// Quiet hours, both boundary hours included
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuietHours {
    start_hour: u32,
    end_hour: u32,
    offset: Option<FixedOffset>,
}

impl QuietHours {
    pub fn new(start_hour: u32, end_hour: u32, offset: Option<FixedOffset>) -> Self {
        Self {
            start_hour,
            end_hour,
            offset,
        }
    }

    pub fn from_config(config: &QuietHoursConfig) -> Self {
        let offset = config.utc_offset_secs.and_then(|secs| {
            let offset = FixedOffset::east_opt(secs);
            if offset.is_none() {
                log::warn!("Invalid quiet hours UTC offset {}s, using local time", secs);
            }
            offset
        });
        Self::new(config.start_hour, config.end_hour, offset)
    }

    /// Hour of `now` on the wall clock used for the check
    pub fn local_hour(&self, now: DateTime<Utc>) -> u32 {
        match self.offset {
            Some(offset) => now.with_timezone(&offset).hour(),
            None => now.with_timezone(&Local).hour(),
        }
    }

    pub fn contains(&self, now: DateTime<Utc>) -> bool {
        let hour = self.local_hour(now);
        if self.start_hour > self.end_hour {
            // Window wraps around midnight
            hour >= self.start_hour || hour <= self.end_hour
        } else {
            hour >= self.start_hour && hour <= self.end_hour
        }
    }
}

impl Default for QuietHours {
    fn default() -> Self {
        Self::from_config(&QuietHoursConfig::default())
    }
}
