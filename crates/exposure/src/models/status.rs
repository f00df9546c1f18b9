//! Tracing status as reported by the SDK

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// A single detected contact with a distinguishing identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ExposureEvent {
    /// Opaque identifier, unique per exposure occurrence
    pub identifier: String,
    /// Onset/contact date
    pub date: DateTime<Utc>,
}

impl ExposureEvent {
    pub fn new(identifier: impl Into<String>, date: DateTime<Utc>) -> Self {
        Self {
            identifier: identifier.into(),
            date,
        }
    }
}

/// Operational state of the proximity-tracing radio
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TrackingState {
    Active,
    #[default]
    Stopped,
    Inactive(SdkError),
    ActiveAdvertisingOnly,
    ActiveReceivingOnly,
}

impl TrackingState {
    /// Whether the radio is at least partially working
    pub fn is_active(&self) -> bool {
        matches!(
            self,
            TrackingState::Active
                | TrackingState::ActiveAdvertisingOnly
                | TrackingState::ActiveReceivingOnly
        )
    }
}

/// Classification of the local user
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InfectionStatus {
    #[default]
    Healthy,
    Exposed(Vec<ExposureEvent>),
    Infected,
}

impl InfectionStatus {
    /// Exposure events relevant for notification scheduling.
    ///
    /// `None` for infected users: their exposure history is frozen and must
    /// not be touched.
    pub fn exposures(&self) -> Option<&[ExposureEvent]> {
        match self {
            InfectionStatus::Healthy => Some(&[]),
            InfectionStatus::Exposed(events) => Some(events),
            InfectionStatus::Infected => None,
        }
    }
}

/// Full SDK status snapshot
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TracingStatus {
    pub tracking_state: TrackingState,
    pub infection_status: InfectionStatus,
    pub last_sync_time: Option<DateTime<Utc>>,
    pub handshake_count: u32,
}

impl TracingStatus {
    pub fn new(tracking_state: TrackingState, infection_status: InfectionStatus) -> Self {
        Self {
            tracking_state,
            infection_status,
            last_sync_time: None,
            handshake_count: 0,
        }
    }
}
