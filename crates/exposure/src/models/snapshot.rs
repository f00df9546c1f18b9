//! Derived UI state
//!
//! A [`UiStateSnapshot`] is only ever produced by
//! [`reconcile`](crate::state::reconcile). Values are compared, never patched.

use serde::{Deserialize, Serialize};

use super::InfectionStatus;

/// Tracing health shown in the header and encounters module
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TracingHealth {
    Active,
    Inactive,
    BluetoothOff,
    PermissionError,
    /// Tracing no longer matters: the user reported an infection.
    Ended,
}

/// Exposure/infection banner on the home screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ExposureBanner {
    None,
    Exposed,
    Infected,
}

/// Infection status forced by a test build, replacing the SDK value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DebugOverride {
    Healthy,
    Exposed,
    Infected,
}

impl DebugOverride {
    pub fn infection_status(self) -> InfectionStatus {
        match self {
            DebugOverride::Healthy => InfectionStatus::Healthy,
            DebugOverride::Exposed => InfectionStatus::Exposed(Vec::new()),
            DebugOverride::Infected => InfectionStatus::Infected,
        }
    }
}

/// Immutable UI state
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UiStateSnapshot {
    pub tracing_health: TracingHealth,
    pub exposure_banner: ExposureBanner,
    /// Push permission is missing
    pub push_problem: bool,
    /// Sync has been failing for longer than the escalation window
    pub sync_problem: bool,
    /// The last sync failed because the device clock is off
    pub time_inconsistency: bool,
    pub debug_override: Option<DebugOverride>,
}
