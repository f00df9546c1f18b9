//! Scripted scenario driving the simulated tracing SDK
//!
//! A scenario is a list of steps. Each tick the simulator advances one step:
//! the SDK reports the step's status and answers the next sync with the
//! step's outcome. The last step repeats forever.

use chrono::{Duration, Utc};
use exposure::{ExposureEvent, InfectionStatus, SdkError, SyncOutcome, TrackingState, TracingStatus};
use serde::{Deserialize, Serialize};

/// Scenario file in the config directory
pub const SCENARIO_FILE: &str = "scenario.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Step {
    /// Status the SDK reports from this step on
    pub status: TracingStatus,
    /// Error the next sync fails with, success when absent
    #[serde(default)]
    pub sync_error: Option<SdkError>,
}

impl Step {
    fn healthy() -> Self {
        Self {
            status: TracingStatus::new(TrackingState::Active, InfectionStatus::Healthy),
            sync_error: None,
        }
    }

    pub fn sync_outcome(&self) -> SyncOutcome {
        match &self.sync_error {
            Some(error) => SyncOutcome::Failure(error.clone()),
            None => SyncOutcome::Success,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Seconds between ticks
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,
    pub steps: Vec<Step>,
}

fn default_tick_secs() -> u64 {
    15
}

impl Default for Scenario {
    /// Healthy start, a network outage, bluetooth off, then an exposure
    fn default() -> Self {
        let offline = SdkError::Networking {
            status: None,
            message: "simulated outage".to_string(),
        };
        let exposure = ExposureEvent::new("sim-exposure-1", Utc::now() - Duration::days(2));

        Self {
            tick_secs: default_tick_secs(),
            steps: vec![
                Step::healthy(),
                Step {
                    sync_error: Some(offline.clone()),
                    ..Step::healthy()
                },
                Step {
                    sync_error: Some(offline),
                    ..Step::healthy()
                },
                Step {
                    status: TracingStatus::new(
                        TrackingState::Inactive(SdkError::BluetoothTurnedOff),
                        InfectionStatus::Healthy,
                    ),
                    sync_error: None,
                },
                Step {
                    status: TracingStatus::new(
                        TrackingState::Active,
                        InfectionStatus::Exposed(vec![exposure]),
                    ),
                    sync_error: None,
                },
            ],
        }
    }
}

impl Scenario {
    /// Step for a tick, clamped to the last one
    pub fn step(&self, tick: usize) -> Option<&Step> {
        self.steps.get(tick).or_else(|| self.steps.last())
    }
}
