//! Domain models for tracing state

mod markers;
mod outcome;
mod snapshot;
mod status;

pub use markers::PersistedMarkers;
pub use outcome::SyncOutcome;
pub use snapshot::{DebugOverride, ExposureBanner, TracingHealth, UiStateSnapshot};
pub use status::{ExposureEvent, InfectionStatus, TrackingState, TracingStatus};
