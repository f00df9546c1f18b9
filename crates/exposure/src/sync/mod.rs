//! Sync throttling
//!
//! [`SyncCoordinator`] serializes and throttles calls into the SDK's sync and
//! records the sync/failure markers the UI state is derived from.

mod coordinator;
mod timing;

pub use coordinator::SyncCoordinator;
pub use timing::{cooldown_elapsed, sustained_failure};
