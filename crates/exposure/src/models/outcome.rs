//! Result of one sync attempt

use serde::{Deserialize, Serialize};

use crate::error::SdkError;

/// Produced once per sync attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SyncOutcome {
    Success,
    Failure(SdkError),
    /// Another sync was in flight or the cooldown had not elapsed
    Skipped,
}
