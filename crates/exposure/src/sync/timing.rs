//! Sync timing utilities for cooldown management and failure escalation
//!
//! Pure functions over explicit timestamps so they can be tested without a clock.

use chrono::{DateTime, Duration, Utc};

/// Check if enough time has elapsed since the last sync to allow a new sync.
///
/// # Arguments
/// * `last_sync_at` - When the last successful sync completed (None if never synced)
/// * `now` - Time of the sync attempt
/// * `cooldown` - Minimum time that must elapse between syncs
///
/// # Returns
/// `true` if enough time has passed (or never synced), `false` if still in cooldown
pub fn cooldown_elapsed(
    last_sync_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    cooldown: Duration,
) -> bool {
    match last_sync_at {
        Some(last) => now - last >= cooldown,
        None => true, // Never synced, so cooldown has "elapsed"
    }
}

/// Whether a failure window has lasted at least `window`.
///
/// A single failure opens a window of length zero, so it never counts.
pub fn sustained_failure(
    first_failure_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    window: Duration,
) -> bool {
    match (first_failure_at, last_failure_at) {
        (Some(first), Some(last)) => last - first >= window,
        _ => false,
    }
}
