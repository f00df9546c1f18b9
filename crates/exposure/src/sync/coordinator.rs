//! Single-flight, throttled sync against the tracing SDK

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};

use super::timing::cooldown_elapsed;
use crate::error::{ErrorKind, classify};
use crate::models::SyncOutcome;
use crate::notify::NotificationScheduler;
use crate::ports::{BackgroundTask, Platform, TracingSdk};
use crate::storage::MarkerStore;

const BACKGROUND_TASK_NAME: &str = "exposure-sync";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlightState {
    Idle,
    InFlight,
}

/// Holds the in-flight slot and the background task for one sync.
///
/// Dropping it (success, failure or a cancelled future) returns the slot to
/// `Idle` and then ends the background task.
struct FlightGuard<'a> {
    flight: &'a Mutex<FlightState>,
    _task: BackgroundTask,
}

impl Drop for FlightGuard<'_> {
    fn drop(&mut self) {
        *self.flight.lock().unwrap_or_else(PoisonError::into_inner) = FlightState::Idle;
    }
}

/// Serializes and throttles SDK syncs
///
/// Failures are never retried here. The next attempt happens when the host
/// triggers one again (timer, background wake-up, user action).
pub struct SyncCoordinator {
    sdk: Arc<dyn TracingSdk>,
    platform: Arc<dyn Platform>,
    markers: MarkerStore,
    scheduler: Arc<NotificationScheduler>,
    min_interval: Duration,
    flight: Mutex<FlightState>,
}

impl SyncCoordinator {
    pub fn new(
        sdk: Arc<dyn TracingSdk>,
        platform: Arc<dyn Platform>,
        markers: MarkerStore,
        scheduler: Arc<NotificationScheduler>,
        min_interval: Duration,
    ) -> Self {
        Self {
            sdk,
            platform,
            markers,
            scheduler,
            min_interval,
            flight: Mutex::new(FlightState::Idle),
        }
    }

    fn flight(&self) -> MutexGuard<'_, FlightState> {
        self.flight.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a sync is currently running
    pub fn is_syncing(&self) -> bool {
        *self.flight() == FlightState::InFlight
    }

    /// Sync unless one is running or the last success is too recent
    pub async fn sync_if_needed(&self, now: DateTime<Utc>) -> SyncOutcome {
        self.run(now, false).await
    }

    /// Sync regardless of the interval, still turned away while one is running
    pub async fn force_sync(&self, now: DateTime<Utc>) -> SyncOutcome {
        self.run(now, true).await
    }

    async fn run(&self, now: DateTime<Utc>, force: bool) -> SyncOutcome {
        let Some(_guard) = self.try_begin(now, force) else {
            return SyncOutcome::Skipped;
        };

        info!("Starting sync{}", if force { " (forced)" } else { "" });
        let outcome = self.sdk.sync().await;
        self.record(&outcome, now);
        outcome
    }

    /// Claim the in-flight slot. Check and claim happen under one lock.
    fn try_begin(&self, now: DateTime<Utc>, force: bool) -> Option<FlightGuard<'_>> {
        let mut flight = self.flight();
        if *flight == FlightState::InFlight {
            debug!("Sync already in flight, skipping");
            return None;
        }

        if !force {
            let last_success = self.markers.last_successful_sync_time().unwrap_or_else(|e| {
                warn!("Failed to read last sync time: {:#}", e);
                None
            });
            if !cooldown_elapsed(last_success, now, self.min_interval) {
                debug!("Last sync at {:?} is too recent, skipping", last_success);
                return None;
            }
        }

        *flight = FlightState::InFlight;
        drop(flight);

        Some(FlightGuard {
            flight: &self.flight,
            _task: BackgroundTask::begin(self.platform.clone(), BACKGROUND_TASK_NAME),
        })
    }

    /// Update the sync markers, then let the scheduler react.
    ///
    /// Runs before the in-flight slot is released, so the next attempt always
    /// sees a complete marker set.
    fn record(&self, outcome: &SyncOutcome, now: DateTime<Utc>) {
        let result = match outcome {
            SyncOutcome::Success => {
                info!("Sync succeeded");
                self.clear_failure_markers()
                    .and_then(|_| self.markers.set_last_successful_sync_time(Some(now)))
            }
            SyncOutcome::Failure(error) => match classify(error) {
                ErrorKind::RateLimited => {
                    // Never shown; a previous failure window is not meaningful anymore
                    info!("Sync rate limited: {}", error);
                    self.clear_failure_markers()
                }
                kind => {
                    if kind.is_user_facing() {
                        warn!("Sync failed ({:?}): {}", kind, error);
                    } else {
                        info!("Sync failed ({:?}): {}", kind, error);
                    }
                    self.record_failure(kind, now)
                }
            },
            SyncOutcome::Skipped => Ok(()),
        };

        if let Err(e) = result {
            warn!("Failed to persist sync markers: {:#}", e);
        }

        match outcome {
            SyncOutcome::Failure(error) if classify(error) == ErrorKind::RateLimited => {}
            _ => self.scheduler.handle_sync_outcome(outcome),
        }
    }

    fn record_failure(&self, kind: ErrorKind, now: DateTime<Utc>) -> anyhow::Result<()> {
        if self.markers.first_sync_failure_time()?.is_none() {
            self.markers.set_first_sync_failure_time(Some(now))?;
        }
        self.markers.set_last_sync_failure_time(Some(now))?;
        if kind == ErrorKind::TimeInconsistency {
            self.markers.set_time_inconsistency_flag(true)?;
        }
        Ok(())
    }

    fn clear_failure_markers(&self) -> anyhow::Result<()> {
        self.markers.set_first_sync_failure_time(None)?;
        self.markers.set_last_sync_failure_time(None)?;
        self.markers.set_time_inconsistency_flag(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfig;
    use crate::error::{FrameworkCode, SdkError};
    use crate::notify::SYNC_ERROR;
    use crate::storage::InMemoryKeyValueStore;
    use crate::test_support::{FakePlatform, RecordingCenter, ScriptedSdk};
    use chrono::TimeZone;
    use tokio::sync::Notify;

    struct Harness {
        coordinator: Arc<SyncCoordinator>,
        sdk: Arc<ScriptedSdk>,
        platform: Arc<FakePlatform>,
        center: Arc<RecordingCenter>,
        markers: MarkerStore,
    }

    fn create_harness(sdk: ScriptedSdk) -> Harness {
        let sdk = Arc::new(sdk);
        let platform = Arc::new(FakePlatform::default());
        let center = Arc::new(RecordingCenter::default());
        let markers = MarkerStore::new(Arc::new(InMemoryKeyValueStore::new()));
        let scheduler = Arc::new(NotificationScheduler::new(
            CoreConfig::default(),
            center.clone(),
            platform.clone(),
            markers.clone(),
        ));
        let coordinator = Arc::new(SyncCoordinator::new(
            sdk.clone(),
            platform.clone(),
            markers.clone(),
            scheduler,
            Duration::seconds(10),
        ));
        Harness {
            coordinator,
            sdk,
            platform,
            center,
            markers,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2020, 9, 1, 10, 0, 0).unwrap()
    }

    fn network_error() -> SdkError {
        SdkError::Networking {
            status: Some(502),
            message: "bad gateway".into(),
        }
    }

    #[test]
    fn test_throttle_within_interval() {
        let h = create_harness(ScriptedSdk::default());
        tokio_test::block_on(async {
            assert_eq!(h.coordinator.sync_if_needed(t0()).await, SyncOutcome::Success);
            assert_eq!(
                h.coordinator.sync_if_needed(t0() + Duration::seconds(1)).await,
                SyncOutcome::Skipped
            );
            assert_eq!(
                h.coordinator.sync_if_needed(t0() + Duration::seconds(10)).await,
                SyncOutcome::Success
            );
        });
        assert_eq!(h.sdk.sync_calls(), 2);
    }

    #[test]
    fn test_force_sync_bypasses_interval() {
        let h = create_harness(ScriptedSdk::default());
        tokio_test::block_on(async {
            h.coordinator.sync_if_needed(t0()).await;
            assert_eq!(
                h.coordinator.force_sync(t0() + Duration::seconds(1)).await,
                SyncOutcome::Success
            );
        });
        assert_eq!(h.sdk.sync_calls(), 2);
    }

    #[test]
    fn test_failure_does_not_start_cooldown() {
        let h = create_harness(ScriptedSdk::default());
        h.sdk.push_outcome(SyncOutcome::Failure(network_error()));
        tokio_test::block_on(async {
            assert!(matches!(
                h.coordinator.sync_if_needed(t0()).await,
                SyncOutcome::Failure(_)
            ));
            assert_eq!(
                h.coordinator.sync_if_needed(t0() + Duration::seconds(1)).await,
                SyncOutcome::Success
            );
        });
        assert_eq!(h.sdk.sync_calls(), 2);
    }

    #[tokio::test]
    async fn test_single_flight() {
        let gate = Arc::new(Notify::new());
        let h = create_harness(ScriptedSdk::gated(gate.clone()));

        let first = {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.force_sync(t0()).await })
        };
        while !h.coordinator.is_syncing() {
            tokio::task::yield_now().await;
        }

        assert_eq!(h.coordinator.force_sync(t0()).await, SyncOutcome::Skipped);
        assert_eq!(h.platform.open_tasks(), 1);

        gate.notify_one();
        assert_eq!(first.await.unwrap(), SyncOutcome::Success);
        assert!(!h.coordinator.is_syncing());
        assert_eq!(h.platform.open_tasks(), 0);
        assert_eq!(h.sdk.sync_calls(), 1);
    }

    #[tokio::test]
    async fn test_cancelled_sync_releases_slot() {
        let gate = Arc::new(Notify::new());
        let h = create_harness(ScriptedSdk::gated(gate.clone()));

        let task = {
            let coordinator = h.coordinator.clone();
            tokio::spawn(async move { coordinator.force_sync(t0()).await })
        };
        while !h.coordinator.is_syncing() {
            tokio::task::yield_now().await;
        }
        task.abort();
        assert!(task.await.unwrap_err().is_cancelled());

        assert!(!h.coordinator.is_syncing());
        assert_eq!(h.platform.open_tasks(), 0);
        assert_eq!(h.platform.tasks_begun(), 1);
    }

    #[test]
    fn test_failure_anchor_and_success_reset() {
        let h = create_harness(ScriptedSdk::default());
        h.sdk.push_outcome(SyncOutcome::Failure(network_error()));
        h.sdk.push_outcome(SyncOutcome::Failure(SdkError::TimeInconsistency));

        let later = t0() + Duration::hours(5);
        tokio_test::block_on(async {
            h.coordinator.sync_if_needed(t0()).await;
            h.coordinator.sync_if_needed(later).await;
        });

        let markers = h.markers.load();
        assert_eq!(markers.first_sync_failure_time, Some(t0()));
        assert_eq!(markers.last_sync_failure_time, Some(later));
        assert!(markers.time_inconsistency_flag);
        assert_eq!(markers.last_successful_sync_time, None);
        assert!(h.center.scheduled_ids().contains(&SYNC_ERROR.to_string()));

        let success_at = later + Duration::hours(1);
        tokio_test::block_on(h.coordinator.sync_if_needed(success_at));

        let markers = h.markers.load();
        assert_eq!(markers.first_sync_failure_time, None);
        assert_eq!(markers.last_sync_failure_time, None);
        assert!(!markers.time_inconsistency_flag);
        assert_eq!(markers.last_successful_sync_time, Some(success_at));
        assert!(h.center.cancelled_pending().contains(&SYNC_ERROR.to_string()));
    }

    #[test]
    fn test_rate_limit_clears_failure_window() {
        let h = create_harness(ScriptedSdk::default());
        h.sdk.push_outcome(SyncOutcome::Failure(network_error()));
        h.sdk.push_outcome(SyncOutcome::Failure(SdkError::ExposureNotification(
            FrameworkCode::RateLimited,
        )));

        tokio_test::block_on(async {
            h.coordinator.sync_if_needed(t0()).await;
        });
        let scheduled_after_first = h.center.scheduled().len();

        tokio_test::block_on(async {
            h.coordinator.sync_if_needed(t0() + Duration::minutes(1)).await;
        });

        let markers = h.markers.load();
        assert_eq!(markers.first_sync_failure_time, None);
        assert_eq!(markers.last_sync_failure_time, None);
        assert_eq!(h.center.scheduled().len(), scheduled_after_first);
    }
}
