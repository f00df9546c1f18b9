//! Integration tests for the exposure crate
//!
//! These tests drive the full TracingService through mock ports: SDK events
//! in, notifications and UI snapshots out.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration as StdDuration;

use async_trait::async_trait;
use chrono::{DateTime, Duration, TimeZone, Utc};
use exposure::{
    BackgroundTaskId, Clock, CoreConfig, DebugOverride, ExposureBanner, ExposureEvent,
    InfectionStatus, KeyValueStore, NotificationCategory, NotificationCenter, NotificationRequest,
    Platform, QuietHoursConfig, SdkError, SqliteKeyValueStore, StateObserver, SyncOutcome,
    TrackingState, TracingHealth, TracingSdk, TracingService, TracingStatus, UiStateSnapshot,
    InMemoryKeyValueStore,
};
use tempfile::TempDir;

// ============================================================================
// Mock ports
// ============================================================================

#[derive(Default)]
struct MockSdk {
    status: Mutex<TracingStatus>,
    outcomes: Mutex<VecDeque<SyncOutcome>>,
    sync_calls: AtomicUsize,
    resets: AtomicUsize,
    tracing: AtomicBool,
}

impl MockSdk {
    fn set_status(&self, status: TracingStatus) {
        *self.status.lock().unwrap() = status;
    }

    fn fail_next(&self, error: SdkError) {
        self.outcomes
            .lock()
            .unwrap()
            .push_back(SyncOutcome::Failure(error));
    }
}

#[async_trait]
impl TracingSdk for MockSdk {
    fn status(&self) -> TracingStatus {
        self.status.lock().unwrap().clone()
    }

    async fn sync(&self) -> SyncOutcome {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SyncOutcome::Success)
    }

    fn start_tracing(&self) {
        self.tracing.store(true, Ordering::SeqCst);
    }

    fn stop_tracing(&self) {
        self.tracing.store(false, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct MockCenter {
    scheduled: Mutex<Vec<NotificationRequest>>,
    cancelled_pending: Mutex<Vec<String>>,
    categories: Mutex<Vec<NotificationCategory>>,
}

impl MockCenter {
    fn scheduled_ids(&self) -> Vec<String> {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.id.clone())
            .collect()
    }

    fn count_with_title(&self, title: &str) -> usize {
        self.scheduled
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.title == title)
            .count()
    }
}

impl NotificationCenter for MockCenter {
    fn schedule(&self, request: NotificationRequest) {
        self.scheduled.lock().unwrap().push(request);
    }

    fn cancel_pending(&self, ids: &[String]) {
        self.cancelled_pending.lock().unwrap().extend_from_slice(ids);
    }

    fn cancel_delivered(&self, _ids: &[String]) {}

    fn cancel_all_delivered(&self) {}

    fn register_categories(&self, categories: Vec<NotificationCategory>) {
        *self.categories.lock().unwrap() = categories;
    }
}

struct MockPlatform {
    push_granted: AtomicBool,
    backgrounded: AtomicBool,
    open_tasks: AtomicUsize,
}

impl Default for MockPlatform {
    fn default() -> Self {
        Self {
            push_granted: AtomicBool::new(true),
            backgrounded: AtomicBool::new(false),
            open_tasks: AtomicUsize::new(0),
        }
    }
}

impl Platform for MockPlatform {
    fn push_permission_granted(&self) -> bool {
        self.push_granted.load(Ordering::SeqCst)
    }

    fn is_backgrounded(&self) -> bool {
        self.backgrounded.load(Ordering::SeqCst)
    }

    fn begin_background_task(&self, _name: &str) -> BackgroundTaskId {
        self.open_tasks.fetch_add(1, Ordering::SeqCst);
        1
    }

    fn end_background_task(&self, _id: BackgroundTaskId) {
        self.open_tasks.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Clock the test moves by hand
struct ManualClock {
    now: Mutex<DateTime<Utc>>,
}

impl ManualClock {
    fn new(now: DateTime<Utc>) -> Self {
        Self {
            now: Mutex::new(now),
        }
    }

    fn set(&self, now: DateTime<Utc>) {
        *self.now.lock().unwrap() = now;
    }

    fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap()
    }
}

// ============================================================================
// Harness
// ============================================================================

struct Harness {
    service: TracingService,
    sdk: Arc<MockSdk>,
    center: Arc<MockCenter>,
    platform: Arc<MockPlatform>,
    clock: Arc<ManualClock>,
}

/// Quiet hours evaluated in UTC so tests do not depend on the machine's zone
fn test_config() -> CoreConfig {
    CoreConfig {
        quiet_hours: QuietHoursConfig {
            utc_offset_secs: Some(0),
            ..Default::default()
        },
        ..Default::default()
    }
}

fn noon() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2020, 9, 1, 12, 0, 0).unwrap()
}

fn create_harness_with_store(store: Arc<dyn KeyValueStore>) -> Harness {
    let sdk = Arc::new(MockSdk::default());
    sdk.set_status(TracingStatus::new(TrackingState::Active, InfectionStatus::Healthy));
    let center = Arc::new(MockCenter::default());
    let platform = Arc::new(MockPlatform::default());
    let clock = Arc::new(ManualClock::new(noon()));

    let service = TracingService::with_clock(
        test_config(),
        sdk.clone(),
        store,
        center.clone(),
        platform.clone(),
        clock.clone(),
    );
    Harness {
        service,
        sdk,
        center,
        platform,
        clock,
    }
}

fn create_harness() -> Harness {
    create_harness_with_store(Arc::new(InMemoryKeyValueStore::new()))
}

fn exposed(events: &[(&str, DateTime<Utc>)]) -> TracingStatus {
    TracingStatus::new(
        TrackingState::Active,
        InfectionStatus::Exposed(
            events
                .iter()
                .map(|(id, date)| ExposureEvent::new(*id, *date))
                .collect(),
        ),
    )
}

fn recording_observer(log: &Arc<Mutex<Vec<UiStateSnapshot>>>) -> Arc<dyn StateObserver> {
    let log = log.clone();
    Arc::new(move |snapshot: &UiStateSnapshot| log.lock().unwrap().push(snapshot.clone()))
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn test_initialize_registers_and_publishes() {
    let h = create_harness();
    h.service.initialize();

    assert!(!h.center.categories.lock().unwrap().is_empty());
    assert!(
        h.center
            .scheduled_ids()
            .contains(&"beacon.notification.syncWarning1".to_string())
    );
    let snapshot = h.service.current_snapshot();
    assert_eq!(snapshot.tracing_health, TracingHealth::Active);
    assert_eq!(snapshot.exposure_banner, ExposureBanner::None);
}

#[test]
fn test_new_exposure_notifies_exactly_once() {
    let h = create_harness();
    let day = |d| Utc.with_ymd_and_hms(2020, 8, d, 0, 0, 0).unwrap();

    h.service.on_status_changed(exposed(&[("A", day(1)), ("B", day(2))]));
    assert_eq!(h.center.count_with_title("push_exposed_title"), 1);

    // Same history again: nothing new
    h.service.on_status_changed(exposed(&[("A", day(1)), ("B", day(2))]));
    assert_eq!(h.center.count_with_title("push_exposed_title"), 1);

    // C is new and newest: one burst for C only
    h.service
        .on_status_changed(exposed(&[("A", day(1)), ("B", day(2)), ("C", day(3))]));
    assert_eq!(h.center.count_with_title("push_exposed_title"), 2);
    assert_eq!(h.center.scheduled_ids().last().map(String::as_str), Some("C"));

    let mut seen = h.service.persisted_markers().seen_exposure_identifiers;
    seen.sort();
    assert_eq!(seen, vec!["A", "B", "C"]);
    assert_eq!(h.service.current_snapshot().exposure_banner, ExposureBanner::Exposed);
}

#[test]
fn test_backgrounded_exposure_gets_reminders() {
    let h = create_harness();
    h.platform.backgrounded.store(true, Ordering::SeqCst);

    h.service.on_status_changed(exposed(&[("A", noon())]));
    assert_eq!(h.center.count_with_title("push_exposed_title"), 13);
}

#[test]
fn test_reset_forgets_exposure_history() {
    let h = create_harness();
    let status = exposed(&[("A", noon() - Duration::days(1))]);

    h.service.on_status_changed(status.clone());
    h.service.reset().unwrap();
    assert_eq!(h.sdk.resets.load(Ordering::SeqCst), 1);
    assert!(
        h.center
            .cancelled_pending
            .lock()
            .unwrap()
            .contains(&"A".to_string())
    );

    h.service.on_status_changed(status);
    assert_eq!(h.center.count_with_title("push_exposed_title"), 2);
}

#[test]
fn test_bluetooth_notification_respects_quiet_hours() {
    let h = create_harness();
    let off = TracingStatus::new(
        TrackingState::Inactive(SdkError::BluetoothTurnedOff),
        InfectionStatus::Healthy,
    );

    h.clock.set(Utc.with_ymd_and_hms(2020, 9, 1, 2, 0, 0).unwrap());
    h.service.on_status_changed(off.clone());
    h.clock.set(Utc.with_ymd_and_hms(2020, 9, 1, 23, 0, 0).unwrap());
    h.service.on_status_changed(off.clone());
    assert_eq!(h.center.count_with_title("bluetooth_turned_off_title"), 0);

    h.clock.set(Utc.with_ymd_and_hms(2020, 9, 2, 12, 0, 0).unwrap());
    h.service.on_status_changed(off.clone());
    h.service.on_status_changed(off);
    assert_eq!(h.center.count_with_title("bluetooth_turned_off_title"), 1);
    assert_eq!(h.service.current_snapshot().tracing_health, TracingHealth::BluetoothOff);
}

#[test]
fn test_sync_throttle() {
    let h = create_harness();
    tokio_test::block_on(async {
        assert_eq!(h.service.sync_if_needed().await, SyncOutcome::Success);
        h.clock.advance(Duration::seconds(1));
        assert_eq!(h.service.sync_if_needed().await, SyncOutcome::Skipped);
    });
    assert_eq!(h.sdk.sync_calls.load(Ordering::SeqCst), 1);
    assert_eq!(h.platform.open_tasks.load(Ordering::SeqCst), 0);
}

#[test]
fn test_sync_problem_escalates_after_a_day() {
    let h = create_harness();
    let network = || SdkError::Networking {
        status: None,
        message: "offline".into(),
    };
    for _ in 0..3 {
        h.sdk.fail_next(network());
    }

    tokio_test::block_on(async {
        h.service.sync_if_needed().await;
        assert!(!h.service.current_snapshot().sync_problem);

        h.clock.advance(Duration::hours(23) + Duration::minutes(59));
        h.service.sync_if_needed().await;
        assert!(!h.service.current_snapshot().sync_problem);

        h.clock.advance(Duration::minutes(2));
        h.service.sync_if_needed().await;
        assert!(h.service.current_snapshot().sync_problem);

        // Recovery clears it
        h.clock.advance(Duration::minutes(1));
        h.service.sync_if_needed().await;
    });
    assert!(!h.service.current_snapshot().sync_problem);
    assert_eq!(h.service.persisted_markers().first_sync_failure_time, None);
}

#[test]
fn test_time_inconsistency_until_success() {
    let h = create_harness();
    h.sdk.fail_next(SdkError::TimeInconsistency);

    tokio_test::block_on(h.service.trigger_force_sync());
    assert!(h.service.current_snapshot().time_inconsistency);

    tokio_test::block_on(h.service.trigger_force_sync());
    assert!(!h.service.current_snapshot().time_inconsistency);
}

#[test]
fn test_bluetooth_sync_failure_shows_right_away() {
    let h = create_harness();
    assert_eq!(h.service.current_snapshot().tracing_health, TracingHealth::Active);

    h.sdk.set_status(TracingStatus::new(
        TrackingState::Inactive(SdkError::BluetoothTurnedOff),
        InfectionStatus::Healthy,
    ));
    h.sdk.fail_next(SdkError::BluetoothTurnedOff);

    tokio_test::block_on(h.service.sync_if_needed());
    assert_eq!(h.service.current_snapshot().tracing_health, TracingHealth::BluetoothOff);
    assert_eq!(h.center.count_with_title("bluetooth_turned_off_title"), 1);
}

#[test]
fn test_networking_sync_failure_keeps_last_status() {
    let h = create_harness();
    h.sdk.set_status(TracingStatus::new(
        TrackingState::Inactive(SdkError::BluetoothTurnedOff),
        InfectionStatus::Healthy,
    ));
    h.sdk.fail_next(SdkError::Networking {
        status: Some(502),
        message: "bad gateway".into(),
    });

    tokio_test::block_on(h.service.sync_if_needed());
    assert_eq!(h.service.current_snapshot().tracing_health, TracingHealth::Active);
}

#[test]
fn test_successful_sync_reloads_status() {
    let h = create_harness();
    h.sdk.set_status(exposed(&[("A", noon() - Duration::days(2))]));

    tokio_test::block_on(h.service.perform_background_tasks());
    assert_eq!(h.service.current_snapshot().exposure_banner, ExposureBanner::Exposed);
    assert_eq!(h.center.count_with_title("push_exposed_title"), 1);
}

#[test]
fn test_infection_ends_tracing_and_debug_override() {
    let h = create_harness();
    h.service.on_status_changed(TracingStatus::new(
        TrackingState::Inactive(SdkError::PermissionError),
        InfectionStatus::Infected,
    ));
    let snapshot = h.service.current_snapshot();
    assert_eq!(snapshot.tracing_health, TracingHealth::Ended);
    assert_eq!(snapshot.exposure_banner, ExposureBanner::Infected);

    h.service.set_debug_override(Some(DebugOverride::Healthy));
    let snapshot = h.service.current_snapshot();
    assert_eq!(snapshot.exposure_banner, ExposureBanner::None);
    assert_eq!(snapshot.tracing_health, TracingHealth::PermissionError);
}

#[test]
fn test_observers_receive_changes_only() {
    let h = create_harness();
    let log = Arc::new(Mutex::new(Vec::new()));
    let observer = recording_observer(&log);

    h.service.add_observer("home", &observer);
    assert_eq!(log.lock().unwrap().len(), 1);

    h.service.refresh_push_permission();
    h.service.refresh_push_permission();
    assert_eq!(log.lock().unwrap().len(), 1);

    h.platform.push_granted.store(false, Ordering::SeqCst);
    h.service.refresh_push_permission();
    assert_eq!(log.lock().unwrap().len(), 2);
    assert!(log.lock().unwrap()[1].push_problem);

    drop(observer);
    h.platform.push_granted.store(true, Ordering::SeqCst);
    h.service.refresh_push_permission();
    assert_eq!(log.lock().unwrap().len(), 2);
}

#[test]
fn test_stop_and_start_tracing() {
    let h = create_harness();
    h.service.stop_tracing(Some(StdDuration::from_secs(4 * 3600)));
    assert!(!h.sdk.tracing.load(Ordering::SeqCst));
    assert!(
        h.center
            .scheduled_ids()
            .contains(&"beacon.notification.tracing.reminder".to_string())
    );
    assert!(
        h.center
            .cancelled_pending
            .lock()
            .unwrap()
            .contains(&"beacon.notification.syncError".to_string())
    );

    h.service.start_tracing();
    assert!(h.sdk.tracing.load(Ordering::SeqCst));
    assert!(
        h.center
            .cancelled_pending
            .lock()
            .unwrap()
            .contains(&"beacon.notification.tracing.reminder".to_string())
    );
}

#[test]
fn test_markers_survive_restart_with_sqlite() {
    let dir = TempDir::new().unwrap();
    let db_path = dir.path().join("markers.test.sqlite");

    {
        let store = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
        let h = create_harness_with_store(store);
        h.sdk.fail_next(SdkError::TimeInconsistency);
        tokio_test::block_on(h.service.sync_if_needed());
        h.service.on_status_changed(exposed(&[("A", noon())]));
    }

    let store = Arc::new(SqliteKeyValueStore::new(&db_path).unwrap());
    let h = create_harness_with_store(store);
    let markers = h.service.persisted_markers();
    assert_eq!(markers.first_sync_failure_time, Some(noon()));
    assert!(markers.time_inconsistency_flag);
    assert_eq!(markers.seen_exposure_identifiers, vec!["A"]);
    assert!(h.service.current_snapshot().time_inconsistency);

    // Already notified before the restart
    h.service.on_status_changed(exposed(&[("A", noon())]));
    assert_eq!(h.center.count_with_title("push_exposed_title"), 0);
}
