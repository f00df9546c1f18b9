//! Recording fakes for the ports, shared by unit tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::models::{SyncOutcome, TracingStatus};
use crate::notify::{NotificationCategory, NotificationRequest};
use crate::ports::{BackgroundTaskId, NotificationCenter, Platform, TracingSdk};

#[derive(Default)]
pub struct RecordingCenter {
    scheduled: Mutex<Vec<NotificationRequest>>,
    cancelled_pending: Mutex<Vec<String>>,
    cancelled_delivered: Mutex<Vec<String>>,
    all_delivered_cleared: AtomicUsize,
    categories: Mutex<Vec<NotificationCategory>>,
}

impl RecordingCenter {
    pub fn scheduled(&self) -> Vec<NotificationRequest> {
        self.scheduled.lock().unwrap().clone()
    }

    pub fn scheduled_ids(&self) -> Vec<String> {
        self.scheduled().into_iter().map(|r| r.id).collect()
    }

    pub fn cancelled_pending(&self) -> Vec<String> {
        self.cancelled_pending.lock().unwrap().clone()
    }

    pub fn cancelled_delivered(&self) -> Vec<String> {
        self.cancelled_delivered.lock().unwrap().clone()
    }

    pub fn all_delivered_cleared(&self) -> usize {
        self.all_delivered_cleared.load(Ordering::SeqCst)
    }

    pub fn categories(&self) -> Vec<NotificationCategory> {
        self.categories.lock().unwrap().clone()
    }
}

impl NotificationCenter for RecordingCenter {
    fn schedule(&self, request: NotificationRequest) {
        self.scheduled.lock().unwrap().push(request);
    }

    fn cancel_pending(&self, ids: &[String]) {
        self.cancelled_pending.lock().unwrap().extend_from_slice(ids);
    }

    fn cancel_delivered(&self, ids: &[String]) {
        self.cancelled_delivered.lock().unwrap().extend_from_slice(ids);
    }

    fn cancel_all_delivered(&self) {
        self.all_delivered_cleared.fetch_add(1, Ordering::SeqCst);
    }

    fn register_categories(&self, categories: Vec<NotificationCategory>) {
        *self.categories.lock().unwrap() = categories;
    }
}

pub struct FakePlatform {
    push_granted: AtomicBool,
    backgrounded: AtomicBool,
    next_task: AtomicU64,
    open_tasks: Mutex<Vec<BackgroundTaskId>>,
    tasks_begun: AtomicUsize,
}

impl Default for FakePlatform {
    fn default() -> Self {
        Self {
            push_granted: AtomicBool::new(true),
            backgrounded: AtomicBool::new(false),
            next_task: AtomicU64::new(1),
            open_tasks: Mutex::new(Vec::new()),
            tasks_begun: AtomicUsize::new(0),
        }
    }
}

impl FakePlatform {
    pub fn set_backgrounded(&self, value: bool) {
        self.backgrounded.store(value, Ordering::SeqCst);
    }

    pub fn set_push_granted(&self, value: bool) {
        self.push_granted.store(value, Ordering::SeqCst);
    }

    pub fn open_tasks(&self) -> usize {
        self.open_tasks.lock().unwrap().len()
    }

    pub fn tasks_begun(&self) -> usize {
        self.tasks_begun.load(Ordering::SeqCst)
    }
}

impl Platform for FakePlatform {
    fn push_permission_granted(&self) -> bool {
        self.push_granted.load(Ordering::SeqCst)
    }

    fn is_backgrounded(&self) -> bool {
        self.backgrounded.load(Ordering::SeqCst)
    }

    fn begin_background_task(&self, _name: &str) -> BackgroundTaskId {
        let id = self.next_task.fetch_add(1, Ordering::SeqCst);
        self.tasks_begun.fetch_add(1, Ordering::SeqCst);
        self.open_tasks.lock().unwrap().push(id);
        id
    }

    fn end_background_task(&self, id: BackgroundTaskId) {
        self.open_tasks.lock().unwrap().retain(|open| *open != id);
    }
}

/// SDK fake returning queued outcomes, `Success` once the queue is empty
#[derive(Default)]
pub struct ScriptedSdk {
    status: Mutex<TracingStatus>,
    outcomes: Mutex<VecDeque<SyncOutcome>>,
    sync_calls: AtomicUsize,
    started: AtomicUsize,
    stopped: AtomicUsize,
    resets: AtomicUsize,
    /// When set, `sync` waits for a permit before returning
    gate: Option<Arc<Notify>>,
}

impl ScriptedSdk {
    pub fn gated(gate: Arc<Notify>) -> Self {
        Self {
            gate: Some(gate),
            ..Default::default()
        }
    }

    pub fn set_status(&self, status: TracingStatus) {
        *self.status.lock().unwrap() = status;
    }

    pub fn push_outcome(&self, outcome: SyncOutcome) {
        self.outcomes.lock().unwrap().push_back(outcome);
    }

    pub fn sync_calls(&self) -> usize {
        self.sync_calls.load(Ordering::SeqCst)
    }

    pub fn started(&self) -> usize {
        self.started.load(Ordering::SeqCst)
    }

    pub fn stopped(&self) -> usize {
        self.stopped.load(Ordering::SeqCst)
    }

    pub fn resets(&self) -> usize {
        self.resets.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TracingSdk for ScriptedSdk {
    fn status(&self) -> TracingStatus {
        self.status.lock().unwrap().clone()
    }

    async fn sync(&self) -> SyncOutcome {
        self.sync_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.notified().await;
        }
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(SyncOutcome::Success)
    }

    fn start_tracing(&self) {
        self.started.fetch_add(1, Ordering::SeqCst);
    }

    fn stop_tracing(&self) {
        self.stopped.fetch_add(1, Ordering::SeqCst);
    }

    fn reset(&self) {
        self.resets.fetch_add(1, Ordering::SeqCst);
    }
}
