//! Exposure and error notification scheduling

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use log::{debug, info, warn};

use super::identifiers::{self, ErrorNotificationKind, category, exposure_reminder_id};
use super::{NotificationRequest, QuietHours};
use crate::config::CoreConfig;
use crate::error::classify;
use crate::models::{ExposureEvent, SyncOutcome, TrackingState};
use crate::ports::{NotificationCenter, Platform};
use crate::storage::MarkerStore;

/// Notification-owned markers, cached in memory and written through
#[derive(Debug, Default)]
struct SchedulerState {
    seen_exposure_identifiers: Vec<String>,
    latest_handled_exposure_date: Option<DateTime<Utc>>,
    scheduled_error_kinds: BTreeSet<ErrorNotificationKind>,
}

/// Owns every local-notification side effect
pub struct NotificationScheduler {
    pub(super) center: Arc<dyn NotificationCenter>,
    platform: Arc<dyn Platform>,
    markers: MarkerStore,
    pub(super) config: CoreConfig,
    quiet_hours: QuietHours,
    state: Mutex<SchedulerState>,
}

impl NotificationScheduler {
    pub fn new(
        config: CoreConfig,
        center: Arc<dyn NotificationCenter>,
        platform: Arc<dyn Platform>,
        markers: MarkerStore,
    ) -> Self {
        let persisted = markers.load();
        let state = SchedulerState {
            seen_exposure_identifiers: persisted.seen_exposure_identifiers,
            latest_handled_exposure_date: persisted.latest_handled_exposure_date,
            scheduled_error_kinds: persisted.scheduled_error_notification_kinds,
        };

        Self {
            center,
            platform,
            markers,
            quiet_hours: QuietHours::from_config(&config.quiet_hours),
            config,
            state: Mutex::new(state),
        }
    }

    pub fn with_quiet_hours(mut self, quiet_hours: QuietHours) -> Self {
        self.quiet_hours = quiet_hours;
        self
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Identifiers already handed to [`handle_exposures`](Self::handle_exposures)
    #[cfg(test)]
    fn seen_exposure_identifiers(&self) -> Vec<String> {
        self.state().seen_exposure_identifiers.clone()
    }

    #[cfg(test)]
    fn scheduled_error_kinds(&self) -> BTreeSet<ErrorNotificationKind> {
        self.state().scheduled_error_kinds.clone()
    }

    // ========================================================================
    // Exposures
    // ========================================================================

    /// Notify about the newest exposure not seen before.
    ///
    /// At most one fresh burst per call: events are walked newest first and
    /// the walk stops at the first one that is both unseen and newer than the
    /// last handled date. Afterwards every given identifier counts as seen.
    /// Returns the identifier that was notified, if any.
    pub fn handle_exposures(&self, events: &[ExposureEvent]) -> Option<String> {
        let mut sorted: Vec<&ExposureEvent> = events.iter().collect();
        sorted.sort_by(|a, b| b.date.cmp(&a.date));

        let fresh = {
            let mut state = self.state();

            let fresh = sorted
                .iter()
                .find(|event| {
                    !state.seen_exposure_identifiers.contains(&event.identifier)
                        && state
                            .latest_handled_exposure_date
                            .is_none_or(|latest| event.date > latest)
                })
                .map(|event| (*event).clone());

            if let Some(event) = &fresh {
                state.latest_handled_exposure_date = Some(event.date);
                if let Err(e) = self.markers.set_latest_handled_exposure_date(Some(event.date)) {
                    warn!("Failed to persist latest exposure date: {:#}", e);
                }
            }

            let mut identifiers: Vec<String> = Vec::with_capacity(sorted.len());
            for event in &sorted {
                if !identifiers.contains(&event.identifier) {
                    identifiers.push(event.identifier.clone());
                }
            }

            if identifiers != state.seen_exposure_identifiers {
                debug!("Now tracking {} exposure identifiers", identifiers.len());
                if let Err(e) = self.markers.set_seen_exposure_identifiers(Some(&identifiers)) {
                    warn!("Failed to persist seen exposure identifiers: {:#}", e);
                }
                state.seen_exposure_identifiers = identifiers;
            }

            fresh
        };

        // Host callbacks run without the state lock held
        fresh.map(|event| {
            info!("New exposure {} dated {}", event.identifier, event.date);
            self.schedule_exposure_burst(&event.identifier);
            event.identifier
        })
    }

    fn schedule_exposure_burst(&self, identifier: &str) {
        self.center.schedule(
            NotificationRequest::new(identifier, "push_exposed_title", "push_exposed_text")
                .in_category(category::EXPOSURE),
        );

        // A backgrounded user may swipe the alert away without ever opening
        // the app, so keep reminding for a while.
        if self.platform.is_backgrounded() {
            let interval = self.config.exposure_reminder_interval();
            for index in 1..=self.config.exposure_reminder_count {
                let Some(delay) = interval.checked_mul(index) else {
                    warn!("Reminder {} for exposure {} is out of range", index, identifier);
                    break;
                };
                self.center.schedule(
                    NotificationRequest::new(
                        exposure_reminder_id(identifier, index),
                        "push_exposed_title",
                        "push_exposed_text",
                    )
                    .after(delay)
                    .in_category(category::EXPOSURE),
                );
            }
            debug!(
                "Scheduled {} repeat reminders for exposure {}",
                self.config.exposure_reminder_count, identifier
            );
        }
    }

    // ========================================================================
    // Error notifications
    // ========================================================================

    /// Schedule a debounced notification for `kind`.
    ///
    /// Does nothing while one for the same kind is outstanding. During quiet
    /// hours the attempt is dropped; a later recurrence of the condition
    /// retries. Returns whether a notification was scheduled.
    pub fn schedule_error_notification(&self, kind: ErrorNotificationKind, now: DateTime<Utc>) -> bool {
        {
            let mut state = self.state();

            if state.scheduled_error_kinds.contains(&kind) {
                debug!("{:?} notification already outstanding", kind);
                return false;
            }

            if self.quiet_hours.contains(now) {
                info!(
                    "Dropping {:?} notification during quiet hours (local hour {})",
                    kind,
                    self.quiet_hours.local_hour(now)
                );
                return false;
            }

            // Claimed before scheduling so a concurrent caller backs off
            state.scheduled_error_kinds.insert(kind);
            self.persist_error_kinds(&state.scheduled_error_kinds);
        }

        self.center.schedule(
            NotificationRequest::new(kind.identifier(), kind.title_key(), kind.body_key())
                .after(self.config.error_notification_delay()),
        );
        info!("Scheduled {:?} notification", kind);
        true
    }

    /// Withdraw notifications for conditions that are resolved
    pub fn reset_error_notifications(&self, kinds: &[ErrorNotificationKind]) {
        let ids: Vec<String> = kinds.iter().map(|k| k.identifier().to_string()).collect();
        self.center.cancel_delivered(&ids);
        self.center.cancel_pending(&ids);

        let mut state = self.state();
        let before = state.scheduled_error_kinds.len();
        for kind in kinds {
            state.scheduled_error_kinds.remove(kind);
        }
        if state.scheduled_error_kinds.len() != before {
            self.persist_error_kinds(&state.scheduled_error_kinds);
        }
    }

    fn persist_error_kinds(&self, kinds: &BTreeSet<ErrorNotificationKind>) {
        if let Err(e) = self.markers.set_scheduled_error_notification_kinds(kinds) {
            warn!("Failed to persist scheduled error notifications: {:#}", e);
        }
    }

    /// React to a new tracking state
    pub fn handle_tracking_state(&self, tracking_state: &TrackingState, now: DateTime<Utc>) {
        match tracking_state {
            TrackingState::Inactive(error) => {
                if let Some(kind) = classify(error).error_notification() {
                    self.schedule_error_notification(kind, now);
                }
            }
            TrackingState::Active
            | TrackingState::ActiveAdvertisingOnly
            | TrackingState::ActiveReceivingOnly
            | TrackingState::Stopped => {
                self.reset_error_notifications(&ErrorNotificationKind::ALL);
            }
        }
    }

    // ========================================================================
    // Sync warnings
    // ========================================================================

    /// Arm or disarm the "sync keeps failing" notification
    pub fn handle_sync_outcome(&self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::Failure(_) => {
                self.center.schedule(
                    NotificationRequest::new(
                        identifiers::SYNC_ERROR,
                        "sync_warning_notification_title",
                        "sync_warning_notification_text",
                    )
                    .after(self.config.sync_error_notification_delay())
                    .in_category(category::SYNC_WARNING),
                );
            }
            SyncOutcome::Success => {
                self.center.cancel_pending(&[identifiers::SYNC_ERROR.to_string()]);
                self.reset_background_task_warning_triggers();
            }
            SyncOutcome::Skipped => {}
        }
    }

    /// Push the "app has not run in the background" warnings into the future.
    ///
    /// Called whenever the app runs. Scheduling an existing id replaces it.
    pub fn reset_background_task_warning_triggers(&self) {
        for (index, secs) in self.config.background_warning_delays_secs.iter().enumerate() {
            self.center.schedule(
                NotificationRequest::new(
                    identifiers::sync_warning_id(index + 1),
                    "sync_warning_notification_title",
                    "sync_warning_notification_text",
                )
                .after(std::time::Duration::from_secs(*secs))
                .in_category(category::SYNC_WARNING),
            );
        }
    }

    pub fn remove_sync_warning_triggers(&self) {
        let mut ids: Vec<String> = (1..=self.config.background_warning_delays_secs.len())
            .map(identifiers::sync_warning_id)
            .collect();
        ids.push(identifiers::SYNC_ERROR.to_string());
        self.center.cancel_pending(&ids);
    }

    // ========================================================================
    // Data wipe
    // ========================================================================

    /// Cancel everything exposure related and forget the exposure history.
    ///
    /// Identifiers seen before are treated as new afterwards. Outstanding
    /// error kinds are kept; they describe the device, not the user data.
    pub fn clear_all(&self) {
        let seen = {
            let mut state = self.state();
            state.latest_handled_exposure_date = None;
            if let Err(e) = self
                .markers
                .set_seen_exposure_identifiers(None)
                .and_then(|_| self.markers.set_latest_handled_exposure_date(None))
            {
                warn!("Failed to clear exposure markers: {:#}", e);
            }
            std::mem::take(&mut state.seen_exposure_identifiers)
        };

        self.center.cancel_all_delivered();
        let mut pending = Vec::new();
        for identifier in &seen {
            pending.push(identifier.clone());
            pending.extend(
                (1..=self.config.exposure_reminder_count)
                    .map(|index| exposure_reminder_id(identifier, index)),
            );
        }
        if !pending.is_empty() {
            self.center.cancel_pending(&pending);
        }
        info!("Cleared all exposure notifications");
    }
}
