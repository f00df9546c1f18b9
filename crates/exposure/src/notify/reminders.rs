//! Tracing and check-in reminders

use std::time::Duration;

use log::debug;

use super::identifiers::{self, CheckoutAction, category};
use super::{NotificationCategory, NotificationRequest, NotificationScheduler};

/// Delay of the overlapping-checkout error, long enough to leave the app
const CHECKOUT_ERROR_DELAY: Duration = Duration::from_secs(1);

impl NotificationScheduler {
    /// Categories and their actions, registered once at startup
    pub fn notification_categories() -> Vec<NotificationCategory> {
        vec![
            NotificationCategory::new(category::CHECKIN_REMINDER, CheckoutAction::ALL.to_vec()),
            NotificationCategory::new(
                category::AUTOMATIC_REMINDER,
                vec![CheckoutAction::CheckOut],
            ),
            NotificationCategory::new(category::AUTOMATIC_CHECKOUT, Vec::new()),
            NotificationCategory::new(category::CHECKOUT_ERROR, Vec::new()),
            NotificationCategory::new(category::EXPOSURE, Vec::new()),
            NotificationCategory::new(category::SYNC_WARNING, Vec::new()),
        ]
    }

    pub fn register_categories(&self) {
        self.center.register_categories(Self::notification_categories());
    }

    /// Remind the user that tracing is still switched off
    pub fn schedule_tracing_reminder(&self, after: Duration) {
        debug!("Scheduling tracing reminder in {:?}", after);
        self.center.schedule(
            NotificationRequest::new(
                identifiers::TRACING_REMINDER,
                "tracing_reminder_notification_title",
                "tracing_reminder_notification_subtitle",
            )
            .after(after),
        );
    }

    pub fn reset_tracing_reminder(&self) {
        let ids = [identifiers::TRACING_REMINDER.to_string()];
        self.center.cancel_pending(&ids);
        self.center.cancel_delivered(&ids);
    }

    /// User-chosen check-in reminder, offering checkout and every snooze
    pub fn schedule_check_in_reminder(&self, after: Duration) {
        self.center.schedule(
            NotificationRequest::new(
                identifiers::CHECKIN_REMINDER,
                "checkout_reminder_title",
                "checkout_reminder_text",
            )
            .after(after)
            .in_category(category::CHECKIN_REMINDER),
        );
    }

    /// Reminder and forced checkout for a check-in the user forgot about.
    ///
    /// `None` uses the configured defaults.
    pub fn schedule_automatic_reminder_and_checkout(
        &self,
        reminder_after: Option<Duration>,
        checkout_after: Option<Duration>,
    ) {
        let reminder_after = reminder_after.unwrap_or_else(|| self.config.checkout_warning());
        let checkout_after = checkout_after.unwrap_or_else(|| self.config.automatic_checkout());

        self.center.schedule(
            NotificationRequest::new(
                identifiers::AUTOMATIC_REMINDER,
                "checkout_reminder_title",
                "checkout_reminder_text",
            )
            .after(reminder_after)
            .in_category(category::AUTOMATIC_REMINDER),
        );
        self.center.schedule(
            NotificationRequest::new(
                identifiers::AUTOMATIC_CHECKOUT,
                "auto_checkout_title",
                "auto_checkout_body",
            )
            .after(checkout_after)
            .in_category(category::AUTOMATIC_CHECKOUT),
        );
    }

    /// Checkout failed because it overlaps an earlier check-in
    pub fn schedule_checkout_error_notification(&self) {
        self.center.schedule(
            NotificationRequest::new(
                identifiers::CHECKOUT_ERROR,
                "checkout_overlapping_alert_title",
                "checkout_overlapping_alert_description",
            )
            .after(CHECKOUT_ERROR_DELAY)
            .in_category(category::CHECKOUT_ERROR),
        );
    }

    pub fn remove_all_check_in_reminders(&self) {
        self.center.cancel_pending(&[
            identifiers::CHECKIN_REMINDER.to_string(),
            identifiers::AUTOMATIC_REMINDER.to_string(),
            identifiers::AUTOMATIC_CHECKOUT.to_string(),
        ]);
    }
}
