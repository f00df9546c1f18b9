//! Notification, category and action identifiers

use serde::{Deserialize, Serialize};
use std::time::Duration;

const NAMESPACE: &str = "beacon.notification";

/// Pending "sync keeps failing" notification
pub const SYNC_ERROR: &str = "beacon.notification.syncError";
pub const TRACING_REMINDER: &str = "beacon.notification.tracing.reminder";
pub const CHECKIN_REMINDER: &str = "beacon.notification.checkin.reminder";
pub const AUTOMATIC_REMINDER: &str = "beacon.notification.checkin.automaticReminder";
pub const AUTOMATIC_CHECKOUT: &str = "beacon.notification.checkin.automaticCheckout";
pub const CHECKOUT_ERROR: &str = "beacon.notification.checkin.checkoutError";

/// Category identifiers
pub mod category {
    pub const CHECKIN_REMINDER: &str = "beacon.category.checkin.reminder";
    pub const AUTOMATIC_REMINDER: &str = "beacon.category.checkin.automaticReminder";
    pub const AUTOMATIC_CHECKOUT: &str = "beacon.category.checkin.automaticCheckout";
    pub const CHECKOUT_ERROR: &str = "beacon.category.checkin.checkoutError";
    pub const EXPOSURE: &str = "beacon.category.exposure";
    pub const SYNC_WARNING: &str = "beacon.category.syncWarning";
}

/// "App has not run in the background" warning, 1-based
pub fn sync_warning_id(index: usize) -> String {
    format!("{NAMESPACE}.syncWarning{index}")
}

/// Repeat reminder `index` (1-based) for an exposure notification
pub fn exposure_reminder_id(exposure_identifier: &str, index: u32) -> String {
    format!("{exposure_identifier}{index}")
}

/// Error conditions that get at most one outstanding notification each
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum ErrorNotificationKind {
    Bluetooth,
    Permission,
}

impl ErrorNotificationKind {
    pub const ALL: [ErrorNotificationKind; 2] =
        [ErrorNotificationKind::Bluetooth, ErrorNotificationKind::Permission];

    pub fn identifier(self) -> &'static str {
        match self {
            ErrorNotificationKind::Bluetooth => "beacon.notification.bluetooth.warning",
            ErrorNotificationKind::Permission => "beacon.notification.permission.warning",
        }
    }

    pub fn title_key(self) -> &'static str {
        match self {
            ErrorNotificationKind::Bluetooth => "bluetooth_turned_off_title",
            ErrorNotificationKind::Permission => "tracing_permission_error_title_ios",
        }
    }

    pub fn body_key(self) -> &'static str {
        match self {
            ErrorNotificationKind::Bluetooth => "bluetooth_turned_off_text",
            ErrorNotificationKind::Permission => "tracing_permission_error_text_ios",
        }
    }
}

/// Actions offered on check-in reminders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CheckoutAction {
    CheckOut,
    Snooze30Minutes,
    Snooze1Hour,
    Snooze2Hours,
}

impl CheckoutAction {
    pub const ALL: [CheckoutAction; 4] = [
        CheckoutAction::CheckOut,
        CheckoutAction::Snooze30Minutes,
        CheckoutAction::Snooze1Hour,
        CheckoutAction::Snooze2Hours,
    ];

    pub fn identifier(self) -> &'static str {
        match self {
            CheckoutAction::CheckOut => "beacon.action.checkout",
            CheckoutAction::Snooze30Minutes => "beacon.action.snooze.30m",
            CheckoutAction::Snooze1Hour => "beacon.action.snooze.1h",
            CheckoutAction::Snooze2Hours => "beacon.action.snooze.2h",
        }
    }

    pub fn from_identifier(identifier: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|action| action.identifier() == identifier)
    }

    pub fn title_key(self) -> &'static str {
        match self {
            CheckoutAction::CheckOut => "checkout_button_title",
            CheckoutAction::Snooze30Minutes => "reminder_option_minutes_30",
            CheckoutAction::Snooze1Hour => "reminder_option_hours_1",
            CheckoutAction::Snooze2Hours => "reminder_option_hours_2",
        }
    }

    /// How long to snooze, `None` for an immediate checkout
    pub fn snooze_duration(self) -> Option<Duration> {
        match self {
            CheckoutAction::CheckOut => None,
            CheckoutAction::Snooze30Minutes => Some(Duration::from_secs(30 * 60)),
            CheckoutAction::Snooze1Hour => Some(Duration::from_secs(60 * 60)),
            CheckoutAction::Snooze2Hours => Some(Duration::from_secs(2 * 60 * 60)),
        }
    }
}
