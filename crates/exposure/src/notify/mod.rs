//! Local notification scheduling
//!
//! Turns domain events into at most one pending or delivered notification per
//! logical reason. All side effects go through the injected
//! [`NotificationCenter`](crate::ports::NotificationCenter).

mod identifiers;
mod quiet_hours;
mod reminders;
mod request;
mod scheduler;

pub use identifiers::{
    AUTOMATIC_CHECKOUT, AUTOMATIC_REMINDER, CHECKIN_REMINDER, CHECKOUT_ERROR, CheckoutAction,
    ErrorNotificationKind, SYNC_ERROR, TRACING_REMINDER, category, exposure_reminder_id,
    sync_warning_id,
};
pub use quiet_hours::QuietHours;
pub use request::{NotificationCategory, NotificationRequest};
pub use scheduler::NotificationScheduler;
