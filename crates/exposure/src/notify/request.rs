//! Notification requests handed to the OS notification center

use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::CheckoutAction;

/// One-shot local notification
///
/// `title` and `body` are localization keys, resolved by the host.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationRequest {
    pub id: String,
    pub title: String,
    pub body: String,
    /// `None` delivers immediately
    pub delay: Option<Duration>,
    pub category: Option<String>,
}

impl NotificationRequest {
    pub fn new(id: impl Into<String>, title: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            body: body.into(),
            delay: None,
            category: None,
        }
    }

    pub fn after(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn in_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }
}

/// Category with the actions shown on its notifications
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationCategory {
    pub identifier: String,
    pub actions: Vec<CheckoutAction>,
}

impl NotificationCategory {
    pub fn new(identifier: impl Into<String>, actions: Vec<CheckoutAction>) -> Self {
        Self {
            identifier: identifier.into(),
            actions,
        }
    }
}
