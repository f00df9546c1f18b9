//! SDK failure reasons and their classification
//!
//! The tracing SDK reports failures through [`SdkError`]. Everything outside
//! this module consumes the plain [`ErrorKind`] returned by [`classify`], so
//! there is exactly one place that knows how raw SDK reasons map onto
//! user-facing behaviour.

use serde::{Deserialize, Serialize};

use crate::notify::ErrorNotificationKind;

/// Codes reported by the OS exposure-notification framework
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FrameworkCode {
    BluetoothOff,
    NotAuthorized,
    NotEnabled,
    Restricted,
    RateLimited,
    Other(i32),
}

/// Raw failure reason reported by the tracing SDK
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, thiserror::Error)]
pub enum SdkError {
    #[error("networking error (status {status:?}): {message}")]
    Networking { status: Option<u16>, message: String },

    #[error("database error: {0}")]
    Database(String),

    #[error("cryptography error: {0}")]
    Cryptography(String),

    #[error("bluetooth turned off")]
    BluetoothTurnedOff,

    #[error("tracing permission denied")]
    PermissionError,

    #[error("tracing authorization unknown")]
    AuthorizationUnknown,

    #[error("exposure notification framework error: {0:?}")]
    ExposureNotification(FrameworkCode),

    #[error("device time is inconsistent with server time")]
    TimeInconsistency,

    #[error("case synchronization error")]
    CaseSynchronization,

    #[error("sync cancelled")]
    Cancelled,
}

/// Error taxonomy consumed by the rest of the crate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Transient; the next external trigger retries.
    Networking,
    Database,
    Cryptography,
    BluetoothOff,
    Permission,
    /// Persists until a successful sync clears it.
    TimeInconsistency,
    /// Logged only.
    CaseSynchronization,
    /// Framework throttled us. Never shown, and resets any failure window.
    RateLimited,
}

impl ErrorKind {
    /// Whether the user ever sees this kind of failure
    pub fn is_user_facing(self) -> bool {
        matches!(
            self,
            ErrorKind::BluetoothOff | ErrorKind::Permission | ErrorKind::TimeInconsistency
        )
    }

    /// Shown right away instead of waiting for the failure window to escalate
    pub fn surfaces_immediately(self) -> bool {
        matches!(self, ErrorKind::BluetoothOff | ErrorKind::Permission)
    }

    /// The local notification this failure escalates to, if any
    pub fn error_notification(self) -> Option<ErrorNotificationKind> {
        match self {
            ErrorKind::BluetoothOff => Some(ErrorNotificationKind::Bluetooth),
            ErrorKind::Permission => Some(ErrorNotificationKind::Permission),
            _ => None,
        }
    }
}

/// Map a raw SDK failure onto the error taxonomy.
pub fn classify(error: &SdkError) -> ErrorKind {
    match error {
        SdkError::Networking { .. } | SdkError::Cancelled => ErrorKind::Networking,
        SdkError::Database(_) => ErrorKind::Database,
        SdkError::Cryptography(_) => ErrorKind::Cryptography,
        SdkError::BluetoothTurnedOff => ErrorKind::BluetoothOff,
        SdkError::PermissionError | SdkError::AuthorizationUnknown => ErrorKind::Permission,
        SdkError::TimeInconsistency => ErrorKind::TimeInconsistency,
        SdkError::CaseSynchronization => ErrorKind::CaseSynchronization,
        SdkError::ExposureNotification(code) => match code {
            FrameworkCode::BluetoothOff => ErrorKind::BluetoothOff,
            FrameworkCode::NotAuthorized | FrameworkCode::NotEnabled | FrameworkCode::Restricted => {
                ErrorKind::Permission
            }
            FrameworkCode::RateLimited => ErrorKind::RateLimited,
            // Unknown framework codes behave like an unhealthy backend connection
            FrameworkCode::Other(_) => ErrorKind::Networking,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_networking_and_cancel() {
        let err = SdkError::Networking {
            status: Some(503),
            message: "maintenance".into(),
        };
        assert_eq!(classify(&err), ErrorKind::Networking);
        assert_eq!(classify(&SdkError::Cancelled), ErrorKind::Networking);
    }

    #[test]
    fn test_classify_framework_codes() {
        assert_eq!(
            classify(&SdkError::ExposureNotification(FrameworkCode::BluetoothOff)),
            ErrorKind::BluetoothOff
        );
        for code in [
            FrameworkCode::NotAuthorized,
            FrameworkCode::NotEnabled,
            FrameworkCode::Restricted,
        ] {
            assert_eq!(
                classify(&SdkError::ExposureNotification(code)),
                ErrorKind::Permission
            );
        }
        assert_eq!(
            classify(&SdkError::ExposureNotification(FrameworkCode::RateLimited)),
            ErrorKind::RateLimited
        );
    }

    #[test]
    fn test_only_radio_and_permission_notify() {
        assert_eq!(
            ErrorKind::BluetoothOff.error_notification(),
            Some(ErrorNotificationKind::Bluetooth)
        );
        assert_eq!(
            ErrorKind::Permission.error_notification(),
            Some(ErrorNotificationKind::Permission)
        );
        assert_eq!(ErrorKind::TimeInconsistency.error_notification(), None);
        assert_eq!(ErrorKind::CaseSynchronization.error_notification(), None);
        assert!(!ErrorKind::CaseSynchronization.is_user_facing());
        assert!(ErrorKind::TimeInconsistency.is_user_facing());
        assert!(!ErrorKind::TimeInconsistency.surfaces_immediately());
        assert!(ErrorKind::BluetoothOff.surfaces_immediately());
    }
}
