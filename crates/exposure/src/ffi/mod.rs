//! FFI bindings for UniFFI export
//!
//! Swift/Kotlin bindings for the exposure crate.
//!
//! ## Usage from Swift
//!
//! ```swift
//! import ExposureFFI
//!
//! // Initialize logging first
//! initializeLogging(callback: myLogCallback, maxLevel: .info)
//!
//! let service = try ExposureService(
//!     dbPath: "/path/to/markers.sqlite",
//!     configJson: nil,
//!     sdk: sdkBridge,
//!     notifications: notificationBridge,
//!     platform: platformBridge
//! )
//! service.initialize()
//! service.addObserver(id: "home", observer: homeViewModel)
//!
//! // From a background fetch
//! let result = service.performBackgroundTasks()
//! ```

mod logging;
mod service;
mod types;

pub use logging::{init_ffi_logger, initialize_logging, set_log_callback, set_log_level, set_logging_level};
pub use service::*;
pub use types::*;
