//! `log` backend that forwards records to the host app
//!
//! Lets Rust logs show up next to the host's own logs (os_log on iOS,
//! Logcat on Android) instead of going to stderr.

use std::sync::{Arc, OnceLock, RwLock};

use log::{Level, Log, Metadata, Record, SetLoggerError};

use super::types::{FfiLogLevel, LogCallback};

static FFI_LOGGER: OnceLock<FfiLogger> = OnceLock::new();

/// Forwards to the callback when one is installed, drops records otherwise
struct FfiLogger {
    callback: RwLock<Option<Arc<dyn LogCallback>>>,
    max_level: RwLock<Level>,
}

impl FfiLogger {
    fn new(max_level: Level) -> Self {
        Self {
            callback: RwLock::new(None),
            max_level: RwLock::new(max_level),
        }
    }

    fn set_callback(&self, callback: Option<Arc<dyn LogCallback>>) {
        if let Ok(mut guard) = self.callback.write() {
            *guard = callback;
        }
    }

    fn set_max_level(&self, level: Level) {
        if let Ok(mut guard) = self.max_level.write() {
            *guard = level;
        }
    }

    fn max_level(&self) -> Level {
        self.max_level.read().map(|l| *l).unwrap_or(Level::Info)
    }

    fn has_callback(&self) -> bool {
        self.callback.read().is_ok_and(|cb| cb.is_some())
    }
}

impl Log for FfiLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.max_level() && self.has_callback()
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        // Lock released before calling out; the host may log from on_log
        let callback = match self.callback.read() {
            Ok(guard) => guard.clone(),
            Err(_) => return,
        };

        if let Some(callback) = callback {
            callback.on_log(
                FfiLogLevel::from(record.level()),
                record.target().to_string(),
                record.args().to_string(),
            );
        }
    }

    fn flush(&self) {}
}

/// Install the FFI logger as the global `log` backend.
///
/// Fails if another logger (e.g. env_logger in the simulator) is already set.
/// The callback can be installed later with [`set_log_callback`].
pub fn init_ffi_logger(max_level: Level) -> Result<(), SetLoggerError> {
    let logger = FFI_LOGGER.get_or_init(|| FfiLogger::new(max_level));
    log::set_logger(logger)?;
    log::set_max_level(max_level.to_level_filter());
    Ok(())
}

/// Replace the callback receiving log records. `None` silences logging.
pub fn set_log_callback(callback: Option<Arc<dyn LogCallback>>) {
    if let Some(logger) = FFI_LOGGER.get() {
        logger.set_callback(callback);
    }
}

pub fn set_log_level(level: Level) {
    if let Some(logger) = FFI_LOGGER.get() {
        logger.set_max_level(level);
        log::set_max_level(level.to_level_filter());
    }
}

// ============================================================================
// Exported functions
// ============================================================================

/// Route Rust logs to `callback`. Safe to call more than once; later calls
/// only swap the callback and level.
#[uniffi::export]
pub fn initialize_logging(callback: Box<dyn LogCallback>, max_level: FfiLogLevel) {
    let level = Level::from(max_level);
    if init_ffi_logger(level).is_err() {
        set_log_level(level);
    }
    set_log_callback(Some(Arc::from(callback)));
}

#[uniffi::export]
pub fn set_logging_level(max_level: FfiLogLevel) {
    set_log_level(Level::from(max_level));
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Collect {
        lines: Mutex<Vec<(String, String)>>,
    }

    impl LogCallback for Collect {
        fn on_log(&self, _level: FfiLogLevel, target: String, message: String) {
            self.lines.lock().unwrap().push((target, message));
        }
    }

    #[test]
    fn test_logger_forwards_only_enabled_levels() {
        let logger = FfiLogger::new(Level::Info);
        let collect = Arc::new(Collect::default());

        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("exposure::sync")
                .args(format_args!("dropped"))
                .build(),
        );
        assert!(collect.lines.lock().unwrap().is_empty());

        logger.set_callback(Some(collect.clone() as Arc<dyn LogCallback>));
        logger.log(
            &Record::builder()
                .level(Level::Info)
                .target("exposure::sync")
                .args(format_args!("kept"))
                .build(),
        );
        logger.log(
            &Record::builder()
                .level(Level::Debug)
                .target("exposure::sync")
                .args(format_args!("too verbose"))
                .build(),
        );

        let lines = collect.lines.lock().unwrap();
        assert_eq!(*lines, vec![("exposure::sync".to_string(), "kept".to_string())]);
    }
}
