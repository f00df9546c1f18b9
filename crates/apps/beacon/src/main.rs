//! Beacon - Headless simulator for the exposure core
//!
//! Runs the sync, notification and UI state logic against a scripted tracing
//! SDK. Notifications and UI snapshots are written to the log.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use exposure::{
    CoreConfig, InMemoryKeyValueStore, KeyValueStore, SqliteKeyValueStore, StateObserver,
    TracingSdk, TracingService, UiStateSnapshot,
};
use log::{error, info, warn};

mod ports;
mod scenario;

use ports::{HeadlessPlatform, LoggingNotificationCenter, SimulatedSdk};
use scenario::{SCENARIO_FILE, Scenario};

/// Marker database inside the config directory
const DB_FILE: &str = "markers.sqlite";

/// Set to keep markers in memory only
const EPHEMERAL_ENV: &str = "BEACON_EPHEMERAL";

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    let core_config = CoreConfig::load().unwrap_or_else(|e| {
        warn!("Using default core config: {:#}", e);
        CoreConfig::default()
    });
    let scenario: Scenario = config::load_json_or_default(SCENARIO_FILE).unwrap_or_else(|e| {
        warn!("Using built-in scenario: {:#}", e);
        Scenario::default()
    });
    let tick = Duration::from_secs(scenario.tick_secs.max(1));
    info!(
        "Loaded scenario with {} steps, ticking every {}s",
        scenario.steps.len(),
        tick.as_secs()
    );

    let sdk = Arc::new(SimulatedSdk::new(scenario));
    let service = TracingService::new(
        core_config,
        sdk.clone(),
        open_store(),
        Arc::new(LoggingNotificationCenter),
        Arc::new(HeadlessPlatform::default()),
    );
    service.initialize();

    let observer: Arc<dyn StateObserver> = Arc::new(|snapshot: &UiStateSnapshot| {
        info!(
            "UI: health={:?} banner={:?} sync_problem={} time_inconsistency={} push_problem={}",
            snapshot.tracing_health,
            snapshot.exposure_banner,
            snapshot.sync_problem,
            snapshot.time_inconsistency,
            snapshot.push_problem
        );
    });
    service.add_observer("console", &observer);

    info!("Beacon started, press Ctrl-C to stop");

    let mut interval = tokio::time::interval(tick);
    // The first tick completes immediately and covers step zero
    interval.tick().await;
    service.sync_if_needed().await;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let step = sdk.advance();
                info!("Step {}", step);
                service.on_status_changed(sdk.status());
                service.sync_if_needed().await;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Shutting down");
                break;
            }
        }
    }

    Ok(())
}

/// SQLite in the config directory, memory when that is unavailable
fn open_store() -> Arc<dyn KeyValueStore> {
    if std::env::var_os(EPHEMERAL_ENV).is_some() {
        info!("Keeping markers in memory");
        return Arc::new(InMemoryKeyValueStore::new());
    }

    let Some(path) = config::config_path(DB_FILE) else {
        warn!("No config directory, keeping markers in memory");
        return Arc::new(InMemoryKeyValueStore::new());
    };

    match SqliteKeyValueStore::new(&path) {
        Ok(store) => {
            info!("Markers stored at {}", path.display());
            Arc::new(store)
        }
        Err(e) => {
            error!("Failed to open {}: {:#}", path.display(), e);
            Arc::new(InMemoryKeyValueStore::new())
        }
    }
}
