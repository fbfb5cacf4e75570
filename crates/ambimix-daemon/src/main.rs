//! Ambimix Daemon - headless ambient sound mixer.
//!
//! This is the main entry point for the Ambimix daemon, which loads the
//! channel catalog and saved presets, applies the configured startup mix,
//! and runs the session until a signal arrives or the sleep timer elapses.

use anyhow::{Context, Result};
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod output;
mod signals;

use ambimix_core::{Catalog, Notification};
use ambimix_engine::{EngineError, Session, SessionRuntime, SliderLevels};
use ambimix_store::{PresetStore, SqliteStore};

use crate::config::{DaemonConfig, SessionConfig};
use crate::output::LogOutput;

/// Crates whose log level follows the configured one
const LOG_TARGETS: &[&str] = &["ambimix_core", "ambimix_store", "ambimix_engine", "ambimix_daemon"];

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first, it carries the log level
    let config = config::load_config()?;
    init_logging(&config.daemon)?;

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Ambimix daemon");

    // Open preset storage
    let store = match &config.store.path {
        Some(path) => SqliteStore::open_at(path.clone()),
        None => SqliteStore::open(),
    }
    .context("Failed to open preset database")?;
    let presets = PresetStore::open(Box::new(store)).context("Failed to load presets")?;

    // Build the session
    let mut session = Session::new(Catalog::default(), presets, LogOutput::new(), SliderLevels::new());
    info!(custom_presets = session.presets().len(), "Session created");
    let loaded = session.load_catalog(&config.audio.dir);
    if loaded == 0 {
        warn!(dir = %config.audio.dir, "No channels loaded, nothing will play");
    }

    let mut events = session.subscribe();

    apply_startup(&mut session, &config.session);

    let (handle, runtime_task) = SessionRuntime::spawn(session);

    // Set up signal handling
    let mut shutdown_rx = signals::setup_signal_handlers()?;

    info!("Daemon running. Press Ctrl+C to exit.");

    // Main event loop
    loop {
        tokio::select! {
            Some(signal) = shutdown_rx.recv() => {
                info!(signal = %signal, "Shutdown requested");
                break;
            }

            event = events.recv() => {
                match event {
                    Ok(Notification::TimerCompleted) if config.session.exit_when_timer_elapses => {
                        info!("Sleep timer elapsed, exiting");
                        break;
                    }
                    Ok(notification) => {
                        debug!(?notification, "Session notification");
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        warn!(skipped, "Notification log lagged behind");
                    }
                    Err(RecvError::Closed) => {
                        warn!("Session stopped unexpectedly");
                        break;
                    }
                }
            }
        }
    }

    // Graceful shutdown
    info!("Shutting down...");
    match handle.shutdown().await {
        Ok(()) | Err(EngineError::SessionClosed) => {}
        Err(e) => warn!(error = %e, "Session shutdown failed"),
    }
    runtime_task.await.context("Session runtime panicked")?;

    info!("Daemon stopped");
    Ok(())
}

/// Install the tracing subscriber.
///
/// `RUST_LOG` takes precedence over the configured level for other crates.
fn init_logging(config: &DaemonConfig) -> Result<()> {
    let mut filter = EnvFilter::from_default_env();
    for target in LOG_TARGETS {
        let directive = format!("{target}={}", config.log_level);
        filter = filter.add_directive(
            directive.parse().with_context(|| format!("Invalid log level: {}", config.log_level))?,
        );
    }

    if config.log_json {
        tracing_subscriber::fmt().json().with_env_filter(filter).init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
    Ok(())
}

/// Apply the configured master volume, startup preset, and sleep timer.
///
/// Failures are logged; the daemon still starts with whatever applied.
fn apply_startup(session: &mut Session, config: &SessionConfig) {
    if let Err(e) = session.set_master_volume(config.master_volume) {
        warn!(volume = config.master_volume, error = %e, "Ignoring configured master volume");
    }

    if let Some(preset) = &config.startup_preset {
        match session.apply_preset(preset, config.startup_preset_custom) {
            Ok(()) => info!(preset = %preset, "Startup preset applied"),
            Err(e) => warn!(preset = %preset, error = %e, "Could not apply startup preset"),
        }
    }

    if let Some(minutes) = config.sleep_timer_minutes {
        session.start_timer(minutes);
        if session.timer().is_running() {
            info!(minutes, "Sleep timer started");
        }
    }
}
