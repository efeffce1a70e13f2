//! # Rover Controller
//!
//! Drive a six-wheel rover and its arm from a gamepad.
//!
//! # Control Flow
//!
//! 1. **Initialization**
//!    - Load configuration (first argument, default `config/default.toml`)
//!    - Set up logging, optionally with a daily packet log file
//!    - Open the drive and arm links (failure here is fatal)
//!
//! 2. **Main Loop**
//!    - Poll every `poll_interval_ms`, emit frames at `fps`
//!    - Handle Ctrl+C for graceful shutdown
//!
//! 3. **Graceful Shutdown**
//!    - Close links and log totals
//!
//! Expected output:
//! ```text
//! INFO rover_controller: Rover Controller v0.1.0 starting...
//! INFO rover_controller::controller::tracker: Controller #0 attached: Xbox Wireless Controller (6 axes, 10 buttons, 1 hats)
//! INFO packets: DriveCommand_0_0_0_0_0_0
//! INFO packets: ArmCommand_0_0_0_0_0_0
//! ```

use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::time::{interval, Instant, MissedTickBehavior};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::Targets;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use rover_controller::app::{resolver_settings, App, Step};
use rover_controller::config::Config;
use rover_controller::controller::evdev_provider::EvdevProvider;
use rover_controller::telemetry::FrameRecorder;
use rover_controller::transmit::{TransmissionGate, Transmitter, PACKET_LOG_TARGET};

/// Configuration file used when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix of the daily packet log
const PACKET_LOG_PREFIX: &str = "packets.log";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let config_path = std::env::args().nth(1);
    let config = load_config(config_path.as_deref())?;

    let _guard = init_logging(&config);

    info!("Rover Controller v{} starting...", env!("CARGO_PKG_VERSION"));

    let provider = EvdevProvider::new(
        config.name_filter(),
        Duration::from_millis(config.input.rescan_interval_ms),
    )
    .context("Failed to start gamepad input")?;

    let transmitter = Transmitter::connect(&config.transport)
        .await
        .context("Failed to open microcontroller links")?;

    let recorder = FrameRecorder::from_config(&config.telemetry)
        .context("Failed to start frame recorder")?;

    let gate = TransmissionGate::new(config.frame.fps);
    info!(
        "Emitting frames at {} FPS (every {} ms), polling every {} ms",
        config.frame.fps,
        gate.threshold_ms(),
        config.frame.poll_interval_ms
    );

    let mut app = App::new(
        provider,
        resolver_settings(&config),
        gate,
        transmitter,
        recorder,
    );

    let mut poll = interval(Duration::from_millis(config.frame.poll_interval_ms));
    poll.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let start = Instant::now();
    info!("Press Ctrl+C to exit");

    loop {
        tokio::select! {
            _ = poll.tick() => {
                let now_ms = u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX);
                if app.step(now_ms).await == Step::Shutdown {
                    break;
                }
            }

            _ = &mut ctrl_c => {
                info!("Received Ctrl+C, shutting down...");
                break;
            }
        }
    }

    app.shutdown();
    Ok(())
}

/// Loads the config file, falling back to defaults when the default path is
/// missing. An explicitly given path must exist.
fn load_config(path: Option<&str>) -> Result<Config> {
    match path {
        Some(path) => {
            Config::load(path).with_context(|| format!("Failed to load config from {}", path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => Config::load(DEFAULT_CONFIG_PATH)
            .with_context(|| format!("Failed to load config from {}", DEFAULT_CONFIG_PATH)),
        None => Ok(Config::default()),
    }
}

/// Console logging filtered by `RUST_LOG` or `logging.level`, plus a daily
/// packet log file when `logging.packet_log_dir` is set.
fn init_logging(config: &Config) -> Option<WorkerGuard> {
    let console_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    let console = tracing_subscriber::fmt::layer().with_filter(console_filter);

    if config.logging.packet_log_dir.is_empty() {
        tracing_subscriber::registry().with(console).init();
        return None;
    }

    let appender =
        tracing_appender::rolling::daily(&config.logging.packet_log_dir, PACKET_LOG_PREFIX);
    let (writer, guard) = tracing_appender::non_blocking(appender);
    let packets = tracing_subscriber::fmt::layer()
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .with_filter(Targets::new().with_target(PACKET_LOG_TARGET, tracing::Level::INFO));

    tracing_subscriber::registry()
        .with(console)
        .with(packets)
        .init();
    Some(guard)
}
