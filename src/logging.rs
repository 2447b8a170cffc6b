//! Console and daily-rotated file logging.
//!
//! Both layers share one `EnvFilter` (`RUST_LOG`, default `info`). Files
//! are named `pulse.log.YYYY-MM-DD` inside the log directory.

use std::path::Path;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// File name prefix for rotated logs
pub const LOG_FILE_PREFIX: &str = "pulse.log";

/// Install the global subscriber. Keep the guard alive for the whole
/// process or buffered file output is lost.
pub fn init(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("Failed to create log directory: {}", log_dir.display()))?;

    let file_appender = rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (file_writer, guard) = non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .with(fmt::layer().with_ansi(false).with_writer(file_writer))
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(guard)
}

/// Console-only logging, for one-shot commands that need no log file
pub fn init_console() {
    let _ = tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer().with_target(false))
        .try_init();
}
