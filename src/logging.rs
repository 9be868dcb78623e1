//! Subscriber setup for the binary.
//!
//! Console output is split by severity: ERROR goes to stderr, everything
//! else to stdout. An optional log file receives DEBUG and above.

use std::fs::{self, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::{
    filter::{filter_fn, LevelFilter},
    fmt,
    layer::SubscriberExt,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

use crate::error::{Result, ScreenerError};

pub const DEFAULT_LOG_FILE: &str = "logs/app.log";

fn console_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("equity_screener=info"))
}

/// Install the global subscriber
pub fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let stdout_layer = fmt::layer()
        .with_writer(std::io::stdout)
        .with_filter(console_filter())
        .with_filter(filter_fn(|metadata| *metadata.level() != Level::ERROR));

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_filter(LevelFilter::ERROR);

    let file_layer = match log_file {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt::layer()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("equity_screener=debug")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(stdout_layer)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| ScreenerError::Logging(e.to_string()))
}
