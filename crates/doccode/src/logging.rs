//! Subscriber setup for binaries and tests that want log output.
//!
//! Library code logs through `log` and opens `tracing` spans; [`init`]
//! installs one `tracing-subscriber` pipeline for both, with `log` records
//! bridged by `tracing-log`.

use std::sync::OnceLock;

use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter};

/// Overrides the level passed to [`init`], e.g. `DOCCODE_LOG=doccode=debug`.
pub const LOG_ENV: &str = "DOCCODE_LOG";

static INSTALLED: OnceLock<()> = OnceLock::new();

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Failed to install tracing subscriber: {0}")]
    Subscriber(#[from] tracing::subscriber::SetGlobalDefaultError),

    #[error("Failed to bridge log records: {0}")]
    LogBridge(#[from] log::SetLoggerError),
}

/// Installs the global subscriber. Later calls are no-ops.
pub fn init(default_level: &str, format: LogFormat) -> Result<(), LoggingError> {
    if INSTALLED.get().is_some() {
        return Ok(());
    }

    let filter = EnvFilter::try_from_env(LOG_ENV)
        .or_else(|_| EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => tracing::subscriber::set_global_default(
            registry.with(
                fmt::layer()
                    .with_target(false)
                    .with_thread_ids(false)
                    .with_file(false)
                    .compact(),
            ),
        )?,
        LogFormat::Json => {
            tracing::subscriber::set_global_default(registry.with(fmt::layer().json()))?
        }
    }
    tracing_log::LogTracer::init()?;

    let _ = INSTALLED.set(());
    Ok(())
}
