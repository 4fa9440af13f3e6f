//! Tracing subscriber setup.
//!
//! The library only emits `tracing` events. Applications that want them
//! printed call [`init`] once at startup.

use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::{LogFormat, LoggingConfig};
use crate::error::{MacroError, Result};

/// Build the filter for a logging configuration.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.level)
        .map_err(|e| MacroError::config(format!("invalid log level '{}': {e}", config.level)))
}

/// Install a global subscriber.
///
/// Fails if the level is not a valid filter directive or a global
/// subscriber is already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = filter(config)?;
    let registry = tracing_subscriber::registry().with(filter);

    let result = match config.format {
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().pretty().with_target(true))
            .try_init(),
        LogFormat::Compact => registry
            .with(tracing_subscriber::fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_target(true))
            .try_init(),
    };

    result.map_err(|e| MacroError::config(format!("failed to install subscriber: {e}")))
}
