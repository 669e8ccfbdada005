//! Global `tracing` subscriber installation.

use calarm_domain::{CalarmError, LoggingConfig, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Resolve the filter: `RUST_LOG` wins over the configured directive.
///
/// # Errors
/// Returns `CalarmError::Config` if the configured directive is invalid.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(&config.filter)
        .map_err(|e| CalarmError::Config(format!("Invalid log filter '{}': {e}", config.filter)))
}

/// Install the global subscriber with a plain or JSON formatter.
///
/// # Errors
/// Returns `CalarmError::Config` for an invalid filter and
/// `CalarmError::Internal` if a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    let installed = if config.json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .try_init()
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .try_init()
    };

    installed.map_err(|e| CalarmError::Internal(format!("tracing already initialised: {e}")))?;
    tracing::debug!(filter = %config.filter, json = config.json, "tracing initialised");
    Ok(())
}
