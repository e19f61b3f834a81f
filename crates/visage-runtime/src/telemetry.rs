//! Process-wide log subscriber

use tracing_subscriber::EnvFilter;
use visage_core::{VisageError, VisageResult};

use crate::LoggingConfig;

/// Install the global `tracing` subscriber
///
/// `RUST_LOG` takes precedence over `config.level`. Fails if a subscriber is
/// already installed or the directive does not parse.
pub fn init_logging(config: &LoggingConfig) -> VisageResult<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .map_err(|e| VisageError::InvalidConfig(format!("log level: {e}")))?,
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    installed.map_err(|e| VisageError::InvalidConfig(format!("log subscriber: {e}")))?;
    tracing::debug!(level = %config.level, json = config.json, "logging initialized");
    Ok(())
}
