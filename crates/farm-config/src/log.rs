//! Logging configuration and subscriber setup.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

fn default_level() -> String {
    "info".to_string()
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LogConfig {
    /// Fallback filter directive when `FARM_LOG` is unset (e.g. `"warn"`,
    /// `"farm_db=debug"`).
    #[serde(default = "default_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
        }
    }
}

/// Install the global `tracing` subscriber.
///
/// `FARM_LOG` takes precedence over the configured level.
///
/// # Errors
///
/// Returns `ConfigError::Tracing` if a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<(), ConfigError> {
    let filter = tracing_subscriber::EnvFilter::try_from_env("FARM_LOG")
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .try_init()
        .map_err(|error| ConfigError::Tracing(error.to_string()))
}
