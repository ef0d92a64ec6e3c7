//! # farm-config
//!
//! Layered configuration loading for the farm workspace using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`FARM_*` prefix, `__` as separator)
//! 2. Project-level `.farm/config.toml`
//! 3. User-level `~/.config/farm/config.toml`
//! 4. Built-in defaults
//!
//! Figment maps `FARM_DATABASE__PATH` -> `database.path`,
//! `FARM_AUDIT__DEFAULT_LIMIT` -> `audit.default_limit`, etc.
//!
//! # Usage
//!
//! ```no_run
//! use farm_config::FarmConfig;
//!
//! let config = FarmConfig::load_with_dotenv().expect("config");
//! farm_config::init_tracing(&config.log).expect("tracing");
//! println!("database: {}", config.database.path);
//! ```

mod audit;
mod database;
mod error;
mod log;

pub use audit::AuditConfig;
pub use database::DatabaseConfig;
pub use error::ConfigError;
pub use log::{LogConfig, init_tracing};

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct FarmConfig {
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub log: LogConfig,
    #[serde(default)]
    pub audit: AuditConfig,
}

impl FarmConfig {
    /// Load configuration from all sources (TOML files + environment variables).
    ///
    /// Does NOT call `dotenvy` -- use [`Self::load_with_dotenv`] for `.env` loading.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let config: Self = Self::figment().extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration after reading a `.env` file from the current
    /// directory, if one exists.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a source cannot be parsed or a value is invalid.
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::load()
    }

    /// Build the figment provider chain.
    ///
    /// Public so tests can inspect the figment directly or layer extra
    /// providers on top.
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".farm/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        // `FARM_LOG` is a tracing filter read by `init_tracing`, not a config key.
        figment.merge(Env::prefixed("FARM_").ignore(&["log"]).split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.path.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.path".into(),
                reason: "must not be empty".into(),
            });
        }
        if self.audit.default_limit == 0 {
            return Err(ConfigError::InvalidValue {
                field: "audit.default_limit".into(),
                reason: "must be greater than zero".into(),
            });
        }
        Ok(())
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("farm").join("config.toml"))
    }
}
