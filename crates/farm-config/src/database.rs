//! libSQL database location and locking.

use serde::{Deserialize, Serialize};

fn default_path() -> String {
    "farm.db".to_string()
}

const fn default_busy_timeout_ms() -> u64 {
    5_000
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Path to the local database file, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,

    /// How long a writer waits for another connection's lock before failing.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
            busy_timeout_ms: default_busy_timeout_ms(),
        }
    }
}

impl DatabaseConfig {
    /// Whether the database lives in memory only (tests, scratch runs).
    pub fn is_in_memory(&self) -> bool {
        self.path == ":memory:"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_file() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, "farm.db");
        assert_eq!(config.busy_timeout_ms, 5_000);
        assert!(!config.is_in_memory());
    }

    #[test]
    fn detects_in_memory() {
        let config = DatabaseConfig {
            path: ":memory:".into(),
            ..Default::default()
        };
        assert!(config.is_in_memory());
    }

    #[test]
    fn missing_busy_timeout_uses_default() {
        use figment::Figment;
        use figment::providers::{Format, Toml};

        let config: DatabaseConfig = Figment::from(Toml::string("path = \"x.db\""))
            .extract()
            .unwrap();
        assert_eq!(config.busy_timeout_ms, 5_000);
    }
}
