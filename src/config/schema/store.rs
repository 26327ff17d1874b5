use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Where bandit parameters are persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    #[serde(default = "default_sqlite_url")]
    pub sqlite_url: String,
    /// Pool size. In-memory SQLite URLs always use one connection.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_sqlite_url() -> String {
    "sqlite://atelier.db?mode=rwc".into()
}

fn default_max_connections() -> u32 {
    4
}

impl StoreConfig {
    pub fn pool_size(&self) -> u32 {
        if self.sqlite_url.contains(":memory:") {
            1
        } else {
            self.max_connections.max(1)
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            sqlite_url: default_sqlite_url(),
            max_connections: default_max_connections(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn backend_parses_snake_case() {
        assert_eq!(StoreBackend::from_str("sqlite").unwrap(), StoreBackend::Sqlite);
        assert_eq!(StoreBackend::from_str("memory").unwrap(), StoreBackend::Memory);
        assert!(StoreBackend::from_str("redis").is_err());
    }

    #[test]
    fn default_is_memory() {
        let cfg = StoreConfig::default();
        assert_eq!(cfg.backend, StoreBackend::Memory);
        assert!(cfg.sqlite_url.starts_with("sqlite://"));
        assert_eq!(cfg.pool_size(), 4);
    }

    #[test]
    fn memory_url_uses_single_connection() {
        let cfg = StoreConfig {
            sqlite_url: "sqlite::memory:".into(),
            max_connections: 8,
            ..StoreConfig::default()
        };
        assert_eq!(cfg.pool_size(), 1);
    }
}
