use super::AtelierConfig;
use crate::config::StoreBackend;
use std::str::FromStr;

impl AtelierConfig {
    /// Overlay `ATELIER_*` environment variables. Unparseable values are ignored.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("ATELIER_CREATIVITY")
            && let Ok(creativity) = raw.parse::<f64>()
        {
            self.sampling.default_creativity = creativity;
        }

        if let Ok(raw) = std::env::var("ATELIER_BIAS_STRENGTH")
            && let Ok(strength) = raw.parse::<f64>()
        {
            self.sampling.brand_bias_strength = strength;
        }

        if let Ok(raw) = std::env::var("ATELIER_CACHE_CAPACITY")
            && let Ok(capacity) = raw.parse::<usize>()
        {
            self.cache.capacity = capacity;
        }

        if let Ok(level) = std::env::var("ATELIER_LOG_LEVEL")
            && !level.is_empty()
        {
            self.observability.log_level = level;
        }

        if let Ok(raw) = std::env::var("ATELIER_STORE_BACKEND") {
            match StoreBackend::from_str(raw.trim()) {
                Ok(backend) => self.store.backend = backend,
                Err(_) => tracing::warn!(
                    "Unknown store backend '{}' in ATELIER_STORE_BACKEND, keeping '{}'",
                    raw,
                    self.store.backend
                ),
            }
        }

        if let Ok(url) = std::env::var("ATELIER_SQLITE_URL")
            && !url.is_empty()
        {
            self.store.sqlite_url = url;
        }
    }
}
