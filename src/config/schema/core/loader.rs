use super::AtelierConfig;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

impl AtelierConfig {
    /// Parse, apply environment overrides, then validate.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: AtelierConfig =
            toml::from_str(contents).context("Failed to parse config")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!(path = %path.display(), "config file not found, using defaults");
            return Self::from_toml_str("");
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to load config file {}", path.display()))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let toml_str = toml::to_string_pretty(self).context("Failed to serialize config")?;
        fs::write(path, toml_str).context("Failed to write config file")?;
        Ok(())
    }
}
