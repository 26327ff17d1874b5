use super::super::{
    AggregatorConfig, BrandConfig, CacheConfig, ObservabilityConfig, SamplingConfig, StoreConfig,
};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

const MAX_BIAS_STRENGTH: f64 = 10.0;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AtelierConfig {
    #[serde(default)]
    pub sampling: SamplingConfig,
    #[serde(default)]
    pub aggregator: AggregatorConfig,
    #[serde(default)]
    pub brand: BrandConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

impl AtelierConfig {
    /// Pull numeric settings back into range instead of rejecting them.
    ///
    /// Non-finite values fall back to the section default.
    pub fn normalize(&mut self) {
        let sampling_defaults = SamplingConfig::default();
        self.sampling.default_creativity = finite_or(
            self.sampling.default_creativity,
            sampling_defaults.default_creativity,
        )
        .clamp(0.0, 1.0);
        self.sampling.brand_bias_strength = finite_or(
            self.sampling.brand_bias_strength,
            sampling_defaults.brand_bias_strength,
        )
        .clamp(0.0, MAX_BIAS_STRENGTH);
        self.sampling.color_count = self.sampling.color_count.max(1);
        self.sampling.accessory_count = self.sampling.accessory_count.max(1);
        self.sampling.construction_count = self.sampling.construction_count.max(1);

        self.aggregator.max_records = self.aggregator.max_records.max(1);
        self.brand.sample_cap = self.brand.sample_cap.max(1);
        self.brand.min_sample_confidence = finite_or(
            self.brand.min_sample_confidence,
            BrandConfig::default().min_sample_confidence,
        )
        .clamp(0.0, 1.0);
        self.cache.capacity = self.cache.capacity.max(1);
    }

    /// Normalize, then reject what cannot be repaired.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.normalize();
        if self.store.sqlite_url.trim().is_empty()
            && self.store.backend == super::super::StoreBackend::Sqlite
        {
            return Err(ConfigError::Validation(
                "store.sqlite_url must be set for the sqlite backend".into(),
            ));
        }
        Ok(())
    }
}

pub(crate) fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() { value } else { fallback }
}
