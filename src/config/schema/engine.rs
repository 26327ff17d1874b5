use serde::{Deserialize, Serialize};

/// Explore/exploit and top-N settings for the sampling engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Creativity used when a request does not carry its own (0 to 1).
    #[serde(default = "default_creativity")]
    pub default_creativity: f64,
    /// Multiplier bonus for brand-signature keys: sample * (1 + strength).
    #[serde(default = "default_bias_strength")]
    pub brand_bias_strength: f64,
    #[serde(default = "default_color_count")]
    pub color_count: usize,
    #[serde(default = "default_construction_count")]
    pub construction_count: usize,
    #[serde(default = "default_accessory_count")]
    pub accessory_count: usize,
}

fn default_creativity() -> f64 {
    0.3
}
fn default_bias_strength() -> f64 {
    0.3
}
fn default_color_count() -> usize {
    2
}
fn default_construction_count() -> usize {
    5
}
fn default_accessory_count() -> usize {
    2
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            default_creativity: default_creativity(),
            brand_bias_strength: default_bias_strength(),
            color_count: default_color_count(),
            construction_count: default_construction_count(),
            accessory_count: default_accessory_count(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Size of the most-recent descriptor window per request.
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

fn default_max_records() -> usize {
    100
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Upper bound on high-confidence samples read from a style profile.
    #[serde(default = "default_sample_cap")]
    pub sample_cap: usize,
    #[serde(default = "default_min_sample_confidence")]
    pub min_sample_confidence: f64,
}

fn default_true() -> bool {
    true
}
fn default_sample_cap() -> usize {
    50
}
fn default_min_sample_confidence() -> f64 {
    0.7
}

impl Default for BrandConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            sample_cap: default_sample_cap(),
            min_sample_confidence: default_min_sample_confidence(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

fn default_capacity() -> usize {
    100
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            capacity: default_capacity(),
        }
    }
}
