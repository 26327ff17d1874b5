use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::types::Category;

/// Aesthetic used when a profile names no themes.
pub const DEFAULT_AESTHETIC: &str = "contemporary";

// WeightedValue: one entry of a ranked distribution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedValue {
    pub name: String,
    pub weight: f64,
}

impl WeightedValue {
    pub fn new(name: impl Into<String>, weight: f64) -> Self {
        Self {
            name: name.into(),
            weight,
        }
    }
}

// ProfileSample: photography fields of one high-confidence portfolio image
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileSample {
    #[serde(default)]
    pub shot_type: Option<String>,
    #[serde(default)]
    pub lighting: Option<String>,
    #[serde(default)]
    pub camera_angle: Option<String>,
    #[serde(default)]
    pub confidence: f64,
}

// StyleProfile: precomputed per-user aggregate, read-only here
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StyleProfile {
    #[serde(default)]
    pub aesthetic_themes: Vec<WeightedValue>,
    #[serde(default)]
    pub color_distribution: Vec<WeightedValue>,
    #[serde(default)]
    pub fabric_distribution: Vec<WeightedValue>,
    #[serde(default)]
    pub construction_distribution: Vec<WeightedValue>,
    #[serde(default)]
    pub garment_distribution: Vec<WeightedValue>,
    /// High-confidence sample, most recent first.
    #[serde(default)]
    pub samples: Vec<ProfileSample>,
}

// BrandDna: ranked brand signature derived from a StyleProfile. A bias
// signal only; every consumer treats it as optional.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BrandDna {
    pub primary_aesthetic: String,
    pub secondary_aesthetics: Vec<String>,
    /// Ranked, weights normalized to 0 to 1.
    pub signature_colors: Vec<WeightedValue>,
    pub signature_fabrics: Vec<WeightedValue>,
    pub signature_construction: Vec<WeightedValue>,
    pub primary_garments: Vec<WeightedValue>,
    /// Ranked by frequency over the sample; weight is the frequency share.
    pub preferred_shot_types: Vec<WeightedValue>,
    pub preferred_lighting: Vec<WeightedValue>,
    pub preferred_angles: Vec<WeightedValue>,
    pub confidence: f64,
    pub extracted_at: DateTime<Utc>,
}

impl BrandDna {
    pub fn color_names(&self) -> impl Iterator<Item = &str> {
        names(&self.signature_colors)
    }

    pub fn construction_names(&self) -> impl Iterator<Item = &str> {
        names(&self.signature_construction)
    }

    pub fn top_fabric(&self) -> Option<&str> {
        self.signature_fabrics.first().map(|v| v.name.as_str())
    }

    pub fn top_shot_type(&self) -> Option<&str> {
        self.preferred_shot_types.first().map(|v| v.name.as_str())
    }

    pub fn top_angle(&self) -> Option<&str> {
        self.preferred_angles.first().map(|v| v.name.as_str())
    }

    /// Keys the sampling engine should favor for `category`.
    pub fn bias_for(&self, category: Category) -> Vec<String> {
        let ranked = match category {
            Category::StyleContext => {
                return std::iter::once(self.primary_aesthetic.clone())
                    .chain(self.secondary_aesthetics.iter().cloned())
                    .collect();
            }
            Category::Garment => &self.primary_garments,
            Category::Fabric => &self.signature_fabrics,
            Category::Color => &self.signature_colors,
            Category::Construction => &self.signature_construction,
            Category::Pose | Category::Photography => &self.preferred_shot_types,
            Category::Accessory => return Vec::new(),
        };
        names(ranked).map(ToString::to_string).collect()
    }
}

fn names(values: &[WeightedValue]) -> impl Iterator<Item = &str> {
    values.iter().map(|v| v.name.as_str())
}
