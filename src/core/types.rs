use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use strum::{Display, EnumString};
use uuid::Uuid;

use super::bandit::SelectionMode;

// Category: preference dimension learned per user. Declaration order is the
// per-request sampling order.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Category {
    StyleContext,
    Garment,
    Fabric,
    Color,
    Construction,
    Pose,
    Accessory,
    Photography,
}

// DetailCategory: construction detail family, highest composition priority first
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetailCategory {
    Silhouette,
    Sleeves,
    Closure,
    Pockets,
    Hardware,
    Other,
}

// Facing: where the subject faces in a source image. `Away` is tracked for
// statistics only; composition always renders a frontal pose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Facing {
    #[default]
    Front,
    Away,
}

// Attribute: representative payload for one attribute key
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Attribute {
    Style {
        aesthetic: String,
        #[serde(default)]
        mood: Option<String>,
    },
    Garment {
        garment_type: String,
        #[serde(default)]
        silhouette: Option<String>,
    },
    Fabric {
        material: String,
        #[serde(default)]
        finish: Option<String>,
    },
    Color {
        name: String,
    },
    Construction {
        detail: String,
        category: DetailCategory,
    },
    Pose {
        shot_type: String,
        facing: Facing,
    },
    Accessory {
        name: String,
    },
    Photography {
        shot_type: String,
        lighting: String,
        camera_angle: String,
    },
}

impl Attribute {
    pub fn category(&self) -> Category {
        match self {
            Self::Style { .. } => Category::StyleContext,
            Self::Garment { .. } => Category::Garment,
            Self::Fabric { .. } => Category::Fabric,
            Self::Color { .. } => Category::Color,
            Self::Construction { .. } => Category::Construction,
            Self::Pose { .. } => Category::Pose,
            Self::Accessory { .. } => Category::Accessory,
            Self::Photography { .. } => Category::Photography,
        }
    }

    /// Human-readable phrase used when the attribute is rendered into a prompt.
    pub fn label(&self) -> &str {
        match self {
            Self::Style { aesthetic, .. } => aesthetic,
            Self::Garment { garment_type, .. } => garment_type,
            Self::Fabric { material, .. } => material,
            Self::Color { name } | Self::Accessory { name } => name,
            Self::Construction { detail, .. } => detail,
            Self::Pose { shot_type, .. } | Self::Photography { shot_type, .. } => shot_type,
        }
    }
}

// AttributeStat: one PreferenceTable cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeStat {
    pub count: u32,
    pub payload: Attribute,
    /// Garment types this attribute was observed together with.
    #[serde(default)]
    pub garments: BTreeSet<String>,
}

/// category → attribute key → stat
pub type PreferenceTable = BTreeMap<Category, BTreeMap<String, AttributeStat>>;

// Selected: one winning attribute
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selected {
    pub key: String,
    pub attribute: Attribute,
}

impl Selected {
    pub fn new(key: impl Into<String>, attribute: Attribute) -> Self {
        Self {
            key: key.into(),
            attribute,
        }
    }
}

// SelectionResult: per-category winners for one composition call
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionResult {
    #[serde(default)]
    pub style_context: Option<Selected>,
    #[serde(default)]
    pub garment: Option<Selected>,
    #[serde(default)]
    pub fabric: Option<Selected>,
    #[serde(default)]
    pub colors: Vec<Selected>,
    #[serde(default)]
    pub construction: Vec<Selected>,
    #[serde(default)]
    pub pose: Option<Selected>,
    #[serde(default)]
    pub accessories: Vec<Selected>,
    #[serde(default)]
    pub photography: Option<Selected>,
}

impl SelectionResult {
    /// Every (category, key) pair touched, in category order, each pair once.
    pub fn credit_targets(&self) -> Vec<(Category, String)> {
        let singles = [
            (Category::StyleContext, &self.style_context),
            (Category::Garment, &self.garment),
            (Category::Fabric, &self.fabric),
            (Category::Pose, &self.pose),
            (Category::Photography, &self.photography),
        ];
        let lists = [
            (Category::Color, &self.colors),
            (Category::Construction, &self.construction),
            (Category::Accessory, &self.accessories),
        ];

        let mut seen = BTreeSet::new();
        for (category, slot) in singles {
            if let Some(selected) = slot {
                seen.insert((category, selected.key.clone()));
            }
        }
        for (category, list) in lists {
            for selected in list {
                seen.insert((category, selected.key.clone()));
            }
        }
        seen.into_iter().collect()
    }

    /// Chosen keys per category, for result metadata.
    pub fn chosen(&self) -> BTreeMap<Category, Vec<String>> {
        let mut chosen: BTreeMap<Category, Vec<String>> = BTreeMap::new();
        for (category, key) in self.credit_targets() {
            chosen.entry(category).or_default().push(key);
        }
        chosen
    }

    pub fn garment_type(&self) -> Option<&str> {
        match self.garment.as_ref().map(|s| &s.attribute) {
            Some(Attribute::Garment { garment_type, .. }) => Some(garment_type),
            _ => None,
        }
    }

    pub fn fabric_material(&self) -> Option<&str> {
        match self.fabric.as_ref().map(|s| &s.attribute) {
            Some(Attribute::Fabric { material, .. }) => Some(material),
            _ => None,
        }
    }

    pub fn aesthetic(&self) -> Option<&str> {
        match self.style_context.as_ref().map(|s| &s.attribute) {
            Some(Attribute::Style { aesthetic, .. }) => Some(aesthetic),
            _ => None,
        }
    }

    pub fn color_names(&self) -> Vec<&str> {
        self.colors.iter().map(|s| s.attribute.label()).collect()
    }

    pub fn construction_details(&self) -> Vec<(DetailCategory, &str)> {
        self.construction
            .iter()
            .filter_map(|s| match &s.attribute {
                Attribute::Construction { detail, category } => Some((*category, detail.as_str())),
                _ => None,
            })
            .collect()
    }

    pub fn shot_type(&self) -> Option<&str> {
        match self.photography.as_ref().map(|s| &s.attribute) {
            Some(Attribute::Photography { shot_type, .. }) => Some(shot_type),
            _ => match self.pose.as_ref().map(|s| &s.attribute) {
                Some(Attribute::Pose { shot_type, .. }) => Some(shot_type),
                _ => None,
            },
        }
    }

    pub fn camera_angle(&self) -> Option<&str> {
        match self.photography.as_ref().map(|s| &s.attribute) {
            Some(Attribute::Photography { camera_angle, .. }) => Some(camera_angle),
            _ => None,
        }
    }
}

// Filters: optional request narrowing, also part of the cache key
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Filters {
    #[serde(default)]
    pub garment_type: Option<String>,
    #[serde(default)]
    pub season: Option<String>,
    #[serde(default)]
    pub occasion: Option<String>,
}

// ModelGender: model descriptor requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, Default)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ModelGender {
    Female,
    Male,
    #[default]
    Unspecified,
}

// PromptRequest: one prompt-build invocation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptRequest {
    pub user_id: String,
    #[serde(default)]
    pub filters: Filters,
    /// Probability of exploring (0 to 1). `None` uses the configured default.
    #[serde(default)]
    pub creativity: Option<f64>,
    /// Free-text modifiers. Requests carrying text bypass the cache.
    #[serde(default)]
    pub user_text: Option<String>,
    /// Explicit color; overrides any learned or brand-biased color.
    #[serde(default)]
    pub user_color: Option<String>,
    #[serde(default)]
    pub model_gender: ModelGender,
    #[serde(default = "default_true")]
    pub use_brand_dna: bool,
}

fn default_true() -> bool {
    true
}

impl PromptRequest {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            filters: Filters::default(),
            creativity: None,
            user_text: None,
            user_color: None,
            model_gender: ModelGender::default(),
            use_brand_dna: true,
        }
    }

    pub fn with_creativity(mut self, creativity: f64) -> Self {
        self.creativity = Some(creativity);
        self
    }

    pub fn with_filters(mut self, filters: Filters) -> Self {
        self.filters = filters;
        self
    }

    pub fn with_user_text(mut self, text: impl Into<String>) -> Self {
        self.user_text = Some(text.into());
        self
    }

    pub fn with_user_color(mut self, color: impl Into<String>) -> Self {
        self.user_color = Some(color.into());
        self
    }

    pub fn with_model_gender(mut self, gender: ModelGender) -> Self {
        self.model_gender = gender;
        self
    }
}

// PromptMetadata: everything needed to explain and later credit a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptMetadata {
    pub prompt_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub mode: SelectionMode,
    pub creativity: f64,
    pub consistency_score: f64,
    pub brand_dna_applied: bool,
    pub records_considered: usize,
    pub chosen: BTreeMap<Category, Vec<String>>,
    pub selections: SelectionResult,
}

// PromptResult: composed positive/negative pair plus metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptResult {
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub metadata: PromptMetadata,
}
