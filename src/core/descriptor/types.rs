//! Typed descriptor records.
//!
//! Upstream ingestion emits loosely-shaped JSON: nested documents may be
//! missing, stored as JSON text, or carry a plain string where an object is
//! expected. [`DescriptorRecord::from_value`] is the single parsing boundary;
//! downstream stages never re-validate shape.

use serde_json::{Map, Value};

/// Sentinel garment type for garments whose type could not be read.
pub const UNKNOWN_GARMENT: &str = "unknown";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FabricDescriptor {
    pub material: Option<String>,
    pub finish: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GarmentDescriptor {
    pub garment_type: String,
    pub silhouette: Option<String>,
    pub fabric: FabricDescriptor,
    pub colors: Vec<String>,
    pub construction: Vec<String>,
}

impl Default for GarmentDescriptor {
    fn default() -> Self {
        Self {
            garment_type: UNKNOWN_GARMENT.into(),
            silhouette: None,
            fabric: FabricDescriptor::default(),
            colors: Vec::new(),
            construction: Vec::new(),
        }
    }
}

impl GarmentDescriptor {
    pub fn is_known(&self) -> bool {
        self.garment_type != UNKNOWN_GARMENT
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PoseDescriptor {
    pub gaze: Option<String>,
    pub head: Option<String>,
    pub body_position: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotographyDescriptor {
    pub shot_type: Option<String>,
    pub lighting: Option<String>,
    pub camera_angle: Option<String>,
    pub pose: PoseDescriptor,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StylingContext {
    pub accessories: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextualAttributes {
    pub aesthetic: Option<String>,
    pub mood: Option<String>,
    pub season: Option<String>,
    pub occasion: Option<String>,
}

/// One analyzed portfolio image.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescriptorRecord {
    pub id: String,
    pub garments: Vec<GarmentDescriptor>,
    pub photography: PhotographyDescriptor,
    pub styling: StylingContext,
    pub context: ContextualAttributes,
    pub confidence: f64,
}

impl DescriptorRecord {
    /// Decode one raw record. Never fails: unreadable sub-documents become
    /// empty structures and are reported at `warn`.
    pub fn from_value(raw: &Value) -> Self {
        let Some(root) = as_object(raw) else {
            tracing::warn!("descriptor record is not an object, using empty record");
            return Self::default();
        };

        let id = text_field(&root, &["id", "image_id", "imageId"]).unwrap_or_default();

        let garments = match root.get("garments").map(decode_nested) {
            Some(Value::Array(items)) => items.iter().map(parse_garment).collect(),
            Some(Value::Object(single)) => vec![parse_garment(&Value::Object(single))],
            Some(Value::Null) | None => Vec::new(),
            Some(_) => {
                tracing::warn!(record = %id, "garments field is malformed, ignoring");
                Vec::new()
            }
        };

        let photography = sub_document(&root, "photography", &id)
            .map(|doc| parse_photography(&doc))
            .unwrap_or_default();
        let styling = sub_document(&root, "styling_context", &id)
            .map(|doc| StylingContext {
                accessories: text_list(doc.get("accessories"), &["name", "type", "item"]),
            })
            .unwrap_or_default();
        let context = sub_document(&root, "contextual_attributes", &id)
            .map(|doc| ContextualAttributes {
                aesthetic: text_field(&doc, &["aesthetic", "overall_aesthetic", "style"]),
                mood: text_field(&doc, &["mood", "mood_aesthetic"]),
                season: text_field(&doc, &["season"]),
                occasion: text_field(&doc, &["occasion"]),
            })
            .unwrap_or_default();

        let confidence = root
            .get("confidence")
            .and_then(number_of)
            .filter(|c| c.is_finite())
            .map_or(0.0, |c| c.clamp(0.0, 1.0));

        Self {
            id,
            garments,
            photography,
            styling,
            context,
            confidence,
        }
    }

    /// Garment types present on this record, lowercased.
    pub fn garment_types(&self) -> impl Iterator<Item = String> + '_ {
        self.garments
            .iter()
            .filter(|g| g.is_known())
            .map(|g| g.garment_type.to_lowercase())
    }
}

fn parse_garment(raw: &Value) -> GarmentDescriptor {
    let Some(doc) = as_object(raw) else {
        // A bare string names the garment type.
        return GarmentDescriptor {
            garment_type: text_of(raw, &[]).unwrap_or_else(|| UNKNOWN_GARMENT.into()),
            ..GarmentDescriptor::default()
        };
    };

    let fabric = match doc.get("fabric").map(decode_nested) {
        Some(Value::Object(fabric)) => FabricDescriptor {
            material: text_field(&fabric, &["primary_material", "material", "type", "name"]),
            finish: text_field(&fabric, &["finish", "texture"]),
        },
        Some(other) => FabricDescriptor {
            material: text_of(&other, &[]),
            finish: None,
        },
        None => FabricDescriptor::default(),
    };

    let mut colors = text_list(
        doc.get("color_palette").or_else(|| doc.get("colors")),
        &["name", "color_name", "color"],
    );
    if let Some(primary) = doc.get("color").and_then(|v| text_of(v, &["name", "primary"])) {
        colors.insert(0, primary);
    }

    let construction = text_list(
        doc.get("construction_details")
            .or_else(|| doc.get("construction")),
        &["detail", "description", "name", "type"],
    );

    GarmentDescriptor {
        garment_type: text_field(&doc, &["type", "garment_type", "category"])
            .unwrap_or_else(|| UNKNOWN_GARMENT.into()),
        silhouette: text_field(&doc, &["silhouette"]),
        fabric,
        colors,
        construction,
    }
}

fn parse_photography(doc: &Map<String, Value>) -> PhotographyDescriptor {
    let pose = match doc.get("pose").map(decode_nested) {
        Some(Value::Object(pose)) => PoseDescriptor {
            gaze: text_field(&pose, &["gaze", "gaze_direction"]),
            head: text_field(&pose, &["head", "head_position"]),
            body_position: text_field(&pose, &["body_position", "position", "stance"]),
        },
        Some(other) => PoseDescriptor {
            body_position: text_of(&other, &[]),
            ..PoseDescriptor::default()
        },
        None => PoseDescriptor::default(),
    };

    PhotographyDescriptor {
        shot_type: text_field(doc, &["shot_composition", "shot_type", "framing"]),
        lighting: text_field(doc, &["lighting"]),
        camera_angle: text_field(doc, &["camera_angle", "angle"]),
        pose,
    }
}

/// Sub-documents may arrive as objects or as JSON text.
fn sub_document(root: &Map<String, Value>, key: &str, id: &str) -> Option<Map<String, Value>> {
    match root.get(key).map(decode_nested) {
        Some(Value::Object(doc)) => Some(doc),
        Some(Value::Null) | None => None,
        Some(_) => {
            tracing::warn!(record = %id, field = key, "sub-document is malformed, using empty default");
            None
        }
    }
}

fn decode_nested(value: &Value) -> Value {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            if trimmed.starts_with('{') || trimmed.starts_with('[') {
                serde_json::from_str(trimmed).unwrap_or(Value::Null)
            } else {
                value.clone()
            }
        }
        other => other.clone(),
    }
}

fn as_object(value: &Value) -> Option<Map<String, Value>> {
    match decode_nested(value) {
        Value::Object(map) => Some(map),
        _ => None,
    }
}

fn text_field(doc: &Map<String, Value>, keys: &[&str]) -> Option<String> {
    keys.iter()
        .find_map(|key| doc.get(*key).and_then(|v| text_of(v, &["type", "name", "value"])))
}

/// Strings pass through; objects resolve through `nested_keys`, then the
/// usual `type`/`name`/`value` fields.
fn text_of(value: &Value, nested_keys: &[&str]) -> Option<String> {
    match value {
        Value::String(text) => {
            let trimmed = text.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        Value::Object(map) => nested_keys
            .iter()
            .chain(["type", "name", "value"].iter())
            .find_map(|key| map.get(*key).and_then(|v| text_of(v, &[]))),
        _ => None,
    }
}

fn text_list(value: Option<&Value>, nested_keys: &[&str]) -> Vec<String> {
    match value.map(decode_nested) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|item| text_of(item, nested_keys))
            .collect(),
        Some(Value::String(text)) => text
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .collect(),
        Some(other @ Value::Object(_)) => text_of(&other, nested_keys).into_iter().collect(),
        _ => Vec::new(),
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
