//! Prompt composition.
//!
//! Sections are emitted in a fixed order:
//! style, garment (fabric fused), design details, user modifiers, accessory,
//! color, model, framing triple, lighting triple, sharpness.
//! Optional tokens that contradict the frontal full-body framing are dropped;
//! the mandatory sections always render. Duplicates are removed
//! case-insensitively (first wins).

pub mod details;
pub mod negative;
pub mod token;

pub use details::{DETAIL_SLOTS, select_details};
pub use negative::{negative_prompt, requests_warm_red};
pub use token::{MAX_WEIGHT, MIN_WEIGHT, PromptToken, clamp_weight, format_token};

use crate::core::brand::{BrandDna, DEFAULT_AESTHETIC};
use crate::core::descriptor::rules::{FRAMING_CONFLICT_TERMS, matches_any, matches_term};
use crate::core::types::{ModelGender, SelectionResult};

pub const FRAMING_TRIPLE: [&str; 3] = ["full-body shot", "standing", "facing camera"];
pub const LIGHTING_TRIPLE: [&str; 3] = [
    "soft even studio lighting",
    "clean seamless background",
    "professional fashion photography",
];
pub const SHARPNESS_MARKER: &str = "sharp focus";
pub const NEUTRAL_PALETTE: &str = "neutral color palette";
pub const FALLBACK_GARMENT: &str = "tailored garment";

const STYLE_WEIGHT: f64 = 1.1;
const GARMENT_WEIGHT: f64 = 1.3;
const DETAIL_WEIGHT: f64 = 1.1;
const MODIFIER_WEIGHT: f64 = 1.2;
const ACCESSORY_WEIGHT: f64 = 0.8;
const COLOR_WEIGHT: f64 = 1.2;
const USER_COLOR_WEIGHT: f64 = 1.4;
const MODEL_WEIGHT: f64 = 1.0;
const FRAMING_WEIGHT: f64 = 1.3;
const LIGHTING_WEIGHT: f64 = 1.0;
const SHARPNESS_WEIGHT: f64 = 1.1;

/// Everything the composer reads for one prompt.
#[derive(Debug, Clone, Copy)]
pub struct CompositionInput<'a> {
    pub selection: &'a SelectionResult,
    pub brand: Option<&'a BrandDna>,
    pub user_text: Option<&'a str>,
    pub user_color: Option<&'a str>,
    pub model_gender: ModelGender,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ComposedPrompt {
    pub positive: String,
    pub negative: String,
    pub tokens: Vec<PromptToken>,
}

/// Assemble the positive and negative prompts. Always yields a complete
/// prompt; every missing input falls back to a neutral phrase.
pub fn compose(input: &CompositionInput<'_>) -> ComposedPrompt {
    let selection = input.selection;
    let mut tokens = Vec::new();

    let aesthetic = selection
        .aesthetic()
        .or_else(|| input.brand.map(|b| b.primary_aesthetic.as_str()))
        .unwrap_or(DEFAULT_AESTHETIC);
    tokens.push(PromptToken::new(format!("{aesthetic} style"), STYLE_WEIGHT));

    let garment_type = selection
        .garment_type()
        .or_else(|| input.brand.and_then(|b| b.primary_garments.first()).map(|g| g.name.as_str()));
    let fabric = selection
        .fabric_material()
        .or_else(|| input.brand.and_then(BrandDna::top_fabric));
    tokens.push(PromptToken::new(
        sanitize_garment(&garment_phrase(fabric, garment_type)),
        GARMENT_WEIGHT,
    ));

    for detail in select_details(&selection.construction_details(), garment_type) {
        push_optional(&mut tokens, PromptToken::new(detail, DETAIL_WEIGHT));
    }

    let mut modifiers = Vec::new();
    for modifier in split_modifiers(input.user_text) {
        if !conflicts(&modifier) {
            tokens.push(PromptToken::new(modifier.as_str(), MODIFIER_WEIGHT));
            modifiers.push(modifier);
        }
    }

    if let Some(accessory) = selection.accessories.first() {
        push_optional(
            &mut tokens,
            PromptToken::new(accessory.attribute.label(), ACCESSORY_WEIGHT),
        );
    }

    let user_color = input.user_color.map(str::trim).filter(|c| !c.is_empty());
    let colors = match user_color {
        Some(user_color) => vec![user_color.to_string()],
        None => resolved_colors(input),
    };
    let color_token = match user_color {
        Some(user_color) => PromptToken::new(user_color, USER_COLOR_WEIGHT),
        None if colors.is_empty() => PromptToken::new(NEUTRAL_PALETTE, COLOR_WEIGHT),
        None => PromptToken::new(colors.join(" and "), COLOR_WEIGHT),
    };
    tokens.push(color_token);

    tokens.push(PromptToken::new(model_phrase(input.model_gender), MODEL_WEIGHT));
    for framing in FRAMING_TRIPLE {
        tokens.push(PromptToken::new(framing, FRAMING_WEIGHT));
    }
    for lighting in LIGHTING_TRIPLE {
        tokens.push(PromptToken::new(lighting, LIGHTING_WEIGHT));
    }
    tokens.push(PromptToken::new(SHARPNESS_MARKER, SHARPNESS_WEIGHT));

    let tokens = dedupe(tokens);
    let positive = tokens
        .iter()
        .map(PromptToken::render)
        .collect::<Vec<_>>()
        .join(", ");

    // Only what is actually rendered can request warm red.
    let mentions = colors
        .iter()
        .chain(modifiers.iter())
        .map(String::as_str);
    let negative = negative_prompt(!requests_warm_red(mentions));

    ComposedPrompt {
        positive,
        negative,
        tokens,
    }
}

fn garment_phrase(fabric: Option<&str>, garment_type: Option<&str>) -> String {
    let garment = garment_type.unwrap_or(FALLBACK_GARMENT);
    match fabric {
        Some(fabric) if !garment.to_lowercase().contains(&fabric.to_lowercase()) => {
            format!("{fabric} {garment}")
        }
        _ => garment.to_string(),
    }
}

fn model_phrase(gender: ModelGender) -> &'static str {
    match gender {
        ModelGender::Female => "female fashion model",
        ModelGender::Male => "male fashion model",
        ModelGender::Unspecified => "fashion model",
    }
}

/// Learned colors, or brand signature colors when nothing was selected.
fn resolved_colors(input: &CompositionInput<'_>) -> Vec<String> {
    let selected = input.selection.color_names();
    if !selected.is_empty() {
        return selected.into_iter().map(ToString::to_string).collect();
    }
    input
        .brand
        .map(|b| b.color_names().take(2).map(ToString::to_string).collect())
        .unwrap_or_default()
}

fn split_modifiers(user_text: Option<&str>) -> Vec<String> {
    user_text
        .unwrap_or_default()
        .split([',', ';', '\n'])
        .map(str::trim)
        .filter(|m| !m.is_empty())
        .map(ToString::to_string)
        .collect()
}

fn conflicts(text: &str) -> bool {
    let conflicting = matches_any(text, FRAMING_CONFLICT_TERMS);
    if conflicting {
        tracing::debug!(token = %text, "dropping framing-conflict token");
    }
    conflicting
}

/// Optional sections (details, accessory) are dropped on a framing conflict.
fn push_optional(tokens: &mut Vec<PromptToken>, token: PromptToken) {
    if !conflicts(&token.text) {
        tokens.push(token);
    }
}

/// The garment section is mandatory: conflicting words are cut out of the
/// phrase, and a phrase with nothing left becomes the fallback garment.
fn sanitize_garment(phrase: &str) -> String {
    if !matches_any(phrase, FRAMING_CONFLICT_TERMS) {
        return phrase.to_string();
    }
    let words: Vec<&str> = phrase.split_whitespace().collect();
    let mut kept: Vec<&str> = Vec::with_capacity(words.len());
    let mut i = 0;
    'words: while i < words.len() {
        for term in FRAMING_CONFLICT_TERMS {
            let span = term.split_whitespace().count();
            if i + span <= words.len() && matches_term(&words[i..i + span].join(" "), term) {
                i += span;
                continue 'words;
            }
        }
        kept.push(words[i]);
        i += 1;
    }
    let cleaned = kept.join(" ");
    if cleaned.is_empty() || matches_any(&cleaned, FRAMING_CONFLICT_TERMS) {
        FALLBACK_GARMENT.to_string()
    } else {
        tracing::debug!(garment = %phrase, cleaned = %cleaned, "removed framing-conflict words from garment");
        cleaned
    }
}

fn dedupe(tokens: Vec<PromptToken>) -> Vec<PromptToken> {
    let mut kept: Vec<PromptToken> = Vec::with_capacity(tokens.len());
    for token in tokens {
        if !kept.iter().any(|k| k.text.eq_ignore_ascii_case(&token.text)) {
            kept.push(token);
        }
    }
    kept
}
