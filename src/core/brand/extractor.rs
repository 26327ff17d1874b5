use chrono::Utc;

use super::types::{BrandDna, DEFAULT_AESTHETIC, ProfileSample, StyleProfile, WeightedValue};
use crate::config::BrandConfig;
use crate::core::descriptor::normalize::{normalize_camera_angle, normalize_lighting, normalize_shot_type};

const SIGNATURE_COLORS: usize = 3;
const SIGNATURE_FABRICS: usize = 3;
const SIGNATURE_CONSTRUCTION: usize = 5;
const PRIMARY_GARMENTS: usize = 5;
const SECONDARY_AESTHETICS: usize = 2;
const PREFERRED_PHOTOGRAPHY: usize = 3;

/// Reported when the profile carries no usable sample.
const UNSAMPLED_CONFIDENCE: f64 = 0.5;

/// Distill brand DNA from a style profile. Absent input (or a disabled
/// extractor) yields `None`; malformed entries are skipped.
pub fn extract(profile: Option<&StyleProfile>, config: &BrandConfig) -> Option<BrandDna> {
    if !config.enabled {
        return None;
    }
    let profile = profile?;

    let themes = rank(&profile.aesthetic_themes, 1 + SECONDARY_AESTHETICS);
    let mut themes = themes.into_iter().map(|v| v.name);
    let primary_aesthetic = themes.next().unwrap_or_else(|| DEFAULT_AESTHETIC.to_string());
    let secondary_aesthetics: Vec<String> = themes.collect();

    let samples: Vec<&ProfileSample> = profile
        .samples
        .iter()
        .filter(|s| s.confidence.is_finite() && s.confidence >= config.min_sample_confidence)
        .take(config.sample_cap.max(1))
        .collect();

    let shot_types = frequencies(
        samples
            .iter()
            .filter_map(|s| s.shot_type.as_deref())
            .map(|s| normalize_shot_type(Some(s))),
    );
    let lighting = frequencies(
        samples
            .iter()
            .filter_map(|s| s.lighting.as_deref())
            .map(|s| normalize_lighting(Some(s))),
    );
    let angles = frequencies(
        samples
            .iter()
            .filter_map(|s| s.camera_angle.as_deref())
            .map(|s| normalize_camera_angle(Some(s))),
    );

    let confidence = if samples.is_empty() {
        UNSAMPLED_CONFIDENCE
    } else {
        #[allow(clippy::cast_precision_loss)]
        let count = samples.len() as f64;
        (samples.iter().map(|s| s.confidence).sum::<f64>() / count).clamp(0.0, 1.0)
    };

    let dna = BrandDna {
        primary_aesthetic,
        secondary_aesthetics,
        signature_colors: rank(&profile.color_distribution, SIGNATURE_COLORS),
        signature_fabrics: rank(&profile.fabric_distribution, SIGNATURE_FABRICS),
        signature_construction: rank(&profile.construction_distribution, SIGNATURE_CONSTRUCTION),
        primary_garments: rank(&profile.garment_distribution, PRIMARY_GARMENTS),
        preferred_shot_types: truncate(shot_types, PREFERRED_PHOTOGRAPHY),
        preferred_lighting: truncate(lighting, PREFERRED_PHOTOGRAPHY),
        preferred_angles: truncate(angles, PREFERRED_PHOTOGRAPHY),
        confidence,
        extracted_at: Utc::now(),
    };

    tracing::debug!(
        primary_aesthetic = %dna.primary_aesthetic,
        colors = dna.signature_colors.len(),
        samples = samples.len(),
        "brand dna extracted"
    );
    Some(dna)
}

/// Merge case-insensitive duplicates, drop unusable weights, sort by weight
/// descending (stable), keep `limit`, and normalize weights to shares of the
/// whole distribution.
fn rank(values: &[WeightedValue], limit: usize) -> Vec<WeightedValue> {
    let mut merged: Vec<WeightedValue> = Vec::new();
    for value in values {
        let name = value.name.trim().to_lowercase();
        if name.is_empty() || !value.weight.is_finite() || value.weight <= 0.0 {
            continue;
        }
        match merged.iter_mut().find(|m| m.name == name) {
            Some(existing) => existing.weight += value.weight,
            None => merged.push(WeightedValue::new(name, value.weight)),
        }
    }

    let total: f64 = merged.iter().map(|v| v.weight).sum();
    merged.sort_by(|a, b| b.weight.total_cmp(&a.weight));
    merged.truncate(limit);
    for value in &mut merged {
        value.weight = (value.weight / total).clamp(0.0, 1.0);
    }
    merged
}

/// Rank values by frequency, first-seen order breaking ties.
fn frequencies(values: impl Iterator<Item = String>) -> Vec<WeightedValue> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for value in values {
        match counts.iter_mut().find(|(name, _)| *name == value) {
            Some((_, count)) => *count += 1,
            None => counts.push((value, 1)),
        }
    }
    let total: usize = counts.iter().map(|(_, c)| c).sum();
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(name, count)| {
            #[allow(clippy::cast_precision_loss)]
            let share = count as f64 / total as f64;
            WeightedValue::new(name, share)
        })
        .collect()
}

fn truncate(mut values: Vec<WeightedValue>, limit: usize) -> Vec<WeightedValue> {
    values.truncate(limit);
    values
}
