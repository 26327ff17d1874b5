//! Front-angle normalization.
//!
//! Generated images must always be frontal. Non-frontal camera angles are
//! rewritten to [`CANONICAL_FRONT_ANGLE`] wherever they are read, and turned
//! poses are tagged [`Facing::Away`] but never rendered as such.

use super::rules::{AWAY_TERMS, NON_FRONTAL_ANGLE_TERMS, matches_any};
use super::types::PoseDescriptor;
use crate::core::types::Facing;

pub const CANONICAL_FRONT_ANGLE: &str = "front";
pub const DEFAULT_SHOT_TYPE: &str = "full body";
pub const DEFAULT_LIGHTING: &str = "studio";

pub fn normalize_camera_angle(angle: Option<&str>) -> String {
    match angle.map(str::trim).filter(|a| !a.is_empty()) {
        Some(angle) if !matches_any(angle, NON_FRONTAL_ANGLE_TERMS) => angle.to_lowercase(),
        _ => CANONICAL_FRONT_ANGLE.to_string(),
    }
}

pub fn facing_of(pose: &PoseDescriptor) -> Facing {
    let signals = [&pose.gaze, &pose.head, &pose.body_position];
    if signals
        .iter()
        .filter_map(|s| s.as_deref())
        .any(|s| matches_any(s, AWAY_TERMS))
    {
        Facing::Away
    } else {
        Facing::Front
    }
}

pub fn normalize_shot_type(shot: Option<&str>) -> String {
    shot.map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| DEFAULT_SHOT_TYPE.to_string(), str::to_lowercase)
}

pub fn normalize_lighting(lighting: Option<&str>) -> String {
    lighting
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map_or_else(|| DEFAULT_LIGHTING.to_string(), str::to_lowercase)
}
