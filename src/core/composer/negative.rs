use crate::core::descriptor::rules::{WARM_RED_TERMS, matches_any};

pub const BASELINE_CLAUSE: &str = "blurry, low quality, jpeg artifacts, distorted anatomy, extra limbs, \
deformed hands, disfigured face, watermark, text, back view, rear view";

pub const NON_FRONTAL_CLAUSE: &str = "side view, profile view, three-quarter view, turned away, \
looking away, over the shoulder, cropped body, close-up, headshot, half body, cut off feet, out of frame";

pub const WARM_RED_CLAUSE: &str = "red tones, warm red color cast, burgundy tint, reddish skin tones";

/// True when any resolved color or modifier names a warm-red family term.
pub fn requests_warm_red<'a>(mentions: impl IntoIterator<Item = &'a str>) -> bool {
    mentions
        .into_iter()
        .any(|text| matches_any(text, WARM_RED_TERMS))
}

pub fn negative_prompt(include_warm_red: bool) -> String {
    let mut clauses = vec![BASELINE_CLAUSE, NON_FRONTAL_CLAUSE];
    if include_warm_red {
        clauses.push(WARM_RED_CLAUSE);
    }
    clauses.join(", ")
}
