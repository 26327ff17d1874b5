use crate::core::brand::BrandDna;
use crate::core::types::SelectionResult;

/// Score reported when no brand DNA is available.
pub const NEUTRAL_SCORE: f64 = 0.5;

const AESTHETIC_WEIGHT: f64 = 0.25;
const COLOR_WEIGHT: f64 = 0.25;
const FABRIC_WEIGHT: f64 = 0.15;
const CONSTRUCTION_WEIGHT: f64 = 0.15;
const SHOT_WEIGHT: f64 = 0.10;
const ANGLE_WEIGHT: f64 = 0.10;
/// Share of the aesthetic weight granted for a secondary-aesthetic match.
const SECONDARY_CREDIT: f64 = 0.5;

/// How well `selection` aligns with `brand`, in `[0, 1]`.
pub fn consistency_score(selection: &SelectionResult, brand: Option<&BrandDna>) -> f64 {
    let Some(brand) = brand else {
        return NEUTRAL_SCORE;
    };

    let aesthetic = selection.aesthetic().map_or(0.0, |aesthetic| {
        if eq(aesthetic, &brand.primary_aesthetic) {
            1.0
        } else if brand.secondary_aesthetics.iter().any(|s| eq(aesthetic, s)) {
            SECONDARY_CREDIT
        } else {
            0.0
        }
    });

    let colors = selection.color_names();
    let color = proportion(colors.iter().copied(), |c| {
        brand.color_names().any(|signature| eq(c, signature))
    });

    let fabric = match (selection.fabric_material(), brand.top_fabric()) {
        (Some(selected), Some(signature)) if eq(selected, signature) => 1.0,
        _ => 0.0,
    };

    let details = selection.construction_details();
    let construction = proportion(details.iter().map(|(_, d)| *d), |d| {
        let detail = d.to_lowercase();
        brand.construction_names().any(|signature| {
            let signature = signature.to_lowercase();
            detail.contains(&signature) || signature.contains(&detail)
        })
    });

    let shot = exact(selection.shot_type(), brand.top_shot_type());
    let angle = exact(selection.camera_angle(), brand.top_angle());

    let score = aesthetic * AESTHETIC_WEIGHT
        + color * COLOR_WEIGHT
        + fabric * FABRIC_WEIGHT
        + construction * CONSTRUCTION_WEIGHT
        + shot * SHOT_WEIGHT
        + angle * ANGLE_WEIGHT;

    if score.is_finite() {
        score.clamp(0.0, 1.0)
    } else {
        NEUTRAL_SCORE
    }
}

fn eq(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

fn exact(selected: Option<&str>, preferred: Option<&str>) -> f64 {
    match (selected, preferred) {
        (Some(s), Some(p)) if eq(s, p) => 1.0,
        _ => 0.0,
    }
}

/// Fraction of `items` satisfying `hit`; zero for no items.
fn proportion<'a>(items: impl Iterator<Item = &'a str>, hit: impl Fn(&str) -> bool) -> f64 {
    let (total, hits) = items.fold((0_u32, 0_u32), |(total, hits), item| {
        (total + 1, hits + u32::from(hit(item)))
    });
    if total == 0 {
        0.0
    } else {
        f64::from(hits) / f64::from(total)
    }
}
