//! Keyword → category rule tables.
//!
//! Every place that infers a category from free text goes through these
//! tables so the inference can be tested on its own.

use crate::core::types::DetailCategory;

/// One row of a rule table: any keyword match yields `value`.
#[derive(Debug, Clone, Copy)]
pub struct KeywordRule<T: 'static> {
    pub keywords: &'static [&'static str],
    pub value: T,
}

/// First matching rule wins, so more specific families come first.
pub const DETAIL_RULES: &[KeywordRule<DetailCategory>] = &[
    KeywordRule {
        keywords: &["pocket", "pouch"],
        value: DetailCategory::Pockets,
    },
    KeywordRule {
        keywords: &["sleeve", "cuff", "raglan", "puff sleeve", "armhole"],
        value: DetailCategory::Sleeves,
    },
    KeywordRule {
        keywords: &[
            "zip", "zipper", "button", "snap", "placket", "toggle", "closure", "hook", "drawstring",
            "wrap", "lace-up",
        ],
        value: DetailCategory::Closure,
    },
    KeywordRule {
        keywords: &[
            "hardware", "buckle", "rivet", "grommet", "d-ring", "eyelet", "stud", "clasp", "chain",
        ],
        value: DetailCategory::Hardware,
    },
    KeywordRule {
        keywords: &[
            "silhouette", "oversized", "fitted", "boxy", "a-line", "slim", "relaxed", "tailored",
            "shoulder", "peplum", "wide-leg", "straight-leg", "flared", "draped", "structured",
        ],
        value: DetailCategory::Silhouette,
    },
];

/// Broad garment family, used to pick fallback design details.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GarmentClass {
    Dress,
    Outerwear,
    Top,
    Bottom,
    Other,
}

pub const GARMENT_CLASS_RULES: &[KeywordRule<GarmentClass>] = &[
    KeywordRule {
        keywords: &["dress", "gown", "jumpsuit"],
        value: GarmentClass::Dress,
    },
    KeywordRule {
        keywords: &[
            "jacket", "coat", "bomber", "blazer", "parka", "trench", "vest", "gilet", "anorak",
            "puffer",
        ],
        value: GarmentClass::Outerwear,
    },
    KeywordRule {
        keywords: &[
            "shirt", "blouse", "top", "tee", "t-shirt", "sweater", "hoodie", "knit", "cardigan",
            "tank",
        ],
        value: GarmentClass::Top,
    },
    KeywordRule {
        keywords: &["pant", "trouser", "jean", "skirt", "short", "legging", "culotte"],
        value: GarmentClass::Bottom,
    },
];

impl GarmentClass {
    /// Design details injected when the data yields fewer than three.
    pub fn fallback_details(self) -> &'static [(DetailCategory, &'static str)] {
        match self {
            Self::Dress => &[
                (DetailCategory::Silhouette, "fitted bodice"),
                (DetailCategory::Silhouette, "fluid skirt"),
                (DetailCategory::Closure, "concealed back zip"),
            ],
            Self::Outerwear => &[
                (DetailCategory::Silhouette, "structured shoulders"),
                (DetailCategory::Closure, "front zip closure"),
                (DetailCategory::Pockets, "welt pockets"),
            ],
            Self::Top => &[
                (DetailCategory::Silhouette, "clean relaxed fit"),
                (DetailCategory::Sleeves, "finished cuffs"),
                (DetailCategory::Closure, "button placket"),
            ],
            Self::Bottom => &[
                (DetailCategory::Silhouette, "tailored waistband"),
                (DetailCategory::Silhouette, "straight leg"),
                (DetailCategory::Pockets, "slant pockets"),
            ],
            Self::Other => &[
                (DetailCategory::Silhouette, "clean lines"),
                (DetailCategory::Other, "refined finishing"),
                (DetailCategory::Other, "precise tailoring"),
            ],
        }
    }
}

/// Camera-angle phrases that are not frontal.
pub const NON_FRONTAL_ANGLE_TERMS: &[&str] = &[
    "side",
    "back",
    "rear",
    "profile",
    "three-quarter",
    "three quarter",
    "3/4",
    "behind",
    "over the shoulder",
    "over-the-shoulder",
];

/// Gaze/head/position phrases meaning the subject is turned away.
pub const AWAY_TERMS: &[&str] = &[
    "away",
    "turned",
    "turning",
    "profile",
    "averted",
    "over shoulder",
    "over the shoulder",
    "from behind",
    "back to camera",
    "side",
];

/// Phrases that contradict the mandatory frontal full-body framing.
pub const FRAMING_CONFLICT_TERMS: &[&str] = &[
    "crop",
    "cropping",
    "cropped shot",
    "cropped frame",
    "headshot",
    "head shot",
    "close-up",
    "closeup",
    "close up",
    "profile",
    "side view",
    "three-quarter",
    "three quarter",
    "3/4 view",
    "half body",
    "half-body",
    "waist up",
    "waist-up",
    "medium shot",
    "wide shot",
    "long shot",
    "distant",
    "from afar",
    "from behind",
    "back view",
    "rear view",
];

/// Warm-red family; any of these in resolved colors or modifiers lifts the
/// warm-red suppression from the negative prompt.
pub const WARM_RED_TERMS: &[&str] = &[
    "red", "burgundy", "maroon", "scarlet", "crimson", "rust", "wine",
];

/// Whole-word (plural-tolerant) match of `term` inside `text`, case-insensitive.
pub fn matches_term(text: &str, term: &str) -> bool {
    let haystack = text.to_lowercase();
    let needle = term.to_lowercase();
    if needle.is_empty() {
        return false;
    }
    for (start, _) in haystack.match_indices(&needle) {
        let before_ok = haystack[..start]
            .chars()
            .next_back()
            .is_none_or(|c| !c.is_alphanumeric());
        let rest = &haystack[start + needle.len()..];
        let rest = rest
            .strip_prefix("es")
            .filter(|r| r.chars().next().is_none_or(|c| !c.is_alphanumeric()))
            .or_else(|| rest.strip_prefix('s'))
            .unwrap_or(rest);
        let after_ok = rest.chars().next().is_none_or(|c| !c.is_alphanumeric());
        if before_ok && after_ok {
            return true;
        }
    }
    false
}

pub fn matches_any(text: &str, terms: &[&str]) -> bool {
    terms.iter().any(|term| matches_term(text, term))
}

pub fn classify<T: Copy>(text: &str, rules: &[KeywordRule<T>]) -> Option<T> {
    rules
        .iter()
        .find(|rule| matches_any(text, rule.keywords))
        .map(|rule| rule.value)
}

pub fn classify_detail(text: &str) -> DetailCategory {
    classify(text, DETAIL_RULES).unwrap_or(DetailCategory::Other)
}

pub fn classify_garment(text: &str) -> GarmentClass {
    classify(text, GARMENT_CLASS_RULES).unwrap_or(GarmentClass::Other)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn term_match_respects_word_boundaries() {
        assert!(matches_term("Back view", "back"));
        assert!(!matches_term("backpack", "back"));
        assert!(matches_term("two patch pockets", "pocket"));
        assert!(matches_term("zip closures", "closure"));
        assert!(!matches_term("redwood", "red"));
        assert!(matches_term("deep red", "red"));
    }

    #[test]
    fn detail_classification_priority() {
        assert_eq!(classify_detail("zip pocket"), DetailCategory::Pockets);
        assert_eq!(classify_detail("ribbed cuffs"), DetailCategory::Sleeves);
        assert_eq!(classify_detail("two-way zipper"), DetailCategory::Closure);
        assert_eq!(classify_detail("antique brass buckle"), DetailCategory::Hardware);
        assert_eq!(classify_detail("oversized fit"), DetailCategory::Silhouette);
        assert_eq!(classify_detail("contrast topstitching"), DetailCategory::Other);
    }

    #[test]
    fn garment_classification() {
        assert_eq!(classify_garment("nylon bomber jacket"), GarmentClass::Outerwear);
        assert_eq!(classify_garment("shirt dress"), GarmentClass::Dress);
        assert_eq!(classify_garment("wide-leg trousers"), GarmentClass::Bottom);
        assert_eq!(classify_garment("cashmere sweater"), GarmentClass::Top);
        assert_eq!(classify_garment("kimono"), GarmentClass::Other);
    }

    #[test]
    fn every_class_has_three_fallbacks() {
        for class in [
            GarmentClass::Dress,
            GarmentClass::Outerwear,
            GarmentClass::Top,
            GarmentClass::Bottom,
            GarmentClass::Other,
        ] {
            assert_eq!(class.fallback_details().len(), 3);
        }
    }

    #[test]
    fn framing_terms_do_not_hit_mandatory_triple() {
        for mandatory in ["full-body shot", "standing", "facing camera"] {
            assert!(!matches_any(mandatory, FRAMING_CONFLICT_TERMS), "{mandatory}");
        }
    }
}
