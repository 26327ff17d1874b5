use serde::{Deserialize, Serialize};

/// Inclusive bounds for every rendered token weight.
pub const MIN_WEIGHT: f64 = 0.5;
pub const MAX_WEIGHT: f64 = 2.0;

/// Clamp into `[MIN_WEIGHT, MAX_WEIGHT]`; non-finite weights read as 1.0.
pub fn clamp_weight(weight: f64) -> f64 {
    if weight.is_finite() {
        weight.clamp(MIN_WEIGHT, MAX_WEIGHT)
    } else {
        1.0
    }
}

/// Render `(text:w)` with one decimal. Weights below 1.0 are wrapped too.
pub fn format_token(text: &str, weight: f64) -> String {
    format!("({}:{:.1})", text.trim(), clamp_weight(weight))
}

/// One positive-prompt token before rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptToken {
    pub text: String,
    pub weight: f64,
}

impl PromptToken {
    pub fn new(text: impl Into<String>, weight: f64) -> Self {
        Self {
            text: text.into().trim().to_string(),
            weight: clamp_weight(weight),
        }
    }

    pub fn render(&self) -> String {
        format_token(&self.text, self.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn renders_one_decimal() {
        assert_eq!(format_token("nylon bomber jacket", 1.25), "(nylon bomber jacket:1.2)");
        assert_eq!(format_token(" standing ", 1.0), "(standing:1.0)");
    }

    #[test]
    fn out_of_range_weights_are_clamped() {
        assert_eq!(format_token("x", -5.0), "(x:0.5)");
        assert_eq!(format_token("x", 99.0), "(x:2.0)");
        assert_eq!(format_token("x", f64::NAN), "(x:1.0)");
        assert_eq!(format_token("x", f64::INFINITY), "(x:1.0)");
    }

    #[test]
    fn low_weights_are_still_wrapped() {
        assert_eq!(PromptToken::new("silver ring", 0.8).render(), "(silver ring:0.8)");
    }

    proptest! {
        #[test]
        fn weight_always_in_range(weight in proptest::num::f64::ANY) {
            let clamped = clamp_weight(weight);
            prop_assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&clamped));

            let rendered = format_token("t", weight);
            let value: f64 = rendered
                .trim_start_matches("(t:")
                .trim_end_matches(')')
                .parse()
                .unwrap();
            prop_assert!((MIN_WEIGHT..=MAX_WEIGHT).contains(&value));
        }
    }
}
