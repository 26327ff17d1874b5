use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::core::types::Category;

/// Prior used when a (user, category, attribute) row does not exist yet.
pub const DEFAULT_ALPHA: f64 = 2.0;
pub const DEFAULT_BETA: f64 = 2.0;

/// Beta posterior counters for one attribute. Both fields stay positive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BetaParams {
    pub alpha: f64,
    pub beta: f64,
}

impl Default for BetaParams {
    fn default() -> Self {
        Self {
            alpha: DEFAULT_ALPHA,
            beta: DEFAULT_BETA,
        }
    }
}

impl BetaParams {
    pub fn new(alpha: f64, beta: f64) -> Self {
        Self { alpha, beta }.sanitized()
    }

    /// Replace non-finite or non-positive counters with the default prior.
    pub fn sanitized(self) -> Self {
        let valid = |v: f64| v.is_finite() && v > 0.0;
        Self {
            alpha: if valid(self.alpha) { self.alpha } else { DEFAULT_ALPHA },
            beta: if valid(self.beta) { self.beta } else { DEFAULT_BETA },
        }
    }

    pub fn mean(&self) -> f64 {
        self.alpha / (self.alpha + self.beta)
    }

    pub fn variance(&self) -> f64 {
        let total = self.alpha + self.beta;
        (self.alpha * self.beta) / (total * total * (total + 1.0))
    }

    /// Monotonic update: success bumps alpha, failure bumps beta.
    pub fn record(&mut self, success: bool) {
        if success {
            self.alpha += 1.0;
        } else {
            self.beta += 1.0;
        }
    }
}

/// category → attribute → posterior, for one user. Absent rows are not
/// materialized; read through [`params_for`].
pub type UserParams = BTreeMap<Category, BTreeMap<String, BetaParams>>;

pub fn params_for(params: &UserParams, category: Category, attribute: &str) -> BetaParams {
    params
        .get(&category)
        .and_then(|by_attr| by_attr.get(attribute))
        .copied()
        .map(BetaParams::sanitized)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_prior_is_two_two() {
        let p = BetaParams::default();
        assert!((p.mean() - 0.5).abs() < 1e-12);
        assert!((p.variance() - 0.05).abs() < 1e-12);
    }

    #[test]
    fn record_is_monotonic() {
        let mut p = BetaParams::default();
        p.record(true);
        p.record(false);
        p.record(true);
        assert!((p.alpha - 4.0).abs() < f64::EPSILON);
        assert!((p.beta - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn invalid_counters_fall_back_to_prior() {
        let p = BetaParams::new(-1.0, f64::NAN);
        assert_eq!(p, BetaParams::default());
        let p = BetaParams::new(5.0, 0.0);
        assert!((p.alpha - 5.0).abs() < f64::EPSILON);
        assert!((p.beta - DEFAULT_BETA).abs() < f64::EPSILON);
    }

    #[test]
    fn missing_rows_read_as_default() {
        let mut params = UserParams::new();
        params
            .entry(Category::Color)
            .or_default()
            .insert("navy".into(), BetaParams::new(9.0, 3.0));
        assert!((params_for(&params, Category::Color, "navy").alpha - 9.0).abs() < f64::EPSILON);
        assert_eq!(params_for(&params, Category::Color, "teal"), BetaParams::default());
        assert_eq!(params_for(&params, Category::Fabric, "navy"), BetaParams::default());
    }
}
