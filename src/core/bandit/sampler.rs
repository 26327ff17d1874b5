//! Thompson-sampling attribute selection with a per-request explore/exploit
//! decision.
//!
//! Notes:
//! - The mode is decided once per request ([`decide_mode`]) and threaded
//!   through every category, so one request never mixes modes.
//! - Randomness comes from a [`RandomSource`], so selection is reproducible
//!   with a scripted or seeded source.
//! - Candidate order is the caller's order; ties keep the earlier key.

use serde::{Deserialize, Serialize};
use strum::Display;

use super::params::{BetaParams, UserParams, params_for};
use super::random::{RandomSource, standard_normal};
use crate::core::descriptor::rules::matches_term;
use crate::core::types::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SelectionMode {
    /// Ignore posteriors; uniform draw with brand-biased weights.
    Explore,
    /// Highest (bias-adjusted) posterior sample wins.
    Exploit,
}

/// Draw once: explore with probability `creativity`.
///
/// Non-finite creativity counts as 0; values outside `[0, 1]` are clamped.
pub fn decide_mode<R: RandomSource + ?Sized>(creativity: f64, rng: &mut R) -> SelectionMode {
    let creativity = if creativity.is_finite() {
        creativity.clamp(0.0, 1.0)
    } else {
        0.0
    };
    if rng.next_unit() < creativity {
        SelectionMode::Explore
    } else {
        SelectionMode::Exploit
    }
}

/// One Beta(alpha, beta) draw by normal approximation, clamped to `[0, 1]`.
pub fn beta_sample<R: RandomSource + ?Sized>(params: BetaParams, rng: &mut R) -> f64 {
    let params = params.sanitized();
    let z = standard_normal(rng);
    let sample = params.mean() + z * params.variance().sqrt();
    if sample.is_finite() {
        sample.clamp(0.0, 1.0)
    } else {
        params.mean()
    }
}

/// True when `key` is named by any bias entry.
pub fn is_biased(key: &str, bias: &[String]) -> bool {
    bias.iter().any(|b| matches_term(key, b))
}

/// Per-request selector over one user's posteriors.
pub struct SamplingEngine<'a, R: RandomSource + ?Sized> {
    mode: SelectionMode,
    params: &'a UserParams,
    bias_strength: f64,
    rng: &'a mut R,
}

impl<'a, R: RandomSource + ?Sized> SamplingEngine<'a, R> {
    pub fn new(
        mode: SelectionMode,
        params: &'a UserParams,
        bias_strength: f64,
        rng: &'a mut R,
    ) -> Self {
        let bias_strength = if bias_strength.is_finite() {
            bias_strength.max(0.0)
        } else {
            0.0
        };
        Self {
            mode,
            params,
            bias_strength,
            rng,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    /// Pick one winner. Empty candidates yield `None`; a single candidate
    /// always wins.
    pub fn sample_category(
        &mut self,
        category: Category,
        candidates: &[String],
        bias: &[String],
    ) -> Option<String> {
        let candidates = distinct(candidates);
        match candidates.len() {
            0 => None,
            1 => Some(candidates[0].to_string()),
            _ => {
                let picked = match self.mode {
                    SelectionMode::Exploit => self
                        .scored(category, &candidates, bias)
                        .into_iter()
                        .fold(None::<(&str, f64)>, |best, (key, score)| match best {
                            Some((_, best_score)) if best_score >= score => best,
                            _ => Some((key, score)),
                        })
                        .map(|(key, _)| key),
                    SelectionMode::Explore => {
                        let weights = self.weights(&candidates, bias);
                        self.weighted_index(&weights).map(|i| candidates[i])
                    }
                };
                tracing::debug!(%category, mode = %self.mode, ?picked, "sampled category");
                picked.map(ToString::to_string)
            }
        }
    }

    /// Pick up to `n` distinct winners, best first.
    pub fn sample_multiple(
        &mut self,
        category: Category,
        candidates: &[String],
        bias: &[String],
        n: usize,
    ) -> Vec<String> {
        let candidates = distinct(candidates);
        if n == 0 || candidates.is_empty() {
            return Vec::new();
        }
        if candidates.len() == 1 {
            return vec![candidates[0].to_string()];
        }

        let picked: Vec<&str> = match self.mode {
            SelectionMode::Exploit => {
                let mut scored = self.scored(category, &candidates, bias);
                // Stable sort keeps candidate order among equal scores.
                scored.sort_by(|a, b| b.1.total_cmp(&a.1));
                scored.into_iter().take(n).map(|(key, _)| key).collect()
            }
            SelectionMode::Explore => {
                let mut weights = self.weights(&candidates, bias);
                let mut out = Vec::with_capacity(n.min(candidates.len()));
                while out.len() < n {
                    let Some(index) = self.weighted_index(&weights) else {
                        break;
                    };
                    out.push(candidates[index]);
                    // Without replacement.
                    weights[index] = 0.0;
                }
                out
            }
        };
        tracing::debug!(%category, mode = %self.mode, ?picked, "sampled multiple");
        picked.into_iter().map(ToString::to_string).collect()
    }

    fn scored<'c>(
        &mut self,
        category: Category,
        candidates: &[&'c str],
        bias: &[String],
    ) -> Vec<(&'c str, f64)> {
        candidates
            .iter()
            .map(|key| {
                let posterior = params_for(self.params, category, key);
                let mut score = beta_sample(posterior, &mut *self.rng);
                if is_biased(key, bias) {
                    score *= 1.0 + self.bias_strength;
                }
                (*key, score)
            })
            .collect()
    }

    fn weights(&self, candidates: &[&str], bias: &[String]) -> Vec<f64> {
        candidates
            .iter()
            .map(|key| {
                if is_biased(key, bias) {
                    1.0 + self.bias_strength
                } else {
                    1.0
                }
            })
            .collect()
    }

    fn weighted_index(&mut self, weights: &[f64]) -> Option<usize> {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return None;
        }
        let target = self.rng.next_unit() * total;
        let mut cumulative = 0.0;
        let mut last_live = None;
        for (index, weight) in weights.iter().enumerate() {
            if *weight <= 0.0 {
                continue;
            }
            cumulative += weight;
            last_live = Some(index);
            if target < cumulative {
                return Some(index);
            }
        }
        last_live
    }
}

fn distinct(candidates: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if !out.contains(&candidate.as_str()) {
            out.push(candidate);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::bandit::random::{RngSource, ScriptedRandom};
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn keys(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| (*s).to_string()).collect()
    }

    fn params(rows: &[(&str, f64, f64)]) -> UserParams {
        let mut params = UserParams::new();
        for (key, alpha, beta) in rows {
            params
                .entry(Category::Color)
                .or_default()
                .insert((*key).to_string(), BetaParams::new(*alpha, *beta));
        }
        params
    }

    #[test]
    fn mode_follows_creativity_threshold() {
        let mut rng = ScriptedRandom::new(vec![0.2]);
        assert_eq!(decide_mode(0.3, &mut rng), SelectionMode::Explore);
        let mut rng = ScriptedRandom::new(vec![0.3]);
        assert_eq!(decide_mode(0.3, &mut rng), SelectionMode::Exploit);
    }

    #[test]
    fn invalid_creativity_never_explores() {
        let mut rng = ScriptedRandom::new(vec![0.0]);
        assert_eq!(decide_mode(-5.0, &mut rng), SelectionMode::Exploit);
        assert_eq!(decide_mode(f64::NAN, &mut rng), SelectionMode::Exploit);
    }

    #[test]
    fn empty_candidates_are_not_errors() {
        let p = UserParams::new();
        let mut rng = ScriptedRandom::new(vec![0.5]);
        let mut engine = SamplingEngine::new(SelectionMode::Exploit, &p, 0.3, &mut rng);
        assert_eq!(engine.sample_category(Category::Color, &[], &[]), None);
        assert!(engine.sample_multiple(Category::Color, &[], &[], 3).is_empty());
    }

    #[test]
    fn single_candidate_always_wins() {
        let p = UserParams::new();
        for mode in [SelectionMode::Explore, SelectionMode::Exploit] {
            let mut rng = ScriptedRandom::new(vec![0.99]);
            let mut engine = SamplingEngine::new(mode, &p, 0.3, &mut rng);
            assert_eq!(
                engine.sample_category(Category::Color, &keys(&["navy"]), &[]),
                Some("navy".to_string())
            );
        }
    }

    #[test]
    fn exploit_picks_highest_adjusted_sample() {
        let p = params(&[("black", 3.0, 9.0), ("navy", 12.0, 2.0), ("olive", 6.0, 6.0)]);
        let candidates = keys(&["black", "navy", "olive"]);
        let script = ScriptedRandom::new(vec![0.37, 0.81, 0.12, 0.64, 0.58, 0.09]);

        let mut replay = script.clone();
        let expected = candidates
            .iter()
            .map(|k| (k.clone(), beta_sample(params_for(&p, Category::Color, k), &mut replay)))
            .fold(None::<(String, f64)>, |best, (k, s)| match best {
                Some((_, bs)) if bs >= s => best,
                _ => Some((k, s)),
            })
            .map(|(k, _)| k);

        let mut rng = script;
        let mut engine = SamplingEngine::new(SelectionMode::Exploit, &p, 0.3, &mut rng);
        assert_eq!(engine.sample_category(Category::Color, &candidates, &[]), expected);
    }

    #[test]
    fn bias_can_flip_exploit_winner() {
        // Identical posteriors and identical draws: every raw sample ties, so
        // the bias multiplier decides.
        let p = params(&[("black", 4.0, 4.0), ("navy", 4.0, 4.0)]);
        let candidates = keys(&["black", "navy"]);

        let mut rng = ScriptedRandom::new(vec![0.5, 0.25]);
        let mut engine = SamplingEngine::new(SelectionMode::Exploit, &p, 0.3, &mut rng);
        assert_eq!(
            engine.sample_category(Category::Color, &candidates, &[]),
            Some("black".into())
        );

        let mut rng = ScriptedRandom::new(vec![0.5, 0.25]);
        let mut engine = SamplingEngine::new(SelectionMode::Exploit, &p, 0.3, &mut rng);
        assert_eq!(
            engine.sample_category(Category::Color, &candidates, &keys(&["navy"])),
            Some("navy".into())
        );
    }

    #[test]
    fn explore_ignores_posteriors() {
        let p = params(&[("black", 500.0, 1.0), ("navy", 1.0, 500.0)]);
        let candidates = keys(&["black", "navy"]);
        // 0.75 * total(2.0) = 1.5 lands in navy's slot.
        let mut rng = ScriptedRandom::new(vec![0.75]);
        let mut engine = SamplingEngine::new(SelectionMode::Explore, &p, 0.3, &mut rng);
        assert_eq!(
            engine.sample_category(Category::Color, &candidates, &[]),
            Some("navy".into())
        );
    }

    #[test]
    fn explore_bias_widens_slot() {
        let p = UserParams::new();
        let candidates = keys(&["black", "navy"]);
        // Weights 2.0 / 1.0, total 3.0; 0.6 * 3.0 = 1.8 falls in black's slot.
        let mut rng = ScriptedRandom::new(vec![0.6]);
        let mut engine = SamplingEngine::new(SelectionMode::Explore, &p, 1.0, &mut rng);
        assert_eq!(
            engine.sample_category(Category::Color, &candidates, &keys(&["black"])),
            Some("black".into())
        );
    }

    #[test]
    fn exploit_top_n_ranks_descending() {
        let p = params(&[("black", 2.0, 40.0), ("navy", 40.0, 2.0), ("olive", 20.0, 20.0)]);
        let mut rng = RngSource(StdRng::seed_from_u64(11));
        let mut engine = SamplingEngine::new(SelectionMode::Exploit, &p, 0.0, &mut rng);
        let picked = engine.sample_multiple(
            Category::Color,
            &keys(&["black", "navy", "olive"]),
            &[],
            2,
        );
        assert_eq!(picked, keys(&["navy", "olive"]));
    }

    #[test]
    fn explore_top_n_without_replacement() {
        let p = UserParams::new();
        let mut rng = ScriptedRandom::new(vec![0.0]);
        let mut engine = SamplingEngine::new(SelectionMode::Explore, &p, 0.3, &mut rng);
        let picked =
            engine.sample_multiple(Category::Color, &keys(&["a", "b", "c"]), &[], 5);
        assert_eq!(picked, keys(&["a", "b", "c"]));
    }

    proptest! {
        #[test]
        fn beta_sample_stays_in_unit_interval(
            alpha in 1e-6f64..1e6,
            beta in 1e-6f64..1e6,
            seed in any::<u64>(),
        ) {
            let mut rng = RngSource(StdRng::seed_from_u64(seed));
            let s = beta_sample(BetaParams::new(alpha, beta), &mut rng);
            prop_assert!((0.0..=1.0).contains(&s));
        }

        #[test]
        fn sample_multiple_is_bounded_and_distinct(
            names in proptest::collection::vec("[a-e]{1,2}", 0..12),
            n in 0usize..6,
            explore in any::<bool>(),
            seed in any::<u64>(),
        ) {
            let p = UserParams::new();
            let mode = if explore { SelectionMode::Explore } else { SelectionMode::Exploit };
            let mut rng = RngSource(StdRng::seed_from_u64(seed));
            let mut engine = SamplingEngine::new(mode, &p, 0.5, &mut rng);
            let picked = engine.sample_multiple(Category::Color, &names, &[], n);
            prop_assert!(picked.len() <= n);
            let mut dedup = picked.clone();
            dedup.sort();
            dedup.dedup();
            prop_assert_eq!(dedup.len(), picked.len());
            for key in &picked {
                prop_assert!(names.contains(key));
            }
        }
    }
}
