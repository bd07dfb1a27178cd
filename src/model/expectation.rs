// E-step and final posterior pass.
//
// Each place's posterior depends only on its own words and on read-only
// distributions, so places are updated in parallel. The convergence
// statistic is reduced from per-task maxima once the parallel pass ends.

use rayon::prelude::*;

use crate::tiling::TileId;

use super::distributions::{Distributions, WordDistribution};
use super::posterior::{normalize, WordProbabilities};

/// Posteriors below this are snapped to zero after normalization so words
/// that should vanish do not decay forever.
pub const NEGLIGIBLE_PROBABILITY: f64 = 1e-10;

/// Unnormalized core likelihood of each word in `words`.
///
/// The usual form is the importance ratio core(w) / background(w). If any
/// background weight is zero that ratio is undefined, so every word instead
/// gets the joint-likelihood numerator core(w) · Π_{w' ≠ w} background(w').
fn importance_ratios(words: &[&str], core: &WordDistribution, background: &WordDistribution) -> Vec<f64> {
    let core_of = |w: &str| core.get(w).copied().unwrap_or(0.0);
    let background_of = |w: &str| background.get(w).copied().unwrap_or(0.0);

    if words.iter().all(|&w| background_of(w) != 0.0) {
        return words.iter().map(|&w| core_of(w) / background_of(w)).collect();
    }

    words
        .iter()
        .enumerate()
        .map(|(i, &w)| {
            words
                .iter()
                .enumerate()
                .filter(|(j, _)| *j != i)
                .fold(core_of(w), |acc, (_, &other)| acc * background_of(other))
        })
        .collect()
}

/// One E-step on one place. Returns the largest absolute change.
///
/// Single-word titles are unambiguous. When every candidate has zero
/// likelihood the posterior is left as it was.
pub(crate) fn update_place(
    posterior: &mut WordProbabilities,
    core: &WordDistribution,
    background: &WordDistribution,
) -> f64 {
    match posterior.len() {
        0 => 0.0,
        1 => posterior.assign(&[1.0]),
        _ => {
            let words: Vec<&str> = posterior.words().collect();
            let mut values = importance_ratios(&words, core, background);
            if !normalize(&mut values) {
                return 0.0;
            }
            for v in values.iter_mut() {
                if *v < NEGLIGIBLE_PROBABILITY {
                    *v = 0.0;
                }
            }
            normalize(&mut values);
            posterior.assign(&values)
        }
    }
}

/// Run the E-step over every place. Returns the convergence statistic.
pub(crate) fn expectation_step(
    posteriors: &mut [WordProbabilities],
    tiles: &[Option<TileId>],
    distributions: &Distributions,
    use_tiles: bool,
) -> f64 {
    posteriors
        .par_iter_mut()
        .zip(tiles.par_iter())
        .map(|(posterior, tile)| {
            let background = distributions.background_for(use_tiles, *tile);
            update_place(posterior, &distributions.core, background)
        })
        .reduce(|| 0.0, f64::max)
}

/// Fixed-weight Bayesian posterior for one place:
/// π(w) ∝ core(w)·λ / (core(w)·λ + background(w)·(1−λ)).
pub(crate) fn mixture_posterior(
    posterior: &mut WordProbabilities,
    core: &WordDistribution,
    background: &WordDistribution,
    mixture_weight: f64,
) {
    if posterior.is_empty() {
        return;
    }
    let mut values: Vec<f64> = posterior
        .words()
        .map(|w| {
            let c = core.get(w).copied().unwrap_or(0.0) * mixture_weight;
            let b = background.get(w).copied().unwrap_or(0.0) * (1.0 - mixture_weight);
            if c + b > 0.0 {
                c / (c + b)
            } else {
                0.0
            }
        })
        .collect();
    if normalize(&mut values) {
        posterior.assign(&values);
    }
}

/// Final posterior pass over every place, read by callers after a run.
pub(crate) fn posterior_pass(
    posteriors: &mut [WordProbabilities],
    tiles: &[Option<TileId>],
    distributions: &Distributions,
    use_tiles: bool,
    mixture_weight: f64,
) {
    posteriors
        .par_iter_mut()
        .zip(tiles.par_iter())
        .for_each(|(posterior, tile)| {
            let background = distributions.background_for(use_tiles, *tile);
            mixture_posterior(posterior, &distributions.core, background, mixture_weight);
        });
}
