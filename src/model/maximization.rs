// M-step — re-estimate word distributions from the current posteriors.
//
// Every word's estimate reads posteriors through the inverted index, one
// term per occurrence, and writes only that word's slot. Tile backgrounds
// are updated after the global background because they interpolate with it.

use rayon::prelude::*;

use crate::tiling::TileId;

use super::distributions::{Distributions, WordDistribution};
use super::index::CorpusIndex;

/// Σ over occurrences of `word` of π(word).
fn core_mass(index: &CorpusIndex, word: &str) -> f64 {
    index
        .occurrences(word)
        .iter()
        .map(|&slot| index.posterior(slot).get(word).unwrap_or(0.0))
        .sum()
}

/// Σ over occurrences of `word` of 1 − π(word), restricted to `tile` if given.
fn background_mass(index: &CorpusIndex, word: &str, tile: Option<TileId>) -> f64 {
    index
        .occurrences(word)
        .iter()
        .filter(|&&slot| tile.is_none() || index.tile_of(slot) == tile)
        .map(|&slot| 1.0 - index.posterior(slot).get(word).unwrap_or(0.0))
        .sum()
}

/// core(w) = Σ π(w) / number of places.
pub fn core_estimate(index: &CorpusIndex, word: &str) -> f64 {
    let places = index.place_count();
    if places == 0 {
        return 0.0;
    }
    core_mass(index, word) / places as f64
}

/// background(w) = Σ (1 − π(w)) / (word occurrences − places).
///
/// When every title has a single word there are no background slots at all
/// and the estimate is 0.
pub fn background_estimate(index: &CorpusIndex, word: &str) -> f64 {
    let slots = index.total_occurrences() as f64 - index.place_count() as f64;
    if slots <= 0.0 {
        return 0.0;
    }
    background_mass(index, word, None) / slots
}

/// Full-corpus M-step. `use_tiles` additionally refreshes tile backgrounds.
pub(crate) fn maximization_step(
    index: &CorpusIndex,
    distributions: &mut Distributions,
    use_tiles: bool,
    tile_smoothing: f64,
) {
    let Distributions {
        core,
        background,
        tiles,
    } = distributions;

    core.par_iter_mut()
        .for_each(|(word, weight)| *weight = core_estimate(index, word));
    background
        .par_iter_mut()
        .for_each(|(word, weight)| *weight = background_estimate(index, word));

    if use_tiles {
        let global: &WordDistribution = background;
        tiles.par_iter_mut().for_each(|(tile, distribution)| {
            update_tile(index, *tile, distribution, global, tile_smoothing);
        });
    }
}

/// tile(w) = α · (tile-local share of background mass) + (1 − α) · global(w).
///
/// The local share divides the word's in-tile background mass by the
/// in-tile background mass of every word in the tile. A tile with no
/// background mass at all contributes 0 locally.
fn update_tile(
    index: &CorpusIndex,
    tile: TileId,
    distribution: &mut WordDistribution,
    global: &WordDistribution,
    tile_smoothing: f64,
) {
    let mut cells: Vec<(&String, &mut f64)> = distribution.iter_mut().collect();
    let masses: Vec<f64> = cells
        .iter()
        .map(|(word, _)| background_mass(index, word, Some(tile)))
        .collect();
    let total: f64 = masses.iter().sum();

    for ((word, weight), mass) in cells.iter_mut().zip(masses) {
        let local = if total > 0.0 { mass / total } else { 0.0 };
        let global_weight = global.get(word.as_str()).copied().unwrap_or(0.0);
        **weight = tile_smoothing * local + (1.0 - tile_smoothing) * global_weight;
    }
}

/// M-step restricted to `words`, used by the single-place fast path. Tile
/// backgrounds are not touched.
pub(crate) fn update_words(index: &CorpusIndex, distributions: &mut Distributions, words: &[String]) {
    for word in words {
        let core = core_estimate(index, word);
        let background = background_estimate(index, word);
        distributions.core.insert(word.clone(), core);
        distributions.background.insert(word.clone(), background);
    }
}
