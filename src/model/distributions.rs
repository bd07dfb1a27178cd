// Global core/background distributions and per-tile backgrounds.
//
// Values are per-word component weights. They are not forced to sum to 1
// over the vocabulary, and words are seeded with a neutral weight when they
// first enter the index.

use std::collections::HashMap;

use crate::tiling::TileId;

use super::index::{CorpusIndex, Registration};
use super::BackgroundPrior;

/// Weight given to a word when it first enters the vocabulary.
pub const NEUTRAL_SEED: f64 = 1.0;

pub type WordDistribution = HashMap<String, f64>;

#[derive(Debug, Default, Clone)]
pub struct Distributions {
    pub core: WordDistribution,
    pub background: WordDistribution,
    pub tiles: HashMap<TileId, WordDistribution>,
}

impl Distributions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed slots for a freshly indexed place: new vocabulary words get the
    /// neutral weight, and the place's tile gets a slot for each of its words.
    /// Existing weights are left alone.
    pub fn seed(&mut self, registration: &Registration) {
        for word in &registration.new_words {
            self.core.insert(word.clone(), NEUTRAL_SEED);
            self.background.insert(word.clone(), NEUTRAL_SEED);
        }
        if let Some(tile) = registration.tile {
            let tile_distribution = self.tiles.entry(tile).or_default();
            for word in &registration.words {
                tile_distribution.entry(word.clone()).or_insert(0.0);
            }
        }
    }

    /// Reset every distribution to the EM starting point.
    ///
    /// Core is always uniform over the vocabulary. Background is either
    /// uniform too (global: 1/|V|, tile: 1/distinct words in tile) or
    /// proportional to occurrence counts, depending on `prior`.
    pub fn initialize(&mut self, index: &CorpusIndex, prior: BackgroundPrior) {
        let vocabulary_size = self.core.len();
        if vocabulary_size == 0 {
            return;
        }
        let uniform = 1.0 / vocabulary_size as f64;
        for weight in self.core.values_mut() {
            *weight = uniform;
        }

        match prior {
            BackgroundPrior::Uniform => {
                for weight in self.background.values_mut() {
                    *weight = uniform;
                }
                for distribution in self.tiles.values_mut() {
                    let tile_uniform = 1.0 / distribution.len() as f64;
                    for weight in distribution.values_mut() {
                        *weight = tile_uniform;
                    }
                }
            }
            BackgroundPrior::Frequency => {
                let total = index.total_occurrences().max(1) as f64;
                for (word, weight) in self.background.iter_mut() {
                    *weight = index.occurrences(word).len() as f64 / total;
                }
                for (tile, distribution) in self.tiles.iter_mut() {
                    let counts: Vec<usize> = distribution
                        .keys()
                        .map(|word| tile_occurrences(index, *tile, word))
                        .collect();
                    let tile_total = counts.iter().sum::<usize>().max(1) as f64;
                    for (weight, count) in distribution.values_mut().zip(counts) {
                        *weight = count as f64 / tile_total;
                    }
                }
            }
        }
    }

    /// Background distribution a place should be scored against: its tile's
    /// when `use_tiles` is set and the tile is known, the global one otherwise.
    pub fn background_for(&self, use_tiles: bool, tile: Option<TileId>) -> &WordDistribution {
        match tile {
            Some(tile) if use_tiles => self.tiles.get(&tile).unwrap_or(&self.background),
            _ => &self.background,
        }
    }

    pub fn core_weight(&self, word: &str) -> f64 {
        self.core.get(word).copied().unwrap_or(0.0)
    }

    pub fn background_weight(&self, word: &str) -> f64 {
        self.background.get(word).copied().unwrap_or(0.0)
    }

    pub fn tile_weight(&self, tile: TileId, word: &str) -> Option<f64> {
        self.tiles.get(&tile).and_then(|d| d.get(word).copied())
    }
}

/// Occurrences of `word` in places that sit in `tile`.
pub(crate) fn tile_occurrences(index: &CorpusIndex, tile: TileId, word: &str) -> usize {
    index
        .occurrences(word)
        .iter()
        .filter(|&&slot| index.tile_of(slot) == Some(tile))
        .count()
}
