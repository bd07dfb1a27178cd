// Vocabulary, inverted index, and per-place posterior slots.
//
// Every indexed place gets a dense slot number. Posteriors and tile ids live
// in slot-indexed vectors so the E-step can hand each parallel task exactly
// one slot; the inverted index stores slots, one entry per occurrence.

use std::collections::{HashMap, HashSet};

use crate::places::models::{Place, PlaceId};
use crate::tiling::TileId;

use super::posterior::WordProbabilities;
use super::vocabulary::tokenize;

/// What changed when a place was indexed for the first time.
#[derive(Debug, Clone)]
pub struct Registration {
    pub slot: usize,
    pub tile: Option<TileId>,
    /// Distinct normalized words of the title, in title order
    pub words: Vec<String>,
    /// Words that were not in the vocabulary before this place
    pub new_words: Vec<String>,
}

#[derive(Debug, Default)]
pub struct CorpusIndex {
    vocabulary: HashSet<String>,
    inverted: HashMap<String, Vec<usize>>,
    slots: HashMap<PlaceId, usize>,
    ids: Vec<PlaceId>,
    tiles: Vec<Option<TileId>>,
    posteriors: Vec<WordProbabilities>,
    /// Word occurrences across all titles, repeats included
    total_occurrences: usize,
}

impl CorpusIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index `place` under `tile`. Returns `None` (and changes nothing) if
    /// the place id is already indexed.
    pub fn register(&mut self, place: &Place, tile: Option<TileId>) -> Option<Registration> {
        if self.slots.contains_key(&place.id) {
            return None;
        }

        let slot = self.ids.len();
        let mut posterior = WordProbabilities::new();
        let mut words = Vec::new();
        let mut new_words = Vec::new();

        for token in tokenize(&place.title) {
            if self.vocabulary.insert(token.clone()) {
                self.inverted.insert(token.clone(), Vec::new());
                new_words.push(token.clone());
            }
            if let Some(bucket) = self.inverted.get_mut(&token) {
                bucket.push(slot);
            }
            if posterior.insert_word(&token) {
                words.push(token);
            }
            self.total_occurrences += 1;
        }

        self.slots.insert(place.id, slot);
        self.ids.push(place.id);
        self.tiles.push(tile);
        self.posteriors.push(posterior);

        Some(Registration {
            slot,
            tile,
            words,
            new_words,
        })
    }

    pub fn contains_place(&self, id: PlaceId) -> bool {
        self.slots.contains_key(&id)
    }

    pub fn slot_of(&self, id: PlaceId) -> Option<usize> {
        self.slots.get(&id).copied()
    }

    pub fn place_id(&self, slot: usize) -> PlaceId {
        self.ids[slot]
    }

    pub fn tile_of(&self, slot: usize) -> Option<TileId> {
        self.tiles[slot]
    }

    pub fn posterior(&self, slot: usize) -> &WordProbabilities {
        &self.posteriors[slot]
    }

    pub fn posterior_of(&self, id: PlaceId) -> Option<&WordProbabilities> {
        self.slot_of(id).map(|slot| &self.posteriors[slot])
    }

    pub fn posteriors(&self) -> &[WordProbabilities] {
        &self.posteriors
    }

    pub fn tiles(&self) -> &[Option<TileId>] {
        &self.tiles
    }

    /// Posterior slots for mutation, alongside the read-only tile column.
    pub(crate) fn posteriors_mut(&mut self) -> (&mut [WordProbabilities], &[Option<TileId>]) {
        (&mut self.posteriors, &self.tiles)
    }

    /// Slots of the places containing `word`, one per occurrence.
    pub fn occurrences(&self, word: &str) -> &[usize] {
        self.inverted.get(word).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn vocabulary(&self) -> &HashSet<String> {
        &self.vocabulary
    }

    pub fn contains_word(&self, word: &str) -> bool {
        self.vocabulary.contains(word)
    }

    pub fn place_count(&self) -> usize {
        self.ids.len()
    }

    pub fn total_occurrences(&self) -> usize {
        self.total_occurrences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_builds_vocabulary_and_index() {
        let mut index = CorpusIndex::new();
        let reg = index.register(&Place::new(1, "Central Park"), None).unwrap();
        assert_eq!(reg.slot, 0);
        assert_eq!(reg.new_words, vec!["central", "park"]);

        let reg = index.register(&Place::new(2, "Hyde Park"), None).unwrap();
        assert_eq!(reg.slot, 1);
        assert_eq!(reg.new_words, vec!["hyde"]);

        assert_eq!(index.vocabulary().len(), 3);
        assert_eq!(index.occurrences("park"), &[0, 1]);
        assert_eq!(index.total_occurrences(), 4);
        assert_eq!(index.posterior(0).get("park"), Some(0.0));
    }

    #[test]
    fn test_register_is_idempotent() {
        let mut index = CorpusIndex::new();
        let place = Place::new(1, "Central Park");
        assert!(index.register(&place, None).is_some());
        assert!(index.register(&place, None).is_none());
        assert_eq!(index.place_count(), 1);
        assert_eq!(index.total_occurrences(), 2);
    }

    #[test]
    fn test_repeated_word_inflates_bucket_only() {
        let mut index = CorpusIndex::new();
        let reg = index.register(&Place::new(1, "New New York"), None).unwrap();
        assert_eq!(reg.words, vec!["new", "york"]);
        assert_eq!(index.occurrences("new"), &[0, 0]);
        assert_eq!(index.posterior(0).len(), 2);
        assert_eq!(index.total_occurrences(), 3);
    }

    #[test]
    fn test_empty_title_gets_empty_slot() {
        let mut index = CorpusIndex::new();
        let reg = index.register(&Place::new(9, "  "), None).unwrap();
        assert!(reg.words.is_empty());
        assert!(index.posterior(0).is_empty());
        assert_eq!(index.place_count(), 1);
    }
}
