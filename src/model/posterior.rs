// Per-place posterior — belief that each distinct title word is the core word.
//
// Entries keep title order so iteration (and therefore tie-breaking and
// floating-point summation) is deterministic across runs.

use std::collections::HashMap;

use serde::Serialize;

/// Probability gap under which the top two words count as tied.
pub const TIE_TOLERANCE: f64 = 1e-9;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct WordProbabilities {
    entries: Vec<(String, f64)>,
}

impl WordProbabilities {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `word` with probability 0 unless already present.
    /// Returns true if the word was new to this place.
    pub fn insert_word(&mut self, word: &str) -> bool {
        if self.get(word).is_some() {
            return false;
        }
        self.entries.push((word.to_string(), 0.0));
        true
    }

    pub fn get(&self, word: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(w, _)| w == word)
            .map(|(_, p)| *p)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(w, _)| w.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(w, p)| (w.as_str(), *p))
    }

    pub fn sum(&self) -> f64 {
        self.entries.iter().map(|(_, p)| p).sum()
    }

    /// Words sorted by descending probability. The sort is stable, so tied
    /// words keep title order.
    pub fn ranked(&self) -> Vec<(&str, f64)> {
        let mut ranked: Vec<(&str, f64)> = self.iter().collect();
        ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }

    /// True if the two most probable words are within `TIE_TOLERANCE`, i.e.
    /// the model could not pick a single core word.
    pub fn top_is_tied(&self) -> bool {
        let ranked = self.ranked();
        match ranked.as_slice() {
            [first, second, ..] => first.1 - second.1 < TIE_TOLERANCE,
            _ => false,
        }
    }

    /// Most probable word, if any.
    pub fn top(&self) -> Option<(&str, f64)> {
        self.ranked().into_iter().next()
    }

    /// Overwrite every probability, in entry order. Returns the largest
    /// absolute change.
    pub(crate) fn assign(&mut self, values: &[f64]) -> f64 {
        debug_assert_eq!(values.len(), self.entries.len());
        let mut max_delta = 0.0_f64;
        for ((_, p), &v) in self.entries.iter_mut().zip(values) {
            max_delta = max_delta.max((v - *p).abs());
            *p = v;
        }
        max_delta
    }

    pub fn to_map(&self) -> HashMap<String, f64> {
        self.entries.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<(S, f64)> for WordProbabilities {
    fn from_iter<I: IntoIterator<Item = (S, f64)>>(iter: I) -> Self {
        let mut probabilities = Self::new();
        for (word, p) in iter {
            let word = word.into();
            match probabilities.entries.iter_mut().find(|(w, _)| *w == word) {
                Some(entry) => entry.1 = p,
                None => probabilities.entries.push((word, p)),
            }
        }
        probabilities
    }
}

/// Scale `values` in place to sum to 1. Returns false, leaving them
/// untouched, when the sum is not positive (no usable signal).
pub(crate) fn normalize(values: &mut [f64]) -> bool {
    let sum: f64 = values.iter().sum();
    if sum <= 0.0 || !sum.is_finite() {
        return false;
    }
    for v in values.iter_mut() {
        *v /= sum;
    }
    true
}
