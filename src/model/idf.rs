// IDF heuristic — a single non-iterative pass.
//
// A word scores log(places / occurrences): words that appear everywhere
// score 0, words unique to one place score highest. Scores are normalized
// per place. Repeated words can push occurrences above the place count; such
// negative scores are clamped to 0.

use rayon::prelude::*;

use super::index::CorpusIndex;
use super::posterior::{normalize, WordProbabilities};

/// log(places / occurrences(word)), clamped at 0. Unknown words score 0.
pub fn idf(index: &CorpusIndex, word: &str) -> f64 {
    let occurrences = index.occurrences(word).len();
    if occurrences == 0 {
        return 0.0;
    }
    (index.place_count() as f64 / occurrences as f64).ln().max(0.0)
}

fn idf_posterior(index: &CorpusIndex, posterior: &WordProbabilities) -> Option<Vec<f64>> {
    let mut values: Vec<f64> = posterior.words().map(|w| idf(index, w)).collect();
    normalize(&mut values).then_some(values)
}

/// Overwrite every posterior with its normalized IDF scores. Places whose
/// words all score 0 keep their previous values.
pub(crate) fn idf_pass(index: &mut CorpusIndex) {
    let shared: &CorpusIndex = index;
    let updates: Vec<Option<Vec<f64>>> = shared
        .posteriors()
        .par_iter()
        .map(|posterior| idf_posterior(shared, posterior))
        .collect();

    let (posteriors, _) = index.posteriors_mut();
    posteriors
        .par_iter_mut()
        .zip(updates)
        .for_each(|(posterior, update)| {
            if let Some(values) = update {
                posterior.assign(&values);
            }
        });
}
