// Precision of the top-ranked candidates against ground truth.
//
// For a record with k annotated core words, the k most probable title words
// are checked in rank order. The record is a hit as soon as one of them is an
// annotated core word AND carries enough probability for its rank: at rank r
// (0-based) it must reach 1/(r+2) − ε, so a first-ranked word needs about
// one half, a second-ranked one about one third, and so on.

use tracing::debug;

use super::ground_truth::{GroundTruth, GroundTruthRecord};
use super::traits::PosteriorSource;

/// Slack on the per-rank confidence floor.
pub const CONFIDENCE_EPSILON: f64 = 1e-3;

/// Minimum probability for a hit at 0-based `rank`.
pub fn confidence_floor(rank: usize) -> f64 {
    (1.0 / (rank as f64 + 2.0) - CONFIDENCE_EPSILON).max(0.0)
}

/// Whether `record` counts as a hit under `source`. Places the source never
/// scored are misses.
pub fn is_hit(record: &GroundTruthRecord, source: &impl PosteriorSource) -> bool {
    let Some(posterior) = source.posterior(record.id) else {
        debug!(id = record.id, "No posterior for ground truth place");
        return false;
    };

    posterior
        .ranked()
        .into_iter()
        .take(record.core_words.len())
        .enumerate()
        .any(|(rank, (word, p))| record.is_core(word) && p >= confidence_floor(rank))
}

/// hits / min(records, max_samples), over the first `max_samples` records.
/// Returns 0 when nothing is evaluated.
pub fn precision(ground_truth: &GroundTruth, source: &impl PosteriorSource, max_samples: usize) -> f64 {
    let evaluated = ground_truth.len().min(max_samples);
    if evaluated == 0 {
        return 0.0;
    }
    let hits = ground_truth
        .records()
        .iter()
        .take(evaluated)
        .filter(|record| is_hit(record, source))
        .count();
    hits as f64 / evaluated as f64
}

/// (sample size, precision) for each requested sample size.
pub fn precision_curve(
    ground_truth: &GroundTruth,
    source: &impl PosteriorSource,
    sample_sizes: &[usize],
) -> Vec<(usize, f64)> {
    sample_sizes
        .iter()
        .map(|&size| (size, precision(ground_truth, source, size)))
        .collect()
}
