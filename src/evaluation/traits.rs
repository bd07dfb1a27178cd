// Posterior source trait — lets the evaluator score any model output.
//
// The engine is the usual source, but a plain map of precomputed posteriors
// (e.g. loaded from a previous run) works just as well.

use std::collections::HashMap;

use crate::model::{CoreWordEngine, WordProbabilities};
use crate::places::models::PlaceId;

pub trait PosteriorSource {
    /// Posterior of the place with this id, if it was scored.
    fn posterior(&self, id: PlaceId) -> Option<&WordProbabilities>;
}

impl PosteriorSource for CoreWordEngine {
    fn posterior(&self, id: PlaceId) -> Option<&WordProbabilities> {
        CoreWordEngine::posterior(self, id)
    }
}

impl PosteriorSource for HashMap<PlaceId, WordProbabilities> {
    fn posterior(&self, id: PlaceId) -> Option<&WordProbabilities> {
        self.get(&id)
    }
}
