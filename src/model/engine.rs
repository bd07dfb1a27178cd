// Core-word engine — owns the corpus state and drives the estimators.
//
// All mutable model state (index, posteriors, distributions) lives in one
// engine instance. Parallel tasks borrow it for the duration of a single
// step; a step returns only after every task has finished, so no task of
// step N+1 ever overlaps step N.

use anyhow::Result;
use tracing::{debug, info, warn};

use crate::places::models::{Place, PlaceId};
use crate::places::store::PlaceStore;
use crate::tiling::{TileId, Tiler, Tiling};

use super::distributions::Distributions;
use super::expectation::{expectation_step, mixture_posterior, posterior_pass, update_place};
use super::idf::idf_pass;
use super::index::CorpusIndex;
use super::maximization::{maximization_step, update_words};
use super::posterior::WordProbabilities;
use super::{BackgroundPrior, EmParams, Model, RunReport};

/// Snapshot of corpus size, for status output.
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusStats {
    pub places: usize,
    pub vocabulary: usize,
    pub occurrences: usize,
    pub tiles: usize,
    pub untiled_places: usize,
}

pub struct CoreWordEngine {
    store: PlaceStore,
    tiler: Tiler,
    index: CorpusIndex,
    distributions: Distributions,
    params: EmParams,
}

impl CoreWordEngine {
    /// Tile the corpus, index every place, and seed the distributions at the
    /// EM starting point.
    pub fn new(store: PlaceStore, tiling: Tiling, params: EmParams) -> Result<Self> {
        params.validate()?;
        let tiler = Tiler::build(&store, tiling)?;

        let mut engine = Self {
            store,
            tiler,
            index: CorpusIndex::new(),
            distributions: Distributions::new(),
            params,
        };

        let ids: Vec<PlaceId> = engine.store.iter().map(|p| p.id).collect();
        for id in ids {
            engine.index_place(id);
        }
        engine
            .distributions
            .initialize(&engine.index, params.background_prior);

        info!(
            places = engine.index.place_count(),
            vocabulary = engine.index.vocabulary().len(),
            occurrences = engine.index.total_occurrences(),
            tiles = engine.distributions.tiles.len(),
            "Indexed corpus"
        );
        Ok(engine)
    }

    /// Index a store place if it is not indexed yet. Returns false if it
    /// already was (or is unknown to the store).
    fn index_place(&mut self, id: PlaceId) -> bool {
        let Some(place) = self.store.get(id) else {
            return false;
        };
        let tile = self.tiler.tile_id(place);
        match self.index.register(place, tile) {
            Some(registration) => {
                self.distributions.seed(&registration);
                true
            }
            None => false,
        }
    }

    /// `index_place` for a place that joined after the tiler was built, so
    /// it also enters its same-tile bucket.
    fn index_late_place(&mut self, id: PlaceId) -> bool {
        if !self.index_place(id) {
            return false;
        }
        if let Some(place) = self.store.get(id) {
            self.tiler.insert(place);
        }
        true
    }

    /// Add `place` to the corpus after setup.
    ///
    /// Returns false and changes nothing if its id is already indexed. New
    /// words start from the neutral seed; existing distributions keep their
    /// values, so the model is only partially converged for the new place
    /// until the next full run.
    pub fn add_or_update_place(&mut self, place: Place) -> bool {
        let id = place.id;
        if self.index.contains_place(id) {
            return false;
        }
        self.store.insert(place);
        self.index_late_place(id)
    }

    /// Run `model` over the whole corpus.
    ///
    /// EM models alternate E- and M-steps until the largest posterior change
    /// drops below `threshold` or `max_steps` E-steps have run, then apply the
    /// fixed-weight posterior pass that callers read. IDF is a single pass.
    pub fn run(&mut self, model: Model, max_steps: usize, threshold: f64) -> RunReport {
        if model == Model::Idf {
            idf_pass(&mut self.index);
            let tied_places = self.tied_places();
            info!(model = %model, tied_places, "IDF pass complete");
            return RunReport {
                model,
                steps: 0,
                final_delta: 0.0,
                converged: true,
                tied_places,
            };
        }

        let use_tiles = model.uses_tiles();
        let mut report = RunReport {
            model,
            steps: 0,
            final_delta: f64::INFINITY,
            converged: false,
            tied_places: 0,
        };

        for step in 0..max_steps {
            let delta = {
                let (posteriors, tiles) = self.index.posteriors_mut();
                expectation_step(posteriors, tiles, &self.distributions, use_tiles)
            };
            report.steps = step + 1;
            report.final_delta = delta;
            debug!(model = %model, step = step + 1, delta, "E-step");

            if delta < threshold {
                report.converged = true;
                break;
            }
            maximization_step(
                &self.index,
                &mut self.distributions,
                use_tiles,
                self.params.tile_smoothing,
            );
        }

        let (posteriors, tiles) = self.index.posteriors_mut();
        posterior_pass(
            posteriors,
            tiles,
            &self.distributions,
            use_tiles,
            self.params.mixture_weight,
        );
        report.tied_places = self.tied_places();

        info!(
            model = %model,
            steps = report.steps,
            final_delta = report.final_delta,
            converged = report.converged,
            tied_places = report.tied_places,
            "EM run complete"
        );
        if report.tied_places > 0 && self.params.background_prior == BackgroundPrior::Uniform {
            warn!(
                tied_places = report.tied_places,
                "Uniform background prior cannot separate words that play symmetric roles; \
                 TOPONYM_BACKGROUND_PRIOR=frequency breaks these ties"
            );
        }
        report
    }

    /// Places whose top two words are tied. Such places rank their tied
    /// words in title order.
    fn tied_places(&self) -> usize {
        self.index
            .posteriors()
            .iter()
            .filter(|posterior| posterior.top_is_tied())
            .count()
    }

    /// `run` with the configured step cap and threshold.
    pub fn run_configured(&mut self, model: Model) -> RunReport {
        self.run(model, self.params.max_steps, self.params.threshold)
    }

    /// Posterior for an arbitrary title.
    ///
    /// An unseen title becomes a placeholder place and gets one bounded
    /// name-model pass scoped to it: a single E-step on that place, an M-step
    /// over its words only, and the final posterior formula. A known title
    /// returns the first matching place's current posterior.
    pub fn compute_core_probability(&mut self, title: &str) -> WordProbabilities {
        self.compute_core_probability_at(title, 0)
            .unwrap_or_default()
    }

    /// Like `compute_core_probability`, selecting the `nth` place carrying
    /// the title when several do. `None` if there are fewer than `nth + 1`.
    pub fn compute_core_probability_at(&mut self, title: &str, nth: usize) -> Option<WordProbabilities> {
        let ids = self.store.add_placeholder(title);
        let id = *ids.get(nth)?;
        if self.index_late_place(id) {
            if let Some(slot) = self.index.slot_of(id) {
                self.refine_place(slot);
            }
        }
        self.index.posterior_of(id).cloned()
    }

    fn refine_place(&mut self, slot: usize) {
        let delta = {
            let (posteriors, _) = self.index.posteriors_mut();
            update_place(
                &mut posteriors[slot],
                &self.distributions.core,
                &self.distributions.background,
            )
        };
        debug!(slot, delta, "Single-place E-step");

        if delta >= self.params.threshold {
            let words: Vec<String> = self.index.posterior(slot).words().map(str::to_string).collect();
            update_words(&self.index, &mut self.distributions, &words);
        }

        let (posteriors, _) = self.index.posteriors_mut();
        mixture_posterior(
            &mut posteriors[slot],
            &self.distributions.core,
            &self.distributions.background,
            self.params.mixture_weight,
        );
    }

    pub fn posterior(&self, id: PlaceId) -> Option<&WordProbabilities> {
        self.index.posterior_of(id)
    }

    /// Every indexed place with its posterior, in indexing order.
    pub fn posteriors(&self) -> impl Iterator<Item = (&Place, &WordProbabilities)> {
        self.index
            .posteriors()
            .iter()
            .enumerate()
            .filter_map(move |(slot, posterior)| {
                self.store
                    .get(self.index.place_id(slot))
                    .map(|place| (place, posterior))
            })
    }

    /// Tile of a known place, `None` if unknown or untiled.
    pub fn tile_id(&self, id: PlaceId) -> Option<TileId> {
        self.store.get(id).and_then(|p| self.tiler.tile_id(p))
    }

    pub fn places_in_same_tile(&self, id: PlaceId) -> &[PlaceId] {
        match self.store.get(id) {
            Some(place) => self.tiler.places_in_same_tile(place),
            None => &[],
        }
    }

    pub fn stats(&self) -> CorpusStats {
        CorpusStats {
            places: self.index.place_count(),
            vocabulary: self.index.vocabulary().len(),
            occurrences: self.index.total_occurrences(),
            tiles: self.distributions.tiles.len(),
            untiled_places: self.index.tiles().iter().filter(|t| t.is_none()).count(),
        }
    }

    pub fn store(&self) -> &PlaceStore {
        &self.store
    }

    pub fn tiler(&self) -> &Tiler {
        &self.tiler
    }

    pub fn index(&self) -> &CorpusIndex {
        &self.index
    }

    pub fn distributions(&self) -> &Distributions {
        &self.distributions
    }

    pub fn params(&self) -> &EmParams {
        &self.params
    }
}
