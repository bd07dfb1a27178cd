// Core-word model — EM estimation of which title words carry a place's identity.
//
// A title is modelled as one core word drawn from a core distribution plus
// background words drawn from a background distribution (global, or local to
// the place's tile). EM alternates between per-place posteriors (E-step) and
// per-word distribution estimates (M-step).

pub mod distributions;
pub mod engine;
pub mod expectation;
pub mod idf;
pub mod index;
pub mod maximization;
pub mod posterior;
pub mod vocabulary;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;

pub use engine::{CoreWordEngine, CorpusStats};
pub use posterior::WordProbabilities;

/// Which estimator to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Model {
    /// Global background distribution, no spatial signal
    Name,
    /// Background distribution local to the place's tile
    SpatialContext,
    /// Non-iterative inverse-document-frequency heuristic
    Idf,
}

impl Model {
    pub fn as_str(&self) -> &'static str {
        match self {
            Model::Name => "name",
            Model::SpatialContext => "spatial",
            Model::Idf => "idf",
        }
    }

    /// Whether the estimator scores against tile backgrounds.
    pub fn uses_tiles(&self) -> bool {
        matches!(self, Model::SpatialContext)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for Model {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "name" => Ok(Model::Name),
            "spatial" | "spatial-context" | "spatialcontext" => Ok(Model::SpatialContext),
            "idf" => Ok(Model::Idf),
            other => anyhow::bail!("Unknown model '{other}' (expected name, spatial or idf)"),
        }
    }
}

/// How background distributions are seeded before the first E-step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackgroundPrior {
    /// 1/|vocabulary| globally, 1/|tile words| per tile
    #[default]
    Uniform,
    /// Share of word occurrences, globally and per tile
    Frequency,
}

impl FromStr for BackgroundPrior {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "uniform" => Ok(BackgroundPrior::Uniform),
            "frequency" => Ok(BackgroundPrior::Frequency),
            other => anyhow::bail!("Unknown background prior '{other}' (expected uniform or frequency)"),
        }
    }
}

/// Tunables for the EM loop and the final posterior pass.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmParams {
    /// Step cap for a full-corpus run (default 100)
    pub max_steps: usize,
    /// Stop once the largest per-word posterior change is below this (default 1e-3)
    pub threshold: f64,
    /// λ: prior mass of the core component in the final posterior (default 0.5)
    pub mixture_weight: f64,
    /// α: weight of the tile-local estimate against the global background (default 0.5)
    pub tile_smoothing: f64,
    pub background_prior: BackgroundPrior,
}

impl Default for EmParams {
    fn default() -> Self {
        Self {
            max_steps: 100,
            threshold: 1e-3,
            mixture_weight: 0.5,
            tile_smoothing: 0.5,
            background_prior: BackgroundPrior::Uniform,
        }
    }
}

impl EmParams {
    pub fn validate(&self) -> Result<()> {
        if !(self.mixture_weight > 0.0 && self.mixture_weight < 1.0) {
            anyhow::bail!(
                "Mixture weight must be strictly between 0 and 1, got {}",
                self.mixture_weight
            );
        }
        if !(0.0..=1.0).contains(&self.tile_smoothing) {
            anyhow::bail!(
                "Tile smoothing must be between 0 and 1, got {}",
                self.tile_smoothing
            );
        }
        if !(self.threshold.is_finite() && self.threshold >= 0.0) {
            anyhow::bail!("Convergence threshold must be non-negative, got {}", self.threshold);
        }
        Ok(())
    }
}

/// Outcome of one `run`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RunReport {
    pub model: Model,
    /// E-steps executed (0 for the IDF heuristic)
    pub steps: usize,
    /// Max absolute posterior change of the last E-step
    pub final_delta: f64,
    /// True if the threshold was reached before the step cap
    pub converged: bool,
    /// Places whose two most probable words ended the run tied
    pub tied_places: usize,
}
