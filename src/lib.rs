// Toponym: core-word extraction for crowd-sourced place names
//
// This is the library root. Each module corresponds to a major subsystem
// of the core-word pipeline.

pub mod config;
pub mod evaluation;
pub mod model;
pub mod output;
pub mod places;
pub mod status;
pub mod tiling;
