// Spatial tiling — partitions places into tiles so the contextual model can
// learn a background distribution per neighbourhood.

pub mod geo;
pub mod grid;

pub use grid::{pair, TileId, Tiler, Tiling};
