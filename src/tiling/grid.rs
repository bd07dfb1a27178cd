// Tile assignment — coordinate grid or city buckets.
//
// Coordinate mode quantizes (lat, lon) relative to the corpus bounding box
// into a row/column cell and folds the pair into one integer key with the
// Cantor pairing function. City mode uses the city id as the key. The mode
// is fixed when the tiler is built; a place the active mode cannot place
// (no location, no city id, outside the grid) has no tile.

use std::collections::HashMap;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::places::models::{CityId, Place, PlaceId};
use crate::places::store::PlaceStore;

/// Tile key. Only used for map lookups, never decoded back into a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileId(pub u64);

impl std::fmt::Display for TileId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which partitioning to use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tiling {
    /// Square cells of `tile_size` degrees anchored at the bounding box corner
    Coordinates { tile_size: f64 },
    /// One tile per city id
    City,
}

/// Cantor pairing: bijection from pairs of naturals to naturals.
pub fn pair(a: u64, b: u64) -> u64 {
    let s = a + b;
    s * (s + 1) / 2 + b
}

/// Largest number of rows or columns a coordinate grid may have. Keeps
/// the pairing key of every in-grid cell far below `u64::MAX`.
pub const MAX_GRID_SIDE: u64 = 1 << 24;

#[derive(Debug)]
struct CoordinateGrid {
    min_lat: f64,
    min_lon: f64,
    tile_size: f64,
    rows: u64,
    cols: u64,
    /// Occupied cells only, keyed by (row, col)
    cells: HashMap<(u64, u64), Vec<PlaceId>>,
}

/// Cells needed to cover `range` degrees, +1 so a place sitting exactly on
/// the max edge still has a cell.
fn grid_side(range: f64, tile_size: f64, axis: &str) -> Result<u64> {
    let side = (range / tile_size).floor() + 1.0;
    if !side.is_finite() || side > MAX_GRID_SIDE as f64 {
        anyhow::bail!(
            "Tile size {tile_size}° is too small for a {range}° {axis} span \
             (grid would need more than {MAX_GRID_SIDE} {axis} cells)"
        );
    }
    Ok(side as u64)
}

impl CoordinateGrid {
    fn build(store: &PlaceStore, tile_size: f64) -> Result<Self> {
        let Some(bounds) = store.bounds() else {
            return Ok(Self {
                min_lat: 0.0,
                min_lon: 0.0,
                tile_size,
                rows: 0,
                cols: 0,
                cells: HashMap::new(),
            });
        };

        let rows = grid_side(bounds.max_lat - bounds.min_lat, tile_size, "latitude")?;
        let cols = grid_side(bounds.max_lon - bounds.min_lon, tile_size, "longitude")?;

        let mut grid = Self {
            min_lat: bounds.min_lat,
            min_lon: bounds.min_lon,
            tile_size,
            rows,
            cols,
            cells: HashMap::new(),
        };
        for place in store.iter() {
            grid.insert(place);
        }
        Ok(grid)
    }

    /// Quantized (row, col) of a place, `None` without location or when the
    /// point lies outside the grid.
    fn cell(&self, place: &Place) -> Option<(u64, u64)> {
        let point = place.location?;
        let i = ((point.lat - self.min_lat) / self.tile_size).floor();
        let j = ((point.lon - self.min_lon) / self.tile_size).floor();
        if !(i.is_finite() && j.is_finite()) || i < 0.0 || j < 0.0 {
            return None;
        }
        if i >= self.rows as f64 || j >= self.cols as f64 {
            return None;
        }
        Some((i as u64, j as u64))
    }

    fn insert(&mut self, place: &Place) {
        if let Some(cell) = self.cell(place) {
            let bucket = self.cells.entry(cell).or_default();
            if !bucket.contains(&place.id) {
                bucket.push(place.id);
            }
        }
    }

    fn tile_id(&self, place: &Place) -> Option<TileId> {
        self.cell(place).map(|(i, j)| TileId(pair(i + j, j)))
    }
}

#[derive(Debug)]
enum Mode {
    Grid(CoordinateGrid),
    City(HashMap<CityId, Vec<PlaceId>>),
}

/// Assigns tile ids and answers same-tile queries in constant time.
#[derive(Debug)]
pub struct Tiler {
    mode: Mode,
}

impl Tiler {
    /// Bucket every place in `store` according to `tiling`.
    ///
    /// Fails on a non-positive tile size, or one so small that the grid
    /// over the corpus bounding box would exceed `MAX_GRID_SIDE` cells on
    /// either axis.
    pub fn build(store: &PlaceStore, tiling: Tiling) -> Result<Self> {
        let mode = match tiling {
            Tiling::Coordinates { tile_size } => {
                if !(tile_size.is_finite() && tile_size > 0.0) {
                    anyhow::bail!("Tile size must be a positive number of degrees, got {tile_size}");
                }
                Mode::Grid(CoordinateGrid::build(store, tile_size)?)
            }
            Tiling::City => {
                let mut tiler = Self {
                    mode: Mode::City(HashMap::new()),
                };
                for place in store.iter() {
                    tiler.insert(place);
                }
                return Ok(tiler);
            }
        };
        Ok(Self { mode })
    }

    /// Bucket a place that joined the corpus after the tiler was built.
    /// The grid extent stays fixed, so a point outside it gets no bucket.
    /// Inserting a place twice is a no-op.
    pub fn insert(&mut self, place: &Place) {
        match &mut self.mode {
            Mode::Grid(grid) => grid.insert(place),
            Mode::City(buckets) => {
                if let Some(city) = place.city_id {
                    let bucket = buckets.entry(city).or_default();
                    if !bucket.contains(&place.id) {
                        bucket.push(place.id);
                    }
                }
            }
        }
    }

    pub fn tiling(&self) -> Tiling {
        match &self.mode {
            Mode::Grid(grid) => Tiling::Coordinates {
                tile_size: grid.tile_size,
            },
            Mode::City(_) => Tiling::City,
        }
    }

    /// Tile of `place`, or `None` when the active mode cannot place it.
    pub fn tile_id(&self, place: &Place) -> Option<TileId> {
        match &self.mode {
            Mode::Grid(grid) => grid.tile_id(place),
            Mode::City(_) => place.city_id.map(TileId),
        }
    }

    /// Ids of every place bucketed with `place` (itself included). Empty if
    /// the place has no tile or was never bucketed.
    pub fn places_in_same_tile(&self, place: &Place) -> &[PlaceId] {
        let bucket = match &self.mode {
            Mode::Grid(grid) => grid.cell(place).and_then(|cell| grid.cells.get(&cell)),
            Mode::City(buckets) => place.city_id.and_then(|city| buckets.get(&city)),
        };
        bucket.map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of non-empty buckets.
    pub fn occupied_tiles(&self) -> usize {
        match &self.mode {
            Mode::Grid(grid) => grid.cells.len(),
            Mode::City(buckets) => buckets.len(),
        }
    }

    /// Grid dimensions (rows, cols) in coordinate mode.
    pub fn grid_shape(&self) -> Option<(u64, u64)> {
        match &self.mode {
            Mode::Grid(grid) => Some((grid.rows, grid.cols)),
            Mode::City(_) => None,
        }
    }
}
