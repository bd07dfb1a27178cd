// Place ingestion from crawler JSON dumps.
//
// The crawler writes pages of place records as JSON arrays. Only the fields
// the model needs are read: id, title, and the location block (lat, lon,
// city_id). Everything else in the record is ignored.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;
use tracing::{info, warn};

use super::models::{CityId, GeoPoint, Place};
use super::store::PlaceStore;

#[derive(Debug, Deserialize)]
struct RawPlace {
    id: u64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    location: Option<RawLocation>,
}

#[derive(Debug, Deserialize)]
struct RawLocation {
    lat: Option<f64>,
    lon: Option<f64>,
    /// Crawler output carries this as a string; accept numbers too
    #[serde(default)]
    city_id: Option<serde_json::Value>,
}

impl RawPlace {
    fn into_place(self) -> Place {
        let title = match self.title {
            Some(t) => t,
            None => {
                warn!(id = self.id, "Place has no title, indexing with an empty word set");
                String::new()
            }
        };

        let (location, city_id) = match self.location {
            Some(loc) => {
                let point = match (loc.lat, loc.lon) {
                    (Some(lat), Some(lon)) => Some(GeoPoint::new(lat, lon)),
                    _ => None,
                };
                (point, loc.city_id.as_ref().and_then(|v| parse_city_id(self.id, v)))
            }
            None => (None, None),
        };

        Place {
            id: self.id,
            title,
            location,
            city_id,
        }
    }
}

/// City id from a JSON number or numeric string. Anything else but `null`
/// is logged and treated as no city.
fn parse_city_id(place: u64, value: &serde_json::Value) -> Option<CityId> {
    let parsed = match value {
        serde_json::Value::Null => return None,
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    if parsed.is_none() {
        warn!(id = place, city_id = %value, "Ignoring unparseable city id");
    }
    parsed
}

/// Parse a JSON array of place records.
pub fn parse_places(json: &str) -> Result<Vec<Place>> {
    let raw: Vec<RawPlace> = serde_json::from_str(json).context("Invalid place JSON")?;
    Ok(raw.into_iter().map(RawPlace::into_place).collect())
}

/// Load one JSON file of place records.
pub fn load_places(path: &Path) -> Result<Vec<Place>> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("Failed to read place file {}", path.display()))?;
    parse_places(&json).with_context(|| format!("Failed to parse {}", path.display()))
}

/// Load every `*.json` file in `dir` (in file-name order) into a store.
/// Records whose id was already seen are dropped.
pub fn load_directory(dir: &Path) -> Result<PlaceStore> {
    let mut files: Vec<PathBuf> = fs::read_dir(dir)
        .with_context(|| format!("Failed to list place directory {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();

    if files.is_empty() {
        anyhow::bail!(
            "No .json place files found in {}\n\
             Set TOPONYM_DATA_DIR or pass --data-dir to point at the crawler output.",
            dir.display()
        );
    }

    let mut store = PlaceStore::new();
    let mut duplicates = 0usize;
    for file in &files {
        for place in load_places(file)? {
            if !store.insert(place) {
                duplicates += 1;
            }
        }
    }

    info!(
        files = files.len(),
        places = store.len(),
        duplicates,
        "Loaded place corpus"
    );
    Ok(store)
}
