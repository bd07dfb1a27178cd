// Data models — the place records that flow through the pipeline.
//
// A place is immutable once ingested. Identity is the numeric id alone:
// two places that share a title are still distinct places.

use serde::{Deserialize, Serialize};

/// Stable identifier assigned by the ingestion side.
pub type PlaceId = u64;

/// Opaque city key used by the city tiling mode.
pub type CityId = u64;

/// A latitude/longitude pair in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// A named place, possibly geolocated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    /// Raw title as ingested, possibly multi-word and unnormalized
    pub title: String,
    pub location: Option<GeoPoint>,
    pub city_id: Option<CityId>,
}

impl Place {
    /// A place with a title and nothing else, as created for ad hoc queries.
    pub fn new(id: PlaceId, title: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            location: None,
            city_id: None,
        }
    }

    pub fn with_location(mut self, lat: f64, lon: f64) -> Self {
        self.location = Some(GeoPoint::new(lat, lon));
        self
    }

    pub fn with_city(mut self, city_id: CityId) -> Self {
        self.city_id = Some(city_id);
        self
    }
}

/// Axis-aligned bounding box over geolocated places.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// A box containing exactly one point.
    pub fn around(point: GeoPoint) -> Self {
        Self {
            min_lat: point.lat,
            max_lat: point.lat,
            min_lon: point.lon,
            max_lon: point.lon,
        }
    }

    /// Grow the box so it contains `point`.
    pub fn extend(&mut self, point: GeoPoint) {
        self.min_lat = self.min_lat.min(point.lat);
        self.max_lat = self.max_lat.max(point.lat);
        self.min_lon = self.min_lon.min(point.lon);
        self.max_lon = self.max_lon.max(point.lon);
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lon + self.max_lon) / 2.0,
        )
    }
}
