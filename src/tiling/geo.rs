// Geodesic helpers for reporting tile extents in meters.

use crate::places::models::GeoPoint;

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Great-circle distance in meters between two points (haversine formula).
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let delta_lat = lat2 - lat1;
    let delta_lon = (b.lon - a.lon).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_M * c
}

/// Physical size (north-south, east-west) in meters of a square tile of
/// `tile_size` degrees whose south-west corner sits at `origin`.
pub fn tile_extent_meters(origin: GeoPoint, tile_size: f64) -> (f64, f64) {
    let north = GeoPoint::new(origin.lat + tile_size, origin.lon);
    let east = GeoPoint::new(origin.lat, origin.lon + tile_size);
    (distance_meters(origin, north), distance_meters(origin, east))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_distance() {
        let p = GeoPoint::new(48.853943, 2.343521);
        assert!(distance_meters(p, p).abs() < 1e-6);
    }

    #[test]
    fn test_paris_to_london() {
        let paris = GeoPoint::new(48.853943, 2.343521);
        let london = GeoPoint::new(51.507351, -0.127758);
        let d = distance_meters(paris, london);
        // Roughly 343 km
        assert!((d - 343_000.0).abs() < 5_000.0, "got {d}");
    }

    #[test]
    fn test_one_degree_latitude() {
        let (ns, _) = tile_extent_meters(GeoPoint::new(0.0, 0.0), 1.0);
        assert!((ns - 111_195.0).abs() < 100.0, "got {ns}");
    }
}
