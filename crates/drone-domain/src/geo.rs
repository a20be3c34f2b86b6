//! Geospatial helpers shared by the storage gateway's geospatial filters
//! and the drone core's `nearby` lookup.

/// Mean earth radius in kilometres, used for the spherical-earth
/// approximation required by the storage gateway's geospatial predicate.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Saudi Arabia bounding box, enforced on every incoming lat/lon (I7).
pub const SA_MIN_LAT: f64 = 16.0;
pub const SA_MAX_LAT: f64 = 32.0;
pub const SA_MIN_LON: f64 = 34.0;
pub const SA_MAX_LON: f64 = 56.0;

#[must_use]
pub fn in_saudi_arabia(lat: f64, lon: f64) -> bool {
    (SA_MIN_LAT..=SA_MAX_LAT).contains(&lat) && (SA_MIN_LON..=SA_MAX_LON).contains(&lon)
}

/// Great-circle distance between two points, Haversine formula.
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let phi1 = lat1.to_radians();
    let phi2 = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + phi1.cos() * phi2.cos() * (delta_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

/// Axis-aligned bounding box used as a cheap pre-filter before the exact
/// Haversine sort, mirroring the original's SQL `BETWEEN` predicates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    /// A box generous enough to contain every point within `radius_km` of
    /// `(center_lat, center_lon)`. One degree of latitude is ~111km
    /// everywhere; longitude is corrected by the cosine of latitude.
    #[must_use]
    pub fn around(center_lat: f64, center_lon: f64, radius_km: f64) -> Self {
        let lat_delta = radius_km / 111.0;
        let lon_delta = radius_km / (111.0 * center_lat.to_radians().cos().max(0.01));
        Self {
            min_lat: center_lat - lat_delta,
            max_lat: center_lat + lat_delta,
            min_lon: center_lon - lon_delta,
            max_lon: center_lon + lon_delta,
        }
    }

    #[must_use]
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        (self.min_lat..=self.max_lat).contains(&lat) && (self.min_lon..=self.max_lon).contains(&lon)
    }
}
