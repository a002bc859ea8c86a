//! Geographic primitives and the spatial lookup capability.
//!
//! The engine never depends on a particular geospatial index. Components that
//! need "what is near this point" take any [`SpatialIndex`]; callers plug in
//! whatever backs their records. [`LinearScanIndex`] is the in-memory
//! reference implementation.

use std::f64::consts::PI;

/// Mean Earth radius in meters (IUGG).
pub const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Meters per degree of latitude (spherical approximation).
pub const METERS_PER_DEGREE_LAT: f64 = 111_320.0;

/// Smallest cosine used when converting meters to degrees of longitude.
///
/// Keeps the conversion finite at the poles; degree spacing there is
/// meaningless anyway.
pub const MIN_COS_LAT: f64 = 1e-6;

/// A WGS84 latitude/longitude pair in degrees.
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Whether both coordinates are finite and the latitude is in range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite() && (-90.0..=90.0).contains(&self.lat)
    }

    /// Great-circle distance to `other` in meters.
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        haversine_m(self, other)
    }
}

/// Haversine great-circle distance in meters.
///
/// Identical points give exactly `0.0`.
pub fn haversine_m(a: &LatLng, b: &LatLng) -> f64 {
    let lat1 = a.lat * PI / 180.0;
    let lat2 = b.lat * PI / 180.0;
    let dlat = (b.lat - a.lat) * PI / 180.0;
    let dlng = (b.lng - a.lng) * PI / 180.0;

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Meters per degree of longitude at `lat`.
///
/// Shrinks with `cos(lat)`; floored via [`MIN_COS_LAT`] so it never reaches 0.
pub fn meters_per_degree_lng(lat: f64) -> f64 {
    METERS_PER_DEGREE_LAT * (lat * PI / 180.0).cos().max(MIN_COS_LAT)
}

/// Anything with a position.
pub trait Located {
    fn location(&self) -> LatLng;
}

impl Located for LatLng {
    fn location(&self) -> LatLng {
        *self
    }
}

/// Radius lookup over located records.
///
/// Implementations must be `Send + Sync` so a shared index can serve
/// concurrent engine calls.
pub trait SpatialIndex<T: Located>: Send + Sync {
    /// Returns every record within `radius_m` meters of `point`.
    fn find_near(&self, point: &LatLng, radius_m: f64) -> Vec<&T>;
}

/// Brute-force [`SpatialIndex`]: checks every record on each query.
#[derive(Debug, Clone, Default)]
pub struct LinearScanIndex<T> {
    items: Vec<T>,
}

impl<T: Located> LinearScanIndex<T> {
    pub fn new(items: Vec<T>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }
}

impl<T: Located + Send + Sync> SpatialIndex<T> for LinearScanIndex<T> {
    fn find_near(&self, point: &LatLng, radius_m: f64) -> Vec<&T> {
        self.items
            .iter()
            .filter(|item| haversine_m(point, &item.location()) <= radius_m)
            .collect()
    }
}
