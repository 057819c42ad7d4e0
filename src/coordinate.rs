use serde::{Deserialize, Serialize};

use crate::utils;

/// A position on the map, in degrees.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinate {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance in meters.
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        utils::haversine_distance_m(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }

    // the format used by web services for `origin=` and friends
    pub fn to_query_value(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl From<Coordinate> for geo_types::Coord<f64> {
    fn from(c: Coordinate) -> Self {
        geo_types::coord! { x: c.longitude, y: c.latitude }
    }
}

impl From<geo_types::Coord<f64>> for Coordinate {
    fn from(c: geo_types::Coord<f64>) -> Self {
        Coordinate::new(c.y, c.x)
    }
}

/// One location fix as reported by the platform location service.
#[derive(Clone, Debug, PartialEq)]
pub struct RawData {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp_ms: Option<i64>,
    pub accuracy: Option<f32>,
    pub altitude: Option<f32>,
    pub speed: Option<f32>,
}

impl RawData {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}
