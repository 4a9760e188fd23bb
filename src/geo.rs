//! Great-circle distance between coordinates.

use serde::{Deserialize, Serialize};

use crate::error::{MedirankError, Result};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// A geographical point with latitude and longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    /// Latitude in degrees (-90 to 90)
    pub lat: f64,
    /// Longitude in degrees (-180 to 180)
    pub lon: f64,
}

impl GeoPoint {
    /// Create a new point, rejecting out-of-range coordinates.
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(MedirankError::invalid_argument(format!(
                "latitude {lat} must be between -90 and 90"
            )));
        }
        if !(-180.0..=180.0).contains(&lon) {
            return Err(MedirankError::invalid_argument(format!(
                "longitude {lon} must be between -180 and 180"
            )));
        }

        Ok(GeoPoint { lat, lon })
    }

    /// Create a point without range checks.
    ///
    /// Entity coordinates arrive from storage already parsed; the distance
    /// math is defined for any finite input even when the result means little.
    pub fn unchecked(lat: f64, lon: f64) -> Self {
        GeoPoint { lat, lon }
    }

    /// Haversine distance to another point in kilometers.
    pub fn distance_to(&self, other: &GeoPoint) -> f64 {
        distance_km(self.lat, self.lon, other.lat, other.lon)
    }
}

/// Great-circle distance in kilometers between two `(lat, lon)` points.
///
/// The formula only uses `|Δ|`-symmetric terms, so swapping the points gives
/// the identical value, and identical points give exactly `0.0`.
///
/// ```
/// use medirank::geo::distance_km;
///
/// let d = distance_km(28.6139, 77.2090, 19.0760, 72.8777);
/// assert!((d - 1148.0).abs() < 5.0);
/// assert_eq!(distance_km(12.97, 77.59, 12.97, 77.59), 0.0);
/// ```
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lon = (lon2 - lon1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lon / 2.0).sin().powi(2);
    // Rounding can push `a` a hair outside [0, 1] for antipodal points.
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}
