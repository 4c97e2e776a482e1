//! Great-circle helpers shared by the geo index implementations.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Earth radius used by Redis GEO commands, kept so radius answers agree with a Redis backend.
pub const EARTH_RADIUS_KM: f64 = 6372.797_560_856;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
}

/// Lat/lon envelope that contains every point within a radius of a center.
///
/// Longitudes are not normalised: near the antimeridian `min_lon` may fall below -180 or
/// `max_lon` above 180. Use [`Envelope::lon_ranges`] to get the wrapped intervals.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Envelope {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lon: f64) -> Result<Self> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(Error::InvalidArgument(format!("latitude out of range: {lat}")));
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(Error::InvalidArgument(format!("longitude out of range: {lon}")));
        }
        Ok(Self { lat, lon })
    }

    /// Haversine distance in kilometres.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = lat2 - lat1;
        let dlon = (other.lon - self.lon).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_KM * a.sqrt().min(1.0).asin()
    }

    pub fn envelope(&self, radius_km: f64) -> Envelope {
        let dlat = (radius_km / EARTH_RADIUS_KM).to_degrees();
        let min_lat = (self.lat - dlat).max(-90.0);
        let max_lat = (self.lat + dlat).min(90.0);
        // widest longitude span sits on the edge furthest from the equator
        let widest = min_lat.abs().max(max_lat.abs()).to_radians().cos();
        let dlon = if widest < 1e-9 { 180.0 } else { (radius_km / (EARTH_RADIUS_KM * widest)).to_degrees().min(180.0) };
        Envelope { min_lat, max_lat, min_lon: self.lon - dlon, max_lon: self.lon + dlon }
    }
}

impl Envelope {
    pub fn contains(&self, p: &GeoPoint) -> bool {
        p.lat >= self.min_lat
            && p.lat <= self.max_lat
            && self.lon_ranges().iter().any(|(lo, hi)| p.lon >= *lo && p.lon <= *hi)
    }

    /// Longitude intervals within `[-180, 180]`, split in two where the envelope crosses the antimeridian.
    pub fn lon_ranges(&self) -> Vec<(f64, f64)> {
        if self.max_lon - self.min_lon >= 360.0 {
            vec![(-180.0, 180.0)]
        } else if self.min_lon < -180.0 {
            vec![(self.min_lon + 360.0, 180.0), (-180.0, self.max_lon)]
        } else if self.max_lon > 180.0 {
            vec![(self.min_lon, 180.0), (-180.0, self.max_lon - 360.0)]
        } else {
            vec![(self.min_lon, self.max_lon)]
        }
    }
}
