//! Geodesic geometry for areas of interest.
//!
//! Every function here is pure. Coordinates are stored as `(lat, lng)` in
//! degrees; GeoJSON-facing helpers return `[lng, lat]` positions instead.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod area;
pub use area::*;

pub mod projection;
pub use projection::*;

pub mod format;
pub use format::*;

#[cfg(test)]
mod tests_area;

/// Sphere radius used for every area computation (WGS84 semi-major axis).
pub const EARTH_RADIUS_M: f64 = 6_378_137.0;

/// Flat-earth meters per degree of latitude used by the circle offset formulas.
pub const METERS_PER_DEGREE: f64 = 111_320.0;

/// Segment count used when a circle is flattened into a ring.
pub const DEFAULT_CIRCLE_SEGMENTS: usize = 32;

/// Tolerance for floating-point comparisons
pub const EPSILON: f64 = 1e-9;

/// Errors raised for geometry that is not well formed.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GeometryError {
    #[error("Polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),

    #[error("Non-finite coordinate ({lat}, {lng})")]
    NonFiniteCoordinate { lat: f64, lng: f64 },

    #[error("Invalid radius: {0}")]
    InvalidRadius(f64),
}

pub type GeometryResult<T> = Result<T, GeometryError>;

/// A geographic position in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }

    /// Fails with [`GeometryError::NonFiniteCoordinate`] for NaN or infinite components.
    pub fn validate(&self) -> GeometryResult<()> {
        if self.is_finite() {
            Ok(())
        } else {
            Err(GeometryError::NonFiniteCoordinate { lat: self.lat, lng: self.lng })
        }
    }

    /// GeoJSON position order.
    pub fn to_lng_lat(&self) -> [f64; 2] {
        [self.lng, self.lat]
    }

    pub fn from_lng_lat(position: [f64; 2]) -> Self {
        Self { lat: position[1], lng: position[0] }
    }

    pub fn approx_eq(&self, other: &LatLng) -> bool {
        (self.lat - other.lat).abs() < EPSILON && (self.lng - other.lng).abs() < EPSILON
    }
}

/// Axis-aligned bounding box in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl Bounds {
    /// Zero-area box at a single point.
    pub fn point(p: LatLng) -> Self {
        Self { south: p.lat, west: p.lng, north: p.lat, east: p.lng }
    }

    pub fn empty() -> Self {
        Self {
            south: f64::INFINITY,
            west: f64::INFINITY,
            north: f64::NEG_INFINITY,
            east: f64::NEG_INFINITY,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.south > self.north || self.west > self.east
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south = self.south.min(p.lat);
        self.west = self.west.min(p.lng);
        self.north = self.north.max(p.lat);
        self.east = self.east.max(p.lng);
    }

    pub fn merge(&self, other: &Bounds) -> Bounds {
        Bounds {
            south: self.south.min(other.south),
            west: self.west.min(other.west),
            north: self.north.max(other.north),
            east: self.east.max(other.east),
        }
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south && p.lat <= self.north && p.lng >= self.west && p.lng <= self.east
    }

    pub fn center(&self) -> LatLng {
        LatLng::new((self.south + self.north) / 2.0, (self.west + self.east) / 2.0)
    }

    /// GeoJSON `bbox` member order: `[west, south, east, north]`.
    pub fn to_bbox(&self) -> Vec<f64> {
        vec![self.west, self.south, self.east, self.north]
    }
}
