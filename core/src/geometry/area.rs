//! Area calculations.
//!
//! Polygon area uses the spherical-excess line integral on a sphere of radius
//! [`EARTH_RADIUS_M`]. It is display-grade: the ellipsoid is ignored.

use super::{GeometryError, GeometryResult, LatLng, EARTH_RADIUS_M};

/// Geodesic area of a polygon in square meters.
///
/// The ring is implicitly closed (last vertex connects back to the first), so a
/// caller must not repeat the first vertex. Fewer than 3 vertices yields `0.0`.
pub fn polygon_area(vertices: &[LatLng]) -> GeometryResult<f64> {
    for v in vertices {
        v.validate()?;
    }
    if vertices.len() < 3 {
        return Ok(0.0);
    }

    let mut sum = 0.0;
    for (i, p1) in vertices.iter().enumerate() {
        let p2 = &vertices[(i + 1) % vertices.len()];
        let d_lng = (p2.lng - p1.lng).to_radians();
        sum += d_lng * (2.0 + p1.lat.to_radians().sin() + p2.lat.to_radians().sin());
    }

    Ok((sum * EARTH_RADIUS_M * EARTH_RADIUS_M / 2.0).abs())
}

/// Same as [`polygon_area`] but rejects rings with fewer than 3 vertices.
pub fn polygon_area_strict(vertices: &[LatLng]) -> GeometryResult<f64> {
    if vertices.len() < 3 {
        return Err(GeometryError::TooFewVertices(vertices.len()));
    }
    polygon_area(vertices)
}

/// Planar circle area `π·r²`.
pub fn circle_area(radius_meters: f64) -> GeometryResult<f64> {
    if !radius_meters.is_finite() || radius_meters < 0.0 {
        return Err(GeometryError::InvalidRadius(radius_meters));
    }
    Ok(std::f64::consts::PI * radius_meters * radius_meters)
}
