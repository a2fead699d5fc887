//! Circle flattening and bounding boxes.
//!
//! Circles are offset from their center with the flat-earth approximation
//! `Δlat = r / 111320` and `Δlng = r / (111320 · cos(lat))`. The same formulas
//! drive [`circle_to_polygon`], circle bounds and [`circle_from_ring`].

use super::{Bounds, GeometryError, GeometryResult, LatLng, DEFAULT_CIRCLE_SEGMENTS, METERS_PER_DEGREE};
use crate::features::{AoiFeature, Shape};

/// Smallest cosine used for longitude scaling, keeps polar circles finite.
const MIN_COS_LAT: f64 = 1e-12;

fn lng_scale(lat: f64) -> f64 {
    METERS_PER_DEGREE * lat.to_radians().cos().abs().max(MIN_COS_LAT)
}

/// Point at angle `theta` (radians, 0 = north, clockwise via sin on longitude)
/// on a circle of `radius_meters` around `center`.
pub fn circle_offset(center: LatLng, radius_meters: f64, theta: f64) -> LatLng {
    let d_lat = (radius_meters / METERS_PER_DEGREE) * theta.cos();
    let d_lng = (radius_meters / lng_scale(center.lat)) * theta.sin();
    LatLng::new(center.lat + d_lat, center.lng + d_lng)
}

/// Closed ring of `[lng, lat]` positions approximating a circle.
///
/// Produces `segments + 1` positions; the last repeats the first.
pub fn circle_to_polygon(center: LatLng, radius_meters: f64, segments: usize) -> Vec<[f64; 2]> {
    let segments = segments.max(3);
    let mut ring = Vec::with_capacity(segments + 1);
    for i in 0..segments {
        let theta = (i as f64 / segments as f64) * std::f64::consts::TAU;
        ring.push(circle_offset(center, radius_meters, theta).to_lng_lat());
    }
    if let Some(first) = ring.first().copied() {
        ring.push(first);
    }
    ring
}

/// [`circle_to_polygon`] with [`DEFAULT_CIRCLE_SEGMENTS`].
pub fn circle_to_default_polygon(center: LatLng, radius_meters: f64) -> Vec<[f64; 2]> {
    circle_to_polygon(center, radius_meters, DEFAULT_CIRCLE_SEGMENTS)
}

/// Recover `(center, radius)` from an open ring produced by [`circle_to_polygon`].
///
/// The center is the vertex mean; the radius is the mean offset distance
/// measured with the inverse of the offset formulas.
pub fn circle_from_ring(ring: &[LatLng]) -> GeometryResult<(LatLng, f64)> {
    if ring.len() < 3 {
        return Err(GeometryError::TooFewVertices(ring.len()));
    }
    for p in ring {
        p.validate()?;
    }

    let n = ring.len() as f64;
    let center = LatLng::new(
        ring.iter().map(|p| p.lat).sum::<f64>() / n,
        ring.iter().map(|p| p.lng).sum::<f64>() / n,
    );

    let scale = lng_scale(center.lat);
    let radius = ring
        .iter()
        .map(|p| {
            let dy = (p.lat - center.lat) * METERS_PER_DEGREE;
            let dx = (p.lng - center.lng) * scale;
            (dx * dx + dy * dy).sqrt()
        })
        .sum::<f64>()
        / n;

    if radius <= 0.0 {
        return Err(GeometryError::InvalidRadius(radius));
    }
    Ok((center, radius))
}

/// Box around a circle using the offsets at the four cardinal angles.
pub fn circle_bounds(center: LatLng, radius_meters: f64) -> Bounds {
    let mut bounds = Bounds::point(center);
    for quarter in 0..4 {
        let theta = quarter as f64 * std::f64::consts::FRAC_PI_2;
        bounds.extend(circle_offset(center, radius_meters, theta));
    }
    bounds
}

/// Min/max box over a set of vertices. Empty input gives [`Bounds::empty`].
pub fn vertices_bounds(vertices: &[LatLng]) -> Bounds {
    let mut bounds = Bounds::empty();
    for v in vertices {
        bounds.extend(*v);
    }
    bounds
}

/// Bounding box of a feature's geometry.
pub fn bounds_of(feature: &AoiFeature) -> Bounds {
    match feature.shape() {
        Shape::Marker(position) => Bounds::point(*position),
        Shape::Circle(circle) => circle_bounds(circle.center, circle.radius_meters),
        Shape::Polygon(vertices) | Shape::Rectangle(vertices) => vertices_bounds(vertices),
    }
}

/// Union of [`bounds_of`] over many features; `None` when there are none.
pub fn bounds_of_all<'a>(features: impl IntoIterator<Item = &'a AoiFeature>) -> Option<Bounds> {
    features
        .into_iter()
        .map(bounds_of)
        .filter(|b| !b.is_empty())
        .reduce(|acc, b| acc.merge(&b))
}
