//! Human-readable measurements for popups and the feature list.

use super::LatLng;

const HECTARE_THRESHOLD: f64 = 10_000.0;
const SQ_KM_THRESHOLD: f64 = 1_000_000.0;

/// Format an area in square meters.
///
/// Below 1 ha: whole square meters. Below 1 km²: hectares with 2 decimals.
/// Otherwise square kilometers with 2 decimals.
pub fn format_area(sq_meters: f64) -> String {
    if sq_meters < HECTARE_THRESHOLD {
        format!("{:.0} m²", sq_meters.round())
    } else if sq_meters < SQ_KM_THRESHOLD {
        format!("{:.2} ha", sq_meters / HECTARE_THRESHOLD)
    } else {
        format!("{:.2} km²", sq_meters / SQ_KM_THRESHOLD)
    }
}

/// Format a position as `12.9000° N, 77.6000° E`.
pub fn format_coordinate(lat: f64, lng: f64) -> String {
    let lat_dir = if lat >= 0.0 { 'N' } else { 'S' };
    let lng_dir = if lng >= 0.0 { 'E' } else { 'W' };
    format!("{:.4}° {}, {:.4}° {}", lat.abs(), lat_dir, lng.abs(), lng_dir)
}

pub fn format_lat_lng(p: LatLng) -> String {
    format_coordinate(p.lat, p.lng)
}
