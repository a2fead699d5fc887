//! GeoJSON export and import.
//!
//! Stored coordinates are `(lat, lng)`; GeoJSON positions are `[lng, lat]`,
//! so every conversion here transposes. Polygon rings are closed on export
//! and opened again on import. Circles leave as 32-segment polygons.

use crate::features::{AoiFeature, CircleGeometry, FeatureId, FeatureKind, Shape};
use crate::geometry::{bounds_of_all, circle_from_ring, circle_to_default_polygon, LatLng};
use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue, Value};
use thiserror::Error;
use tracing::warn;


#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Nothing to export")]
    NothingToExport,

    #[error("Failed to parse GeoJSON: {0}")]
    Parse(String),

    #[error("Document is not a FeatureCollection")]
    NotAFeatureCollection,

    #[error("Failed to serialize document: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Snapshot features as a FeatureCollection.
///
/// An empty list is reported as [`ExportError::NothingToExport`]. Degenerate
/// polygons (fewer than 3 vertices) are still exported, with a ring shorter
/// than the 4 positions a GeoJSON LinearRing requires; a warning is logged.
pub fn to_feature_collection(features: &[AoiFeature]) -> ExportResult<FeatureCollection> {
    if features.is_empty() {
        return Err(ExportError::NothingToExport);
    }

    Ok(FeatureCollection {
        bbox: bounds_of_all(features).map(|b| b.to_bbox()),
        features: features.iter().map(to_geojson_feature).collect(),
        foreign_members: None,
    })
}

/// [`to_feature_collection`] rendered as pretty-printed JSON text.
pub fn to_geojson_string(features: &[AoiFeature]) -> ExportResult<String> {
    let collection = to_feature_collection(features)?;
    Ok(serde_json::to_string_pretty(&collection)?)
}

/// Download name for an export taken at `at`.
pub fn export_file_name(at: DateTime<Utc>) -> String {
    format!("aoi-export-{}.geojson", at.format("%Y-%m-%d"))
}

fn to_geojson_feature(feature: &AoiFeature) -> Feature {
    let value = match feature.shape() {
        Shape::Marker(position) => Value::Point(position.to_lng_lat().to_vec()),
        Shape::Polygon(vertices) | Shape::Rectangle(vertices) => {
            if vertices.len() < 3 {
                warn!(id = %feature.id(), vertices = vertices.len(), "Exporting degenerate ring");
            }
            Value::Polygon(vec![closed_ring(vertices)])
        }
        Shape::Circle(circle) => Value::Polygon(vec![circle_to_default_polygon(
            circle.center,
            circle.radius_meters,
        )
        .into_iter()
        .map(|p| p.to_vec())
        .collect()]),
    };

    let mut properties = JsonObject::new();
    properties.insert("id".to_string(), JsonValue::from(feature.id().to_string()));
    properties.insert("name".to_string(), JsonValue::from(feature.name()));
    properties.insert("kind".to_string(), JsonValue::from(feature.kind().as_str()));
    if let Some(area) = feature.area_sq_meters() {
        properties.insert("areaSqMeters".to_string(), JsonValue::from(area));
    }
    properties.insert(
        "createdAt".to_string(),
        JsonValue::from(feature.created_at().to_rfc3339()),
    );

    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: Some(properties),
        foreign_members: None,
    }
}

fn closed_ring(vertices: &[LatLng]) -> Vec<Vec<f64>> {
    let mut ring: Vec<Vec<f64>> = vertices.iter().map(|v| v.to_lng_lat().to_vec()).collect();
    if let Some(first) = ring.first().cloned() {
        ring.push(first);
    }
    ring
}

// =============================================================================
// Import
// =============================================================================

/// Parse GeoJSON text (a FeatureCollection or a single Feature) into features.
///
/// `next_seq` numbers default names for features without one.
pub fn parse_feature_collection(text: &str, next_seq: usize) -> ExportResult<Vec<AoiFeature>> {
    let geojson: GeoJson = text
        .parse()
        .map_err(|e: geojson::Error| ExportError::Parse(e.to_string()))?;

    let collection = match geojson {
        GeoJson::FeatureCollection(collection) => collection,
        GeoJson::Feature(feature) => FeatureCollection {
            bbox: None,
            features: vec![feature],
            foreign_members: None,
        },
        GeoJson::Geometry(_) => return Err(ExportError::NotAFeatureCollection),
    };
    Ok(from_feature_collection(&collection, next_seq))
}

/// Convert a FeatureCollection back into features.
///
/// Geometries other than Point and Polygon are skipped with a warning.
pub fn from_feature_collection(collection: &FeatureCollection, next_seq: usize) -> Vec<AoiFeature> {
    let mut features = Vec::new();
    for (index, gj) in collection.features.iter().enumerate() {
        let kind = gj
            .property("kind")
            .and_then(JsonValue::as_str)
            .and_then(|k| k.parse::<FeatureKind>().ok());

        let Some(shape) = gj.geometry.as_ref().and_then(|g| shape_from_value(&g.value, kind)) else {
            warn!(index, "Skipping feature without a usable Point or Polygon geometry");
            continue;
        };

        let id = gj
            .property("id")
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse::<FeatureId>().ok())
            .unwrap_or_default();

        let name = gj
            .property("name")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| AoiFeature::default_name(next_seq + features.len()));

        let created_at = gj
            .property("createdAt")
            .and_then(JsonValue::as_str)
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);

        let mut feature = AoiFeature::new(id, name, shape, created_at);
        if let Some(area) = gj.property("areaSqMeters").and_then(JsonValue::as_f64) {
            feature = feature.with_recorded_area(area);
        }
        features.push(feature);
    }
    features
}

fn shape_from_value(value: &Value, kind: Option<FeatureKind>) -> Option<Shape> {
    match value {
        Value::Point(position) => position_to_lat_lng(position).map(Shape::Marker),
        Value::Polygon(rings) => {
            let outer = rings.first()?;
            let mut ring = outer
                .iter()
                .map(|p| position_to_lat_lng(p))
                .collect::<Option<Vec<LatLng>>>()?;
            if ring.len() > 1 && ring[0].approx_eq(&ring[ring.len() - 1]) {
                ring.pop();
            }

            match kind {
                Some(FeatureKind::Rectangle) => Some(Shape::Rectangle(ring)),
                Some(FeatureKind::Circle) => match circle_from_ring(&ring) {
                    Ok((center, radius_meters)) => {
                        Some(Shape::Circle(CircleGeometry { center, radius_meters }))
                    }
                    Err(e) => {
                        warn!(error = %e, "Circle ring could not be recovered, importing as polygon");
                        Some(Shape::Polygon(ring))
                    }
                },
                Some(FeatureKind::Polygon) | Some(FeatureKind::Marker) | None => {
                    Some(Shape::Polygon(ring))
                }
            }
        }
        _ => None,
    }
}

fn position_to_lat_lng(position: &[f64]) -> Option<LatLng> {
    match position {
        [lng, lat, ..] => {
            let p = LatLng::new(*lat, *lng);
            p.is_finite().then_some(p)
        }
        _ => None,
    }
}
