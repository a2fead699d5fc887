use crate::geometry::{self, GeometryResult, LatLng};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::warn;
use uuid::Uuid;

/// Opaque, unique identifier of a feature. Serialized as a UUID string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FeatureId(pub Uuid);

impl FeatureId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for FeatureId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FeatureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for FeatureId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim()).map(Self)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureKind {
    Polygon,
    Rectangle,
    Circle,
    Marker,
}

impl FeatureKind {
    pub const ALL: [FeatureKind; 4] = [
        FeatureKind::Polygon,
        FeatureKind::Rectangle,
        FeatureKind::Circle,
        FeatureKind::Marker,
    ];

    /// Display color, fixed per kind.
    pub fn color(&self) -> &'static str {
        match self {
            Self::Polygon => "#3b82f6",
            Self::Rectangle => "#10b981",
            Self::Circle => "#f59e0b",
            Self::Marker => "#ef4444",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Polygon => "Polygon",
            Self::Rectangle => "Rectangle",
            Self::Circle => "Circle",
            Self::Marker => "Marker",
        }
    }

    /// Whether features of this kind carry an area.
    pub fn has_area(&self) -> bool {
        !matches!(self, Self::Marker)
    }
}

impl fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown feature kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for FeatureKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FeatureKind::ALL
            .into_iter()
            .find(|k| k.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownKind(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CircleGeometry {
    pub center: LatLng,
    pub radius_meters: f64,
}

/// Canonical geometry, one case per [`FeatureKind`].
///
/// Serialized adjacently tagged so a feature reads `{"kind": ..., "geometry": ...}`.
/// Polygon and rectangle rings are stored open (first vertex not repeated).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "geometry")]
pub enum Shape {
    Polygon(Vec<LatLng>),
    Rectangle(Vec<LatLng>),
    Circle(CircleGeometry),
    Marker(LatLng),
}

impl Shape {
    pub fn kind(&self) -> FeatureKind {
        match self {
            Shape::Polygon(_) => FeatureKind::Polygon,
            Shape::Rectangle(_) => FeatureKind::Rectangle,
            Shape::Circle(_) => FeatureKind::Circle,
            Shape::Marker(_) => FeatureKind::Marker,
        }
    }

    /// Area in square meters, `None` for markers.
    pub fn area(&self) -> GeometryResult<Option<f64>> {
        match self {
            Shape::Polygon(vertices) | Shape::Rectangle(vertices) => {
                geometry::polygon_area(vertices).map(Some)
            }
            Shape::Circle(circle) => geometry::circle_area(circle.radius_meters).map(Some),
            Shape::Marker(_) => Ok(None),
        }
    }
}

/// A user-drawn area of interest.
///
/// Only the name may change after creation; everything else is fixed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AoiFeature {
    id: FeatureId,
    name: String,
    #[serde(flatten)]
    shape: Shape,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    area_sq_meters: Option<f64>,
    color: String,
    created_at: DateTime<Utc>,
}

impl AoiFeature {
    /// Build a feature, computing its area once. Geometry that cannot be
    /// measured still yields a feature with an area of zero.
    pub fn new(id: FeatureId, name: impl Into<String>, shape: Shape, created_at: DateTime<Utc>) -> Self {
        let area_sq_meters = match shape.area() {
            Ok(area) => area,
            Err(e) => {
                warn!(%id, error = %e, "Could not measure feature, recording zero area");
                shape.kind().has_area().then_some(0.0)
            }
        };

        Self {
            id,
            name: name.into(),
            color: shape.kind().color().to_string(),
            shape,
            area_sq_meters,
            created_at,
        }
    }

    /// Default label for the `seq`-th feature (1-based).
    pub fn default_name(seq: usize) -> String {
        format!("AOI {}", seq)
    }

    pub fn id(&self) -> FeatureId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> FeatureKind {
        self.shape.kind()
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn area_sq_meters(&self) -> Option<f64> {
        self.area_sq_meters
    }

    pub fn color(&self) -> &str {
        &self.color
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub(crate) fn set_name(&mut self, name: String) {
        self.name = name;
    }

    pub(crate) fn with_id(mut self, id: FeatureId) -> Self {
        self.id = id;
        self
    }

    /// Keep an area recorded elsewhere (e.g. an imported document) instead of the computed one.
    pub(crate) fn with_recorded_area(mut self, area: f64) -> Self {
        if self.kind().has_area() && area.is_finite() && area >= 0.0 {
            self.area_sq_meters = Some(area);
        }
        self
    }
}
