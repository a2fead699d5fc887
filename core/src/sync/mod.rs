//! Synchronization between the feature store and a stateful map surface.
//!
//! The map surface (a drawing-capable map widget living outside this crate)
//! is driven through the narrow [`MapSurface`] trait. [`MapSyncController`]
//! is the only owner of the surface and of every live layer handle.

use crate::export::ExportError;
use crate::features::{AoiFeature, CircleGeometry, FeatureKind, Shape, StoreError};
use crate::geometry::{Bounds, GeometryError, LatLng};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use thiserror::Error;

pub mod controller;
pub use controller::MapSyncController;

pub mod session;
pub use session::AoiSession;

#[cfg(test)]
mod tests_session;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("No drawing tool is active")]
    NotDrawing,

    #[error("Expected a {expected} shape, surface produced a {actual}")]
    KindMismatch { expected: FeatureKind, actual: FeatureKind },

    #[error("Invalid shape: {0}")]
    InvalidShape(#[from] GeometryError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Export(#[from] ExportError),
}

pub type SyncResult<T> = Result<T, SyncError>;

/// Paint settings for a live layer or a draw handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayerStyle {
    pub color: String,
    pub weight: f64,
    pub fill_opacity: f64,
}

impl LayerStyle {
    pub fn for_kind(kind: FeatureKind) -> Self {
        Self {
            color: kind.color().to_string(),
            weight: 2.0,
            fill_opacity: 0.2,
        }
    }

    pub fn for_feature(feature: &AoiFeature) -> Self {
        Self {
            color: feature.color().to_string(),
            ..Self::for_kind(feature.kind())
        }
    }
}

/// Drawing-tool state. At most one tool is active at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Idle,
    Activating(FeatureKind),
    Active(FeatureKind),
}

impl DrawMode {
    pub fn active_kind(&self) -> Option<FeatureKind> {
        match self {
            DrawMode::Active(kind) => Some(*kind),
            DrawMode::Idle | DrawMode::Activating(_) => None,
        }
    }
}

/// A drawing-capable map widget.
///
/// Handles are surface-native layer objects; the controller keeps the only
/// copies and maps each back to a feature id.
pub trait MapSurface {
    type Handle: Clone + Eq + Hash + fmt::Debug;

    /// Create a (not yet visible) layer for a canonical shape.
    fn create_layer(&mut self, kind: FeatureKind, shape: &Shape, style: &LayerStyle) -> Self::Handle;

    /// Attach popup text to a layer.
    fn set_layer_popup(&mut self, _handle: &Self::Handle, _text: &str) {}

    fn add_layer_to_group(&mut self, handle: &Self::Handle);

    fn remove_all_layers_from_group(&mut self);

    fn set_base_layer_visible(&mut self, visible: bool);

    fn set_feature_group_visible(&mut self, visible: bool);

    /// Opacity in percent, `0..=100`.
    fn set_base_layer_opacity(&mut self, opacity: u8);

    fn enable_draw_handler(&mut self, kind: FeatureKind, style: &LayerStyle);

    fn disable_active_draw_handler(&mut self);

    fn fit_bounds(&mut self, bounds: &Bounds);
}

/// A completed shape as reported by the surface's drawing tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum RawShape {
    Polygon { vertices: Vec<LatLng> },
    Rectangle { vertices: Vec<LatLng> },
    Circle { center: LatLng, radius: f64 },
    Marker { position: LatLng },
}

impl RawShape {
    pub fn kind(&self) -> FeatureKind {
        match self {
            RawShape::Polygon { .. } => FeatureKind::Polygon,
            RawShape::Rectangle { .. } => FeatureKind::Rectangle,
            RawShape::Circle { .. } => FeatureKind::Circle,
            RawShape::Marker { .. } => FeatureKind::Marker,
        }
    }

    /// Convert into the canonical [`Shape`].
    ///
    /// Rings lose a repeated closing vertex and a two-corner rectangle is
    /// expanded to four vertices. Too few vertices is accepted here (the
    /// feature gets a zero area); non-finite coordinates and non-positive
    /// radii are rejected.
    pub fn normalize(self) -> Result<Shape, GeometryError> {
        match self {
            RawShape::Polygon { vertices } => Ok(Shape::Polygon(open_ring(vertices)?)),
            RawShape::Rectangle { vertices } => {
                let mut ring = open_ring(vertices)?;
                if ring.len() == 2 {
                    ring = rectangle_from_corners(ring[0], ring[1]);
                }
                Ok(Shape::Rectangle(ring))
            }
            RawShape::Circle { center, radius } => {
                center.validate()?;
                if !radius.is_finite() || radius <= 0.0 {
                    return Err(GeometryError::InvalidRadius(radius));
                }
                Ok(Shape::Circle(CircleGeometry { center, radius_meters: radius }))
            }
            RawShape::Marker { position } => {
                position.validate()?;
                Ok(Shape::Marker(position))
            }
        }
    }
}

fn open_ring(mut vertices: Vec<LatLng>) -> Result<Vec<LatLng>, GeometryError> {
    for v in &vertices {
        v.validate()?;
    }
    if vertices.len() > 1 && vertices[0].approx_eq(&vertices[vertices.len() - 1]) {
        vertices.pop();
    }
    Ok(vertices)
}

/// South-west, north-west, north-east, south-east.
fn rectangle_from_corners(a: LatLng, b: LatLng) -> Vec<LatLng> {
    let (south, north) = (a.lat.min(b.lat), a.lat.max(b.lat));
    let (west, east) = (a.lng.min(b.lng), a.lng.max(b.lng));
    vec![
        LatLng::new(south, west),
        LatLng::new(north, west),
        LatLng::new(north, east),
        LatLng::new(south, east),
    ]
}
