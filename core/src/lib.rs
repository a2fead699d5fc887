//! Core of the AOI mapper: geodesic geometry, the persisted feature store,
//! map-surface reconciliation and GeoJSON export.

pub mod geometry;
pub mod features;
pub mod sync;
pub mod export;
pub mod geocode;

pub use features::{AoiFeature, FeatureId, FeatureKind, FeatureStore, Shape, ViewState};
pub use geometry::LatLng;
pub use sync::{AoiSession, MapSurface, MapSyncController, RawShape};
