//! The canonical, persisted list of features plus view toggles.
//!
//! Every mutation is followed by a synchronous write of the whole snapshot
//! (feature list and view state) to the backing [`KeyValueStore`].

use super::storage::{KeyValueStore, StorageError, StorageResult};
use super::types::{AoiFeature, FeatureId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, error, info, warn};

pub const FEATURES_KEY: &str = "aoi-features";
pub const VIEW_STATE_KEY: &str = "view-state";

pub const MAX_OPACITY: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum StoreError {
    #[error("Feature {0} already exists")]
    DuplicateId(FeatureId),

    #[error("Feature {0} not found")]
    UnknownId(FeatureId),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Layer visibility and base-layer opacity (percent).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewState {
    pub base_layer_visible: bool,
    pub features_visible: bool,
    pub opacity: u8,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            base_layer_visible: true,
            features_visible: true,
            opacity: MAX_OPACITY,
        }
    }
}

/// Partial update for [`ViewState`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewStatePatch {
    pub base_layer_visible: Option<bool>,
    pub features_visible: Option<bool>,
    pub opacity: Option<u8>,
}

impl ViewState {
    pub fn apply(&mut self, patch: &ViewStatePatch) {
        if let Some(visible) = patch.base_layer_visible {
            self.base_layer_visible = visible;
        }
        if let Some(visible) = patch.features_visible {
            self.features_visible = visible;
        }
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.min(MAX_OPACITY);
        }
    }
}

#[derive(Debug)]
pub struct FeatureStore<K: KeyValueStore> {
    storage: K,
    features: Vec<AoiFeature>,
    view: ViewState,
}

impl<K: KeyValueStore> FeatureStore<K> {
    /// Rehydrate from storage.
    ///
    /// Missing keys give empty defaults. Unreadable or malformed values are
    /// logged and replaced by defaults; loading never fails.
    pub fn load(storage: K) -> Self {
        let features = read_key::<Vec<AoiFeature>>(&storage, FEATURES_KEY)
            .map(dedup_ids)
            .unwrap_or_default();

        let mut view = read_key::<ViewState>(&storage, VIEW_STATE_KEY).unwrap_or_default();
        view.opacity = view.opacity.min(MAX_OPACITY);

        info!(features = features.len(), "Loaded feature store");
        Self { storage, features, view }
    }

    pub fn features(&self) -> &[AoiFeature] {
        &self.features
    }

    pub fn get(&self, id: FeatureId) -> Option<&AoiFeature> {
        self.features.iter().find(|f| f.id() == id)
    }

    pub fn contains(&self, id: FeatureId) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// 1-based sequence number for the next feature's default name.
    pub fn next_sequence(&self) -> usize {
        self.features.len() + 1
    }

    pub fn view_state(&self) -> &ViewState {
        &self.view
    }

    pub fn storage(&self) -> &K {
        &self.storage
    }

    pub fn into_storage(self) -> K {
        self.storage
    }

    pub fn add_feature(&mut self, feature: AoiFeature) -> StoreResult<()> {
        if self.contains(feature.id()) {
            return Err(StoreError::DuplicateId(feature.id()));
        }
        debug!(id = %feature.id(), kind = %feature.kind(), "Adding feature");
        self.features.push(feature);
        self.persist();
        Ok(())
    }

    /// Append several features with a single write. Nothing is added if any
    /// id collides with the store or with another entry of `features`.
    pub fn add_features(&mut self, features: Vec<AoiFeature>) -> StoreResult<()> {
        let mut seen: HashSet<FeatureId> = self.features.iter().map(|f| f.id()).collect();
        for feature in &features {
            if !seen.insert(feature.id()) {
                return Err(StoreError::DuplicateId(feature.id()));
            }
        }
        self.features.extend(features);
        self.persist();
        Ok(())
    }

    /// Remove a feature. An unknown id is a no-op and returns `None`.
    pub fn remove_feature(&mut self, id: FeatureId) -> Option<AoiFeature> {
        let removed = self
            .features
            .iter()
            .position(|f| f.id() == id)
            .map(|idx| self.features.remove(idx));
        if removed.is_none() {
            debug!(%id, "Remove requested for unknown feature");
        }
        self.persist();
        removed
    }

    pub fn rename_feature(&mut self, id: FeatureId, name: impl Into<String>) -> StoreResult<()> {
        let feature = self
            .features
            .iter_mut()
            .find(|f| f.id() == id)
            .ok_or(StoreError::UnknownId(id))?;
        feature.set_name(name.into());
        self.persist();
        Ok(())
    }

    pub fn clear_all(&mut self) {
        self.features.clear();
        self.persist();
    }

    pub fn set_view_state(&mut self, patch: &ViewStatePatch) -> &ViewState {
        self.view.apply(patch);
        self.persist();
        &self.view
    }

    /// Write the full snapshot. Failures are logged; the in-memory state stays authoritative.
    fn persist(&mut self) {
        if let Err(e) = self.write_snapshot() {
            error!(error = %e, "Failed to persist feature store");
        }
    }

    fn write_snapshot(&mut self) -> StorageResult<()> {
        let features = serde_json::to_string(&self.features).map_err(|source| StorageError::Serialize {
            key: FEATURES_KEY.to_string(),
            source,
        })?;
        let view = serde_json::to_string(&self.view).map_err(|source| StorageError::Serialize {
            key: VIEW_STATE_KEY.to_string(),
            source,
        })?;
        self.storage.set(FEATURES_KEY, &features)?;
        self.storage.set(VIEW_STATE_KEY, &view)?;
        Ok(())
    }
}

fn read_key<T: for<'de> Deserialize<'de>>(storage: &impl KeyValueStore, key: &str) -> Option<T> {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return None,
        Err(e) => {
            warn!(key, error = %e, "Could not read persisted state, using defaults");
            return None;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(key, error = %e, "Persisted state is malformed, using defaults");
            None
        }
    }
}

fn dedup_ids(features: Vec<AoiFeature>) -> Vec<AoiFeature> {
    let mut seen = HashSet::new();
    features
        .into_iter()
        .filter(|f| {
            let fresh = seen.insert(f.id());
            if !fresh {
                warn!(id = %f.id(), "Dropping persisted feature with duplicate id");
            }
            fresh
        })
        .collect()
}
