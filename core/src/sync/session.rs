use super::{MapSurface, MapSyncController, RawShape, SyncResult};
use crate::export::{self, ExportResult};
use crate::features::{AoiFeature, FeatureId, FeatureKind, FeatureStore, KeyValueStore, ViewState, ViewStatePatch};
use geojson::FeatureCollection;

/// One map surface bound to one feature store.
///
/// Every store mutation made through the session is followed by a layer
/// rebuild, after the store has persisted it.
#[derive(Debug)]
pub struct AoiSession<S: MapSurface, K: KeyValueStore> {
    store: FeatureStore<K>,
    controller: MapSyncController<S>,
}

impl<S: MapSurface, K: KeyValueStore> AoiSession<S, K> {
    pub fn new(store: FeatureStore<K>, surface: S) -> Self {
        let controller = MapSyncController::attach(surface, store.view_state(), store.features());
        Self { store, controller }
    }

    pub fn store(&self) -> &FeatureStore<K> {
        &self.store
    }

    pub fn controller(&self) -> &MapSyncController<S> {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut MapSyncController<S> {
        &mut self.controller
    }

    pub fn features(&self) -> &[AoiFeature] {
        self.store.features()
    }

    pub fn view_state(&self) -> &ViewState {
        self.store.view_state()
    }

    pub fn activate_tool(&mut self, kind: FeatureKind) {
        self.controller.activate_tool(kind);
    }

    pub fn cancel_drawing(&mut self) -> bool {
        self.controller.cancel_drawing()
    }

    pub fn complete_shape(&mut self, raw: RawShape) -> SyncResult<FeatureId> {
        self.controller.complete_shape(&mut self.store, raw)
    }

    pub fn rename(&mut self, id: FeatureId, name: impl Into<String>) -> SyncResult<()> {
        self.controller.rename_feature(&mut self.store, id, name)
    }

    /// Remove a feature; unknown ids are a no-op.
    pub fn remove(&mut self, id: FeatureId) -> Option<AoiFeature> {
        self.controller.remove_feature(&mut self.store, id)
    }

    pub fn clear_all(&mut self) {
        self.controller.clear_features(&mut self.store);
    }

    /// Persist a view patch and push it to the surface. Never rebuilds layers.
    pub fn set_view_state(&mut self, patch: &ViewStatePatch) -> &ViewState {
        self.controller.update_view_state(&mut self.store, patch)
    }

    /// Returns `false` when the feature has no vertices to fit.
    pub fn focus(&mut self, id: FeatureId) -> SyncResult<bool> {
        self.controller.focus(&self.store, id)
    }

    pub fn export(&self) -> ExportResult<FeatureCollection> {
        export::to_feature_collection(self.store.features())
    }

    pub fn import(&mut self, document: &str) -> SyncResult<Vec<FeatureId>> {
        self.controller.import_document(&mut self.store, document)
    }

    /// Release the surface and hand back the store.
    pub fn teardown(self) -> (FeatureStore<K>, S) {
        let surface = self.controller.teardown();
        (self.store, surface)
    }
}
