use super::{DrawMode, LayerStyle, MapSurface, RawShape, SyncError, SyncResult};
use crate::features::store::MAX_OPACITY;
use crate::export;
use crate::features::{
    AoiFeature, FeatureId, FeatureKind, FeatureStore, KeyValueStore, Shape, StoreError, ViewState,
    ViewStatePatch,
};
use crate::geometry::{bounds_of, format_area, format_lat_lng};
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tracing::{debug, info, warn};

/// Owns a map surface and keeps its live layers identical to the feature list.
///
/// Layers are never patched in place: [`MapSyncController::rebuild`] drops
/// every live layer and recreates one per feature, rebuilding the
/// id → handle table from scratch.
#[derive(Debug)]
pub struct MapSyncController<S: MapSurface> {
    surface: S,
    layers: HashMap<FeatureId, S::Handle>,
    owners: HashMap<S::Handle, FeatureId>,
    mode: DrawMode,
    handler_enabled: bool,
}

impl<S: MapSurface> MapSyncController<S> {
    pub fn new(surface: S) -> Self {
        Self {
            surface,
            layers: HashMap::new(),
            owners: HashMap::new(),
            mode: DrawMode::Idle,
            handler_enabled: false,
        }
    }

    /// Take over a freshly mounted surface: apply the view toggles and draw every feature.
    pub fn attach(surface: S, view: &ViewState, features: &[AoiFeature]) -> Self {
        let mut controller = Self::new(surface);
        controller.apply_view_state(view);
        controller.rebuild(features);
        controller
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Direct surface access for transport concerns (e.g. flushing queued commands).
    /// Layer handles must not be created or removed through it.
    pub fn surface_mut(&mut self) -> &mut S {
        &mut self.surface
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.mode
    }

    pub fn live_layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn layer_for(&self, id: FeatureId) -> Option<&S::Handle> {
        self.layers.get(&id)
    }

    /// Hit-testing: which feature a live layer belongs to.
    pub fn feature_at(&self, handle: &S::Handle) -> Option<FeatureId> {
        self.owners.get(handle).copied()
    }

    pub fn bindings(&self) -> &HashMap<FeatureId, S::Handle> {
        &self.layers
    }

    // =========================================================================
    // Drawing tools
    // =========================================================================

    /// Activate a drawing tool, preempting whichever tool was active.
    pub fn activate_tool(&mut self, kind: FeatureKind) {
        self.disable_handler();
        self.mode = DrawMode::Activating(kind);
        self.surface.enable_draw_handler(kind, &LayerStyle::for_kind(kind));
        self.handler_enabled = true;
        self.mode = DrawMode::Active(kind);
        debug!(%kind, "Drawing tool active");
    }

    /// Leave drawing mode. Returns `false` if no tool was active.
    pub fn cancel_drawing(&mut self) -> bool {
        let was_active = self.mode != DrawMode::Idle;
        self.finish_drawing();
        was_active
    }

    fn finish_drawing(&mut self) {
        self.disable_handler();
        self.mode = DrawMode::Idle;
    }

    fn disable_handler(&mut self) {
        if self.handler_enabled {
            self.surface.disable_active_draw_handler();
            self.handler_enabled = false;
        }
    }

    /// Lift a shape completed on the surface into a new feature.
    ///
    /// Drawing is single-shot: whatever the outcome, the tool is disabled and
    /// the controller returns to idle. On success the feature is persisted
    /// before the layers are rebuilt.
    pub fn complete_shape<K: KeyValueStore>(
        &mut self,
        store: &mut FeatureStore<K>,
        raw: RawShape,
    ) -> SyncResult<FeatureId> {
        let expected = self.mode.active_kind().ok_or(SyncError::NotDrawing)?;
        self.finish_drawing();

        let actual = raw.kind();
        if actual != expected {
            return Err(SyncError::KindMismatch { expected, actual });
        }

        let shape = raw.normalize()?;
        let feature = AoiFeature::new(
            FeatureId::new(),
            AoiFeature::default_name(store.next_sequence()),
            shape,
            Utc::now(),
        );
        let id = feature.id();
        info!(%id, kind = %actual, area = ?feature.area_sq_meters(), "Shape drawn");

        store.add_feature(feature)?;
        self.rebuild(store.features());
        Ok(id)
    }

    // =========================================================================
    // Store mutations (persist, then rebuild)
    // =========================================================================

    pub fn rename_feature<K: KeyValueStore>(
        &mut self,
        store: &mut FeatureStore<K>,
        id: FeatureId,
        name: impl Into<String>,
    ) -> SyncResult<()> {
        store.rename_feature(id, name)?;
        self.rebuild(store.features());
        Ok(())
    }

    /// Remove a feature; unknown ids are a no-op.
    pub fn remove_feature<K: KeyValueStore>(
        &mut self,
        store: &mut FeatureStore<K>,
        id: FeatureId,
    ) -> Option<AoiFeature> {
        let removed = store.remove_feature(id);
        self.rebuild(store.features());
        removed
    }

    pub fn clear_features<K: KeyValueStore>(&mut self, store: &mut FeatureStore<K>) {
        store.clear_all();
        self.rebuild(store.features());
    }

    /// Persist a view patch and push only the changed toggles. Never rebuilds layers.
    pub fn update_view_state<'a, K: KeyValueStore>(
        &mut self,
        store: &'a mut FeatureStore<K>,
        patch: &ViewStatePatch,
    ) -> &'a ViewState {
        let view = store.set_view_state(patch);
        if patch.base_layer_visible.is_some() {
            self.set_base_layer_visible(view.base_layer_visible);
        }
        if patch.features_visible.is_some() {
            self.set_features_visible(view.features_visible);
        }
        if patch.opacity.is_some() {
            self.set_opacity(view.opacity);
        }
        view
    }

    /// Fit the viewport to a stored feature. Returns whether the surface was asked to move.
    pub fn focus<K: KeyValueStore>(&mut self, store: &FeatureStore<K>, id: FeatureId) -> SyncResult<bool> {
        let feature = store.get(id).ok_or(StoreError::UnknownId(id))?;
        Ok(self.focus_feature(feature))
    }

    /// Append the features of a GeoJSON document. Ids that collide with the
    /// store (or repeat inside the document) are replaced by fresh ones.
    pub fn import_document<K: KeyValueStore>(
        &mut self,
        store: &mut FeatureStore<K>,
        document: &str,
    ) -> SyncResult<Vec<FeatureId>> {
        let parsed = export::parse_feature_collection(document, store.next_sequence())?;

        let mut taken: HashSet<FeatureId> = store.features().iter().map(|f| f.id()).collect();
        let mut features = Vec::with_capacity(parsed.len());
        for feature in parsed {
            let feature = if taken.contains(&feature.id()) {
                feature.with_id(FeatureId::new())
            } else {
                feature
            };
            taken.insert(feature.id());
            features.push(feature);
        }

        let ids: Vec<FeatureId> = features.iter().map(|f| f.id()).collect();
        store.add_features(features)?;
        self.rebuild(store.features());
        info!(count = ids.len(), "Imported features");
        Ok(ids)
    }

    /// Bring a surface up to date with a store another controller changed.
    pub fn resync<K: KeyValueStore>(&mut self, store: &FeatureStore<K>) {
        self.apply_view_state(store.view_state());
        self.rebuild(store.features());
    }

    // =========================================================================
    // Reconciliation
    // =========================================================================

    /// Make the live layer set mirror `features` exactly.
    pub fn rebuild(&mut self, features: &[AoiFeature]) {
        self.surface.remove_all_layers_from_group();
        self.layers.clear();
        self.owners.clear();

        for feature in features {
            if self.layers.contains_key(&feature.id()) {
                warn!(id = %feature.id(), "Skipping second layer for duplicate feature id");
                continue;
            }
            let style = LayerStyle::for_feature(feature);
            let handle = self.surface.create_layer(feature.kind(), feature.shape(), &style);
            self.surface.set_layer_popup(&handle, &popup_text(feature));
            self.surface.add_layer_to_group(&handle);

            self.owners.insert(handle.clone(), feature.id());
            self.layers.insert(feature.id(), handle);
        }
        debug!(layers = self.layers.len(), "Rebuilt live layers");
    }

    // =========================================================================
    // View toggles (never trigger a rebuild)
    // =========================================================================

    pub fn set_base_layer_visible(&mut self, visible: bool) {
        self.surface.set_base_layer_visible(visible);
    }

    pub fn set_features_visible(&mut self, visible: bool) {
        self.surface.set_feature_group_visible(visible);
    }

    pub fn set_opacity(&mut self, opacity: u8) {
        self.surface.set_base_layer_opacity(opacity.min(MAX_OPACITY));
    }

    pub fn apply_view_state(&mut self, view: &ViewState) {
        self.set_base_layer_visible(view.base_layer_visible);
        self.set_features_visible(view.features_visible);
        self.set_opacity(view.opacity);
    }

    /// Fit the surface viewport to a feature. A feature without vertices
    /// has no bounds and leaves the viewport alone (returns `false`).
    pub fn focus_feature(&mut self, feature: &AoiFeature) -> bool {
        let bounds = bounds_of(feature);
        if bounds.is_empty() {
            debug!(id = %feature.id(), "Nothing to fit for feature without vertices");
            return false;
        }
        self.surface.fit_bounds(&bounds);
        true
    }

    /// Release the surface: no handler stays enabled and no layer stays live.
    pub fn teardown(mut self) -> S {
        self.finish_drawing();
        self.surface.remove_all_layers_from_group();
        self.layers.clear();
        self.owners.clear();
        self.surface
    }
}

/// Popup body: name, kind with area, and the anchor coordinate.
pub fn popup_text(feature: &AoiFeature) -> String {
    let anchor = match feature.shape() {
        Shape::Marker(position) => Some(*position),
        Shape::Circle(circle) => Some(circle.center),
        Shape::Polygon(_) | Shape::Rectangle(_) => {
            let bounds = bounds_of(feature);
            (!bounds.is_empty()).then(|| bounds.center())
        }
    };

    let mut text = format!("{}\n{}", feature.name(), feature.kind());
    if let Some(area) = feature.area_sq_meters() {
        text.push_str(&format!(" · {}", format_area(area)));
    }
    if let Some(anchor) = anchor {
        text.push('\n');
        text.push_str(&format_lat_lng(anchor));
    }
    text
}
