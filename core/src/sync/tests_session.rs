use crate::features::store::FEATURES_KEY;
use crate::features::{
    FeatureId, FeatureKind, FeatureStore, KeyValueStore, MemoryStorage, StoreError, ViewStatePatch,
};
use crate::geometry::LatLng;
use crate::sync::recording::{RecordingSurface, SurfaceCall};
use crate::sync::{AoiSession, RawShape, SyncError};

fn session() -> AoiSession<RecordingSurface, MemoryStorage> {
    AoiSession::new(FeatureStore::load(MemoryStorage::new()), RecordingSurface::new())
}

fn draw_marker(session: &mut AoiSession<RecordingSurface, MemoryStorage>, lat: f64, lng: f64) -> FeatureId {
    session.activate_tool(FeatureKind::Marker);
    session
        .complete_shape(RawShape::Marker { position: LatLng::new(lat, lng) })
        .unwrap()
}

fn draw_circle(session: &mut AoiSession<RecordingSurface, MemoryStorage>) -> FeatureId {
    session.activate_tool(FeatureKind::Circle);
    session
        .complete_shape(RawShape::Circle { center: LatLng::new(51.5, -0.12), radius: 750.0 })
        .unwrap()
}

#[test]
fn test_clear_all_removes_every_layer() {
    let mut s = session();
    draw_marker(&mut s, 1.0, 1.0);
    draw_marker(&mut s, 2.0, 2.0);
    assert_eq!(s.controller().live_layer_count(), 2);

    s.clear_all();
    assert_eq!(s.controller().live_layer_count(), 0);
    assert!(s.controller().surface().group.is_empty());
    assert_eq!(s.store().storage().get(FEATURES_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_remove_unknown_leaves_layers() {
    let mut s = session();
    let id = draw_marker(&mut s, 1.0, 1.0);
    let handle = *s.controller().layer_for(id).unwrap();

    assert!(s.remove(FeatureId::new()).is_none());
    assert_eq!(s.features().len(), 1);
    assert_eq!(s.controller().live_layer_count(), 1);
    assert!(s.controller().layer_for(id).is_some());
    assert_ne!(s.controller().layer_for(id), Some(&handle), "layers are recreated, not patched");
}

#[test]
fn test_remove_drops_layer() {
    let mut s = session();
    let keep = draw_marker(&mut s, 1.0, 1.0);
    let gone = draw_marker(&mut s, 2.0, 2.0);

    let removed = s.remove(gone).unwrap();
    assert_eq!(removed.id(), gone);
    assert!(s.controller().layer_for(gone).is_none());
    assert!(s.controller().layer_for(keep).is_some());
    assert_eq!(s.controller().surface().group.len(), 1);
}

#[test]
fn test_rename_refreshes_popup() {
    let mut s = session();
    let id = draw_marker(&mut s, 12.9, 77.6);

    s.rename(id, "Head office").unwrap();
    let handle = s.controller().layer_for(id).unwrap();
    let popup = &s.controller().surface().popups[handle];
    assert!(popup.starts_with("Head office"));
    assert!(popup.contains("12.9000° N, 77.6000° E"));
}

#[test]
fn test_rename_unknown_is_an_error() {
    let mut s = session();
    let id = FeatureId::new();
    assert!(matches!(
        s.rename(id, "x"),
        Err(SyncError::Store(StoreError::UnknownId(missing))) if missing == id
    ));
}

#[test]
fn test_view_patch_never_rebuilds() {
    let mut s = session();
    draw_marker(&mut s, 1.0, 1.0);
    s.controller_mut().surface_mut().clear_calls();

    let view = s.set_view_state(&ViewStatePatch { opacity: Some(35), ..Default::default() });
    assert_eq!(view.opacity, 35);

    let surface = s.controller().surface();
    assert_eq!(surface.calls, vec![SurfaceCall::Opacity(35)]);
    assert_eq!(surface.created_count(), 0);
}

#[test]
fn test_new_session_applies_stored_view() {
    let mut first = session();
    draw_marker(&mut first, 1.0, 1.0);
    first.set_view_state(&ViewStatePatch {
        base_layer_visible: Some(false),
        features_visible: Some(false),
        opacity: Some(60),
    });

    let (store, _) = first.teardown();
    let second = AoiSession::new(FeatureStore::load(store.into_storage()), RecordingSurface::new());

    let surface = second.controller().surface();
    assert_eq!(surface.base_visible, Some(false));
    assert_eq!(surface.group_visible, Some(false));
    assert_eq!(surface.opacity, Some(60));
    assert_eq!(second.controller().live_layer_count(), 1);
}

#[test]
fn test_focus() {
    let mut s = session();
    let id = draw_marker(&mut s, 5.0, 6.0);

    assert!(s.focus(id).unwrap());
    assert!(matches!(
        s.controller().surface().calls.last(),
        Some(SurfaceCall::FitBounds(b)) if b.contains(LatLng::new(5.0, 6.0))
    ));

    assert!(matches!(s.focus(FeatureId::new()), Err(SyncError::Store(StoreError::UnknownId(_)))));
}

#[test]
fn test_export_then_import_into_fresh_session() {
    let mut s = session();
    let marker = draw_marker(&mut s, 12.9, 77.6);
    let circle = draw_circle(&mut s);
    s.rename(circle, "Buffer zone").unwrap();

    let document = serde_json::to_string(&s.export().unwrap()).unwrap();

    let mut other = session();
    let ids = other.import(&document).unwrap();
    assert_eq!(ids, vec![marker, circle]);
    assert_eq!(other.controller().live_layer_count(), 2);

    let imported = other.store().get(circle).unwrap();
    assert_eq!(imported.kind(), FeatureKind::Circle);
    assert_eq!(imported.name(), "Buffer zone");
    assert_eq!(imported.area_sq_meters(), s.store().get(circle).unwrap().area_sq_meters());
}

#[test]
fn test_import_reassigns_colliding_ids() {
    let mut s = session();
    let original = draw_marker(&mut s, 1.0, 1.0);
    let document = serde_json::to_string(&s.export().unwrap()).unwrap();

    let ids = s.import(&document).unwrap();
    assert_eq!(ids.len(), 1);
    assert_ne!(ids[0], original);
    assert_eq!(s.features().len(), 2);
    assert_eq!(s.controller().live_layer_count(), 2);
}

#[test]
fn test_import_rejects_garbage() {
    let mut s = session();
    assert!(matches!(s.import("{not geojson"), Err(SyncError::Export(_))));
    assert!(s.features().is_empty());
}

#[test]
fn test_export_empty_is_an_error() {
    assert!(session().export().is_err());
}
