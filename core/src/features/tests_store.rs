use crate::features::store::{FEATURES_KEY, VIEW_STATE_KEY};
use crate::features::{
    AoiFeature, CircleGeometry, FeatureId, FeatureStore, KeyValueStore, MemoryStorage, Shape, StoreError,
    ViewState, ViewStatePatch,
};
use crate::geometry::LatLng;
use chrono::Utc;

fn marker(name: &str, lat: f64, lng: f64) -> AoiFeature {
    AoiFeature::new(FeatureId::new(), name, Shape::Marker(LatLng::new(lat, lng)), Utc::now())
}

#[test]
fn test_load_missing_keys_gives_defaults() {
    let store = FeatureStore::load(MemoryStorage::new());
    assert!(store.is_empty());
    assert_eq!(store.view_state(), &ViewState::default());
    assert_eq!(store.next_sequence(), 1);
}

#[test]
fn test_load_malformed_state_is_not_fatal() {
    let storage = MemoryStorage::new()
        .with_entry(FEATURES_KEY, "[{\"id\": 42,")
        .with_entry(VIEW_STATE_KEY, "not json at all");

    let store = FeatureStore::load(storage);
    assert!(store.is_empty());
    assert_eq!(store.view_state(), &ViewState::default());
}

#[test]
fn test_marker_persists_and_reloads() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let feature = marker("AOI 1", 12.9, 77.6);
    store.add_feature(feature.clone()).unwrap();

    assert_eq!(store.len(), 1);
    assert_eq!(store.features()[0].area_sq_meters(), None);

    let reloaded = FeatureStore::load(store.into_storage());
    assert_eq!(reloaded.features(), &[feature]);
}

#[test]
fn test_add_duplicate_id_fails() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let feature = marker("AOI 1", 1.0, 1.0);
    store.add_feature(feature.clone()).unwrap();

    let err = store.add_feature(feature.clone()).unwrap_err();
    assert_eq!(err, StoreError::DuplicateId(feature.id()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_remove_unknown_is_noop() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    store.add_feature(marker("AOI 1", 1.0, 1.0)).unwrap();
    let before = store.features().to_vec();

    assert!(store.remove_feature(FeatureId::new()).is_none());
    assert_eq!(store.features(), before.as_slice());
}

#[test]
fn test_remove_persists() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let keep = marker("AOI 1", 1.0, 1.0);
    let drop = marker("AOI 2", 2.0, 2.0);
    store.add_feature(keep.clone()).unwrap();
    store.add_feature(drop.clone()).unwrap();

    let removed = store.remove_feature(drop.id()).unwrap();
    assert_eq!(removed.id(), drop.id());

    let reloaded = FeatureStore::load(store.into_storage());
    assert_eq!(reloaded.features(), &[keep]);
}

#[test]
fn test_rename_replaces_name_only() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let feature = marker("AOI 1", 1.0, 1.0);
    store.add_feature(feature.clone()).unwrap();

    store.rename_feature(feature.id(), "Warehouse").unwrap();
    let renamed = store.get(feature.id()).unwrap();
    assert_eq!(renamed.name(), "Warehouse");
    assert_eq!(renamed.shape(), feature.shape());
    assert_eq!(renamed.created_at(), feature.created_at());

    let reloaded = FeatureStore::load(store.into_storage());
    assert_eq!(reloaded.features()[0].name(), "Warehouse");
}

#[test]
fn test_rename_unknown_fails() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let id = FeatureId::new();
    assert_eq!(store.rename_feature(id, "x"), Err(StoreError::UnknownId(id)));
}

#[test]
fn test_clear_all_persists_empty_list() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    store.add_feature(marker("AOI 1", 1.0, 1.0)).unwrap();
    store.add_feature(marker("AOI 2", 2.0, 2.0)).unwrap();

    store.clear_all();
    assert!(store.is_empty());
    assert_eq!(store.storage().get(FEATURES_KEY).unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_view_state_patch_merges_and_persists() {
    let mut store = FeatureStore::load(MemoryStorage::new());

    store.set_view_state(&ViewStatePatch { opacity: Some(40), ..Default::default() });
    let view = store.set_view_state(&ViewStatePatch {
        base_layer_visible: Some(false),
        ..Default::default()
    });
    assert_eq!(
        view,
        &ViewState { base_layer_visible: false, features_visible: true, opacity: 40 }
    );

    let clamped = store.set_view_state(&ViewStatePatch { opacity: Some(250), ..Default::default() });
    assert_eq!(clamped.opacity, 100);

    let reloaded = FeatureStore::load(store.into_storage());
    assert!(!reloaded.view_state().base_layer_visible);
    assert_eq!(reloaded.view_state().opacity, 100);
}

#[test]
fn test_view_state_survives_corrupt_features() {
    let storage = MemoryStorage::new()
        .with_entry(FEATURES_KEY, "{oops")
        .with_entry(VIEW_STATE_KEY, "{\"opacity\": 55, \"featuresVisible\": false}");

    let store = FeatureStore::load(storage);
    assert!(store.is_empty());
    assert_eq!(store.view_state().opacity, 55);
    assert!(!store.view_state().features_visible);
    assert!(store.view_state().base_layer_visible);
}

#[test]
fn test_load_drops_duplicate_ids() {
    let feature = marker("AOI 1", 1.0, 1.0);
    let json = serde_json::to_string(&vec![feature.clone(), feature.clone()]).unwrap();

    let store = FeatureStore::load(MemoryStorage::new().with_entry(FEATURES_KEY, &json));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_add_features_is_all_or_nothing() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    let existing = marker("AOI 1", 1.0, 1.0);
    store.add_feature(existing.clone()).unwrap();

    let batch = vec![marker("AOI 2", 2.0, 2.0), existing.clone()];
    assert_eq!(store.add_features(batch), Err(StoreError::DuplicateId(existing.id())));
    assert_eq!(store.len(), 1);

    store.add_features(vec![marker("AOI 2", 2.0, 2.0), marker("AOI 3", 3.0, 3.0)]).unwrap();
    assert_eq!(store.len(), 3);
    assert_eq!(store.next_sequence(), 4);
}

#[test]
fn test_reload_preserves_every_float_bit() {
    let mut store = FeatureStore::load(MemoryStorage::new());
    for i in 0..200 {
        let t = i as f64;
        let center = LatLng::new(-60.0 + t * 0.617_283_950_617, -170.0 + t * 1.713_717_171_3);
        let radius_meters = 10.0 + t * 87.123_456_789_012_34 + (t * 0.37).sin();
        let circle = Shape::Circle(CircleGeometry { center, radius_meters });
        store.add_feature(AoiFeature::new(FeatureId::new(), AoiFeature::default_name(i + 1), circle, Utc::now())).unwrap();
    }
    store
        .add_feature(AoiFeature::new(
            FeatureId::new(),
            "Irregular",
            Shape::Polygon(vec![
                LatLng::new(12.971_598_7, 77.594_562_5),
                LatLng::new(12.981_234_567_891, 77.601_111_111_111),
                LatLng::new(12.965_432_109_876_5, 77.612_345_678_901_2),
            ]),
            Utc::now(),
        ))
        .unwrap();

    let before = store.features().to_vec();
    let reloaded = FeatureStore::load(store.into_storage());

    let changed = before
        .iter()
        .zip(reloaded.features())
        .filter(|(a, b)| a != b)
        .count();
    assert_eq!(reloaded.len(), before.len());
    assert_eq!(changed, 0, "{} features changed across reload", changed);
}
