//! Applies client commands to the shared store through one connection's
//! controller and collects the frames to send back.

use crate::commands::{export_error_message, format_error, sync_error_message, ClientCommand};
use crate::surface::WsSurface;
use aoi_core::export::{export_file_name, to_feature_collection};
use aoi_core::features::KeyValueStore;
use aoi_core::{FeatureStore, MapSyncController};
use chrono::Utc;
use serde_json::json;
use tracing::{debug, info, warn};

pub type Controller = MapSyncController<WsSurface>;

/// Frames produced by one command, and whether other connections must resync.
#[derive(Debug, Default)]
pub struct Reply {
    pub frames: Vec<String>,
    pub store_changed: bool,
}

/// Attach a controller for a new connection to the shared store.
pub fn connect<K: KeyValueStore>(store: &FeatureStore<K>) -> Controller {
    MapSyncController::attach(WsSurface::new(), store.view_state(), store.features())
}

/// Frames for a freshly connected client: the queued surface setup, the
/// feature list and the view state.
pub fn initial_frames<K: KeyValueStore>(store: &FeatureStore<K>, controller: &mut Controller) -> Vec<String> {
    let mut frames = Vec::new();
    frames.extend(flush_surface(controller));
    frames.push(features_update(store));
    frames.push(view_update(store));
    frames
}

/// Rebuild a connection whose store was changed by another connection.
pub fn resync_frames<K: KeyValueStore>(store: &FeatureStore<K>, controller: &mut Controller) -> Vec<String> {
    controller.resync(store);
    initial_frames(store, controller)
}

/// Run one command. Surface commands always go out first so the browser
/// has the layers before it hears about the features behind them.
pub fn handle_command<K: KeyValueStore>(
    store: &mut FeatureStore<K>,
    controller: &mut Controller,
    command: ClientCommand,
) -> Reply {
    debug!(?command, "Handling command");
    let mut replies = Vec::new();
    let mut features_changed = false;
    let mut view_changed = false;

    match command {
        ClientCommand::Draw(kind) => controller.activate_tool(kind),
        ClientCommand::Cancel => {
            if !controller.cancel_drawing() {
                debug!("Cancel with no active tool");
            }
        }
        ClientCommand::Shape(raw) => match controller.complete_shape(store, raw) {
            Ok(id) => {
                info!(%id, "Feature created");
                features_changed = true;
            }
            Err(e) => {
                warn!(error = %e, "Shape rejected");
                replies.push(sync_error_message(&e));
            }
        },
        ClientCommand::Rename { id, name } => match controller.rename_feature(store, id, name) {
            Ok(()) => features_changed = true,
            Err(e) => replies.push(sync_error_message(&e)),
        },
        ClientCommand::Delete(id) => {
            if controller.remove_feature(store, id).is_some() {
                info!(%id, "Feature deleted");
                features_changed = true;
            }
        }
        ClientCommand::Clear => {
            controller.clear_features(store);
            info!("All features cleared");
            features_changed = true;
        }
        ClientCommand::View(patch) => {
            controller.update_view_state(store, &patch);
            replies.push(view_update(store));
            view_changed = true;
        }
        ClientCommand::Focus(id) => match controller.focus(store, id) {
            Ok(true) => {}
            Ok(false) => debug!(%id, "Feature has no extent to focus"),
            Err(e) => replies.push(sync_error_message(&e)),
        },
        ClientCommand::Export => replies.push(export_ready(store)),
        ClientCommand::Import(document) => match controller.import_document(store, &document) {
            Ok(ids) => {
                info!(count = ids.len(), "Import complete");
                features_changed = true;
            }
            Err(e) => {
                warn!(error = %e, "Import failed");
                replies.push(sync_error_message(&e));
            }
        },
        ClientCommand::List => {
            replies.push(features_update(store));
            replies.push(view_update(store));
        }
    }

    let mut frames: Vec<String> = flush_surface(controller).into_iter().collect();
    if features_changed {
        frames.push(features_update(store));
    }
    frames.extend(replies);
    Reply { frames, store_changed: features_changed || view_changed }
}

fn flush_surface(controller: &mut Controller) -> Option<String> {
    let surface = controller.surface_mut();
    if !surface.has_pending() {
        return None;
    }
    let commands = surface.drain();
    Some(format!(
        "SURFACE_UPDATE:{}",
        serde_json::to_string(&commands).unwrap_or("[]".into())
    ))
}

fn features_update<K: KeyValueStore>(store: &FeatureStore<K>) -> String {
    format!(
        "FEATURES_UPDATE:{}",
        serde_json::to_string(store.features()).unwrap_or("[]".into())
    )
}

fn view_update<K: KeyValueStore>(store: &FeatureStore<K>) -> String {
    format!(
        "VIEW_UPDATE:{}",
        serde_json::to_string(store.view_state()).unwrap_or("{}".into())
    )
}

fn export_ready<K: KeyValueStore>(store: &FeatureStore<K>) -> String {
    let collection = match to_feature_collection(store.features()) {
        Ok(collection) => collection,
        Err(e) => return export_error_message(&e),
    };
    match serde_json::to_value(&collection) {
        Ok(document) => format!(
            "EXPORT_READY:{}",
            json!({
                "fileName": export_file_name(Utc::now()),
                "document": document,
            })
        ),
        Err(e) => format_error("SERIALIZE_ERROR", &e.to_string(), "error"),
    }
}
