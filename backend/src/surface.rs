use aoi_core::geometry::Bounds;
use aoi_core::sync::LayerStyle;
use aoi_core::{FeatureKind, MapSurface, Shape};
use serde::Serialize;
use std::mem;

/// One instruction for the browser map, sent inside `SURFACE_UPDATE`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum SurfaceCommand {
    CreateLayer { handle: u64, kind: FeatureKind, shape: Shape, style: LayerStyle },
    SetPopup { handle: u64, text: String },
    AddToGroup { handle: u64 },
    ClearGroup,
    SetBaseLayerVisible { visible: bool },
    SetFeatureGroupVisible { visible: bool },
    SetBaseLayerOpacity { opacity: u8 },
    EnableDrawHandler { kind: FeatureKind, style: LayerStyle },
    DisableDrawHandler,
    FitBounds { bounds: Bounds },
}

/// Map surface living in the connected browser.
///
/// Calls are queued and flushed to the socket after each client command;
/// handles are allocated here and echoed back by the client.
#[derive(Debug, Default)]
pub struct WsSurface {
    next_handle: u64,
    pending: Vec<SurfaceCommand>,
}

impl WsSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn drain(&mut self) -> Vec<SurfaceCommand> {
        mem::take(&mut self.pending)
    }
}

impl MapSurface for WsSurface {
    type Handle = u64;

    fn create_layer(&mut self, kind: FeatureKind, shape: &Shape, style: &LayerStyle) -> u64 {
        self.next_handle += 1;
        self.pending.push(SurfaceCommand::CreateLayer {
            handle: self.next_handle,
            kind,
            shape: shape.clone(),
            style: style.clone(),
        });
        self.next_handle
    }

    fn set_layer_popup(&mut self, handle: &u64, text: &str) {
        self.pending.push(SurfaceCommand::SetPopup { handle: *handle, text: text.to_string() });
    }

    fn add_layer_to_group(&mut self, handle: &u64) {
        self.pending.push(SurfaceCommand::AddToGroup { handle: *handle });
    }

    fn remove_all_layers_from_group(&mut self) {
        self.pending.push(SurfaceCommand::ClearGroup);
    }

    fn set_base_layer_visible(&mut self, visible: bool) {
        self.pending.push(SurfaceCommand::SetBaseLayerVisible { visible });
    }

    fn set_feature_group_visible(&mut self, visible: bool) {
        self.pending.push(SurfaceCommand::SetFeatureGroupVisible { visible });
    }

    fn set_base_layer_opacity(&mut self, opacity: u8) {
        self.pending.push(SurfaceCommand::SetBaseLayerOpacity { opacity });
    }

    fn enable_draw_handler(&mut self, kind: FeatureKind, style: &LayerStyle) {
        self.pending.push(SurfaceCommand::EnableDrawHandler { kind, style: style.clone() });
    }

    fn disable_active_draw_handler(&mut self) {
        self.pending.push(SurfaceCommand::DisableDrawHandler);
    }

    fn fit_bounds(&mut self, bounds: &Bounds) {
        self.pending.push(SurfaceCommand::FitBounds { bounds: *bounds });
    }
}
