//! Text-frame protocol between the browser and the server.
//!
//! Client frames are `COMMAND` or `COMMAND:<payload>`. Server frames use the
//! same prefix style, e.g. `FEATURES_UPDATE:[...]`.

use aoi_core::export::ExportError;
use aoi_core::features::{StoreError, ViewStatePatch};
use aoi_core::sync::SyncError;
use aoi_core::{FeatureId, FeatureKind, RawShape};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    Draw(FeatureKind),
    Cancel,
    Shape(RawShape),
    Rename { id: FeatureId, name: String },
    Delete(FeatureId),
    Clear,
    View(ViewStatePatch),
    Focus(FeatureId),
    Export,
    Import(String),
    List,
}

#[derive(Debug, Error, PartialEq)]
pub enum CommandError {
    #[error("Unknown command: {0}")]
    Unknown(String),

    #[error("Invalid {command} payload: {reason}")]
    InvalidPayload { command: &'static str, reason: String },
}

#[derive(Deserialize)]
struct RenamePayload {
    id: FeatureId,
    name: String,
}

impl ClientCommand {
    pub fn parse(text: &str) -> Result<Self, CommandError> {
        let (head, payload) = match text.split_once(':') {
            Some((head, payload)) => (head, payload),
            None => (text.trim(), ""),
        };

        match head {
            "DRAW" => payload
                .parse()
                .map(ClientCommand::Draw)
                .map_err(|e| invalid("DRAW", e)),
            "CANCEL" => Ok(ClientCommand::Cancel),
            "SHAPE" => serde_json::from_str(payload)
                .map(ClientCommand::Shape)
                .map_err(|e| invalid("SHAPE", e)),
            "RENAME" => serde_json::from_str::<RenamePayload>(payload)
                .map(|p| ClientCommand::Rename { id: p.id, name: p.name })
                .map_err(|e| invalid("RENAME", e)),
            "DELETE" => parse_id("DELETE", payload).map(ClientCommand::Delete),
            "CLEAR" => Ok(ClientCommand::Clear),
            "VIEW" => serde_json::from_str(payload)
                .map(ClientCommand::View)
                .map_err(|e| invalid("VIEW", e)),
            "FOCUS" => parse_id("FOCUS", payload).map(ClientCommand::Focus),
            "EXPORT" => Ok(ClientCommand::Export),
            "IMPORT" => Ok(ClientCommand::Import(payload.to_string())),
            "LIST" => Ok(ClientCommand::List),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

fn parse_id(command: &'static str, payload: &str) -> Result<FeatureId, CommandError> {
    payload.trim().parse().map_err(|e| invalid(command, e))
}

fn invalid(command: &'static str, reason: impl std::fmt::Display) -> CommandError {
    CommandError::InvalidPayload { command, reason: reason.to_string() }
}

/// Format an error as a JSON message for the frontend
pub fn format_error(code: &str, message: &str, severity: &str) -> String {
    format!(
        "ERROR_UPDATE:{}",
        json!({
            "code": code,
            "message": message,
            "severity": severity
        })
    )
}

pub fn command_error_message(err: &CommandError) -> String {
    let code = match err {
        CommandError::Unknown(_) => "UNKNOWN_COMMAND",
        CommandError::InvalidPayload { .. } => "INVALID_PAYLOAD",
    };
    format_error(code, &err.to_string(), "error")
}

pub fn sync_error_message(err: &SyncError) -> String {
    let (code, severity) = match err {
        SyncError::NotDrawing => ("NOT_DRAWING", "warning"),
        SyncError::KindMismatch { .. } => ("KIND_MISMATCH", "warning"),
        SyncError::InvalidShape(_) => ("INVALID_SHAPE", "error"),
        SyncError::Store(StoreError::DuplicateId(_)) => ("DUPLICATE_ID", "error"),
        SyncError::Store(StoreError::UnknownId(_)) => ("UNKNOWN_ID", "warning"),
        SyncError::Export(e) => return export_error_message(e),
    };
    format_error(code, &err.to_string(), severity)
}

pub fn export_error_message(err: &ExportError) -> String {
    let (code, severity) = match err {
        ExportError::NothingToExport => ("NOTHING_TO_EXPORT", "info"),
        ExportError::Parse(_) => ("PARSE_ERROR", "error"),
        ExportError::NotAFeatureCollection => ("NOT_A_FEATURE_COLLECTION", "error"),
        ExportError::Serialize(_) => ("SERIALIZE_ERROR", "error"),
    };
    format_error(code, &err.to_string(), severity)
}
