//! Response types returned across the API boundary.

use crate::provider::LibrarySection;
use serde::Serialize;
use std::path::PathBuf;

/// Outcome of an undo request.
#[derive(Debug, Clone, Serialize)]
pub struct UndoResponse {
    pub success: bool,
    pub operation_id: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restored_path: Option<PathBuf>,
}

/// Outcome of permanently discarding one backup.
#[derive(Debug, Clone, Serialize)]
pub struct DiscardResponse {
    pub success: bool,
    pub operation_id: u64,
    pub bytes_freed: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct LibrariesResponse {
    pub success: bool,
    pub libraries: Vec<LibrarySection>,
}
