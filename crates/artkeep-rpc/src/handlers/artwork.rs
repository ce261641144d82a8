//! Library scanning and artwork deletion handlers.

use super::{get_str_list_param, get_str_param, get_u64_param, require_str_param};
use crate::server::AppState;
use artkeep_core::{ArtkeepError, Result};
use serde_json::Value;
use tracing::info;

const DEFAULT_REASON: &str = "User deletion";

pub async fn scan_library(state: &AppState, params: &Value) -> Result<Value> {
    let library = require_str_param(params, "library", "library")?;
    let limit = get_u64_param(params, "limit", "limit")?.map(|n| n as usize);
    let offset = get_u64_param(params, "offset", "offset")?.unwrap_or(0) as usize;

    let response = state.api.scan(&library, limit, offset).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn search_library(state: &AppState, params: &Value) -> Result<Value> {
    let library = require_str_param(params, "library", "library")?;
    let query = get_str_param(params, "query", "query").unwrap_or_default();
    let limit = get_u64_param(params, "limit", "limit")?.map(|n| n as usize);
    let offset = get_u64_param(params, "offset", "offset")?.unwrap_or(0) as usize;

    let response = state.api.search(&library, query, limit, offset).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn find_duplicates(state: &AppState, params: &Value) -> Result<Value> {
    let library = require_str_param(params, "library", "library")?;
    let response = state.api.find_duplicates(&library).await?;
    info!(
        "find_duplicates: {} groups in '{}', {} bytes wasted",
        response.groups.len(),
        library,
        response.wasted_bytes
    );
    Ok(serde_json::to_value(response)?)
}

pub async fn get_scan_progress(state: &AppState, _params: &Value) -> Result<Value> {
    Ok(serde_json::to_value(state.api.scan_progress())?)
}

pub async fn get_libraries(state: &AppState, _params: &Value) -> Result<Value> {
    let response = state.api.libraries().await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn delete_artwork(state: &AppState, params: &Value) -> Result<Value> {
    let refs = get_str_list_param(params, &["paths", "files", "refs"])?.unwrap_or_default();
    if refs.is_empty() {
        return Err(ArtkeepError::InvalidParams {
            message: "No files specified".to_string(),
        });
    }
    let reason = get_str_param(params, "reason", "reason").unwrap_or(DEFAULT_REASON);

    let response = state.api.delete(&refs, reason).await?;
    info!(
        "delete_artwork: {}/{} refs succeeded, {} bytes freed",
        response.successful, response.total, response.bytes_freed
    );
    Ok(serde_json::to_value(response)?)
}

pub async fn resolve_artwork(state: &AppState, params: &Value) -> Result<Value> {
    let reference = require_str_param(params, "path", "path")?;
    let resolution = state.api.resolve(&reference).await?;
    Ok(serde_json::to_value(resolution)?)
}
