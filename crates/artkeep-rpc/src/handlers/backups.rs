//! Journal, undo and backup retention handlers.

use super::{get_u64_param, require_u64_param};
use crate::server::AppState;
use artkeep_core::config::RetentionConfig;
use artkeep_core::{ArtkeepError, Result};
use serde_json::Value;

pub async fn undo_operation(state: &AppState, params: &Value) -> Result<Value> {
    let id = require_u64_param(params, "operation_id", "operationId")?;
    let response = state.api.undo(id).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn get_operations(state: &AppState, params: &Value) -> Result<Value> {
    let limit = get_u64_param(params, "limit", "limit")?
        .map_or(RetentionConfig::DEFAULT_OPERATIONS_LIMIT, |n| n as usize);
    Ok(serde_json::to_value(state.api.operations(limit))?)
}

pub async fn discard_backup(state: &AppState, params: &Value) -> Result<Value> {
    let id = require_u64_param(params, "operation_id", "operationId")?;
    let response = state.api.discard_backup(id).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn clean_backups(state: &AppState, params: &Value) -> Result<Value> {
    let days = match get_u64_param(params, "days", "days")? {
        Some(days) => u32::try_from(days).map_err(|_| ArtkeepError::InvalidParams {
            message: format!("days out of range: {}", days),
        })?,
        None => RetentionConfig::DEFAULT_DAYS,
    };
    let response = state.api.clean_backups(days).await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn empty_trash(state: &AppState, _params: &Value) -> Result<Value> {
    let response = state.api.empty_trash().await?;
    Ok(serde_json::to_value(response)?)
}

pub async fn get_backup_info(state: &AppState, _params: &Value) -> Result<Value> {
    Ok(serde_json::to_value(state.api.backup_info()?)?)
}
