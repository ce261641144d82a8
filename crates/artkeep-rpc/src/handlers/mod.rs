//! JSON-RPC request handlers, split by domain.

mod artwork;
mod backups;
mod shared;

pub(crate) use shared::{
    get_str_list_param, get_str_param, get_u64_param, require_str_param, require_u64_param,
};

use crate::server::AppState;
use crate::wrapper::wrap_response;
use artkeep_core::ArtkeepError;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// JSON-RPC "method not found".
const METHOD_NOT_FOUND: i32 = -32601;

/// Incoming call. `jsonrpc` is accepted but not checked.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
    #[serde(default)]
    pub id: Option<Value>,
}

/// Reply envelope; exactly one of `result` and `error` is set.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
    pub id: Option<Value>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
}

impl From<&ArtkeepError> for JsonRpcError {
    fn from(err: &ArtkeepError) -> Self {
        Self {
            code: err.to_rpc_error_code(),
            message: err.to_string(),
        }
    }
}

impl JsonRpcResponse {
    fn reply(id: Option<Value>, outcome: Result<Value, JsonRpcError>) -> Self {
        let (result, error) = match outcome {
            Ok(value) => (Some(value), None),
            Err(e) => (None, Some(e)),
        };
        Self {
            jsonrpc: "2.0",
            result,
            error,
            id,
        }
    }
}

/// `GET /health`.
pub async fn handle_health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// `POST /rpc`. Application errors travel in the envelope, never as HTTP
/// status codes.
pub async fn handle_rpc(
    State(state): State<Arc<AppState>>,
    Json(request): Json<JsonRpcRequest>,
) -> Json<JsonRpcResponse> {
    let JsonRpcRequest { method, params, id } = request;
    let params = params.unwrap_or_else(|| Value::Object(Default::default()));
    debug!("RPC call: {}({})", method, params);

    if let Some(value) = builtin(&state, &method) {
        return Json(JsonRpcResponse::reply(id, Ok(value)));
    }

    let outcome = match dispatch_method(&state, &method, &params).await {
        Some(Ok(value)) => Ok(wrap_response(&method, value)),
        Some(Err(e)) => {
            error!("RPC error for {}: {}", method, e);
            Err(JsonRpcError::from(&e))
        }
        None => {
            warn!("Method not found: {}", method);
            Err(JsonRpcError {
                code: METHOD_NOT_FOUND,
                message: format!("Method not found: {}", method),
            })
        }
    };
    Json(JsonRpcResponse::reply(id, outcome))
}

/// Methods answered by the server itself rather than the core.
fn builtin(state: &AppState, method: &str) -> Option<Value> {
    match method {
        "health_check" => Some(json!({"status": "ok"})),
        "shutdown" => {
            info!("Shutdown requested");
            state.shutdown.notify_one();
            Some(json!({"status": "shutting_down"}))
        }
        _ => None,
    }
}

/// Route a core method to its domain handler. `None` for unknown methods.
async fn dispatch_method(
    state: &AppState,
    method: &str,
    params: &Value,
) -> Option<artkeep_core::Result<Value>> {
    let result = match method {
        // Library & artwork
        "scan_library" => artwork::scan_library(state, params).await,
        "search_library" => artwork::search_library(state, params).await,
        "find_duplicates" => artwork::find_duplicates(state, params).await,
        "get_scan_progress" => artwork::get_scan_progress(state, params).await,
        "get_libraries" => artwork::get_libraries(state, params).await,
        "resolve_artwork" => artwork::resolve_artwork(state, params).await,
        "delete_artwork" => artwork::delete_artwork(state, params).await,

        // Journal & backups
        "undo_operation" => backups::undo_operation(state, params).await,
        "get_operations" => backups::get_operations(state, params).await,
        "discard_backup" => backups::discard_backup(state, params).await,
        "clean_backups" => backups::clean_backups(state, params).await,
        "empty_trash" => backups::empty_trash(state, params).await,
        "get_backup_info" => backups::get_backup_info(state, params).await,

        _ => return None,
    };
    Some(result)
}
