//! Shared handler utilities used across RPC domains.

use artkeep_core::{ArtkeepError, Result};
use serde_json::Value;

/// Extract an optional string parameter, supporting both snake_case and camelCase.
pub(crate) fn get_str_param<'a>(params: &'a Value, snake: &str, camel: &str) -> Option<&'a str> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_str())
}

/// Extract a required string parameter or return an error.
pub(crate) fn require_str_param(params: &Value, snake: &str, camel: &str) -> Result<String> {
    get_str_param(params, snake, camel)
        .map(String::from)
        .ok_or_else(|| invalid(format!("Missing required parameter: {}", snake)))
}

/// Extract an optional i64 parameter, supporting both snake_case and camelCase.
pub(crate) fn get_i64_param(params: &Value, snake: &str, camel: &str) -> Option<i64> {
    params
        .get(snake)
        .or_else(|| params.get(camel))
        .and_then(|v| v.as_i64())
}

/// Extract an optional non-negative integer parameter.
///
/// Present-but-negative (or non-integer) values are rejected rather than
/// silently defaulted.
pub(crate) fn get_u64_param(params: &Value, snake: &str, camel: &str) -> Result<Option<u64>> {
    let Some(raw) = params.get(snake).or_else(|| params.get(camel)) else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }
    match get_i64_param(params, snake, camel) {
        Some(n) if n >= 0 => Ok(Some(n as u64)),
        _ => Err(invalid(format!(
            "Parameter {} must be a non-negative integer, got {}",
            snake, raw
        ))),
    }
}

/// Extract a required non-negative integer parameter.
pub(crate) fn require_u64_param(params: &Value, snake: &str, camel: &str) -> Result<u64> {
    get_u64_param(params, snake, camel)?
        .ok_or_else(|| invalid(format!("Missing required parameter: {}", snake)))
}

/// Extract a list of strings from the first of `keys` that is present.
pub(crate) fn get_str_list_param(params: &Value, keys: &[&str]) -> Result<Option<Vec<String>>> {
    let Some((key, raw)) = keys
        .iter()
        .find_map(|key| params.get(*key).map(|v| (*key, v)))
    else {
        return Ok(None);
    };

    let items = raw
        .as_array()
        .ok_or_else(|| invalid(format!("Parameter {} must be an array of strings", key)))?;
    items
        .iter()
        .map(|item| {
            item.as_str()
                .map(String::from)
                .ok_or_else(|| invalid(format!("Parameter {} must be an array of strings", key)))
        })
        .collect::<Result<Vec<_>>>()
        .map(Some)
}

fn invalid(message: String) -> ArtkeepError {
    ArtkeepError::InvalidParams { message }
}
