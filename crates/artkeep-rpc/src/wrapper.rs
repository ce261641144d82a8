//! Response wrapping for frontend compatibility.
//!
//! The frontend expects every result in the shape
//! `{success: bool, ...data, error?: string}`. Core methods that already
//! return that shape pass through; bare lists and records are wrapped here.

use serde_json::{json, Value};

/// Wrap API responses to match the frontend's expected format.
pub fn wrap_response(method: &str, result: Value) -> Value {
    match method {
        // List wrappers
        "get_operations" => {
            json!({
                "success": true,
                "operations": if result.is_null() { json!([]) } else { result }
            })
        }

        // Dict wrappers
        "get_scan_progress" => {
            json!({
                "success": true,
                "progress": if result.is_null() { json!({}) } else { result }
            })
        }

        "resolve_artwork" => {
            json!({
                "success": true,
                "resolution": if result.is_null() { json!({}) } else { result }
            })
        }

        "get_backup_info" => {
            json!({
                "success": true,
                "info": if result.is_null() { json!({}) } else { result }
            })
        }

        // Already {success, ...}
        _ => result,
    }
}
