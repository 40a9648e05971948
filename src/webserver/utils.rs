/// Response helpers enforcing the unified API envelope
///
/// Every endpoint answers with exactly one shape: 2xx carries
/// `{"success": true, "data": ...}`, non-2xx carries
/// `{"success": false, "error": "..."}`.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use serde_json::json;

use crate::daemon::CommandAck;

pub fn success_response<T: Serialize>(data: T) -> Response {
    (
        StatusCode::OK,
        Json(json!({ "success": true, "data": data })),
    )
        .into_response()
}

pub fn error_response(status: StatusCode, message: &str) -> Response {
    (
        status,
        Json(json!({ "success": false, "error": message })),
    )
        .into_response()
}

/// Map a daemon acknowledgement onto the envelope: the daemon's verdict is
/// relayed as-is, with failures carried as a 500 so callers see one error
/// taxonomy
pub fn ack_response(ack: CommandAck) -> Response {
    if ack.success {
        success_response(json!({ "message": ack.message }))
    } else {
        error_response(StatusCode::INTERNAL_SERVER_ERROR, &ack.message)
    }
}
