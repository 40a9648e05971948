/// Configuration API routes
///
/// The daemon owns its trading config; the gateway only relays reads and
/// partial updates.
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::get,
    Json, Router,
};
use serde_json::Value;
use std::sync::Arc;

use crate::webserver::state::AppState;
use crate::webserver::utils::{ack_response, error_response, success_response};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/config", get(get_config).post(update_config))
}

/// GET /api/config - current daemon trading configuration
async fn get_config(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.config().await {
        Ok(config) => success_response(config),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to fetch config: {}", e),
        ),
    }
}

/// POST /api/config - merge a partial update into the daemon config
async fn update_config(
    State(state): State<Arc<AppState>>,
    Json(partial): Json<Value>,
) -> Response {
    if !partial.is_object() {
        return error_response(
            StatusCode::BAD_REQUEST,
            "Config update must be a JSON object",
        );
    }

    match state.daemon.update_config(partial).await {
        Ok(ack) => ack_response(ack),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to update config: {}", e),
        ),
    }
}
