// =============================================================================
// API route registration
// =============================================================================
//
// One router, one envelope. Every endpoint lives under /api and answers with
// the unified `{"success": ..}` shape produced by webserver::utils.

pub mod config;
pub mod portfolio;
pub mod status;
pub mod trading;

use axum::Router;
use std::sync::Arc;

use crate::webserver::state::AppState;

/// Build the full gateway router with shared state attached
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new().nest("/api", api_routes()).with_state(state)
}

fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(status::routes())
        .merge(portfolio::routes())
        .merge(config::routes())
        .nest("/trading", trading::routes())
}
