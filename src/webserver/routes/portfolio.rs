/// Portfolio API routes
///
/// The GET path is the one expensive daemon call in the system; it goes
/// through the shared server-side cache so rapid refreshes from multiple
/// clients collapse into one daemon hit per TTL window. POST bypasses the
/// TTL and forces a refresh.
use axum::{
    extract::State,
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use crate::control::resources::ResourceKey;
use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;
use crate::webserver::utils::{error_response, success_response};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/portfolio", get(get_portfolio).post(refresh_portfolio))
        .route("/portfolio/opportunities", get(get_opportunities))
}

/// GET /api/portfolio - portfolio valuation, served from the shared cache
async fn get_portfolio(State(state): State<Arc<AppState>>) -> Response {
    serve_portfolio(&state).await
}

/// POST /api/portfolio - force a daemon refresh regardless of cache age
async fn refresh_portfolio(State(state): State<Arc<AppState>>) -> Response {
    logger::debug(LogTag::Webserver, "forced portfolio refresh requested");
    state.portfolio_cache.invalidate(&ResourceKey::Portfolio);
    serve_portfolio(&state).await
}

/// GET /api/portfolio/opportunities - profit-taking candidates (uncached)
async fn get_opportunities(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.opportunities().await {
        Ok(opportunities) => success_response(opportunities),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to fetch opportunities: {}", e),
        ),
    }
}

async fn serve_portfolio(state: &Arc<AppState>) -> Response {
    let daemon = Arc::clone(&state.daemon);
    let result = state
        .portfolio_cache
        .get_or_fetch(ResourceKey::Portfolio, state.portfolio_ttl(), move || {
            let daemon = Arc::clone(&daemon);
            async move { daemon.portfolio_snapshot().await }
        })
        .await;

    match result {
        Ok(snapshot) => success_response(snapshot),
        Err(e) => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            &format!("Failed to fetch portfolio: {}", e),
        ),
    }
}
