/// Trading control routes
///
/// Commands bypass the caches; the only cache side effect here is the
/// invalidation of the shared portfolio cache after a successful trade so
/// the next portfolio read reflects the mutation.
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::control::client::TradingStatusSnapshot;
use crate::control::resources::ResourceKey;
use crate::logger::{self, LogTag};
use crate::webserver::state::AppState;
use crate::webserver::utils::{ack_response, error_response, success_response};

#[derive(Debug, Default, Deserialize)]
pub struct AutoTradingRequest {
    pub enabled: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ExecuteTradeRequest {
    pub sell_percent: Option<f64>,
}

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/status", get(get_trading_status))
        .route("/start", post(start_daemon))
        .route("/stop", post(stop_daemon))
        .route("/auto", post(set_auto_trading))
        .route("/history", get(get_trade_history))
        .route("/execute/:token_mint", post(execute_trade))
}

/// GET /api/trading/status - daemon/auto-trader/wallet snapshots in one call
async fn get_trading_status(State(state): State<Arc<AppState>>) -> Response {
    let daemon = match state.daemon.daemon_status().await {
        Ok(s) => s,
        Err(e) => return daemon_error("daemon status", e),
    };
    let auto_trader = match state.daemon.auto_trader_status().await {
        Ok(s) => s,
        Err(e) => return daemon_error("auto-trader status", e),
    };
    let wallet = match state.daemon.wallet_status().await {
        Ok(s) => s,
        Err(e) => return daemon_error("wallet status", e),
    };

    success_response(TradingStatusSnapshot {
        daemon,
        auto_trader,
        wallet,
    })
}

/// POST /api/trading/start - start the daemon (idempotent)
async fn start_daemon(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.start().await {
        Ok(ack) => ack_response(ack),
        Err(e) => daemon_error("start", e),
    }
}

/// POST /api/trading/stop - stop the daemon (idempotent)
async fn stop_daemon(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.stop().await {
        Ok(ack) => ack_response(ack),
        Err(e) => daemon_error("stop", e),
    }
}

/// POST /api/trading/auto - toggle auto-trading
async fn set_auto_trading(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AutoTradingRequest>,
) -> Response {
    match state.daemon.set_auto_trading(request.enabled).await {
        Ok(ack) => ack_response(ack),
        Err(e) => daemon_error("set auto-trading", e),
    }
}

/// GET /api/trading/history - executed trade records
async fn get_trade_history(State(state): State<Arc<AppState>>) -> Response {
    match state.daemon.trade_history().await {
        Ok(history) => success_response(history),
        Err(e) => daemon_error("trade history", e),
    }
}

/// POST /api/trading/execute/:token_mint - manual sell
///
/// On a success ack the shared portfolio cache is invalidated so every
/// client's next portfolio read sees the post-trade state.
async fn execute_trade(
    State(state): State<Arc<AppState>>,
    Path(token_mint): Path<String>,
    Json(request): Json<ExecuteTradeRequest>,
) -> Response {
    match state
        .daemon
        .execute_trade(&token_mint, request.sell_percent)
        .await
    {
        Ok(ack) => {
            if ack.success {
                state.portfolio_cache.invalidate(&ResourceKey::Portfolio);
                logger::info(
                    LogTag::Webserver,
                    &format!("💱 Trade executed for {}, portfolio cache invalidated", token_mint),
                );
            }
            ack_response(ack)
        }
        Err(e) => daemon_error("execute trade", e),
    }
}

fn daemon_error(what: &str, e: crate::errors::ControlError) -> Response {
    error_response(
        StatusCode::INTERNAL_SERVER_ERROR,
        &format!("Failed to {}: {}", what, e),
    )
}
