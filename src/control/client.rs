/// HTTP client for the gateway API
///
/// Thin reqwest wrapper. Normalizes the two response envelopes in the wild
/// (the unified `{success, data}` shape this gateway emits, and bare payloads
/// from older gateways) into plain payload values, and folds transport /
/// HTTP-level / daemon-reported failures into `ControlError`.
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::with_config;
use crate::daemon::{
    AutoTraderStatus, DaemonConfig, DaemonStatus, Opportunity, PortfolioSnapshot, TradeRecord,
    WalletStatus,
};
use crate::errors::{ControlError, ControlResult};

/// Composite returned by GET /api/trading/status
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradingStatusSnapshot {
    pub daemon: DaemonStatus,
    pub auto_trader: AutoTraderStatus,
    pub wallet: WalletStatus,
}

pub struct GatewayClient {
    http: reqwest::Client,
    base_url: String,
}

impl GatewayClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn from_config() -> Self {
        Self::new(with_config(|cfg| cfg.client.gateway_url.clone()))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    pub async fn portfolio(&self) -> ControlResult<PortfolioSnapshot> {
        self.get("/api/portfolio").await
    }

    pub async fn trading_status(&self) -> ControlResult<TradingStatusSnapshot> {
        self.get("/api/trading/status").await
    }

    pub async fn daemon_config(&self) -> ControlResult<DaemonConfig> {
        self.get("/api/config").await
    }

    pub async fn opportunities(&self) -> ControlResult<Vec<Opportunity>> {
        self.get("/api/portfolio/opportunities").await
    }

    pub async fn trade_history(&self) -> ControlResult<Vec<TradeRecord>> {
        self.get("/api/trading/history").await
    }

    // =========================================================================
    // COMMANDS (bypass every cache; return the daemon's message)
    // =========================================================================

    pub async fn start(&self) -> ControlResult<String> {
        self.command("/api/trading/start", None).await
    }

    pub async fn stop(&self) -> ControlResult<String> {
        self.command("/api/trading/stop", None).await
    }

    pub async fn set_auto_trading(&self, enabled: bool) -> ControlResult<String> {
        self.command(
            "/api/trading/auto",
            Some(serde_json::json!({ "enabled": enabled })),
        )
        .await
    }

    pub async fn update_config(&self, partial: Value) -> ControlResult<String> {
        self.command("/api/config", Some(partial)).await
    }

    pub async fn execute_trade(
        &self,
        token_mint: &str,
        sell_percent: Option<f64>,
    ) -> ControlResult<String> {
        let body = match sell_percent {
            Some(p) => serde_json::json!({ "sell_percent": p }),
            None => serde_json::json!({}),
        };
        self.command(&format!("/api/trading/execute/{}", token_mint), Some(body))
            .await
    }

    /// Ask the gateway to bypass its own cache and refresh from the daemon
    pub async fn force_portfolio_refresh(&self) -> ControlResult<PortfolioSnapshot> {
        self.post("/api/portfolio", None).await
    }

    // =========================================================================
    // TRANSPORT
    // =========================================================================

    async fn get<T: DeserializeOwned>(&self, path: &str) -> ControlResult<T> {
        let response = self
            .http
            .get(format!("{}{}", self.base_url, path))
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn post<T: DeserializeOwned>(&self, path: &str, body: Option<Value>) -> ControlResult<T> {
        let mut request = self.http.post(format!("{}{}", self.base_url, path));
        if let Some(body) = body {
            request = request.json(&body);
        }
        Self::decode(request.send().await?).await
    }

    async fn command(&self, path: &str, body: Option<Value>) -> ControlResult<String> {
        #[derive(Deserialize)]
        struct CommandPayload {
            message: String,
        }
        let payload: CommandPayload = self.post(path, body).await?;
        Ok(payload.message)
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> ControlResult<T> {
        let status = response.status();
        let text = response.text().await?;
        let body: Value = serde_json::from_str(&text).unwrap_or(Value::Null);

        let payload = normalize_envelope(status, body)?;
        serde_json::from_value(payload).map_err(|e| ControlError::Malformed(e.to_string()))
    }
}

/// Collapse both envelope shapes into the inner payload
///
/// Non-2xx responses become `ControlError::Http` carrying the `error` field
/// when present. A 2xx body with `{"success": false}` is a daemon-reported
/// failure. A 2xx body with `{"success": true, "data": ...}` unwraps to
/// `data`; anything else is treated as a bare payload.
pub(crate) fn normalize_envelope(status: StatusCode, body: Value) -> ControlResult<Value> {
    if !status.is_success() {
        let message = body
            .get("error")
            .and_then(Value::as_str)
            .or_else(|| body.get("message").and_then(Value::as_str))
            .map(str::to_string)
            .unwrap_or_else(|| format!("HTTP {}", status.as_u16()));
        return Err(ControlError::Http {
            status: status.as_u16(),
            message,
        });
    }

    match body {
        Value::Object(ref map) if map.contains_key("success") => {
            let success = map.get("success").and_then(Value::as_bool).unwrap_or(false);
            if !success {
                let message = map
                    .get("error")
                    .and_then(Value::as_str)
                    .or_else(|| map.get("message").and_then(Value::as_str))
                    .unwrap_or("daemon reported failure")
                    .to_string();
                return Err(ControlError::Daemon(message));
            }
            match map.get("data") {
                Some(data) => Ok(data.clone()),
                None => Ok(body),
            }
        }
        bare => Ok(bare),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_unified_envelope() {
        let payload = normalize_envelope(
            StatusCode::OK,
            json!({ "success": true, "data": { "total_value": 15.89 } }),
        )
        .unwrap();
        assert_eq!(payload, json!({ "total_value": 15.89 }));
    }

    #[test]
    fn passes_bare_payload_through() {
        let payload =
            normalize_envelope(StatusCode::OK, json!({ "total_value": 15.89 })).unwrap();
        assert_eq!(payload, json!({ "total_value": 15.89 }));
    }

    #[test]
    fn surfaces_error_body_on_http_failure() {
        let err = normalize_envelope(
            StatusCode::INTERNAL_SERVER_ERROR,
            json!({ "success": false, "error": "insufficient balance" }),
        )
        .unwrap_err();
        match err {
            ControlError::Http { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "insufficient balance");
            }
            other => panic!("expected Http error, got {:?}", other),
        }
    }

    #[test]
    fn two_xx_with_success_false_is_daemon_failure() {
        let err = normalize_envelope(
            StatusCode::OK,
            json!({ "success": false, "message": "not ready" }),
        )
        .unwrap_err();
        assert!(matches!(err, ControlError::Daemon(m) if m == "not ready"));
    }

    #[test]
    fn non_json_error_body_falls_back_to_status_text() {
        let err = normalize_envelope(StatusCode::BAD_GATEWAY, Value::Null).unwrap_err();
        assert!(matches!(err, ControlError::Http { status: 502, .. }));
    }
}
