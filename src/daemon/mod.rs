/// Daemon collaborator seam
///
/// The trading daemon (strategy, execution, pricing, wallet signing) lives
/// outside this crate. The gateway consumes it exclusively through
/// `DaemonHandle`: a fixed query surface returning snapshots and a fixed
/// command surface returning acknowledgements. Nothing here caches; caching
/// is owned by the callers.
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::ControlResult;

pub mod simulated;

pub use simulated::SimulatedDaemon;

// =============================================================================
// SNAPSHOT TYPES (query surface)
// =============================================================================

/// Full portfolio valuation, the expensive call the gateway cache shields
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PortfolioSnapshot {
    pub total_value: f64,
    pub total_unrealized_pnl: f64,
    pub total_unrealized_pnl_percent: f64,
    pub sol_balance: f64,
    pub positions: Vec<PositionSnapshot>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PositionSnapshot {
    pub token_mint: String,
    pub symbol: String,
    pub amount: f64,
    pub entry_price: f64,
    pub current_price: f64,
    pub unrealized_pnl_percent: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DaemonStatus {
    pub is_running: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AutoTraderStatus {
    pub enabled: bool,
    pub daily_trades: u32,
    pub daily_trade_limit: u32,
    /// Percentage of successful trades, 0.0 when no trades happened yet
    pub success_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WalletStatus {
    pub connected: bool,
    pub can_sign: bool,
    pub public_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Opportunity {
    pub token_mint: String,
    pub symbol: String,
    pub current_profit_percent: f64,
    pub recommended_sell_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TradeRecord {
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub token_symbol: String,
    pub action: TradeAction,
    pub amount: f64,
    pub price: f64,
    pub success: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TradeAction {
    Buy,
    Sell,
}

// =============================================================================
// DAEMON CONFIG (owned by the daemon, viewed/edited through the gateway)
// =============================================================================

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DaemonConfig {
    pub execution: ExecutionConfig,
    pub profit_taking: ProfitTakingConfig,
    pub risk_management: RiskManagementConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExecutionConfig {
    pub dry_run: bool,
    pub slippage_percent: f64,
    pub max_price_impact_percent: f64,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            dry_run: true,
            slippage_percent: 5.0,
            max_price_impact_percent: 10.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ProfitTakingConfig {
    pub enabled: bool,
    /// Ladder of (profit %, sell %) rungs
    pub targets: Vec<ProfitTarget>,
}

impl Default for ProfitTakingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            targets: vec![
                ProfitTarget { profit_percent: 25.0, sell_percent: 25.0 },
                ProfitTarget { profit_percent: 50.0, sell_percent: 50.0 },
                ProfitTarget { profit_percent: 100.0, sell_percent: 100.0 },
            ],
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct ProfitTarget {
    pub profit_percent: f64,
    pub sell_percent: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RiskManagementConfig {
    pub max_daily_trades: u32,
}

impl Default for RiskManagementConfig {
    fn default() -> Self {
        Self { max_daily_trades: 10 }
    }
}

// =============================================================================
// COMMAND SURFACE
// =============================================================================

/// Acknowledgement for daemon commands
///
/// The daemon is the authority on whether a state transition actually
/// occurred; callers only relay this verdict. Receipt of a success ack does
/// not guarantee the command finished synchronously.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandAck {
    pub success: bool,
    pub message: String,
}

impl CommandAck {
    pub fn ok(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Query and command interface of the trading daemon
///
/// Each query is a blocking call returning a snapshot; each command returns a
/// `CommandAck`. Implementations must keep `start`/`stop` idempotent: calling
/// `start` while running acknowledges success without a transition.
#[async_trait]
pub trait DaemonHandle: Send + Sync {
    async fn portfolio_snapshot(&self) -> ControlResult<PortfolioSnapshot>;
    async fn daemon_status(&self) -> ControlResult<DaemonStatus>;
    async fn auto_trader_status(&self) -> ControlResult<AutoTraderStatus>;
    async fn wallet_status(&self) -> ControlResult<WalletStatus>;
    async fn config(&self) -> ControlResult<DaemonConfig>;
    async fn opportunities(&self) -> ControlResult<Vec<Opportunity>>;
    async fn trade_history(&self) -> ControlResult<Vec<TradeRecord>>;

    async fn start(&self) -> ControlResult<CommandAck>;
    async fn stop(&self) -> ControlResult<CommandAck>;
    async fn set_auto_trading(&self, enabled: bool) -> ControlResult<CommandAck>;
    async fn set_dry_run(&self, enabled: bool) -> ControlResult<CommandAck>;
    /// Merge a partial JSON document into the daemon config
    async fn update_config(&self, partial: serde_json::Value) -> ControlResult<CommandAck>;
    async fn execute_trade(
        &self,
        token_mint: &str,
        sell_percent: Option<f64>,
    ) -> ControlResult<CommandAck>;
}
