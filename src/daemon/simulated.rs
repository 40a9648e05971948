/// In-memory simulated daemon
///
/// Backs standalone runs and tests the way the bot's simulation mode backs a
/// live session: paper positions, start/stop and auto-trading flags, a daily
/// trade limit, and a trade history fed by executed commands. No network, no
/// signing; the wallet reports as connected and able to sign.
use async_trait::async_trait;
use chrono::Utc;
use rand::Rng;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;

use super::{
    AutoTraderStatus, CommandAck, DaemonConfig, DaemonHandle, DaemonStatus, Opportunity,
    PortfolioSnapshot, PositionSnapshot, TradeAction, TradeRecord, WalletStatus,
};
use crate::errors::ControlResult;
use crate::logger::{self, LogTag};

struct SimState {
    running: bool,
    auto_enabled: bool,
    daily_trades: u32,
    successful_trades: u32,
    total_trades: u32,
    config: DaemonConfig,
    sol_balance: f64,
    positions: Vec<PositionSnapshot>,
    history: Vec<TradeRecord>,
    wallet: WalletStatus,
    fail_next_command: Option<String>,
}

/// Per-query invocation counters, used by tests to prove cache behavior
#[derive(Debug, Default)]
pub struct CallCounts {
    pub portfolio: AtomicU32,
    pub daemon_status: AtomicU32,
    pub auto_trader_status: AtomicU32,
    pub wallet_status: AtomicU32,
    pub config: AtomicU32,
    pub opportunities: AtomicU32,
    pub trade_history: AtomicU32,
}

pub struct SimulatedDaemon {
    state: Mutex<SimState>,
    pub calls: CallCounts,
    price_jitter: bool,
}

impl SimulatedDaemon {
    pub fn new() -> Self {
        let positions = vec![
            PositionSnapshot {
                token_mint: "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU".to_string(),
                symbol: "SAMO".to_string(),
                amount: 1250.0,
                entry_price: 0.0042,
                current_price: 0.0055,
                unrealized_pnl_percent: 30.95,
            },
            PositionSnapshot {
                token_mint: "DezXAZ8z7PnrnRJjz3wXBoRgixCa6xjnB7YaB1pPB263".to_string(),
                symbol: "BONK".to_string(),
                amount: 500_000.0,
                entry_price: 0.0000125,
                current_price: 0.0000118,
                unrealized_pnl_percent: -5.6,
            },
        ];

        Self {
            state: Mutex::new(SimState {
                running: false,
                auto_enabled: false,
                daily_trades: 0,
                successful_trades: 0,
                total_trades: 0,
                config: DaemonConfig::default(),
                sol_balance: 8.7,
                positions,
                history: Vec::new(),
                wallet: WalletStatus {
                    connected: true,
                    can_sign: true,
                    public_key: Some("S1mu1atedWa11etPubkey1111111111111111111111".to_string()),
                },
                fail_next_command: None,
            }),
            calls: CallCounts::default(),
            price_jitter: false,
        }
    }

    /// Apply a small random walk to position prices on every snapshot so a
    /// live dashboard has something to show
    pub fn with_price_jitter(mut self) -> Self {
        self.price_jitter = true;
        self
    }

    pub fn set_wallet(&self, wallet: WalletStatus) {
        self.state.lock().unwrap().wallet = wallet;
    }

    pub fn set_max_daily_trades(&self, limit: u32) {
        self.state.lock().unwrap().config.risk_management.max_daily_trades = limit;
    }

    /// Make the next command fail with the given daemon-reported message
    pub fn fail_next_command(&self, message: impl Into<String>) {
        self.state.lock().unwrap().fail_next_command = Some(message.into());
    }

    fn take_forced_failure(state: &mut SimState) -> Option<CommandAck> {
        state.fail_next_command.take().map(CommandAck::failed)
    }
}

impl Default for SimulatedDaemon {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DaemonHandle for SimulatedDaemon {
    async fn portfolio_snapshot(&self) -> ControlResult<PortfolioSnapshot> {
        self.calls.portfolio.fetch_add(1, Ordering::SeqCst);
        let mut state = self.state.lock().unwrap();

        if self.price_jitter {
            let mut rng = rand::thread_rng();
            for position in &mut state.positions {
                let drift: f64 = rng.gen_range(-0.01..0.01);
                position.current_price *= 1.0 + drift;
                position.unrealized_pnl_percent =
                    (position.current_price / position.entry_price - 1.0) * 100.0;
            }
        }

        let token_value: f64 = state
            .positions
            .iter()
            .map(|p| p.amount * p.current_price)
            .sum();
        let cost_basis: f64 = state
            .positions
            .iter()
            .map(|p| p.amount * p.entry_price)
            .sum();
        let pnl: f64 = token_value - cost_basis;

        Ok(PortfolioSnapshot {
            total_value: state.sol_balance + token_value,
            total_unrealized_pnl: pnl,
            total_unrealized_pnl_percent: if cost_basis > 0.0 {
                pnl / cost_basis * 100.0
            } else {
                0.0
            },
            sol_balance: state.sol_balance,
            positions: state.positions.clone(),
        })
    }

    async fn daemon_status(&self) -> ControlResult<DaemonStatus> {
        self.calls.daemon_status.fetch_add(1, Ordering::SeqCst);
        Ok(DaemonStatus {
            is_running: self.state.lock().unwrap().running,
        })
    }

    async fn auto_trader_status(&self) -> ControlResult<AutoTraderStatus> {
        self.calls.auto_trader_status.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();
        Ok(AutoTraderStatus {
            enabled: state.auto_enabled,
            daily_trades: state.daily_trades,
            daily_trade_limit: state.config.risk_management.max_daily_trades,
            success_rate: if state.total_trades > 0 {
                state.successful_trades as f64 / state.total_trades as f64 * 100.0
            } else {
                0.0
            },
        })
    }

    async fn wallet_status(&self) -> ControlResult<WalletStatus> {
        self.calls.wallet_status.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().wallet.clone())
    }

    async fn config(&self) -> ControlResult<DaemonConfig> {
        self.calls.config.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().config.clone())
    }

    async fn opportunities(&self) -> ControlResult<Vec<Opportunity>> {
        self.calls.opportunities.fetch_add(1, Ordering::SeqCst);
        let state = self.state.lock().unwrap();

        let ladder = &state.config.profit_taking.targets;
        let opportunities = state
            .positions
            .iter()
            .filter(|p| p.unrealized_pnl_percent > 0.0)
            .map(|p| {
                // highest ladder rung the position has crossed
                let recommended = ladder
                    .iter()
                    .filter(|t| p.unrealized_pnl_percent >= t.profit_percent)
                    .map(|t| t.sell_percent)
                    .fold(0.0_f64, f64::max);
                Opportunity {
                    token_mint: p.token_mint.clone(),
                    symbol: p.symbol.clone(),
                    current_profit_percent: p.unrealized_pnl_percent,
                    recommended_sell_percent: if recommended > 0.0 { recommended } else { 25.0 },
                }
            })
            .collect();

        Ok(opportunities)
    }

    async fn trade_history(&self) -> ControlResult<Vec<TradeRecord>> {
        self.calls.trade_history.fetch_add(1, Ordering::SeqCst);
        Ok(self.state.lock().unwrap().history.clone())
    }

    async fn start(&self) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }
        if state.running {
            return Ok(CommandAck::ok("Daemon already running"));
        }
        state.running = true;
        logger::info(LogTag::Daemon, "▶️ Simulated daemon started");
        Ok(CommandAck::ok("Daemon started"))
    }

    async fn stop(&self) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }
        if !state.running {
            return Ok(CommandAck::ok("Daemon already stopped"));
        }
        state.running = false;
        logger::info(LogTag::Daemon, "⏹️ Simulated daemon stopped");
        Ok(CommandAck::ok("Daemon stopped"))
    }

    async fn set_auto_trading(&self, enabled: bool) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }
        state.auto_enabled = enabled;
        Ok(CommandAck::ok(if enabled {
            "Auto-trading enabled"
        } else {
            "Auto-trading disabled"
        }))
    }

    async fn set_dry_run(&self, enabled: bool) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }
        state.config.execution.dry_run = enabled;
        Ok(CommandAck::ok(if enabled {
            "Dry-run mode enabled"
        } else {
            "Dry-run mode disabled"
        }))
    }

    async fn update_config(&self, partial: serde_json::Value) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }

        let mut merged = match serde_json::to_value(&state.config) {
            Ok(v) => v,
            Err(e) => return Ok(CommandAck::failed(format!("Config serialize failed: {}", e))),
        };
        merge_json(&mut merged, &partial);

        match serde_json::from_value::<DaemonConfig>(merged) {
            Ok(config) => {
                state.config = config;
                Ok(CommandAck::ok("Config updated"))
            }
            Err(e) => Ok(CommandAck::failed(format!("Invalid config update: {}", e))),
        }
    }

    async fn execute_trade(
        &self,
        token_mint: &str,
        sell_percent: Option<f64>,
    ) -> ControlResult<CommandAck> {
        let mut state = self.state.lock().unwrap();
        if let Some(ack) = Self::take_forced_failure(&mut state) {
            return Ok(ack);
        }

        if state.daily_trades >= state.config.risk_management.max_daily_trades {
            return Ok(CommandAck::failed("Daily trade limit reached"));
        }

        let Some(index) = state.positions.iter().position(|p| p.token_mint == token_mint) else {
            return Ok(CommandAck::failed(format!("Unknown token mint: {}", token_mint)));
        };

        let sell_percent = sell_percent.unwrap_or(100.0).clamp(0.0, 100.0);
        let position = &mut state.positions[index];
        let sold_amount = position.amount * sell_percent / 100.0;
        let proceeds = sold_amount * position.current_price;
        let price = position.current_price;
        let symbol = position.symbol.clone();

        position.amount -= sold_amount;
        if position.amount <= f64::EPSILON {
            state.positions.remove(index);
        }

        state.sol_balance += proceeds;
        state.daily_trades += 1;
        state.total_trades += 1;
        state.successful_trades += 1;
        state.history.push(TradeRecord {
            timestamp: Utc::now(),
            token_symbol: symbol.clone(),
            action: TradeAction::Sell,
            amount: sold_amount,
            price,
            success: true,
        });

        logger::info(
            LogTag::Daemon,
            &format!("💸 Simulated sell: {:.2}% of {} for {:.4} SOL", sell_percent, symbol, proceeds),
        );
        Ok(CommandAck::ok(format!("Sold {:.2}% of {}", sell_percent, symbol)))
    }
}

/// Deep-merge `patch` into `target`: objects merge recursively, anything else
/// replaces wholesale
fn merge_json(target: &mut serde_json::Value, patch: &serde_json::Value) {
    match (target, patch) {
        (serde_json::Value::Object(target_map), serde_json::Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                merge_json(
                    target_map.entry(key.clone()).or_insert(serde_json::Value::Null),
                    value,
                );
            }
        }
        (target_slot, patch_value) => {
            *target_slot = patch_value.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn start_and_stop_are_idempotent() {
        let daemon = SimulatedDaemon::new();

        assert!(daemon.start().await.unwrap().success);
        let second = daemon.start().await.unwrap();
        assert!(second.success, "repeat start must not fail: {}", second.message);

        assert!(daemon.stop().await.unwrap().success);
        let second = daemon.stop().await.unwrap();
        assert!(second.success, "repeat stop must not fail: {}", second.message);
    }

    #[tokio::test]
    async fn execute_trade_respects_daily_limit() {
        let daemon = SimulatedDaemon::new();
        daemon.set_max_daily_trades(1);

        let mint = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";
        assert!(daemon.execute_trade(mint, Some(10.0)).await.unwrap().success);

        let blocked = daemon.execute_trade(mint, Some(10.0)).await.unwrap();
        assert!(!blocked.success);
        assert_eq!(blocked.message, "Daily trade limit reached");
    }

    #[tokio::test]
    async fn executed_trade_lands_in_history_and_counters() {
        let daemon = SimulatedDaemon::new();
        let mint = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

        daemon.execute_trade(mint, Some(50.0)).await.unwrap();

        let history = daemon.trade_history().await.unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].token_symbol, "SAMO");
        assert!(history[0].success);

        let auto = daemon.auto_trader_status().await.unwrap();
        assert_eq!(auto.daily_trades, 1);
        assert_eq!(auto.success_rate, 100.0);
    }

    #[tokio::test]
    async fn partial_config_update_merges() {
        let daemon = SimulatedDaemon::new();

        let ack = daemon
            .update_config(serde_json::json!({ "execution": { "dry_run": false } }))
            .await
            .unwrap();
        assert!(ack.success);

        let config = daemon.config().await.unwrap();
        assert!(!config.execution.dry_run);
        // untouched sections keep their values
        assert_eq!(config.execution.slippage_percent, 5.0);
        assert_eq!(config.risk_management.max_daily_trades, 10);
    }
}
