/// Status reconciliation
///
/// Pure merge of the daemon/wallet/auto-trader snapshots into one
/// display-ready state. Total over absent inputs: every missing snapshot
/// resolves to a documented default, never an error. Recomputed on demand
/// from already-cached inputs and never cached itself.
use serde::Serialize;

use crate::daemon::{AutoTraderStatus, DaemonStatus, WalletStatus};

/// Connection tier of the control surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConnectionState {
    /// No wallet connection; overrides every other signal
    Disconnected,
    /// Wallet connected but unable to sign transactions
    ReadOnly,
    /// Wallet connected and signing
    Live,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TradingState {
    pub connection: ConnectionState,
    pub daemon_running: bool,
    pub auto_trading_enabled: bool,
    pub daily_trades: u32,
    pub success_rate_percent: f64,
}

/// Merge status snapshots with fixed precedence:
/// 1. wallet not connected (or absent) -> Disconnected, regardless of daemon
/// 2. wallet can sign -> Live
/// 3. otherwise -> ReadOnly
///
/// Daemon-running and auto-trading flags layer on top without affecting the
/// connection tier; counters pass through, defaulting to zero when absent.
pub fn reconcile(
    daemon: Option<&DaemonStatus>,
    wallet: Option<&WalletStatus>,
    auto_trader: Option<&AutoTraderStatus>,
) -> TradingState {
    let connection = match wallet {
        Some(w) if w.connected && w.can_sign => ConnectionState::Live,
        Some(w) if w.connected => ConnectionState::ReadOnly,
        _ => ConnectionState::Disconnected,
    };

    TradingState {
        connection,
        daemon_running: daemon.map(|d| d.is_running).unwrap_or(false),
        auto_trading_enabled: auto_trader.map(|a| a.enabled).unwrap_or(false),
        daily_trades: auto_trader.map(|a| a.daily_trades).unwrap_or(0),
        success_rate_percent: auto_trader.map(|a| a.success_rate).unwrap_or(0.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wallet(connected: bool, can_sign: bool) -> WalletStatus {
        WalletStatus {
            connected,
            can_sign,
            public_key: connected.then(|| "wallet111".to_string()),
        }
    }

    #[test]
    fn signing_wallet_is_live_regardless_of_daemon() {
        for is_running in [true, false] {
            let state = reconcile(
                Some(&DaemonStatus { is_running }),
                Some(&wallet(true, true)),
                None,
            );
            assert_eq!(state.connection, ConnectionState::Live);
            assert_eq!(state.daemon_running, is_running);
        }
    }

    #[test]
    fn disconnected_wallet_overrides_running_daemon() {
        let state = reconcile(
            Some(&DaemonStatus { is_running: true }),
            Some(&wallet(false, false)),
            Some(&AutoTraderStatus {
                enabled: true,
                daily_trades: 4,
                daily_trade_limit: 10,
                success_rate: 80.0,
            }),
        );
        assert_eq!(state.connection, ConnectionState::Disconnected);
        // independent flags still pass through
        assert!(state.daemon_running);
        assert!(state.auto_trading_enabled);
    }

    #[test]
    fn connected_non_signing_wallet_is_read_only() {
        let state = reconcile(None, Some(&wallet(true, false)), None);
        assert_eq!(state.connection, ConnectionState::ReadOnly);
    }

    #[test]
    fn total_over_every_absent_combination() {
        let daemon = DaemonStatus { is_running: true };
        let w = wallet(true, true);
        let auto = AutoTraderStatus {
            enabled: false,
            daily_trades: 2,
            daily_trade_limit: 10,
            success_rate: 50.0,
        };

        for d in [None, Some(&daemon)] {
            for wl in [None, Some(&w)] {
                for a in [None, Some(&auto)] {
                    let state = reconcile(d, wl, a);
                    // exactly one tier, counters never garbage
                    assert!(matches!(
                        state.connection,
                        ConnectionState::Disconnected
                            | ConnectionState::ReadOnly
                            | ConnectionState::Live
                    ));
                    assert!(state.success_rate_percent >= 0.0);
                }
            }
        }
    }

    #[test]
    fn absent_everything_defaults_to_disconnected_zeroes() {
        let state = reconcile(None, None, None);
        assert_eq!(state.connection, ConnectionState::Disconnected);
        assert!(!state.daemon_running);
        assert!(!state.auto_trading_enabled);
        assert_eq!(state.daily_trades, 0);
        assert_eq!(state.success_rate_percent, 0.0);
    }
}
