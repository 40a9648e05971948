/// Command dispatch with an explicit confirmation protocol
///
/// Commands bypass every cache on the way down. After the daemon acknowledges
/// success, the dispatcher invalidates exactly the resource keys the command
/// declares and refetches them immediately so the UI reflects the new state
/// without waiting for the next scheduler tick. Failures leave all caches
/// untouched.
///
/// Financially destructive commands go through a two-step propose/confirm
/// handshake instead of a blocking prompt: `dispatch` hands back a `Proposal`,
/// and nothing touches the network until `confirm` is called. `decline` drops
/// the proposal with zero network effect.
use serde_json::Value;
use std::sync::Arc;
use uuid::Uuid;

use crate::control::client::GatewayClient;
use crate::control::resources::ResourceKey;
use crate::control::store::ResourceStore;
use crate::errors::ControlResult;
use crate::logger::{self, LogTag};

#[derive(Debug, Clone, PartialEq)]
pub enum CommandKind {
    Start,
    Stop,
    SetAutoTrading { enabled: bool },
    SetDryRun { enabled: bool },
    SaveConfig { partial: Value },
    ExecuteTrade { token_mint: String, sell_percent: Option<f64> },
}

impl CommandKind {
    /// Cache entries that must be invalidated once this command succeeds
    pub fn target_resource_keys(&self) -> &'static [ResourceKey] {
        match self {
            CommandKind::Start | CommandKind::Stop | CommandKind::SetAutoTrading { .. } => {
                &[ResourceKey::TradingStatus]
            }
            CommandKind::SetDryRun { .. } => &[ResourceKey::Config, ResourceKey::TradingStatus],
            CommandKind::SaveConfig { .. } => &[ResourceKey::Config],
            CommandKind::ExecuteTrade { .. } => {
                &[ResourceKey::Portfolio, ResourceKey::Opportunities]
            }
        }
    }

    /// Financial/destructive commands need the propose/confirm handshake
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, CommandKind::ExecuteTrade { .. })
    }

    fn describe(&self) -> String {
        match self {
            CommandKind::Start => "start daemon".to_string(),
            CommandKind::Stop => "stop daemon".to_string(),
            CommandKind::SetAutoTrading { enabled } => {
                format!("set auto-trading {}", if *enabled { "on" } else { "off" })
            }
            CommandKind::SetDryRun { enabled } => {
                format!("set dry-run {}", if *enabled { "on" } else { "off" })
            }
            CommandKind::SaveConfig { .. } => "save config".to_string(),
            CommandKind::ExecuteTrade { token_mint, sell_percent } => format!(
                "execute trade: sell {}% of {}",
                sell_percent.unwrap_or(100.0),
                token_mint
            ),
        }
    }
}

/// A confirmation-gated command waiting for an explicit yes/no
#[derive(Debug)]
pub struct Proposal {
    pub id: Uuid,
    pub summary: String,
    kind: CommandKind,
}

#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub message: String,
}

/// Result of a dispatch attempt
#[derive(Debug)]
pub enum Dispatch {
    Executed(CommandOutcome),
    AwaitingConfirmation(Proposal),
}

pub struct CommandDispatcher {
    client: Arc<GatewayClient>,
    store: Arc<ResourceStore>,
}

impl CommandDispatcher {
    pub fn new(client: Arc<GatewayClient>, store: Arc<ResourceStore>) -> Self {
        Self { client, store }
    }

    /// Dispatch a command, or hand back a proposal when confirmation is
    /// required. Idempotent commands (start/stop) relay the daemon's verdict;
    /// repeats are not errors.
    pub async fn dispatch(&self, kind: CommandKind) -> ControlResult<Dispatch> {
        if kind.requires_confirmation() {
            let proposal = Proposal {
                id: Uuid::new_v4(),
                summary: kind.describe(),
                kind,
            };
            logger::info(
                LogTag::Dispatcher,
                &format!("⏸️ Awaiting confirmation: {} ({})", proposal.summary, proposal.id),
            );
            return Ok(Dispatch::AwaitingConfirmation(proposal));
        }

        self.execute(kind).await.map(Dispatch::Executed)
    }

    /// Execute a previously proposed command
    pub async fn confirm(&self, proposal: Proposal) -> ControlResult<CommandOutcome> {
        logger::info(
            LogTag::Dispatcher,
            &format!("✅ Confirmed: {} ({})", proposal.summary, proposal.id),
        );
        self.execute(proposal.kind).await
    }

    /// Drop a proposal with zero network effect
    pub fn decline(&self, proposal: Proposal) {
        logger::info(
            LogTag::Dispatcher,
            &format!("🚫 Declined: {} ({})", proposal.summary, proposal.id),
        );
    }

    async fn execute(&self, kind: CommandKind) -> ControlResult<CommandOutcome> {
        logger::debug(LogTag::Dispatcher, &format!("executing: {}", kind.describe()));

        let result = match &kind {
            CommandKind::Start => self.client.start().await,
            CommandKind::Stop => self.client.stop().await,
            CommandKind::SetAutoTrading { enabled } => {
                self.client.set_auto_trading(*enabled).await
            }
            CommandKind::SetDryRun { enabled } => {
                self.client
                    .update_config(serde_json::json!({ "execution": { "dry_run": enabled } }))
                    .await
            }
            CommandKind::SaveConfig { partial } => {
                self.client.update_config(partial.clone()).await
            }
            CommandKind::ExecuteTrade { token_mint, sell_percent } => {
                self.client.execute_trade(token_mint, *sell_percent).await
            }
        };

        match result {
            Ok(message) => {
                for &key in kind.target_resource_keys() {
                    // refetch immediately; a failed refetch is a notification
                    // concern, not a command failure
                    if let Err(e) = self.store.refresh(key).await {
                        logger::warning(
                            LogTag::Dispatcher,
                            &format!("Post-command refresh of {} failed: {}", key, e),
                        );
                    }
                }
                Ok(CommandOutcome { message })
            }
            Err(e) => {
                logger::warning(
                    LogTag::Dispatcher,
                    &format!("Command failed ({}): {}", kind.describe(), e.notification()),
                );
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::resources::ResourceKey;
    use crate::daemon::{DaemonHandle, SimulatedDaemon};
    use crate::errors::ControlError;
    use crate::webserver::{routes::create_router, state::AppState};
    use std::sync::atomic::Ordering;

    const SAMO_MINT: &str = "7xKXtg2CW87d97TXJSDpbD5jBkheTqA83TZRuJosgAsU";

    async fn spawn_gateway(daemon: Arc<SimulatedDaemon>) -> String {
        let state = Arc::new(AppState::new(daemon as Arc<dyn DaemonHandle>));
        let app = create_router(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn wire(base_url: &str) -> (Arc<ResourceStore>, CommandDispatcher) {
        let client = Arc::new(GatewayClient::new(base_url));
        let store = Arc::new(ResourceStore::new(client.clone()));
        let dispatcher = CommandDispatcher::new(client, store.clone());
        (store, dispatcher)
    }

    #[tokio::test]
    async fn start_twice_never_fails_on_second_call() {
        let daemon = Arc::new(SimulatedDaemon::new());
        let base = spawn_gateway(daemon).await;
        let (_store, dispatcher) = wire(&base);

        for _ in 0..2 {
            match dispatcher.dispatch(CommandKind::Start).await.unwrap() {
                Dispatch::Executed(_) => {}
                other => panic!("start must execute directly, got {:?}", other),
            }
        }

        for _ in 0..2 {
            assert!(matches!(
                dispatcher.dispatch(CommandKind::Stop).await.unwrap(),
                Dispatch::Executed(_)
            ));
        }
    }

    #[tokio::test]
    async fn execute_trade_invalidates_portfolio_and_opportunities_only() {
        let daemon = Arc::new(SimulatedDaemon::new());
        let base = spawn_gateway(daemon.clone()).await;
        let (store, dispatcher) = wire(&base);

        // prime every cache
        store.portfolio().await.unwrap();
        store.opportunities().await.unwrap();
        store.trade_history().await.unwrap();
        assert_eq!(daemon.calls.portfolio.load(Ordering::SeqCst), 1);
        assert_eq!(daemon.calls.opportunities.load(Ordering::SeqCst), 1);
        assert_eq!(daemon.calls.trade_history.load(Ordering::SeqCst), 1);

        let proposal = match dispatcher
            .dispatch(CommandKind::ExecuteTrade {
                token_mint: SAMO_MINT.to_string(),
                sell_percent: Some(25.0),
            })
            .await
            .unwrap()
        {
            Dispatch::AwaitingConfirmation(p) => p,
            other => panic!("trade must require confirmation, got {:?}", other),
        };
        dispatcher.confirm(proposal).await.unwrap();

        // targeted keys were refetched all the way down to the daemon
        assert_eq!(daemon.calls.portfolio.load(Ordering::SeqCst), 2);
        assert_eq!(daemon.calls.opportunities.load(Ordering::SeqCst), 2);
        // trade-history was untouched
        assert_eq!(daemon.calls.trade_history.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn failed_command_surfaces_message_and_invalidates_nothing() {
        let daemon = Arc::new(SimulatedDaemon::new());
        let base = spawn_gateway(daemon.clone()).await;
        let (store, dispatcher) = wire(&base);

        store.portfolio().await.unwrap();
        let portfolio_fetches = daemon.calls.portfolio.load(Ordering::SeqCst);

        daemon.fail_next_command("insufficient balance");
        let proposal = match dispatcher
            .dispatch(CommandKind::ExecuteTrade {
                token_mint: SAMO_MINT.to_string(),
                sell_percent: None,
            })
            .await
            .unwrap()
        {
            Dispatch::AwaitingConfirmation(p) => p,
            other => panic!("unexpected {:?}", other),
        };

        let err = dispatcher.confirm(proposal).await.unwrap_err();
        assert_eq!(err.notification(), "insufficient balance");
        assert!(matches!(err, ControlError::Http { status: 500, .. }));

        // previous data still cached and fresh: no new daemon fetch
        store.portfolio().await.unwrap();
        assert_eq!(daemon.calls.portfolio.load(Ordering::SeqCst), portfolio_fetches);
        assert_eq!(store.metrics().invalidations, 0);
    }

    #[tokio::test]
    async fn declined_proposal_has_no_network_effect() {
        let daemon = Arc::new(SimulatedDaemon::new());
        let base = spawn_gateway(daemon.clone()).await;
        let (_store, dispatcher) = wire(&base);

        let proposal = match dispatcher
            .dispatch(CommandKind::ExecuteTrade {
                token_mint: SAMO_MINT.to_string(),
                sell_percent: Some(50.0),
            })
            .await
            .unwrap()
        {
            Dispatch::AwaitingConfirmation(p) => p,
            other => panic!("unexpected {:?}", other),
        };
        dispatcher.decline(proposal);

        assert!(daemon.trade_history().await.unwrap().is_empty());
        assert_eq!(daemon.calls.portfolio.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn set_dry_run_refreshes_config_and_status() {
        let daemon = Arc::new(SimulatedDaemon::new());
        let base = spawn_gateway(daemon.clone()).await;
        let (store, dispatcher) = wire(&base);

        store.daemon_config().await.unwrap();
        assert!(store.daemon_config().await.unwrap().execution.dry_run);

        dispatcher
            .dispatch(CommandKind::SetDryRun { enabled: false })
            .await
            .unwrap();

        // cache was refreshed with the post-command value
        assert!(!store.daemon_config().await.unwrap().execution.dry_run);
    }
}
