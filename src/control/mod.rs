/// Client half of the control surface
///
/// Everything the browser-side dashboard logic used to do, minus rendering:
/// per-resource TTL caching over the gateway, fixed-interval background
/// refresh, first-activation tab loading, status reconciliation, and the
/// command dispatch / confirmation protocol.
pub mod client;
pub mod dispatcher;
pub mod resources;
pub mod scheduler;
pub mod status;
pub mod store;
pub mod tabs;

pub use client::GatewayClient;
pub use dispatcher::{CommandDispatcher, CommandKind, CommandOutcome, Dispatch, Proposal};
pub use resources::ResourceKey;
pub use scheduler::RefreshScheduler;
pub use status::{ConnectionState, TradingState};
pub use store::ResourceStore;
pub use tabs::{DashboardController, View};
