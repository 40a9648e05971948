/// Shared application state for the gateway webserver
///
/// Constructed once at process start and passed by reference to every route
/// handler; no ambient global lookup. Holds the daemon seam and the
/// server-side portfolio cache shared by all connected clients.
use std::sync::Arc;
use std::time::Duration;

use crate::cache::TtlCache;
use crate::config::with_config;
use crate::control::resources::ResourceKey;
use crate::daemon::{DaemonHandle, PortfolioSnapshot};

pub struct AppState {
    /// Command/query interface of the trading daemon
    pub daemon: Arc<dyn DaemonHandle>,

    /// Shared cache in front of the expensive portfolio-refresh call.
    /// All clients observe the same staleness bound.
    pub portfolio_cache: TtlCache<ResourceKey, PortfolioSnapshot>,

    /// Server startup time
    pub startup_time: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(daemon: Arc<dyn DaemonHandle>) -> Self {
        Self {
            daemon,
            portfolio_cache: TtlCache::new(),
            startup_time: chrono::Utc::now(),
        }
    }

    /// TTL of the shared portfolio cache
    pub fn portfolio_ttl(&self) -> Duration {
        Duration::from_secs(with_config(|cfg| cfg.webserver.portfolio_cache_ttl_secs))
    }

    /// Get server uptime in seconds
    pub fn uptime_seconds(&self) -> u64 {
        (chrono::Utc::now() - self.startup_time).num_seconds().max(0) as u64
    }
}
