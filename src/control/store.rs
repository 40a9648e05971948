/// Client-side resource store
///
/// One TTL cache entry per `ResourceKey`, read through the gateway client.
/// Constructed once per session and passed by reference to the scheduler,
/// tab loader, and dispatcher; there is no ambient global lookup.
use std::sync::Arc;

use crate::cache::{CacheMetrics, TtlCache};
use crate::control::client::{GatewayClient, TradingStatusSnapshot};
use crate::control::resources::ResourceKey;
use crate::control::status::{self, TradingState};
use crate::daemon::{DaemonConfig, Opportunity, PortfolioSnapshot, TradeRecord};
use crate::errors::{ControlError, ControlResult};
use crate::logger::{self, LogTag};

/// Cached payload for one resource key
#[derive(Debug, Clone)]
pub enum Resource {
    Portfolio(PortfolioSnapshot),
    TradingStatus(TradingStatusSnapshot),
    Config(DaemonConfig),
    Opportunities(Vec<Opportunity>),
    TradeHistory(Vec<TradeRecord>),
}

pub struct ResourceStore {
    client: Arc<GatewayClient>,
    cache: TtlCache<ResourceKey, Resource>,
}

impl ResourceStore {
    pub fn new(client: Arc<GatewayClient>) -> Self {
        Self {
            client,
            cache: TtlCache::new(),
        }
    }

    /// Read-through get honoring the per-key TTL; a fresh entry is a network
    /// no-op
    pub async fn get(&self, key: ResourceKey) -> ControlResult<Resource> {
        self.cache
            .get_or_fetch(key, key.ttl(), || self.fetch(key))
            .await
    }

    /// Force the next `get` for this key to hit the gateway
    pub fn invalidate(&self, key: ResourceKey) {
        logger::debug(LogTag::Cache, &format!("invalidating {}", key));
        self.cache.invalidate(&key);
    }

    /// Invalidate-and-refetch in one step (used after successful commands)
    pub async fn refresh(&self, key: ResourceKey) -> ControlResult<Resource> {
        self.invalidate(key);
        self.get(key).await
    }

    pub fn metrics(&self) -> CacheMetrics {
        self.cache.metrics()
    }

    async fn fetch(&self, key: ResourceKey) -> ControlResult<Resource> {
        logger::debug(LogTag::Cache, &format!("fetching {} from gateway", key));
        match key {
            ResourceKey::Portfolio => self.client.portfolio().await.map(Resource::Portfolio),
            ResourceKey::TradingStatus => self
                .client
                .trading_status()
                .await
                .map(Resource::TradingStatus),
            ResourceKey::Config => self.client.daemon_config().await.map(Resource::Config),
            ResourceKey::Opportunities => self
                .client
                .opportunities()
                .await
                .map(Resource::Opportunities),
            ResourceKey::TradeHistory => self
                .client
                .trade_history()
                .await
                .map(Resource::TradeHistory),
        }
    }

    // =========================================================================
    // TYPED ACCESSORS
    // =========================================================================

    pub async fn portfolio(&self) -> ControlResult<PortfolioSnapshot> {
        match self.get(ResourceKey::Portfolio).await? {
            Resource::Portfolio(p) => Ok(p),
            _ => Err(mismatch(ResourceKey::Portfolio)),
        }
    }

    pub async fn trading_status(&self) -> ControlResult<TradingStatusSnapshot> {
        match self.get(ResourceKey::TradingStatus).await? {
            Resource::TradingStatus(s) => Ok(s),
            _ => Err(mismatch(ResourceKey::TradingStatus)),
        }
    }

    pub async fn daemon_config(&self) -> ControlResult<DaemonConfig> {
        match self.get(ResourceKey::Config).await? {
            Resource::Config(c) => Ok(c),
            _ => Err(mismatch(ResourceKey::Config)),
        }
    }

    pub async fn opportunities(&self) -> ControlResult<Vec<Opportunity>> {
        match self.get(ResourceKey::Opportunities).await? {
            Resource::Opportunities(o) => Ok(o),
            _ => Err(mismatch(ResourceKey::Opportunities)),
        }
    }

    pub async fn trade_history(&self) -> ControlResult<Vec<TradeRecord>> {
        match self.get(ResourceKey::TradeHistory).await? {
            Resource::TradeHistory(h) => Ok(h),
            _ => Err(mismatch(ResourceKey::TradeHistory)),
        }
    }

    /// Last fetched status without touching the network
    pub fn peek_trading_status(&self) -> Option<TradingStatusSnapshot> {
        match self.cache.peek(&ResourceKey::TradingStatus) {
            Some(Resource::TradingStatus(s)) => Some(s),
            _ => None,
        }
    }

    /// Reconciled state derived from the latest cached snapshots
    ///
    /// Derived on every call, never stored: it is a pure function of
    /// already-cached inputs and cannot go stale on its own.
    pub fn trading_state(&self) -> TradingState {
        let snapshot = self.peek_trading_status();
        status::reconcile(
            snapshot.as_ref().map(|s| &s.daemon),
            snapshot.as_ref().map(|s| &s.wallet),
            snapshot.as_ref().map(|s| &s.auto_trader),
        )
    }
}

fn mismatch(key: ResourceKey) -> ControlError {
    ControlError::Malformed(format!("cache entry for {} holds a different resource", key))
}
