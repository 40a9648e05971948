/// Resource identities and refresh tables
///
/// Each key names one independently cached resource; staleness of one never
/// implies staleness of another.
use std::time::Duration;

use crate::config::with_config;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKey {
    Portfolio,
    TradingStatus,
    Config,
    Opportunities,
    TradeHistory,
}

/// Resources the background scheduler re-requests on every tick
pub const SCHEDULED_RESOURCES: &[ResourceKey] = &[
    ResourceKey::Portfolio,
    ResourceKey::TradingStatus,
    ResourceKey::Opportunities,
];

impl ResourceKey {
    pub const ALL: &'static [ResourceKey] = &[
        ResourceKey::Portfolio,
        ResourceKey::TradingStatus,
        ResourceKey::Config,
        ResourceKey::Opportunities,
        ResourceKey::TradeHistory,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKey::Portfolio => "portfolio",
            ResourceKey::TradingStatus => "trading-status",
            ResourceKey::Config => "config",
            ResourceKey::Opportunities => "opportunities",
            ResourceKey::TradeHistory => "trade-history",
        }
    }

    /// Client-side TTL for this resource, from config
    pub fn ttl(&self) -> Duration {
        let ms = with_config(|cfg| match self {
            ResourceKey::Portfolio => cfg.refresh.portfolio_ttl_ms,
            ResourceKey::TradingStatus => cfg.refresh.trading_status_ttl_ms,
            ResourceKey::Config => cfg.refresh.config_ttl_ms,
            ResourceKey::Opportunities => cfg.refresh.opportunities_ttl_ms,
            ResourceKey::TradeHistory => cfg.refresh.trade_history_ttl_ms,
        });
        Duration::from_millis(ms)
    }
}

impl std::fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
