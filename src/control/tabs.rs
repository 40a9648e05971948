/// View activation and the dashboard controller
///
/// One controller parameterized by a static view-configuration table: each
/// view declares the resource keys it needs, and activation fetches them
/// through the TTL cache. The first activation of a view performs its eager
/// load; afterwards it is the cache TTL, not view state, that decides whether
/// re-activation touches the network.
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

use futures::future::join_all;

use crate::control::dispatcher::CommandDispatcher;
use crate::control::resources::ResourceKey;
use crate::control::scheduler::RefreshScheduler;
use crate::control::status::TradingState;
use crate::control::store::ResourceStore;
use crate::errors::ControlError;
use crate::logger::{self, LogTag};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum View {
    Overview,
    Opportunities,
    History,
    Settings,
}

impl View {
    pub fn as_str(&self) -> &'static str {
        match self {
            View::Overview => "overview",
            View::Opportunities => "opportunities",
            View::History => "history",
            View::Settings => "settings",
        }
    }
}

/// Static view-configuration table: the resources each view needs
const VIEW_TABLE: &[(View, &[ResourceKey])] = &[
    (
        View::Overview,
        &[
            ResourceKey::Portfolio,
            ResourceKey::TradingStatus,
            ResourceKey::Opportunities,
        ],
    ),
    (View::Opportunities, &[ResourceKey::Opportunities]),
    (View::History, &[ResourceKey::TradeHistory]),
    (View::Settings, &[ResourceKey::Config]),
];

pub fn view_resources(view: View) -> &'static [ResourceKey] {
    VIEW_TABLE
        .iter()
        .find(|(v, _)| *v == view)
        .map(|(_, keys)| *keys)
        .unwrap_or(&[])
}

/// Session-scoped dashboard controller
///
/// Owns the store, dispatcher, and scheduler for one session; constructed
/// once at session init and dropped at teardown.
pub struct DashboardController {
    store: Arc<ResourceStore>,
    dispatcher: CommandDispatcher,
    scheduler: RefreshScheduler,
    loaded: Mutex<HashSet<View>>,
}

impl DashboardController {
    pub fn new(
        store: Arc<ResourceStore>,
        dispatcher: CommandDispatcher,
        scheduler: RefreshScheduler,
    ) -> Self {
        Self {
            store,
            dispatcher,
            scheduler,
            loaded: Mutex::new(HashSet::new()),
        }
    }

    /// Begin the session: kick off the background refresh cadence
    pub fn start_session(&self) {
        self.scheduler.start();
    }

    /// End the session: stop the background cadence exactly once
    pub fn end_session(&self) {
        self.scheduler.stop();
    }

    pub fn store(&self) -> &Arc<ResourceStore> {
        &self.store
    }

    pub fn dispatcher(&self) -> &CommandDispatcher {
        &self.dispatcher
    }

    /// Activate a view: fetch its resources through the TTL cache
    ///
    /// Member fetches are issued together but resolve independently; there is
    /// no cross-resource atomicity. Per-resource failures are collected, not
    /// fatal — the view renders whatever it has.
    pub async fn activate(&self, view: View) -> Vec<(ResourceKey, ControlError)> {
        let first_activation = self.loaded.lock().unwrap().insert(view);
        if first_activation {
            logger::info(
                LogTag::Control,
                &format!("📂 Loading view '{}' for the first time", view.as_str()),
            );
        } else {
            logger::debug(
                LogTag::Control,
                &format!("re-activating view '{}'", view.as_str()),
            );
        }

        let keys = view_resources(view);
        let results = join_all(keys.iter().map(|&key| async move {
            (key, self.store.get(key).await)
        }))
        .await;

        results
            .into_iter()
            .filter_map(|(key, result)| result.err().map(|e| (key, e)))
            .collect()
    }

    pub fn is_loaded(&self, view: View) -> bool {
        self.loaded.lock().unwrap().contains(&view)
    }

    /// Reconciled connection/trading state from the latest cached snapshots
    pub fn trading_state(&self) -> TradingState {
        self.store.trading_state()
    }
}
