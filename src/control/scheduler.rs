/// Fixed-interval background refresh
///
/// One repeating tokio task re-requests {portfolio, trading-status,
/// opportunities} through the resource store every period. Ticks that land
/// while entries are fresh are network no-ops; tick failures are logged and
/// swallowed so the cadence never stalls. `start` refuses to stack a second
/// timer; `stop` halts exactly one.
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

use crate::config::with_config;
use crate::control::resources::{ResourceKey, SCHEDULED_RESOURCES};
use crate::control::store::ResourceStore;
use crate::logger::{self, LogTag};

pub struct RefreshScheduler {
    store: Arc<ResourceStore>,
    period: Duration,
    running: Arc<AtomicBool>,
    shutdown: Arc<Notify>,
}

impl RefreshScheduler {
    pub fn new(store: Arc<ResourceStore>) -> Self {
        let period = Duration::from_secs(with_config(|cfg| cfg.refresh.scheduler_period_secs));
        Self::with_period(store, period)
    }

    pub fn with_period(store: Arc<ResourceStore>, period: Duration) -> Self {
        Self {
            store,
            period,
            running: Arc::new(AtomicBool::new(false)),
            shutdown: Arc::new(Notify::new()),
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Start the repeating refresh task. A no-op when already running, so
    /// repeated session inits never stack timers.
    pub fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            logger::warning(LogTag::Scheduler, "Scheduler already running, not starting again");
            return;
        }

        logger::info(
            LogTag::Scheduler,
            &format!("🔄 Refresh scheduler started ({}s period)", self.period.as_secs()),
        );

        let store = Arc::clone(&self.store);
        let period = self.period;
        let running = Arc::clone(&self.running);
        let shutdown = Arc::clone(&self.shutdown);

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(period) => {
                        Self::tick(&store).await;
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
                if !running.load(Ordering::SeqCst) {
                    break;
                }
            }
            logger::info(LogTag::Scheduler, "Refresh scheduler stopped");
        });
    }

    /// Stop the refresh task. Safe to call when already stopped.
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            self.shutdown.notify_one();
        }
    }

    /// One tick: refresh the scheduled subset through the TTL cache
    async fn tick(store: &ResourceStore) {
        logger::debug(LogTag::Scheduler, "tick");
        for &key in SCHEDULED_RESOURCES {
            if let Err(e) = store.get(key).await {
                // absorbed: the UI keeps last-known-good data and the
                // schedule continues unaffected
                logger::warning(
                    LogTag::Scheduler,
                    &format!("Background refresh of {} failed: {}", key, e),
                );
            }
        }
    }
}

impl Drop for RefreshScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Keys refreshed by each tick (exposed for the controller and tests)
pub fn scheduled_resources() -> &'static [ResourceKey] {
    SCHEDULED_RESOURCES
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> Arc<ResourceStore> {
        use crate::control::client::GatewayClient;
        // port 1 refuses connections; tick failures must be absorbed
        Arc::new(ResourceStore::new(Arc::new(GatewayClient::new(
            "http://127.0.0.1:1",
        ))))
    }

    #[tokio::test]
    async fn start_twice_does_not_stack_timers() {
        let scheduler = RefreshScheduler::with_period(store(), Duration::from_secs(3600));
        scheduler.start();
        assert!(scheduler.is_running());
        scheduler.start(); // warns, does nothing
        assert!(scheduler.is_running());
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn stop_without_start_is_harmless() {
        let scheduler = RefreshScheduler::with_period(store(), Duration::from_secs(3600));
        scheduler.stop();
        scheduler.stop();
        assert!(!scheduler.is_running());
    }

    #[tokio::test]
    async fn failing_ticks_do_not_stop_the_schedule() {
        let scheduler = RefreshScheduler::with_period(store(), Duration::from_millis(20));
        scheduler.start();
        // every tick fails (nothing listens on the target port)
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert!(scheduler.is_running(), "scheduler must survive tick failures");
        scheduler.stop();
    }
}
