use std::sync::Arc;

use tradedeck::{
    arguments,
    config::load_config_from_path,
    daemon::simulated::SimulatedDaemon,
    logger::{self, LogTag},
    webserver::{self, state::AppState},
};

/// Main entry point for the tradedeck gateway
///
/// Runs the HTTP gateway in front of a simulated trading daemon. The control
/// layer in this crate (resource store, scheduler, dispatcher) talks to this
/// gateway the same way a browser client would.
#[tokio::main]
async fn main() {
    let args = arguments::init().clone();

    logger::init();
    logger::info(LogTag::System, "🚀 tradedeck gateway starting up...");

    // Missing config file is not fatal, defaults apply
    if let Err(e) = load_config_from_path(&args.config) {
        logger::warning(
            LogTag::Config,
            &format!("📂 Using default config ({}): {}", args.config, e),
        );
    }

    let daemon = Arc::new(SimulatedDaemon::new().with_price_jitter());
    let state = Arc::new(AppState::new(daemon));

    // Ctrl-C triggers graceful shutdown
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            logger::info(LogTag::System, "⏸️ Ctrl-C received, shutting down...");
            webserver::shutdown();
        }
    });

    if let Err(e) = webserver::start_server(state).await {
        logger::error(LogTag::Webserver, &format!("🚫 {}", e));
        std::process::exit(1);
    }

    logger::info(LogTag::System, "✅ tradedeck gateway stopped");
}
