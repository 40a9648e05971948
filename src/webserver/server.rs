/// Axum webserver implementation
///
/// Main server lifecycle management including startup, shutdown, and graceful termination
use axum::Router;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tower_http::cors::CorsLayer;

use crate::{
    arguments,
    config::with_config,
    logger::{self, LogTag},
    webserver::{routes, state::AppState},
};

/// Global shutdown notifier
static SHUTDOWN_NOTIFY: once_cell::sync::Lazy<Arc<Notify>> =
    once_cell::sync::Lazy::new(|| Arc::new(Notify::new()));

/// Start the webserver
///
/// Binds to the configured host/port (CLI overrides win) and blocks until
/// the server is shut down
pub async fn start_server(state: Arc<AppState>) -> Result<(), String> {
    let (host, port) = bind_target();

    logger::debug(
        LogTag::Webserver,
        &format!("🌐 Starting webserver on {}:{}", host, port),
    );

    // Build the router
    let app = build_app(state);

    // Parse bind address
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .map_err(|e| format!("Invalid bind address: {}", e))?;

    // Create TCP listener
    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        // Provide helpful error message for common cases
        match e.kind() {
            std::io::ErrorKind::AddrInUse => {
                format!(
                    "Failed to bind to {}: Address already in use\n\
                     \n\
                     This usually means another instance of tradedeck is running.\n\
                     \n\
                     To verify and stop other instances:\n\
                       1. Check: ps aux | grep tradedeck | grep -v grep\n\
                       2. Stop: pkill -f tradedeck",
                    addr
                )
            }
            std::io::ErrorKind::PermissionDenied => {
                format!(
                    "Failed to bind to {}: Permission denied\n\
                     \n\
                     Port {} requires elevated privileges on this system.\n\
                     Consider using a port above 1024 or running with appropriate permissions.",
                    addr, port
                )
            }
            _ => format!("Failed to bind to {}: {}", addr, e),
        }
    })?;

    logger::info(
        LogTag::Webserver,
        &format!("✅ Webserver listening on http://{}", addr),
    );
    logger::debug(
        LogTag::Webserver,
        &format!("📊 API endpoints available at http://{}/api", addr),
    );

    // Run the server with graceful shutdown
    let shutdown_signal = async {
        SHUTDOWN_NOTIFY.notified().await;
        logger::debug(
            LogTag::Webserver,
            "Received shutdown signal, stopping webserver...",
        );
    };

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal)
        .await
        .map_err(|e| format!("Server error: {}", e))?;

    logger::info(LogTag::Webserver, "✅ Webserver stopped gracefully");

    Ok(())
}

/// Trigger webserver shutdown
pub fn shutdown() {
    logger::debug(LogTag::Webserver, "Triggering webserver shutdown...");
    SHUTDOWN_NOTIFY.notify_one();
}

/// Resolve the bind host/port: CLI arguments override the config file
fn bind_target() -> (String, u16) {
    let (host, port) = with_config(|cfg| (cfg.webserver.host.clone(), cfg.webserver.port));

    let args = arguments::get();
    (args.host.unwrap_or(host), args.port.unwrap_or(port))
}

/// Build the Axum application with all routes and middleware
fn build_app(state: Arc<AppState>) -> Router {
    // Browser clients live on other origins during development
    routes::create_router(state).layer(CorsLayer::permissive())
}
