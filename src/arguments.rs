/// Centralized command-line argument handling
///
/// Parsed once at startup and stored globally so the logger can check
/// per-module debug flags without threading the struct everywhere.
use clap::Parser;
use once_cell::sync::OnceCell;

#[derive(Debug, Clone, Parser)]
#[command(name = "tradedeck", about = "Control surface and HTTP gateway for the trading daemon")]
pub struct Arguments {
    /// Host to bind the gateway webserver on
    #[arg(long)]
    pub host: Option<String>,

    /// Port to bind the gateway webserver on
    #[arg(long)]
    pub port: Option<u16>,

    /// Path to the TOML configuration file
    #[arg(long, default_value = "data/config.toml")]
    pub config: String,

    /// Show debug logs for the webserver module
    #[arg(long)]
    pub debug_webserver: bool,

    /// Show debug logs for the cache layer
    #[arg(long)]
    pub debug_cache: bool,

    /// Show debug logs for the control layer (store, tabs, dispatcher)
    #[arg(long)]
    pub debug_control: bool,

    /// Show debug logs for the refresh scheduler
    #[arg(long)]
    pub debug_scheduler: bool,

    /// Show debug logs for the daemon seam
    #[arg(long)]
    pub debug_daemon: bool,

    /// Show verbose logs for every module
    #[arg(long)]
    pub verbose: bool,
}

static ARGUMENTS: OnceCell<Arguments> = OnceCell::new();

/// Parse process arguments and store them globally. Call once from main.
pub fn init() -> &'static Arguments {
    ARGUMENTS.get_or_init(Arguments::parse)
}

/// Store explicit arguments (used by tests and embedding binaries)
pub fn init_with(args: Arguments) {
    ARGUMENTS.set(args).ok();
}

/// Get the parsed arguments, falling back to defaults when init was skipped
pub fn get() -> Arguments {
    ARGUMENTS
        .get()
        .cloned()
        .unwrap_or_else(|| Arguments::parse_from(["tradedeck"]))
}

pub fn is_verbose_enabled() -> bool {
    ARGUMENTS.get().map(|a| a.verbose).unwrap_or(false)
}

/// Check a per-module debug flag by its logger tag key
pub fn is_debug_enabled(module: &str) -> bool {
    let Some(args) = ARGUMENTS.get() else {
        return false;
    };
    match module {
        "webserver" => args.debug_webserver,
        "cache" => args.debug_cache,
        "control" => args.debug_control,
        "scheduler" => args.debug_scheduler,
        "daemon" => args.debug_daemon,
        _ => false,
    }
}
