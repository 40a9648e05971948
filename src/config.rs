/// Configuration system - loading, hot access, runtime updates
///
/// Single source of truth for control-surface settings, stored globally and
/// accessed through `with_config`. Every field carries a serde default so a
/// missing or partial `config.toml` resolves to documented defaults instead
/// of an error.
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use std::sync::RwLock;

use crate::logger::{self, LogTag};

/// Global configuration instance
pub static CONFIG: OnceCell<RwLock<Config>> = OnceCell::new();

/// Default configuration file path
pub const CONFIG_FILE_PATH: &str = "data/config.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub webserver: WebserverConfig,
    pub refresh: RefreshConfig,
    pub client: ClientConfig,
}

/// Gateway webserver settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebserverConfig {
    pub host: String,
    pub port: u16,
    /// Server-side portfolio cache TTL shared by all connected clients
    pub portfolio_cache_ttl_secs: u64,
}

impl Default for WebserverConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            portfolio_cache_ttl_secs: 30,
        }
    }
}

/// Client-side refresh cadence and per-resource TTLs (milliseconds)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RefreshConfig {
    pub scheduler_period_secs: u64,
    pub portfolio_ttl_ms: u64,
    pub trading_status_ttl_ms: u64,
    pub config_ttl_ms: u64,
    pub opportunities_ttl_ms: u64,
    pub trade_history_ttl_ms: u64,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            scheduler_period_secs: 30,
            portfolio_ttl_ms: 120_000,
            trading_status_ttl_ms: 10_000,
            config_ttl_ms: 60_000,
            opportunities_ttl_ms: 30_000,
            trade_history_ttl_ms: 60_000,
        }
    }
}

/// Settings for the client half of the control surface
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the gateway this client polls
    pub gateway_url: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            gateway_url: "http://127.0.0.1:8080".to_string(),
        }
    }
}

/// Load configuration from disk and initialize the global CONFIG
///
/// Should be called once at startup. A missing file falls back to defaults.
pub fn load_config() -> Result<(), String> {
    load_config_from_path(CONFIG_FILE_PATH)
}

/// Load configuration from a specific file path
pub fn load_config_from_path(path: &str) -> Result<(), String> {
    let config = if std::path::Path::new(path).exists() {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file '{}': {}", path, e))?;

        toml::from_str::<Config>(&contents)
            .map_err(|e| format!("Failed to parse config file '{}': {}", path, e))?
    } else {
        logger::warning(
            LogTag::Config,
            &format!("⚠️ Config file '{}' not found, using default values", path),
        );
        Config::default()
    };

    CONFIG
        .set(RwLock::new(config))
        .map_err(|_| "Config already initialized".to_string())?;

    Ok(())
}

/// Initialize the global CONFIG with explicit values (tests, embedders)
pub fn init_config(config: Config) {
    CONFIG.set(RwLock::new(config)).ok();
}

/// Execute a function with read access to the configuration
///
/// Falls back to defaults when load_config was never called, so library
/// consumers and tests never panic on a missing global.
pub fn with_config<F, R>(f: F) -> R
where
    F: FnOnce(&Config) -> R,
{
    let config_lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));

    match config_lock.read() {
        Ok(config) => f(&config),
        Err(poisoned) => f(&poisoned.into_inner()),
    }
}

/// Get a clone of the entire configuration
///
/// Useful when values must be held across await points.
pub fn get_config_clone() -> Config {
    with_config(|cfg| cfg.clone())
}

/// Update the config in-memory and optionally save to disk
pub fn update_config_section<F>(update_fn: F, save_to_disk: bool) -> Result<(), String>
where
    F: FnOnce(&mut Config),
{
    let config_lock = CONFIG.get_or_init(|| RwLock::new(Config::default()));

    {
        let mut config = config_lock
            .write()
            .map_err(|e| format!("Failed to acquire config write lock: {}", e))?;
        update_fn(&mut config);
    } // lock released before touching disk

    if save_to_disk {
        save_config(None)?;
    }

    Ok(())
}

/// Save the current configuration to disk
pub fn save_config(path: Option<&str>) -> Result<(), String> {
    let path = path.unwrap_or(CONFIG_FILE_PATH);

    let config_str = with_config(|cfg| {
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))
    })?;

    if let Some(parent) = std::path::Path::new(path).parent() {
        std::fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
    }

    std::fs::write(path, config_str)
        .map_err(|e| format!("Failed to write config file '{}': {}", path, e))?;

    Ok(())
}
