//! Config loader: reads `~/.chatgate/config.json` and merges env vars.
//!
//! # Loading precedence
//! 1. Defaults (from `Config::default()`)
//! 2. JSON file at `~/.chatgate/config.json`
//! 3. Environment variables `CHATGATE_<SECTION>__<FIELD>` (override JSON)

use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use super::schema::Config;

/// Default config file path.
pub fn get_config_path() -> PathBuf {
    crate::utils::get_data_path().join("config.json")
}

/// Load configuration from the default path + env vars.
///
/// Falls back to `Config::default()` if the file doesn't exist or can't be parsed.
pub fn load_config(path: Option<&Path>) -> Config {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    load_config_from_path(&config_path)
}

/// Load config from a specific file path.
fn load_config_from_path(path: &Path) -> Config {
    if !path.exists() {
        info!("No config file found at {}, using defaults", path.display());
        return apply_env_overrides(Config::default());
    }

    debug!("Loading config from {}", path.display());

    let content = match std::fs::read_to_string(path) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to read config file {}: {}", path.display(), e);
            return apply_env_overrides(Config::default());
        }
    };

    let config: Config = match serde_json::from_str(&content) {
        Ok(c) => c,
        Err(e) => {
            warn!("Failed to parse config JSON: {}", e);
            return apply_env_overrides(Config::default());
        }
    };

    apply_env_overrides(config)
}

/// Save configuration to disk (pretty-printed JSON with camelCase keys).
pub fn save_config(config: &Config, path: Option<&Path>) -> std::io::Result<()> {
    let config_path = path
        .map(PathBuf::from)
        .unwrap_or_else(get_config_path);

    if let Some(parent) = config_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(config).map_err(std::io::Error::other)?;

    std::fs::write(&config_path, json)?;
    debug!("Config saved to {}", config_path.display());
    Ok(())
}

/// Apply environment variable overrides on top of a loaded config.
///
/// Env var format: `CHATGATE_<SECTION>__<FIELD>` (double underscore as delimiter).
///
/// Supported overrides:
/// - `CHATGATE_GATEWAY__DEFAULTS__TEMPERATURE` → `gateway.defaults.temperature`
/// - `CHATGATE_GATEWAY__DEFAULTS__MAX_TOKENS` → `gateway.defaults.max_tokens`
/// - `CHATGATE_GATEWAY__REQUEST_TIMEOUT_SECS` → `gateway.request_timeout_secs`
/// - `CHATGATE_GATEWAY__CONNECT_TIMEOUT_SECS` → `gateway.connect_timeout_secs`
/// - `CHATGATE_SECURITY__ENCRYPTION_ENABLED` → `security.encryption_enabled`
/// - `CHATGATE_SECURITY__ENCRYPTION_KEY` → `security.encryption_key`
/// - `CHATGATE_DEFAULT_MODEL` → `default_model`
fn apply_env_overrides(mut config: Config) -> Config {
    if let Ok(val) = std::env::var("CHATGATE_GATEWAY__DEFAULTS__TEMPERATURE") {
        if let Ok(t) = val.parse::<f64>() {
            config.gateway.defaults.temperature = t;
        }
    }
    if let Ok(val) = std::env::var("CHATGATE_GATEWAY__DEFAULTS__MAX_TOKENS") {
        if let Ok(n) = val.parse::<u32>() {
            config.gateway.defaults.max_tokens = n;
        }
    }
    if let Ok(val) = std::env::var("CHATGATE_GATEWAY__REQUEST_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.gateway.request_timeout_secs = n;
        }
    }
    if let Ok(val) = std::env::var("CHATGATE_GATEWAY__CONNECT_TIMEOUT_SECS") {
        if let Ok(n) = val.parse::<u64>() {
            config.gateway.connect_timeout_secs = n;
        }
    }

    // Security
    if let Ok(val) = std::env::var("CHATGATE_SECURITY__ENCRYPTION_ENABLED") {
        config.security.encryption_enabled = val == "true" || val == "1";
    }
    if let Ok(val) = std::env::var("CHATGATE_SECURITY__ENCRYPTION_KEY") {
        config.security.encryption_key = Some(val);
    }

    if let Ok(val) = std::env::var("CHATGATE_DEFAULT_MODEL") {
        config.default_model = Some(val);
    }

    config
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
