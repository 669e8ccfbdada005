//! Configuration loader
//!
//! Loads scheduler configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. Attempt to load from environment variables
//! 2. If `CALARM_STORE_BACKEND` is unset or a value is invalid, fall back
//!    to a file
//! 3. Probe multiple paths for config files
//! 4. JSON and TOML are both accepted
//!
//! ## Environment Variables
//! - `CALARM_STORE_BACKEND`: `memory` or `sqlite` (required)
//! - `CALARM_STORE_PATH`: SQLite database path
//! - `CALARM_STORE_POOL_SIZE`: Connection pool size
//! - `CALARM_LOOKAHEAD_DAYS`: Recurrence expansion horizon in days
//! - `CALARM_MAX_OCCURRENCES`: Cap on expanded instances
//! - `CALARM_DEFAULT_TIMEZONE`: IANA zone for floating times
//! - `CALARM_ALLOWED_DOMAINS`: Comma separated recipient domains
//! - `CALARM_DENIED_RECIPIENTS`: Comma separated addresses
//! - `CALARM_LOG_FILTER`: Tracing filter directive
//! - `CALARM_LOG_JSON`: JSON log output (true/false)
//!
//! ## File Locations
//! The loader probes the following paths (in order):
//! 1. `./config.{json,toml}` then `./calarm.{json,toml}`
//! 2. The same names in the parent and grandparent directories
//! 3. The same names next to the executable

use std::path::{Path, PathBuf};
use std::str::FromStr;

use calarm_domain::{
    CalarmError, Config, LoggingConfig, PolicyConfig, Result, SchedulingConfig, StoreBackend,
    StoreConfig,
};

const CONFIG_FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "calarm.json", "calarm.toml"];

/// Load configuration with automatic fallback strategy
///
/// First attempts to load from environment variables, then falls back to a
/// config file.
///
/// # Errors
/// Returns `CalarmError::Config` if neither source yields a configuration.
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(e) => {
            tracing::debug!(error = ?e, "Failed to load from environment, trying file");
            load_from_file(None)
        }
    }
}

/// Load configuration from environment variables
///
/// Only `CALARM_STORE_BACKEND` is required; every other variable falls
/// back to the serde default.
///
/// # Errors
/// Returns `CalarmError::Config` if the backend is missing or any value
/// fails to parse.
pub fn load_from_env() -> Result<Config> {
    let backend = env_var("CALARM_STORE_BACKEND").and_then(|s| {
        StoreBackend::from_str(&s).map_err(|e| CalarmError::Config(format!("Invalid store backend: {e}")))
    })?;

    let store_defaults = StoreConfig::default();
    let store = StoreConfig {
        backend,
        path: env_opt("CALARM_STORE_PATH").unwrap_or(store_defaults.path),
        pool_size: env_parsed("CALARM_STORE_POOL_SIZE", "pool size")?
            .unwrap_or(store_defaults.pool_size),
    };

    let scheduling_defaults = SchedulingConfig::default();
    let scheduling = SchedulingConfig {
        lookahead_days: env_parsed("CALARM_LOOKAHEAD_DAYS", "lookahead days")?
            .unwrap_or(scheduling_defaults.lookahead_days),
        max_occurrences: env_parsed("CALARM_MAX_OCCURRENCES", "max occurrences")?
            .unwrap_or(scheduling_defaults.max_occurrences),
        default_timezone: env_opt("CALARM_DEFAULT_TIMEZONE")
            .unwrap_or(scheduling_defaults.default_timezone),
    };

    let policy = PolicyConfig {
        allowed_domains: env_list("CALARM_ALLOWED_DOMAINS"),
        denied_recipients: env_list("CALARM_DENIED_RECIPIENTS"),
    };

    let logging_defaults = LoggingConfig::default();
    let logging = LoggingConfig {
        filter: env_opt("CALARM_LOG_FILTER").unwrap_or(logging_defaults.filter),
        json: env_bool("CALARM_LOG_JSON", logging_defaults.json),
    };

    Ok(Config { scheduling, store, policy, logging })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes multiple locations for config files.
/// Format is detected by file extension.
///
/// # Errors
/// Returns `CalarmError::Config` if the file is missing, unreadable or
/// malformed.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(CalarmError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            CalarmError::Config("No config file found in any of the standard locations".to_string())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| CalarmError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

/// Parse configuration from string content, by file extension.
fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| CalarmError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| CalarmError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(CalarmError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe multiple paths for configuration files
///
/// Returns the first existing candidate, or `None`.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd.clone());
        roots.push(cwd.join(".."));
        roots.push(cwd.join("../.."));
    }

    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            roots.push(exe_dir.to_path_buf());
            roots.push(exe_dir.join(".."));
            roots.push(exe_dir.join("../.."));
        }
    }

    roots
        .iter()
        .flat_map(|root| CONFIG_FILE_NAMES.iter().map(move |name| root.join(name)))
        .find(|path| path.exists())
}

/// Get required environment variable
fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        CalarmError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn env_parsed<T>(key: &str, what: &str) -> Result<Option<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    env_opt(key)
        .map(|s| {
            s.trim().parse::<T>().map_err(|e| CalarmError::Config(format!("Invalid {what}: {e}")))
        })
        .transpose()
}

/// Comma separated list; blank entries are dropped.
fn env_list(key: &str) -> Vec<String> {
    env_opt(key)
        .map(|s| {
            s.split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(ToOwned::to_owned)
                .collect()
        })
        .unwrap_or_default()
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off` (case-insensitive)
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
