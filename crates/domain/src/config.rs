//! Configuration structures
//!
//! Every field carries a serde default so partial JSON/TOML files are
//! accepted. Loading lives in `calarm-infra`.

use serde::{Deserialize, Serialize};

use crate::constants::{
    DEFAULT_LOG_FILTER, DEFAULT_LOOKAHEAD_DAYS, DEFAULT_MAX_OCCURRENCES, DEFAULT_POOL_SIZE,
    DEFAULT_STORE_PATH, DEFAULT_TIMEZONE,
};
use crate::impl_domain_status_conversions;

/// Root configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub scheduling: SchedulingConfig,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub policy: PolicyConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Next-alarm computation settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingConfig {
    /// Recurrence expansion window after `now`, in days.
    #[serde(default = "default_lookahead_days")]
    pub lookahead_days: u32,
    /// Upper bound on expanded instants per computation.
    #[serde(default = "default_max_occurrences")]
    pub max_occurrences: u16,
    /// IANA zone used for floating times and unknown TZIDs.
    #[serde(default = "default_timezone")]
    pub default_timezone: String,
}

impl Default for SchedulingConfig {
    fn default() -> Self {
        Self {
            lookahead_days: DEFAULT_LOOKAHEAD_DAYS,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
            default_timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Alarm store backend
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Memory,
    Sqlite,
}

impl_domain_status_conversions!(StoreBackend {
    Memory => "memory",
    Sqlite => "sqlite",
});

/// Alarm store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreConfig {
    #[serde(default)]
    pub backend: StoreBackend,
    /// SQLite database file. Ignored by the memory backend.
    #[serde(default = "default_store_path")]
    pub path: String,
    #[serde(default = "default_pool_size")]
    pub pool_size: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::default(),
            path: DEFAULT_STORE_PATH.to_string(),
            pool_size: DEFAULT_POOL_SIZE,
        }
    }
}

/// Recipient policy settings
///
/// An empty `allowed_domains` list allows every domain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub allowed_domains: Vec<String>,
    #[serde(default)]
    pub denied_recipients: Vec<String>,
}

/// Tracing subscriber settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// `EnvFilter` directive, overridden by `RUST_LOG` when set.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Emit JSON lines instead of human readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: DEFAULT_LOG_FILTER.to_string(), json: false }
    }
}

fn default_lookahead_days() -> u32 {
    DEFAULT_LOOKAHEAD_DAYS
}

fn default_max_occurrences() -> u16 {
    DEFAULT_MAX_OCCURRENCES
}

fn default_timezone() -> String {
    DEFAULT_TIMEZONE.to_string()
}

fn default_store_path() -> String {
    DEFAULT_STORE_PATH.to_string()
}

fn default_pool_size() -> u32 {
    DEFAULT_POOL_SIZE
}

fn default_log_filter() -> String {
    DEFAULT_LOG_FILTER.to_string()
}
