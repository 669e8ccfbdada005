//! Application constants
//!
//! Centralized location for all domain-level constants used throughout the
//! application.

// Scheduling defaults
pub const DEFAULT_LOOKAHEAD_DAYS: u32 = 366;
pub const DEFAULT_MAX_OCCURRENCES: u16 = 1000;
pub const DEFAULT_TIMEZONE: &str = "UTC";

// Store defaults
pub const DEFAULT_STORE_PATH: &str = "calarm.db";
pub const DEFAULT_POOL_SIZE: u32 = 4;
pub const DUE_QUERY_PAGE_SIZE: usize = 256;

// Logging defaults
pub const DEFAULT_LOG_FILTER: &str = "info";

// iCalendar
pub const MAILTO_PREFIX: &str = "mailto:";
