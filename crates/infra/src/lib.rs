//! # Calarm Infrastructure
//!
//! Infrastructure implementations of core ports.
//!
//! This crate contains:
//! - `rrule`-backed recurrence expansion
//! - In-memory and SQLite alarm stores
//! - Configuration loading and tracing initialisation
//! - Service wiring from configuration
//!
//! ## Architecture
//! - Implements traits defined in `calarm-core`
//! - Contains all "impure" code (I/O, global subscribers, environment)

pub mod bootstrap;
pub mod config;
pub mod database;
pub mod errors;
pub mod memory;
pub mod observability;
pub mod policy;
pub mod recurrence;

// Re-export commonly used items
pub use bootstrap::{build_reconciler, AlarmRuntime};
pub use database::{DbManager, SqliteAlarmStore};
pub use errors::InfraError;
pub use memory::InMemoryAlarmStore;
pub use recurrence::RRuleExpander;
