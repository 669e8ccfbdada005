//! # Calarm Domain
//!
//! Business domain types and models for calendar alarm scheduling.
//!
//! This crate contains:
//! - Calendar event model and the iCalendar parser that builds it
//! - Alarm records, decisions and calendar-change notifications
//! - Domain error types and Result definitions
//! - Configuration structures
//!
//! ## Architecture
//! - No dependencies on other Calarm crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod macros;
pub mod types;
pub mod utils;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
// Re-export parser utilities
pub use utils::duration::parse_duration;
pub use utils::ics::{parse_calendar, unfold_lines};
