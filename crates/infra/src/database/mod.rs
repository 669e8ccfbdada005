//! SQLite persistence

pub mod alarm_event_repository;
pub mod manager;

pub use alarm_event_repository::SqliteAlarmStore;
pub use manager::{DbManager, SqlitePool};
