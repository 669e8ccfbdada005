//! In-process adapters

mod alarm_store;

pub use alarm_store::InMemoryAlarmStore;
