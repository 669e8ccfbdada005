//! # Calarm Core
//!
//! Pure business logic layer - no infrastructure dependencies.
//!
//! This crate contains:
//! - The next-alarm calculator
//! - The reconciliation engine that keeps the alarm store in sync with
//!   calendar changes
//! - Port interfaces (traits) for the alarm store, recurrence expansion and
//!   recipient policy
//!
//! ## Architecture Principles
//! - Depends only on `calarm-common` and `calarm-domain`
//! - No database or transport code
//! - All external dependencies via traits
//! - Time is injected through [`calarm_common::time::Clock`]

pub mod alarm;

pub use alarm::calculator::{CalculatorSettings, NextAlarmCalculator};
pub use alarm::errors::{ReconcileError, ReconcileReport};
pub use alarm::policy::{AllOf, AllowAll, DenyList, DomainAllowList, RecipientPolicy};
pub use alarm::ports::{AlarmStore, ExpansionWindow, RecurrenceExpander};
pub use alarm::service::ReconciliationService;
