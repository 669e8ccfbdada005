//! Alarm scheduling: computation, policy and store reconciliation

pub mod calculator;
pub mod errors;
pub mod policy;
pub mod ports;
pub mod service;
