//! Shared test helpers for `calarm-core` integration tests.
//!
//! Lightweight in-memory mocks and payload builders so that tests can focus
//! on reconciliation behaviour instead of boilerplate.

#![allow(dead_code)]

pub mod expander;
pub mod fixtures;
pub mod store;
