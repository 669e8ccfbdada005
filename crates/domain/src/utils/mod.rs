//! Parsing utilities for iCalendar payloads

pub mod datetime;
pub mod duration;
pub mod event_parser;
pub mod ics;
