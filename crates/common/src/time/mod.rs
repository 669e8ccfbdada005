//! Wall-clock abstraction.
//!
//! Alarm computation never reads ambient time; every component that needs
//! "now" receives a [`Clock`].

pub mod clock;

pub use clock::{Clock, MockClock, SystemClock};
