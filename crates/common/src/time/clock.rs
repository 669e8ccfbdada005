//! Time abstraction for testability
//!
//! Provides a trait-based approach to reading the current instant so that
//! scheduling decisions are deterministic under test.
//!
//! # Examples
//!
//! ```
//! use chrono::{Duration, TimeZone, Utc};
//!
//! use calarm_common::time::{Clock, MockClock, SystemClock};
//!
//! // Use system clock in production
//! let clock = SystemClock;
//! let _now = clock.now();
//!
//! // Use mock clock in tests
//! let mock = MockClock::at(Utc.with_ymd_and_hms(2025, 10, 1, 5, 0, 0).unwrap());
//! let start = mock.now();
//! mock.advance(Duration::minutes(5));
//! assert_eq!(mock.now() - start, Duration::minutes(5));
//! ```

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use parking_lot::Mutex;

/// Source of the current UTC instant.
pub trait Clock: Send + Sync + 'static {
    /// Current wall-clock instant.
    fn now(&self) -> DateTime<Utc>;
}

/// Real system clock implementation
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Mock clock for testing
///
/// Time only moves when the test calls [`MockClock::set`] or
/// [`MockClock::advance`]. Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl MockClock {
    /// Create a mock clock frozen at `now`.
    pub fn at(now: DateTime<Utc>) -> Self {
        Self { now: Arc::new(Mutex::new(now)) }
    }

    /// Jump to an absolute instant.
    pub fn set(&self, now: DateTime<Utc>) {
        *self.now.lock() = now;
    }

    /// Advance time by the given amount. Negative durations move backwards.
    pub fn advance(&self, by: Duration) {
        let mut guard = self.now.lock();
        *guard += by;
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::at(DateTime::<Utc>::UNIX_EPOCH)
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock()
    }
}

impl<T: Clock> Clock for Arc<T> {
    fn now(&self) -> DateTime<Utc> {
        (**self).now()
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn base() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 8, 1, 6, 0, 0).unwrap()
    }

    #[test]
    fn test_mock_clock_is_frozen() {
        let clock = MockClock::at(base());
        assert_eq!(clock.now(), base());
        assert_eq!(clock.now(), base());
    }

    #[test]
    fn test_mock_clock_advance_and_set() {
        let clock = MockClock::at(base());
        clock.advance(Duration::minutes(30));
        assert_eq!(clock.now(), base() + Duration::minutes(30));

        clock.set(base() - Duration::days(1));
        assert_eq!(clock.now(), base() - Duration::days(1));
    }

    #[test]
    fn test_mock_clock_clones_share_time() {
        let clock = MockClock::at(base());
        let shared = clock.clone();
        clock.advance(Duration::hours(1));
        assert_eq!(shared.now(), base() + Duration::hours(1));
    }

    #[test]
    fn test_arc_clock_delegates() {
        let clock = Arc::new(MockClock::at(base()));
        let as_dyn: Arc<dyn Clock> = Arc::new(Arc::clone(&clock));
        clock.advance(Duration::seconds(1));
        assert_eq!(as_dyn.now(), base() + Duration::seconds(1));
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
