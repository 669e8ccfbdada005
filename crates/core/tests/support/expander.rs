//! Deterministic `RecurrenceExpander` mock.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use calarm_core::{ExpansionWindow, RecurrenceExpander};
use calarm_domain::{CalarmError, MasterEvent, Result as DomainResult};
use chrono::{DateTime, Duration, Utc};

/// Expands every series as `count` daily instants from DTSTART, ignoring the
/// actual RRULE text.
#[derive(Default, Clone)]
pub struct DailyExpander {
    count: i64,
    fail_on_call: Option<usize>,
    calls: Arc<AtomicUsize>,
}

impl DailyExpander {
    pub fn new(count: i64) -> Self {
        Self { count, ..Self::default() }
    }

    /// Fail the `n`-th call (1-based) with a recurrence error.
    pub fn failing_on_call(mut self, n: usize) -> Self {
        self.fail_on_call = Some(n);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl RecurrenceExpander for DailyExpander {
    fn expand(
        &self,
        master: &MasterEvent,
        window: &ExpansionWindow,
    ) -> DomainResult<Vec<DateTime<Utc>>> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on_call == Some(call) {
            return Err(CalarmError::Recurrence("scripted expansion failure".to_string()));
        }

        Ok((0..self.count)
            .map(|day| master.start().instant + Duration::days(day))
            .filter(|instant| window.contains(*instant))
            .take(usize::from(window.limit))
            .collect())
    }
}
