//! Port interfaces for alarm scheduling
//!
//! These traits define the boundaries between core business logic
//! and infrastructure implementations.

use async_trait::async_trait;
use calarm_domain::{AlarmEvent, EventUid, MailAddress, MasterEvent, Result};
use chrono::{DateTime, Utc};
use futures::stream::BoxStream;

/// Persistent mapping `(event_uid, recipient) -> AlarmEvent`.
///
/// Writes are per key with last-write-wins semantics; there are no
/// cross-key transactions.
#[async_trait]
pub trait AlarmStore: Send + Sync {
    /// Alarm held for one recipient of an event
    async fn find(&self, event_uid: &EventUid, recipient: &MailAddress)
        -> Result<Option<AlarmEvent>>;

    /// Every alarm held for an event
    async fn find_by_event(&self, event_uid: &EventUid) -> Result<Vec<AlarmEvent>>;

    /// Insert or fully replace the alarm keyed by its event UID and recipient
    async fn upsert(&self, alarm: AlarmEvent) -> Result<()>;

    /// Remove an alarm. Removing an absent key succeeds.
    async fn delete(&self, event_uid: &EventUid, recipient: &MailAddress) -> Result<()>;

    /// Lazily stream alarms with `alarm_time <= instant`, each at most once
    fn find_due_before(&self, instant: DateTime<Utc>) -> BoxStream<'_, Result<AlarmEvent>>;
}

/// Bounds of a recurrence expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpansionWindow {
    /// Exclusive lower bound.
    pub after: DateTime<Utc>,
    /// Inclusive upper bound.
    pub before: DateTime<Utc>,
    /// Maximum number of instants returned.
    pub limit: u16,
}

impl ExpansionWindow {
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant > self.after && instant <= self.before
    }
}

/// Expands the `RRULE` of a master event into absolute instants.
///
/// Implementations return the rule's instants inside the window in
/// ascending order. `EXDATE`, `RDATE` and overrides are applied by the
/// caller.
pub trait RecurrenceExpander: Send + Sync {
    fn expand(&self, master: &MasterEvent, window: &ExpansionWindow)
        -> Result<Vec<DateTime<Utc>>>;
}
