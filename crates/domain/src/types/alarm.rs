//! Alarm records and decisions

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::types::calendar::AlarmAction;
use crate::types::mail::MailAddress;

/// iCalendar `UID` of an event.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventUid(String);

impl EventUid {
    pub fn new(uid: impl Into<String>) -> Self {
        Self(uid.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for EventUid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for EventUid {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for EventUid {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Primary key of the alarm store.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AlarmKey {
    pub event_uid: EventUid,
    pub recipient: MailAddress,
}

impl AlarmKey {
    pub fn new(event_uid: EventUid, recipient: MailAddress) -> Self {
        Self { event_uid, recipient }
    }
}

/// Result of the next-alarm computation for one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmDecision {
    pub alarm_time: DateTime<Utc>,
    pub occurrence_start: DateTime<Utc>,
    pub recurring: bool,
    /// Identifier of the chosen instance for recurring events.
    pub recurrence_id: Option<DateTime<Utc>>,
    pub action: AlarmAction,
}

/// Persisted alarm: one per `(event_uid, recipient)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmEvent {
    pub event_uid: EventUid,
    pub recipient: MailAddress,
    pub alarm_time: DateTime<Utc>,
    pub event_start_time: DateTime<Utc>,
    pub recurring: bool,
    pub recurrence_id: Option<DateTime<Utc>>,
    /// Calendar payload the alarm was computed from.
    pub ics: String,
    pub event_path: String,
    pub action: AlarmAction,
}

impl AlarmEvent {
    pub fn from_decision(
        event_uid: EventUid,
        recipient: MailAddress,
        decision: &AlarmDecision,
        ics: impl Into<String>,
        event_path: impl Into<String>,
    ) -> Self {
        Self {
            event_uid,
            recipient,
            alarm_time: decision.alarm_time,
            event_start_time: decision.occurrence_start,
            recurring: decision.recurring,
            recurrence_id: decision.recurrence_id,
            ics: ics.into(),
            event_path: event_path.into(),
            action: decision.action,
        }
    }

    pub fn key(&self) -> AlarmKey {
        AlarmKey::new(self.event_uid.clone(), self.recipient.clone())
    }

    pub fn is_due(&self, at: DateTime<Utc>) -> bool {
        self.alarm_time <= at
    }

    /// `recurrence_id` rendered as RFC 3339 UTC with second precision.
    pub fn recurrence_id_string(&self) -> Option<String> {
        self.recurrence_id.map(|id| id.to_rfc3339_opts(SecondsFormat::Secs, true))
    }
}
