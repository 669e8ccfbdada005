//! Calendar-change notifications consumed by the reconciliation engine.

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// A created or updated event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventChange {
    pub event_path: String,
    /// Current iCalendar payload.
    pub payload: String,
    pub is_import: bool,
    /// Payload before the change, when the sender knows it.
    pub previous_payload: Option<String>,
}

/// A deleted or cancelled event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRemoval {
    pub event_path: String,
    pub last_known_payload: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CalendarChange {
    Created(EventChange),
    Updated(EventChange),
    Deleted(EventRemoval),
    Cancelled(EventRemoval),
}

impl CalendarChange {
    pub fn event_path(&self) -> &str {
        match self {
            Self::Created(change) | Self::Updated(change) => &change.event_path,
            Self::Deleted(removal) | Self::Cancelled(removal) => &removal.event_path,
        }
    }

    /// Short label for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Deleted(_) => "deleted",
            Self::Cancelled(_) => "cancelled",
        }
    }
}

/// Routing key of an incoming alarm message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChangeKind {
    Created,
    Updated,
    /// iTIP `REQUEST`: a new version sent to an attendee.
    Request,
    Deleted,
    Cancel,
}

impl_domain_status_conversions!(ChangeKind {
    Created => "created",
    Updated => "updated",
    Request => "request",
    Deleted => "deleted",
    Cancel => "cancel",
});

/// JSON body of an alarm message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarAlarmMessage {
    pub event_path: String,
    /// Current iCalendar payload.
    pub event: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old_event: Option<String>,
    #[serde(default)]
    pub import: bool,
}

impl CalendarAlarmMessage {
    pub fn into_change(self, kind: ChangeKind) -> CalendarChange {
        match kind {
            ChangeKind::Created => CalendarChange::Created(self.into_event_change()),
            ChangeKind::Updated | ChangeKind::Request => {
                CalendarChange::Updated(self.into_event_change())
            }
            ChangeKind::Deleted => CalendarChange::Deleted(self.into_removal()),
            ChangeKind::Cancel => CalendarChange::Cancelled(self.into_removal()),
        }
    }

    fn into_event_change(self) -> EventChange {
        EventChange {
            event_path: self.event_path,
            payload: self.event,
            is_import: self.import,
            previous_payload: self.old_event,
        }
    }

    fn into_removal(self) -> EventRemoval {
        EventRemoval { event_path: self.event_path, last_known_payload: self.event }
    }
}
