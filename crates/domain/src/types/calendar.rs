//! Calendar event model.
//!
//! A [`CalendarEvent`] is the parsed view of one VCALENDAR payload: the
//! master VEVENT, its recurrence data and any overridden instances. Missing
//! or unusable fields are `Option`s or are dropped at parse time; nothing in
//! this model fails after construction.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::errors::Result;
use crate::impl_ical_value_conversions;
use crate::types::mail::MailAddress;
use crate::utils::event_parser;

/// How an [`EventTime`] was expressed in the payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventZone {
    /// `...Z` suffix.
    Utc,
    /// `TZID=` parameter, or a floating time resolved in the default zone.
    Named(Tz),
    /// `VALUE=DATE`, anchored at midnight UTC.
    AllDay,
}

/// A resolved DATE or DATE-TIME value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventTime {
    pub instant: DateTime<Utc>,
    /// Wall-clock value as written in the payload.
    pub local: NaiveDateTime,
    pub zone: EventZone,
}

impl EventTime {
    pub fn is_all_day(&self) -> bool {
        self.zone == EventZone::AllDay
    }
}

/// `PARTSTAT` of an attendee. Unknown values are read as `NeedsAction`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PartStat {
    #[default]
    NeedsAction,
    Accepted,
    Declined,
    Tentative,
    Delegated,
}

impl_ical_value_conversions!(PartStat {
    NeedsAction => "NEEDS-ACTION",
    Accepted => "ACCEPTED",
    Declined => "DECLINED",
    Tentative => "TENTATIVE",
    Delegated => "DELEGATED",
});

/// VEVENT `STATUS`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventStatus {
    Tentative,
    Confirmed,
    Cancelled,
}

impl_ical_value_conversions!(EventStatus {
    Tentative => "TENTATIVE",
    Confirmed => "CONFIRMED",
    Cancelled => "CANCELLED",
});

/// VALARM `ACTION` values that produce a reminder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmAction {
    Email,
    Display,
}

impl_ical_value_conversions!(AlarmAction {
    Email => "EMAIL",
    Display => "DISPLAY",
});

/// `RELATED` parameter of a VALARM trigger.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum TriggerRelation {
    #[default]
    Start,
    End,
}

impl_ical_value_conversions!(TriggerRelation {
    Start => "START",
    End => "END",
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Person {
    pub address: MailAddress,
    pub common_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attendee {
    pub person: Person,
    pub partstat: PartStat,
}

/// A well-formed VALARM with a relative trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AlarmDefinition {
    pub action: AlarmAction,
    /// Signed offset from the anchor.
    pub trigger: Duration,
    pub related: TriggerRelation,
}

impl AlarmDefinition {
    /// Absolute fire instant for an occurrence spanning `start..end`, or
    /// `None` when the offset leaves the representable range.
    pub fn fire_time(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let anchor = match self.related {
            TriggerRelation::Start => start,
            TriggerRelation::End => end,
        };
        anchor.checked_add_signed(self.trigger)
    }
}

/// Properties shared by master VEVENTs and overridden instances.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventComponent {
    pub uid: String,
    pub start: EventTime,
    /// Explicit `DTEND`.
    pub end: Option<EventTime>,
    /// Explicit `DURATION`.
    pub duration: Option<Duration>,
    pub status: Option<EventStatus>,
    pub sequence: i64,
    pub dtstamp: Option<DateTime<Utc>>,
    pub summary: Option<String>,
    pub organizer: Option<Person>,
    pub attendees: Vec<Attendee>,
    pub valarms: Vec<AlarmDefinition>,
}

impl EventComponent {
    /// `DTEND`, else `DTSTART + DURATION`, else one day for all-day events,
    /// else `DTSTART`. An end past the representable range falls back to
    /// `DTSTART`.
    pub fn end_instant(&self) -> DateTime<Utc> {
        if let Some(end) = &self.end {
            return end.instant;
        }
        let offset = match self.duration {
            Some(duration) => duration,
            None if self.start.is_all_day() => Duration::days(1),
            None => return self.start.instant,
        };
        self.start.instant.checked_add_signed(offset).unwrap_or(self.start.instant)
    }

    /// Length of the event, never negative.
    pub fn span(&self) -> Duration {
        (self.end_instant() - self.start.instant).max(Duration::zero())
    }

    pub fn is_cancelled(&self) -> bool {
        self.status == Some(EventStatus::Cancelled)
    }

    pub fn is_organizer(&self, recipient: &MailAddress) -> bool {
        self.organizer.as_ref().is_some_and(|organizer| &organizer.address == recipient)
    }

    /// `PARTSTAT` of `recipient` when listed as an attendee.
    pub fn participation(&self, recipient: &MailAddress) -> Option<PartStat> {
        self.attendees
            .iter()
            .find(|attendee| &attendee.person.address == recipient)
            .map(|attendee| attendee.partstat)
    }

    /// Organizer, or attendee that has accepted, of a non-cancelled
    /// instance.
    pub fn is_eligible(&self, recipient: &MailAddress) -> bool {
        if self.is_cancelled() {
            return false;
        }
        self.is_organizer(recipient) || self.participation(recipient) == Some(PartStat::Accepted)
    }

    /// Organizer followed by attendees.
    pub fn recipients(&self) -> impl Iterator<Item = &MailAddress> + '_ {
        self.organizer
            .iter()
            .map(|organizer| &organizer.address)
            .chain(self.attendees.iter().map(|attendee| &attendee.person.address))
    }
}

/// Recurrence data of a master VEVENT.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecurrenceRule {
    /// Raw `RRULE` value, e.g. `FREQ=DAILY;COUNT=3`.
    pub rrule: Option<String>,
    pub exdates: BTreeSet<DateTime<Utc>>,
    pub rdates: BTreeSet<DateTime<Utc>>,
}

/// The VEVENT without `RECURRENCE-ID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterEvent {
    pub component: EventComponent,
    pub recurrence: Option<RecurrenceRule>,
}

impl MasterEvent {
    pub fn start(&self) -> &EventTime {
        &self.component.start
    }
}

/// A VEVENT carrying `RECURRENCE-ID`, replacing one instance of the series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideInstance {
    pub recurrence_id: DateTime<Utc>,
    pub component: EventComponent,
}

/// One concrete instance of an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Occurrence<'a> {
    /// Instance taken from the master definition, possibly shifted to an
    /// expanded recurrence instant.
    Master {
        component: &'a EventComponent,
        start: DateTime<Utc>,
        recurrence_id: Option<DateTime<Utc>>,
    },
    /// Instance replaced by an override VEVENT.
    Override(&'a OverrideInstance),
}

impl<'a> Occurrence<'a> {
    pub fn component(&self) -> &'a EventComponent {
        match self {
            Self::Master { component, .. } => component,
            Self::Override(instance) => &instance.component,
        }
    }

    pub fn start(&self) -> DateTime<Utc> {
        match self {
            Self::Master { start, .. } => *start,
            Self::Override(instance) => instance.component.start.instant,
        }
    }

    pub fn end(&self) -> DateTime<Utc> {
        match self {
            Self::Master { component, start, .. } => {
                start.checked_add_signed(component.span()).unwrap_or(*start)
            }
            Self::Override(instance) => instance.component.end_instant(),
        }
    }

    pub fn recurrence_id(&self) -> Option<DateTime<Utc>> {
        match self {
            Self::Master { recurrence_id, .. } => *recurrence_id,
            Self::Override(instance) => Some(instance.recurrence_id),
        }
    }

    pub fn is_override(&self) -> bool {
        matches!(self, Self::Override(_))
    }

    pub fn valarms(&self) -> &'a [AlarmDefinition] {
        &self.component().valarms
    }

    pub fn is_eligible(&self, recipient: &MailAddress) -> bool {
        self.component().is_eligible(recipient)
    }
}

/// Parsed VCALENDAR payload: master, recurrence data and overrides.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CalendarEvent {
    master: MasterEvent,
    overrides: BTreeMap<DateTime<Utc>, OverrideInstance>,
    ics: String,
}

impl CalendarEvent {
    pub fn new(
        master: MasterEvent,
        overrides: BTreeMap<DateTime<Utc>, OverrideInstance>,
        ics: impl Into<String>,
    ) -> Self {
        Self { master, overrides, ics: ics.into() }
    }

    /// Parse a raw iCalendar payload. Floating times and unknown `TZID`s are
    /// resolved in `default_tz`.
    ///
    /// # Errors
    /// Returns `CalarmError::Parse` when the payload is not a usable
    /// VCALENDAR (see [`event_parser::parse_event`]).
    pub fn parse(raw: &str, default_tz: Tz) -> Result<Self> {
        event_parser::parse_event(raw, default_tz)
    }

    pub fn uid(&self) -> &str {
        &self.master.component.uid
    }

    pub fn master(&self) -> &MasterEvent {
        &self.master
    }

    pub fn organizer(&self) -> Option<&Person> {
        self.master.component.organizer.as_ref()
    }

    pub fn attendees(&self) -> &[Attendee] {
        &self.master.component.attendees
    }

    pub fn valarms(&self) -> &[AlarmDefinition] {
        &self.master.component.valarms
    }

    pub fn is_recurring_master(&self) -> bool {
        self.master.recurrence.is_some()
    }

    pub fn recurrence_rule(&self) -> Option<&RecurrenceRule> {
        self.master.recurrence.as_ref()
    }

    pub fn override_instances(&self) -> &BTreeMap<DateTime<Utc>, OverrideInstance> {
        &self.overrides
    }

    pub fn is_cancelled(&self) -> bool {
        self.master.component.is_cancelled()
    }

    pub fn start(&self) -> DateTime<Utc> {
        self.master.component.start.instant
    }

    pub fn end(&self) -> DateTime<Utc> {
        self.master.component.end_instant()
    }

    /// Raw payload this event was parsed from.
    pub fn ics(&self) -> &str {
        &self.ics
    }

    /// Organizer and attendees of the master and of every override.
    pub fn recipients(&self) -> BTreeSet<MailAddress> {
        self.master
            .component
            .recipients()
            .chain(self.overrides.values().flat_map(|instance| instance.component.recipients()))
            .cloned()
            .collect()
    }

    /// The master definition as a single, non-expanded occurrence.
    pub fn single_occurrence(&self) -> Occurrence<'_> {
        Occurrence::Master {
            component: &self.master.component,
            start: self.start(),
            recurrence_id: None,
        }
    }

    /// Instance identified by `recurrence_id`: the override when one exists,
    /// the master shifted to that instant otherwise.
    pub fn occurrence_at(&self, recurrence_id: DateTime<Utc>) -> Occurrence<'_> {
        self.overrides.get(&recurrence_id).map_or(
            Occurrence::Master {
                component: &self.master.component,
                start: recurrence_id,
                recurrence_id: Some(recurrence_id),
            },
            Occurrence::Override,
        )
    }
}
