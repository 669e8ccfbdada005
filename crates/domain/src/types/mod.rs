//! Domain types and models

pub mod alarm;
pub mod calendar;
pub mod mail;
pub mod notification;

pub use alarm::{AlarmDecision, AlarmEvent, AlarmKey, EventUid};
pub use calendar::{
    AlarmAction, AlarmDefinition, Attendee, CalendarEvent, EventComponent, EventStatus, EventTime,
    EventZone, MasterEvent, Occurrence, OverrideInstance, PartStat, Person, RecurrenceRule,
    TriggerRelation,
};
pub use mail::MailAddress;
pub use notification::{
    CalendarAlarmMessage, CalendarChange, ChangeKind, EventChange, EventRemoval,
};
