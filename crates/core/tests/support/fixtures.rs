//! iCalendar payload builders.

use calarm_domain::{CalendarChange, EventChange, EventRemoval};
use chrono::{DateTime, TimeZone, Utc};

pub const ORGANIZER: &str = "org@example.com";
pub const PATH: &str = "/calendars/org/events/evt.ics";

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// Builder for a single-VEVENT calendar organised by [`ORGANIZER`].
#[derive(Clone)]
pub struct EventBuilder {
    uid: String,
    dtstart: String,
    rrule: Option<String>,
    status: Option<String>,
    attendees: Vec<(String, String)>,
    trigger: Option<String>,
}

impl EventBuilder {
    pub fn new(uid: &str, dtstart: &str) -> Self {
        Self {
            uid: uid.to_string(),
            dtstart: dtstart.to_string(),
            rrule: None,
            status: None,
            attendees: Vec::new(),
            trigger: Some("-PT15M".to_string()),
        }
    }

    pub fn attendee(mut self, address: &str, partstat: &str) -> Self {
        self.attendees.push((address.to_string(), partstat.to_string()));
        self
    }

    pub fn rrule(mut self, rrule: &str) -> Self {
        self.rrule = Some(rrule.to_string());
        self
    }

    pub fn cancelled(mut self) -> Self {
        self.status = Some("CANCELLED".to_string());
        self
    }

    pub fn trigger(mut self, trigger: &str) -> Self {
        self.trigger = Some(trigger.to_string());
        self
    }

    pub fn without_alarm(mut self) -> Self {
        self.trigger = None;
        self
    }

    pub fn build(&self) -> String {
        let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//calarm//test//EN\r\n");
        ics.push_str("BEGIN:VEVENT\r\n");
        ics.push_str(&format!("UID:{}\r\n", self.uid));
        ics.push_str(&format!("DTSTART:{}\r\n", self.dtstart));
        ics.push_str("DURATION:PT1H\r\n");
        if let Some(rrule) = &self.rrule {
            ics.push_str(&format!("RRULE:{rrule}\r\n"));
        }
        if let Some(status) = &self.status {
            ics.push_str(&format!("STATUS:{status}\r\n"));
        }
        ics.push_str(&format!("ORGANIZER:mailto:{ORGANIZER}\r\n"));
        for (address, partstat) in &self.attendees {
            ics.push_str(&format!("ATTENDEE;PARTSTAT={partstat}:mailto:{address}\r\n"));
        }
        if let Some(trigger) = &self.trigger {
            ics.push_str(&format!(
                "BEGIN:VALARM\r\nACTION:EMAIL\r\nTRIGGER:{trigger}\r\nEND:VALARM\r\n"
            ));
        }
        ics.push_str("END:VEVENT\r\nEND:VCALENDAR\r\n");
        ics
    }

    pub fn created(&self) -> CalendarChange {
        CalendarChange::Created(change(self.build(), None))
    }

    pub fn updated_from(&self, previous: &EventBuilder) -> CalendarChange {
        CalendarChange::Updated(change(self.build(), Some(previous.build())))
    }

    pub fn deleted(&self) -> CalendarChange {
        CalendarChange::Deleted(EventRemoval {
            event_path: PATH.to_string(),
            last_known_payload: self.build(),
        })
    }

    pub fn cancelled_change(&self) -> CalendarChange {
        CalendarChange::Cancelled(EventRemoval {
            event_path: PATH.to_string(),
            last_known_payload: self.build(),
        })
    }
}

fn change(payload: String, previous_payload: Option<String>) -> EventChange {
    EventChange { event_path: PATH.to_string(), payload, is_import: false, previous_payload }
}
