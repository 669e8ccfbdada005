//! Shared fixtures for infra integration tests.
#![allow(dead_code)]

use std::sync::Arc;

use calarm_common::MockClock;
use calarm_core::NextAlarmCalculator;
use calarm_domain::{CalendarEvent, MailAddress};
use calarm_infra::database::{DbManager, SqliteAlarmStore};
use calarm_infra::RRuleExpander;
use chrono::{DateTime, TimeZone, Utc};
use chrono_tz::Tz;
use tempfile::TempDir;

pub const ORGANIZER: &str = "org@example.com";
pub const ATTENDEE: &str = "attendee@example.com";

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

pub fn address(raw: &str) -> MailAddress {
    MailAddress::parse(raw).expect("valid test address")
}

pub fn parse(ics: &str) -> CalendarEvent {
    CalendarEvent::parse(ics, Tz::UTC).expect("test payload parses")
}

/// Calculator over the real `rrule` expander, pinned to `now`.
pub fn calculator_at(now: DateTime<Utc>) -> NextAlarmCalculator {
    NextAlarmCalculator::new(Arc::new(RRuleExpander::new()), Arc::new(MockClock::at(now)))
}

/// Wrap VEVENT blocks in a VCALENDAR.
pub fn calendar(events: &[String]) -> String {
    let mut ics = String::from("BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:-//calarm//infra-test//EN\r\n");
    for event in events {
        ics.push_str(event);
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

/// A VEVENT with the given extra property lines and one VALARM per trigger.
pub fn vevent(uid: &str, lines: &[&str], triggers: &[&str]) -> String {
    let mut block = format!("BEGIN:VEVENT\r\nUID:{uid}\r\nDTSTAMP:20250701T000000Z\r\n");
    for line in lines {
        block.push_str(line);
        block.push_str("\r\n");
    }
    block.push_str(&format!("ORGANIZER:mailto:{ORGANIZER}\r\n"));
    for trigger in triggers {
        block.push_str(&format!(
            "BEGIN:VALARM\r\nACTION:EMAIL\r\nTRIGGER:{trigger}\r\nEND:VALARM\r\n"
        ));
    }
    block.push_str("END:VEVENT\r\n");
    block
}

pub fn attendee(partstat: &str) -> String {
    format!("ATTENDEE;PARTSTAT={partstat}:mailto:{ATTENDEE}")
}

/// Temporary migrated SQLite database that lives as long as the value.
pub struct TestDatabase {
    pub manager: Arc<DbManager>,
    pub store: SqliteAlarmStore,
    _temp_dir: TempDir,
}

impl TestDatabase {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temp dir should be created");
        let manager = Arc::new(
            DbManager::new(temp_dir.path().join("alarms.db"), 4)
                .expect("db manager should be created"),
        );
        manager.run_migrations().expect("schema migrations should apply");
        let store = SqliteAlarmStore::new(Arc::clone(&manager));
        Self { manager, store, _temp_dir: temp_dir }
    }
}
