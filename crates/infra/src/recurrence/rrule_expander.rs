//! `RecurrenceExpander` backed by the `rrule` crate.
//!
//! The master's DTSTART is handed to `rrule` in its own zone so daily and
//! weekly series keep their wall-clock time across DST changes. All-day
//! series are expanded at midnight UTC.

use calarm_core::{ExpansionWindow, RecurrenceExpander};
use calarm_domain::utils::datetime::localize;
use calarm_domain::{EventTime, EventZone, MasterEvent, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use rrule::RRuleSet;
use tracing::trace;

use crate::errors::InfraError;

const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Clone, Copy, Default)]
pub struct RRuleExpander;

impl RRuleExpander {
    pub fn new() -> Self {
        Self
    }
}

impl RecurrenceExpander for RRuleExpander {
    fn expand(
        &self,
        master: &MasterEvent,
        window: &ExpansionWindow,
    ) -> Result<Vec<DateTime<Utc>>> {
        let Some(rule) = master.recurrence.as_ref().and_then(|r| r.rrule.as_deref()) else {
            return Ok(Vec::new());
        };

        let start = master.start();
        let source = format!("{}\nRRULE:{}", dtstart_line(start), normalize_rule(rule, start));
        let set: RRuleSet = source.parse().map_err(InfraError::from)?;

        let after = window.after.with_timezone(&rrule::Tz::UTC);
        let before = window.before.with_timezone(&rrule::Tz::UTC);
        let result = set.after(after).before(before).all(window.limit);

        trace!(
            uid = %master.component.uid,
            instants = result.dates.len(),
            limited = result.limited,
            "Expanded recurrence rule"
        );

        Ok(result
            .dates
            .into_iter()
            .map(|instant| instant.with_timezone(&Utc))
            .filter(|instant| window.contains(*instant))
            .collect())
    }
}

fn dtstart_line(start: &EventTime) -> String {
    match start.zone {
        EventZone::Named(zone) => {
            format!("DTSTART;TZID={}:{}", zone.name(), start.local.format(DATE_TIME_FORMAT))
        }
        EventZone::Utc | EventZone::AllDay => {
            format!("DTSTART:{}Z", start.instant.naive_utc().format(DATE_TIME_FORMAT))
        }
    }
}

/// Rewrite `UNTIL` as a UTC date-time, which `rrule` requires for
/// zone-aware DTSTARTs. Date-only values include the whole day.
fn normalize_rule(rule: &str, start: &EventTime) -> String {
    rule.trim()
        .split(';')
        .filter(|part| !part.is_empty())
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.trim().eq_ignore_ascii_case("UNTIL") => {
                format!("UNTIL={}", normalize_until(value.trim(), start))
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

fn normalize_until(value: &str, start: &EventTime) -> String {
    if value.ends_with(['Z', 'z']) {
        return value.to_uppercase();
    }

    let local = if let Ok(date) = NaiveDate::parse_from_str(value, "%Y%m%d") {
        date.and_time(NaiveTime::from_hms_opt(23, 59, 59).unwrap_or(NaiveTime::MIN))
    } else if let Ok(local) = NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT) {
        local
    } else {
        return value.to_string();
    };

    let instant = match start.zone {
        EventZone::Named(zone) => localize(zone, local),
        EventZone::Utc | EventZone::AllDay => Some(Utc.from_utc_datetime(&local)),
    };

    instant.map_or_else(
        || value.to_string(),
        |instant| format!("{}Z", instant.naive_utc().format(DATE_TIME_FORMAT)),
    )
}
