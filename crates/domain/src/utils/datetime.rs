//! Resolution of iCalendar DATE / DATE-TIME values to absolute instants.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;

use crate::errors::{CalarmError, Result};
use crate::types::calendar::{EventTime, EventZone};
use crate::utils::ics::ContentLine;

const DATE_FORMAT: &str = "%Y%m%d";
const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

/// Resolve a `DTSTART`/`DTEND`/`RECURRENCE-ID` style property.
///
/// - `...Z` values are UTC.
/// - `TZID=` values are resolved in that zone, or in `default_tz` when the
///   zone is unknown.
/// - Floating values are resolved in `default_tz`.
/// - `VALUE=DATE` (or a bare 8 digit value) is all-day and anchored at
///   midnight UTC.
///
/// # Errors
/// Returns `CalarmError::Parse` when the value is not a DATE or DATE-TIME.
pub fn resolve_event_time(line: &ContentLine, default_tz: Tz) -> Result<EventTime> {
    resolve_value(line.value.trim(), line.param("VALUE"), line.param("TZID"), default_tz)
}

/// Resolve every instant of a comma separated `EXDATE`/`RDATE` property.
/// Values that do not parse (including `VALUE=PERIOD`) are skipped.
pub fn resolve_instants(line: &ContentLine, default_tz: Tz) -> Vec<DateTime<Utc>> {
    if line.param("VALUE").is_some_and(|kind| kind.eq_ignore_ascii_case("PERIOD")) {
        return Vec::new();
    }

    line.value
        .split(',')
        .filter_map(|value| {
            resolve_value(value.trim(), line.param("VALUE"), line.param("TZID"), default_tz).ok()
        })
        .map(|time| time.instant)
        .collect()
}

/// Look up an IANA zone from a `TZID` parameter, tolerating quotes and the
/// `/`-prefixed global form.
pub fn lookup_zone(tzid: &str) -> Option<Tz> {
    let name = tzid.trim().trim_matches('"');
    let name = name.strip_prefix('/').unwrap_or(name);
    name.parse::<Tz>().ok()
}

fn resolve_value(
    value: &str,
    value_type: Option<&str>,
    tzid: Option<&str>,
    default_tz: Tz,
) -> Result<EventTime> {
    let is_date = value_type.is_some_and(|kind| kind.eq_ignore_ascii_case("DATE"))
        || (value.len() == 8 && value.bytes().all(|b| b.is_ascii_digit()));

    if is_date {
        let date = NaiveDate::parse_from_str(value, DATE_FORMAT)
            .map_err(|e| CalarmError::Parse(format!("Invalid DATE '{value}': {e}")))?;
        let local = date.and_time(NaiveTime::MIN);
        return Ok(EventTime { instant: Utc.from_utc_datetime(&local), local, zone: EventZone::AllDay });
    }

    if let Some(utc_value) = value.strip_suffix(['Z', 'z']) {
        let local = parse_date_time(utc_value)?;
        return Ok(EventTime { instant: Utc.from_utc_datetime(&local), local, zone: EventZone::Utc });
    }

    let local = parse_date_time(value)?;
    let zone = tzid.and_then(lookup_zone).unwrap_or(default_tz);
    let instant = localize(zone, local)
        .ok_or_else(|| CalarmError::Parse(format!("Cannot resolve '{value}' in {zone}")))?;

    Ok(EventTime { instant, local, zone: EventZone::Named(zone) })
}

fn parse_date_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .map_err(|e| CalarmError::Parse(format!("Invalid DATE-TIME '{value}': {e}")))
}

/// Map a wall-clock time to an instant. Ambiguous times take the earlier
/// offset; times inside a DST gap move forward by an hour.
pub fn localize(zone: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    zone.from_local_datetime(&local)
        .earliest()
        .or_else(|| zone.from_local_datetime(&(local + Duration::hours(1))).earliest())
        .map(|resolved| resolved.with_timezone(&Utc))
}
