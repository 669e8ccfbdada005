//! Builds the [`CalendarEvent`] model from a parsed component tree.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::errors::{CalarmError, Result};
use crate::types::calendar::{
    AlarmAction, AlarmDefinition, Attendee, CalendarEvent, EventComponent, EventStatus,
    MasterEvent, OverrideInstance, PartStat, Person, RecurrenceRule, TriggerRelation,
};
use crate::types::mail::MailAddress;
use crate::utils::datetime::{resolve_event_time, resolve_instants};
use crate::utils::duration::parse_duration;
use crate::utils::ics::{parse_calendar, Component, ContentLine};

/// Parse a raw VCALENDAR payload into a [`CalendarEvent`].
///
/// The master is the VEVENT without `RECURRENCE-ID`; when several share the
/// UID the highest `SEQUENCE` wins, ties going to the later `DTSTAMP`.
/// VEVENTs with `RECURRENCE-ID` become overrides keyed by their absolute
/// recurrence instant.
///
/// # Errors
/// Returns `CalarmError::Parse` when the payload has no VCALENDAR, has
/// unbalanced blocks, has no VEVENT, has only overrides, or when the master
/// lacks `UID` or `DTSTART`.
pub fn parse_event(raw: &str, default_tz: Tz) -> Result<CalendarEvent> {
    let calendar = parse_calendar(raw)?;
    let vevents: Vec<&Component> = calendar.children_named("VEVENT").collect();
    if vevents.is_empty() {
        return Err(CalarmError::Parse("Calendar contains no VEVENT".to_string()));
    }

    let (override_blocks, master_blocks): (Vec<&Component>, Vec<&Component>) =
        vevents.into_iter().partition(|vevent| vevent.property("RECURRENCE-ID").is_some());

    let mut masters = Vec::with_capacity(master_blocks.len());
    for block in &master_blocks {
        masters.push((parse_component(block, default_tz)?, *block));
    }

    let (master_component, master_block) = masters
        .into_iter()
        .max_by(|(a, _), (b, _)| a.sequence.cmp(&b.sequence).then(a.dtstamp.cmp(&b.dtstamp)))
        .ok_or_else(|| CalarmError::Parse("Calendar has no master VEVENT".to_string()))?;

    let recurrence = parse_recurrence(master_block, default_tz);
    let uid = master_component.uid.clone();

    let mut overrides: BTreeMap<DateTime<Utc>, OverrideInstance> = BTreeMap::new();
    for block in override_blocks {
        let Some(instance) = parse_override(block, default_tz) else {
            continue;
        };
        if instance.component.uid != uid {
            continue;
        }
        let newer = overrides
            .get(&instance.recurrence_id)
            .map_or(true, |existing| instance.component.sequence >= existing.component.sequence);
        if newer {
            overrides.insert(instance.recurrence_id, instance);
        }
    }

    Ok(CalendarEvent::new(
        MasterEvent { component: master_component, recurrence },
        overrides,
        raw,
    ))
}

fn parse_component(block: &Component, default_tz: Tz) -> Result<EventComponent> {
    let uid = block
        .value("UID")
        .filter(|uid| !uid.is_empty())
        .ok_or_else(|| CalarmError::Parse("VEVENT without UID".to_string()))?
        .to_string();
    let start = block
        .property("DTSTART")
        .ok_or_else(|| CalarmError::Parse(format!("VEVENT {uid} without DTSTART")))
        .and_then(|line| resolve_event_time(line, default_tz))?;

    Ok(EventComponent {
        start,
        end: block.property("DTEND").and_then(|line| resolve_event_time(line, default_tz).ok()),
        duration: block.value("DURATION").and_then(|value| parse_duration(value).ok()),
        status: block.value("STATUS").and_then(|value| value.parse::<EventStatus>().ok()),
        sequence: block.value("SEQUENCE").and_then(|value| value.parse().ok()).unwrap_or(0),
        dtstamp: block
            .property("DTSTAMP")
            .and_then(|line| resolve_event_time(line, default_tz).ok())
            .map(|time| time.instant),
        summary: block.value("SUMMARY").map(str::to_string),
        organizer: block.property("ORGANIZER").and_then(parse_person),
        attendees: block.properties_named("ATTENDEE").filter_map(parse_attendee).collect(),
        valarms: block.children_named("VALARM").filter_map(parse_alarm).collect(),
        uid,
    })
}

fn parse_override(block: &Component, default_tz: Tz) -> Option<OverrideInstance> {
    let recurrence_id = block
        .property("RECURRENCE-ID")
        .and_then(|line| resolve_event_time(line, default_tz).ok())?
        .instant;

    // An override that omits DTSTART keeps the original instance start.
    let component = if block.property("DTSTART").is_some() {
        parse_component(block, default_tz).ok()?
    } else {
        let mut patched = block.clone();
        let mut line = block.property("RECURRENCE-ID")?.clone();
        line.name = "DTSTART".to_string();
        patched.properties.push(line);
        parse_component(&patched, default_tz).ok()?
    };

    Some(OverrideInstance { recurrence_id, component })
}

fn parse_recurrence(block: &Component, default_tz: Tz) -> Option<RecurrenceRule> {
    let rrule = block.value("RRULE").filter(|value| !value.is_empty()).map(str::to_string);
    let rdates: BTreeSet<DateTime<Utc>> = block
        .properties_named("RDATE")
        .flat_map(|line| resolve_instants(line, default_tz))
        .collect();

    if rrule.is_none() && rdates.is_empty() {
        return None;
    }

    let exdates = block
        .properties_named("EXDATE")
        .flat_map(|line| resolve_instants(line, default_tz))
        .collect();

    Some(RecurrenceRule { rrule, exdates, rdates })
}

fn parse_person(line: &ContentLine) -> Option<Person> {
    Some(Person {
        address: MailAddress::from_cal_address(&line.value)?,
        common_name: line.param("CN").map(str::to_string),
    })
}

fn parse_attendee(line: &ContentLine) -> Option<Attendee> {
    let partstat = line
        .param("PARTSTAT")
        .and_then(|value| value.parse::<PartStat>().ok())
        .unwrap_or_default();
    Some(Attendee { person: parse_person(line)?, partstat })
}

/// A VALARM is usable only with an `EMAIL`/`DISPLAY` action and a relative
/// duration trigger.
fn parse_alarm(block: &Component) -> Option<AlarmDefinition> {
    let action = block.value("ACTION")?.parse::<AlarmAction>().ok()?;
    let trigger_line = block.property("TRIGGER")?;
    if trigger_line.param("VALUE").is_some_and(|kind| kind.eq_ignore_ascii_case("DATE-TIME")) {
        return None;
    }
    let trigger = parse_duration(&trigger_line.value).ok()?;
    let related = match trigger_line.param("RELATED") {
        Some(value) => value.parse::<TriggerRelation>().ok()?,
        None => TriggerRelation::Start,
    };

    Some(AlarmDefinition { action, trigger, related })
}
