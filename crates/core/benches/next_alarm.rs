use std::sync::Arc;

use calarm_common::time::MockClock;
use calarm_core::{ExpansionWindow, NextAlarmCalculator, RecurrenceExpander};
use calarm_domain::{CalendarEvent, MailAddress, MasterEvent, Result as DomainResult};
use chrono::{DateTime, Duration, TimeZone, Utc};
use chrono_tz::Tz;
use criterion::{black_box, criterion_group, criterion_main, Criterion};

/// Daily series of a fixed length, ignoring the RRULE text.
struct DailyExpander {
    count: i64,
}

impl RecurrenceExpander for DailyExpander {
    fn expand(
        &self,
        master: &MasterEvent,
        window: &ExpansionWindow,
    ) -> DomainResult<Vec<DateTime<Utc>>> {
        Ok((0..self.count)
            .map(|day| master.start().instant + Duration::days(day))
            .filter(|instant| window.contains(*instant))
            .take(usize::from(window.limit))
            .collect())
    }
}

fn series_payload(declined_days: usize) -> String {
    let mut ics = String::from(
        "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nBEGIN:VEVENT\r\nUID:bench\r\n\
DTSTART:20250101T090000Z\r\nDURATION:PT30M\r\nRRULE:FREQ=DAILY;COUNT=400\r\n\
ORGANIZER:mailto:org@example.com\r\nATTENDEE;PARTSTAT=ACCEPTED:mailto:alice@example.com\r\n\
BEGIN:VALARM\r\nACTION:EMAIL\r\nTRIGGER:-PT15M\r\nEND:VALARM\r\nEND:VEVENT\r\n",
    );
    // Overrides declined by alice force the calculator to walk the series.
    for day in 0..declined_days {
        let date = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap() + Duration::days(day as i64);
        let stamp = date.format("%Y%m%dT%H%M%SZ");
        ics.push_str(&format!(
            "BEGIN:VEVENT\r\nUID:bench\r\nRECURRENCE-ID:{stamp}\r\nDTSTART:{stamp}\r\n\
ATTENDEE;PARTSTAT=DECLINED:mailto:alice@example.com\r\n\
BEGIN:VALARM\r\nACTION:EMAIL\r\nTRIGGER:-PT15M\r\nEND:VALARM\r\nEND:VEVENT\r\n"
        ));
    }
    ics.push_str("END:VCALENDAR\r\n");
    ics
}

fn bench_next_alarm(c: &mut Criterion) {
    let now = Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
    let calculator = NextAlarmCalculator::new(
        Arc::new(DailyExpander { count: 400 }),
        Arc::new(MockClock::at(now)),
    );
    let recipient = MailAddress::parse("alice@example.com").unwrap();

    let first_instance = CalendarEvent::parse(&series_payload(0), Tz::UTC).unwrap();
    c.bench_function("next_alarm_first_instance", |b| {
        b.iter(|| {
            calculator
                .compute_next_alarm(black_box(&first_instance), black_box(&recipient))
                .unwrap()
        })
    });

    let walked = CalendarEvent::parse(&series_payload(200), Tz::UTC).unwrap();
    c.bench_function("next_alarm_after_200_declined", |b| {
        b.iter(|| {
            calculator.compute_next_alarm(black_box(&walked), black_box(&recipient)).unwrap()
        })
    });

    let raw = series_payload(50);
    c.bench_function("parse_series_with_50_overrides", |b| {
        b.iter(|| CalendarEvent::parse(black_box(&raw), Tz::UTC).unwrap())
    });
}

criterion_group!(benches, bench_next_alarm);
criterion_main!(benches);
