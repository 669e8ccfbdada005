//! Reconciliation engine behaviour against in-memory store and expander
//! mocks.

mod support;

use std::sync::Arc;

use calarm_common::time::MockClock;
use calarm_common::ErrorClassification;
use calarm_core::{
    AllowAll, DenyList, NextAlarmCalculator, ReconcileError, ReconciliationService,
    RecipientPolicy,
};
use calarm_domain::{CalendarChange, EventChange, MailAddress};
use chrono::{DateTime, Duration, Utc};

use support::expander::DailyExpander;
use support::fixtures::{utc, EventBuilder, ORGANIZER, PATH};
use support::store::MockAlarmStore;

const ALICE: &str = "alice@example.com";
const BOB: &str = "bob@example.com";

struct Harness {
    service: ReconciliationService,
    store: MockAlarmStore,
    clock: MockClock,
}

fn service_over(
    store: &MockAlarmStore,
    clock: &MockClock,
    expander: DailyExpander,
    policy: Arc<dyn RecipientPolicy>,
) -> ReconciliationService {
    let calculator = NextAlarmCalculator::new(Arc::new(expander), Arc::new(clock.clone()));
    ReconciliationService::new(calculator, Arc::new(store.clone()), policy, Arc::new(clock.clone()))
}

fn harness_with(
    now: DateTime<Utc>,
    expander: DailyExpander,
    policy: Arc<dyn RecipientPolicy>,
) -> Harness {
    let store = MockAlarmStore::new();
    let clock = MockClock::at(now);
    let service = service_over(&store, &clock, expander, policy);
    Harness { service, store, clock }
}

fn harness() -> Harness {
    harness_with(utc(2025, 7, 1, 0, 0), DailyExpander::new(5), Arc::new(AllowAll))
}

fn meeting() -> EventBuilder {
    EventBuilder::new("evt-1", "20250801T060000Z")
        .attendee(ALICE, "ACCEPTED")
        .attendee(BOB, "NEEDS-ACTION")
}

fn address(raw: &str) -> MailAddress {
    MailAddress::parse(raw).unwrap()
}

#[tokio::test]
async fn created_schedules_organizer_and_accepted_attendees() {
    let h = harness();

    let report = h.service.handle(meeting().created()).await.unwrap();

    assert_eq!(report.upserted, vec![address(ALICE), address(ORGANIZER)]);
    assert_eq!(report.unchanged, vec![address(BOB)]);
    assert!(report.deleted.is_empty());

    let alarm = h.store.get("evt-1", ALICE).unwrap();
    assert_eq!(alarm.alarm_time, utc(2025, 8, 1, 5, 45));
    assert_eq!(alarm.event_start_time, utc(2025, 8, 1, 6, 0));
    assert_eq!(alarm.event_path, PATH);
    assert!(!alarm.recurring);
    assert!(alarm.ics.contains("UID:evt-1"));
    assert!(h.store.get("evt-1", BOB).is_none());
}

#[tokio::test]
async fn replaying_the_same_change_is_idempotent() {
    let h = harness();

    h.service.handle(meeting().created()).await.unwrap();
    let state_after_first = h.store.snapshot();
    let replay = h.service.handle(meeting().created()).await.unwrap();

    assert_eq!(h.store.snapshot(), state_after_first);
    assert_eq!(replay.mutations(), 0);
    assert_eq!(h.store.upserts(), 2);
    assert_eq!(h.store.deletes(), 0);
}

#[tokio::test]
async fn shifting_the_start_shifts_the_alarm_by_the_same_delta() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();
    let before = h.store.get("evt-1", ALICE).unwrap().alarm_time;

    let moved = EventBuilder::new("evt-1", "20250801T083000Z").attendee(ALICE, "ACCEPTED");
    h.service.handle(moved.updated_from(&meeting())).await.unwrap();

    let after = h.store.get("evt-1", ALICE).unwrap().alarm_time;
    assert_eq!(after - before, Duration::minutes(150));
}

#[tokio::test]
async fn decline_removes_and_reaccept_restores_the_same_alarm() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();
    let original = h.store.get("evt-1", ALICE).unwrap();

    let declined = EventBuilder::new("evt-1", "20250801T060000Z").attendee(ALICE, "DECLINED");
    let report = h.service.handle(declined.updated_from(&meeting())).await.unwrap();
    assert_eq!(report.deleted, vec![address(ALICE)]);
    assert!(h.store.get("evt-1", ALICE).is_none());

    let accepted = EventBuilder::new("evt-1", "20250801T060000Z").attendee(ALICE, "ACCEPTED");
    h.service.handle(accepted.updated_from(&declined)).await.unwrap();
    let restored = h.store.get("evt-1", ALICE).unwrap();
    assert_eq!(restored.alarm_time, original.alarm_time);
}

#[tokio::test]
async fn attendee_removed_from_event_loses_alarm() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    // No previous payload: the stored alarm alone identifies alice.
    let without_alice = EventBuilder::new("evt-1", "20250801T060000Z");
    let change = CalendarChange::Updated(EventChange {
        event_path: PATH.to_string(),
        payload: without_alice.build(),
        is_import: true,
        previous_payload: None,
    });
    let report = h.service.handle(change).await.unwrap();

    assert_eq!(report.deleted, vec![address(ALICE)]);
    assert!(h.store.get("evt-1", ALICE).is_none());
    assert!(h.store.get("evt-1", ORGANIZER).is_some());
}

#[tokio::test]
async fn removing_the_valarm_removes_every_alarm() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    let silent = meeting().without_alarm();
    h.service.handle(silent.updated_from(&meeting())).await.unwrap();

    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn cancelled_status_removes_every_alarm() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    let cancelled = meeting().cancelled();
    let report = h.service.handle(cancelled.updated_from(&meeting())).await.unwrap();

    assert_eq!(report.deleted.len(), 2);
    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn deletion_cascades_to_every_recipient() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();
    assert_eq!(h.store.snapshot().len(), 2);

    let report = h.service.handle(meeting().deleted()).await.unwrap();

    assert!(h.store.snapshot().is_empty());
    assert_eq!(report.deleted.len(), 3);
}

#[tokio::test]
async fn cancellation_notification_deletes_alarms_of_unknown_recipients_too() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    // The last known payload no longer lists alice, the store still does.
    let shrunk = EventBuilder::new("evt-1", "20250801T060000Z");
    h.service.handle(shrunk.cancelled_change()).await.unwrap();

    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn policy_denial_deletes_instead_of_upserting() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();
    assert!(h.store.get("evt-1", ALICE).is_some());

    let strict = service_over(
        &h.store,
        &h.clock,
        DailyExpander::new(5),
        Arc::new(DenyList::new([address(ALICE)])),
    );

    let report = strict.handle(meeting().created()).await.unwrap();

    assert_eq!(report.deleted, vec![address(ALICE)]);
    assert!(h.store.get("evt-1", ALICE).is_none());
    assert!(h.store.get("evt-1", ORGANIZER).is_some());
}

#[tokio::test]
async fn unparseable_payload_is_dropped_without_mutation() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    let garbage = CalendarChange::Updated(EventChange {
        event_path: PATH.to_string(),
        payload: "BEGIN:VCALENDAR\r\nBEGIN:VEVENT\r\n".to_string(),
        is_import: false,
        previous_payload: None,
    });
    let report = h.service.handle(garbage).await.unwrap();

    assert!(report.dropped);
    assert_eq!(report.event_uid, None);
    assert_eq!(h.store.snapshot().len(), 2);
    assert_eq!(h.store.deletes(), 0);
}

#[tokio::test]
async fn unparseable_previous_payload_is_ignored() {
    let h = harness();
    let change = CalendarChange::Updated(EventChange {
        event_path: PATH.to_string(),
        payload: meeting().build(),
        is_import: false,
        previous_payload: Some("not a calendar".to_string()),
    });

    let report = h.service.handle(change).await.unwrap();

    assert_eq!(report.upserted.len(), 2);
}

#[tokio::test]
async fn store_failure_is_propagated_as_retryable() {
    let h = harness();
    h.store.fail_writes();

    let err = h.service.handle(meeting().created()).await.unwrap_err();

    assert!(matches!(err, ReconcileError::Store(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn computation_fault_is_isolated_to_one_recipient() {
    let h = harness_with(
        utc(2025, 7, 1, 0, 0),
        DailyExpander::new(5).failing_on_call(1),
        Arc::new(AllowAll),
    );
    let series = meeting().rrule("FREQ=DAILY;COUNT=5");

    let err = h.service.handle(series.created()).await.unwrap_err();

    let ReconcileError::PartialFailure { report } = err else {
        panic!("expected a partial failure");
    };
    // Recipients are walked in address order: alice faults, org succeeds.
    assert_eq!(report.faulted, vec![address(ALICE)]);
    assert_eq!(report.upserted, vec![address(ORGANIZER)]);
    let organizer_alarm = h.store.get("evt-1", ORGANIZER).unwrap();
    assert!(organizer_alarm.recurring);
    assert_eq!(organizer_alarm.recurrence_id, Some(utc(2025, 8, 1, 6, 0)));
}

#[tokio::test]
async fn now_is_read_from_the_injected_clock() {
    let h = harness();
    h.service.handle(meeting().created()).await.unwrap();

    // Past the alarm time: the same payload now yields no alarm.
    h.clock.set(utc(2025, 8, 1, 5, 50));
    let report = h.service.handle(meeting().created()).await.unwrap();

    assert_eq!(report.deleted.len(), 2);
    assert!(h.store.snapshot().is_empty());
}

#[tokio::test]
async fn recurring_series_moves_to_next_instance_once_one_passes() {
    let h = harness();
    let series = meeting().rrule("FREQ=DAILY;COUNT=5");
    h.service.handle(series.created()).await.unwrap();
    assert_eq!(h.store.get("evt-1", ALICE).unwrap().alarm_time, utc(2025, 8, 1, 5, 45));

    h.clock.set(utc(2025, 8, 1, 7, 0));
    let report = h.service.handle(series.created()).await.unwrap();

    assert_eq!(report.upserted.len(), 2);
    let alarm = h.store.get("evt-1", ALICE).unwrap();
    assert_eq!(alarm.alarm_time, utc(2025, 8, 2, 5, 45));
    assert_eq!(alarm.recurrence_id, Some(utc(2025, 8, 2, 6, 0)));
}

#[tokio::test]
async fn unrepresentable_trigger_yields_no_alarm_without_failing() {
    let h = harness();
    let far_trigger = EventBuilder::new("evt-1", "20250801T060000Z")
        .attendee(ALICE, "ACCEPTED")
        .trigger("-P100000000D");

    let report = h.service.handle(far_trigger.created()).await.unwrap();

    assert!(report.upserted.is_empty());
    assert!(report.faulted.is_empty());
    assert!(h.store.get("evt-1", ALICE).is_none());
}

#[tokio::test]
async fn late_write_for_ineligible_recipient_is_removed_by_next_delivery() {
    let h = harness();
    let first = h.service.handle(meeting().created()).await.unwrap();
    assert_eq!(first.unchanged, vec![address(BOB)]);
    assert_eq!(h.store.deletes(), 0);

    // An older notification's write landing after the snapshot was read.
    let mut stale = h.store.get("evt-1", ALICE).unwrap();
    stale.recipient = address(BOB);
    let _ = h.store.clone().with_alarm(stale);

    let redelivered = h.service.handle(meeting().created()).await.unwrap();

    assert_eq!(redelivered.deleted, vec![address(BOB)]);
    assert!(h.store.get("evt-1", BOB).is_none());
    assert!(h.store.get("evt-1", ALICE).is_some());
}
