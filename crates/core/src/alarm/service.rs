//! Reconciliation engine - keeps the alarm store in line with calendar
//! changes.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use calarm_common::time::Clock;
use calarm_domain::{
    AlarmEvent, CalendarChange, CalendarEvent, EventChange, EventRemoval, EventUid, MailAddress,
};
use chrono_tz::Tz;
use tracing::{debug, info, instrument, warn};

use super::calculator::NextAlarmCalculator;
use super::errors::{ReconcileError, ReconcileReport};
use super::policy::RecipientPolicy;
use super::ports::AlarmStore;

/// Consumes calendar changes and drives the alarm store to the desired state.
///
/// Every notification recomputes the full desired state for the event and
/// applies idempotent upserts and deletes, so duplicate or reordered
/// deliveries converge.
pub struct ReconciliationService {
    calculator: NextAlarmCalculator,
    store: Arc<dyn AlarmStore>,
    policy: Arc<dyn RecipientPolicy>,
    clock: Arc<dyn Clock>,
    default_tz: Tz,
}

impl ReconciliationService {
    pub fn new(
        calculator: NextAlarmCalculator,
        store: Arc<dyn AlarmStore>,
        policy: Arc<dyn RecipientPolicy>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { calculator, store, policy, clock, default_tz: Tz::UTC }
    }

    /// Zone for floating times and unknown `TZID`s in incoming payloads.
    pub fn with_default_timezone(mut self, default_tz: Tz) -> Self {
        self.default_tz = default_tz;
        self
    }

    /// Handle one notification.
    ///
    /// # Errors
    /// - `ReconcileError::Store` when the alarm store fails.
    /// - `ReconcileError::PartialFailure` when some recipients could not be
    ///   computed; the others were still reconciled.
    #[instrument(skip_all, fields(kind = change.kind(), event_path = change.event_path()))]
    pub async fn handle(&self, change: CalendarChange) -> Result<ReconcileReport, ReconcileError> {
        match change {
            CalendarChange::Created(change) | CalendarChange::Updated(change) => {
                self.reconcile(change).await
            }
            CalendarChange::Deleted(removal) | CalendarChange::Cancelled(removal) => {
                self.retract(removal).await
            }
        }
    }

    async fn reconcile(&self, change: EventChange) -> Result<ReconcileReport, ReconcileError> {
        let event = match CalendarEvent::parse(&change.payload, self.default_tz) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, is_import = change.is_import, "Dropping change with unparseable payload");
                return Ok(ReconcileReport::dropped());
            }
        };

        let uid = EventUid::new(event.uid());
        let now = self.clock.now();
        let current = event.recipients();

        let mut recipients: BTreeSet<MailAddress> = current.clone();
        if let Some(previous) = &change.previous_payload {
            match CalendarEvent::parse(previous, self.default_tz) {
                Ok(previous) => recipients.extend(previous.recipients()),
                Err(err) => warn!(error = %err, uid = %uid, "Ignoring unparseable previous payload"),
            }
        }

        let stored = self.stored_alarms(&uid).await?;
        recipients.extend(stored.keys().cloned());

        debug!(
            uid = %uid,
            recipients = recipients.len(),
            is_import = change.is_import,
            "Reconciling event"
        );

        let mut report = ReconcileReport::for_event(uid.clone());
        for recipient in recipients {
            let desired = if current.contains(&recipient) {
                match self.calculator.compute_next_alarm_at(&event, &recipient, now) {
                    Ok(Some(decision)) if self.policy.allows(&recipient) => {
                        Some(AlarmEvent::from_decision(
                            uid.clone(),
                            recipient.clone(),
                            &decision,
                            change.payload.as_str(),
                            change.event_path.as_str(),
                        ))
                    }
                    Ok(Some(_)) => {
                        debug!(uid = %uid, recipient = %recipient, "Recipient denied by policy");
                        None
                    }
                    Ok(None) => None,
                    Err(err) => {
                        warn!(uid = %uid, recipient = %recipient, error = %err, "Failed to compute next alarm");
                        report.faulted.push(recipient);
                        continue;
                    }
                }
            } else {
                None
            };

            let existing = stored.get(&recipient);
            self.apply(&mut report, &uid, recipient, existing, desired).await?;
        }

        if report.faulted.is_empty() {
            Ok(report)
        } else {
            Err(ReconcileError::PartialFailure { report })
        }
    }

    async fn retract(&self, removal: EventRemoval) -> Result<ReconcileReport, ReconcileError> {
        let event = match CalendarEvent::parse(&removal.last_known_payload, self.default_tz) {
            Ok(event) => event,
            Err(err) => {
                warn!(error = %err, "Dropping removal with unparseable payload");
                return Ok(ReconcileReport::dropped());
            }
        };

        let uid = EventUid::new(event.uid());
        let mut recipients = event.recipients();
        recipients.extend(self.stored_alarms(&uid).await?.into_keys());

        let mut report = ReconcileReport::for_event(uid.clone());
        for recipient in recipients {
            self.store.delete(&uid, &recipient).await.map_err(ReconcileError::Store)?;
            report.deleted.push(recipient);
        }

        info!(uid = %uid, deleted = report.deleted.len(), "Retracted alarms for removed event");
        Ok(report)
    }

    async fn stored_alarms(
        &self,
        uid: &EventUid,
    ) -> Result<HashMap<MailAddress, AlarmEvent>, ReconcileError> {
        let alarms = self.store.find_by_event(uid).await.map_err(ReconcileError::Store)?;
        Ok(alarms.into_iter().map(|alarm| (alarm.recipient.clone(), alarm)).collect())
    }

    /// Move one key from its stored state to its desired state.
    async fn apply(
        &self,
        report: &mut ReconcileReport,
        uid: &EventUid,
        recipient: MailAddress,
        existing: Option<&AlarmEvent>,
        desired: Option<AlarmEvent>,
    ) -> Result<(), ReconcileError> {
        match (existing, desired) {
            (Some(current), Some(wanted)) if *current == wanted => {
                debug!(uid = %uid, recipient = %recipient, "Alarm already up to date");
                report.unchanged.push(recipient);
            }
            (_, Some(wanted)) => {
                let alarm_time = wanted.alarm_time;
                self.store.upsert(wanted).await.map_err(ReconcileError::Store)?;
                info!(uid = %uid, recipient = %recipient, %alarm_time, "Scheduled alarm");
                report.upserted.push(recipient);
            }
            (Some(_), None) => {
                self.store.delete(uid, &recipient).await.map_err(ReconcileError::Store)?;
                info!(uid = %uid, recipient = %recipient, "Removed alarm");
                report.deleted.push(recipient);
            }
            // Trusts the snapshot read at the start of this notification; a
            // concurrent write landing after that read is corrected by the
            // next delivery for the event.
            (None, None) => report.unchanged.push(recipient),
        }
        Ok(())
    }
}
