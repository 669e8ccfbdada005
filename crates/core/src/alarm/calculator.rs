//! Next-alarm calculator
//!
//! Given a parsed event and a recipient, finds the earliest future alarm the
//! recipient is entitled to. Recurring series are expanded through the
//! [`RecurrenceExpander`] port inside a bounded lookahead window.

use std::collections::BTreeSet;
use std::sync::Arc;

use calarm_common::time::Clock;
use calarm_domain::constants::{DEFAULT_LOOKAHEAD_DAYS, DEFAULT_MAX_OCCURRENCES};
use calarm_domain::{
    AlarmDecision, CalendarEvent, MailAddress, Occurrence, Result, SchedulingConfig,
};
use chrono::{DateTime, Duration, Utc};
use tracing::trace;

use super::ports::{ExpansionWindow, RecurrenceExpander};

/// Lookahead bounds for recurring series.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalculatorSettings {
    pub lookahead: Duration,
    pub max_occurrences: u16,
}

impl CalculatorSettings {
    pub fn from_config(config: &SchedulingConfig) -> Self {
        Self {
            lookahead: Duration::days(i64::from(config.lookahead_days)),
            max_occurrences: config.max_occurrences,
        }
    }
}

impl Default for CalculatorSettings {
    fn default() -> Self {
        Self {
            lookahead: Duration::days(i64::from(DEFAULT_LOOKAHEAD_DAYS)),
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

/// Computes the next alarm of an event for one recipient.
pub struct NextAlarmCalculator {
    expander: Arc<dyn RecurrenceExpander>,
    clock: Arc<dyn Clock>,
    settings: CalculatorSettings,
}

impl NextAlarmCalculator {
    pub fn new(expander: Arc<dyn RecurrenceExpander>, clock: Arc<dyn Clock>) -> Self {
        Self { expander, clock, settings: CalculatorSettings::default() }
    }

    pub fn with_settings(mut self, settings: CalculatorSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &CalculatorSettings {
        &self.settings
    }

    /// Next alarm relative to the injected clock.
    ///
    /// # Errors
    /// Propagates recurrence expansion failures.
    pub fn compute_next_alarm(
        &self,
        event: &CalendarEvent,
        recipient: &MailAddress,
    ) -> Result<Option<AlarmDecision>> {
        self.compute_next_alarm_at(event, recipient, self.clock.now())
    }

    /// Next alarm relative to an explicit `now`.
    ///
    /// Returns `None` when the recipient is not entitled to any future alarm
    /// within the lookahead window.
    ///
    /// # Errors
    /// Propagates recurrence expansion failures.
    pub fn compute_next_alarm_at(
        &self,
        event: &CalendarEvent,
        recipient: &MailAddress,
        now: DateTime<Utc>,
    ) -> Result<Option<AlarmDecision>> {
        if !event.is_recurring_master() {
            return Ok(decide(event.single_occurrence(), recipient, now, false));
        }

        let decision = self
            .candidates(event, now)?
            .into_iter()
            .find_map(|occurrence| decide(occurrence, recipient, now, true));

        trace!(
            uid = event.uid(),
            recipient = %recipient,
            found = decision.is_some(),
            "Walked recurring candidates"
        );
        Ok(decision)
    }

    /// Occurrences of a recurring event that start after `now`, in
    /// chronological order of their effective start.
    fn candidates<'a>(
        &self,
        event: &'a CalendarEvent,
        now: DateTime<Utc>,
    ) -> Result<Vec<Occurrence<'a>>> {
        let Some(rule) = event.recurrence_rule() else {
            return Ok(vec![event.single_occurrence()]);
        };

        let window = ExpansionWindow {
            after: now,
            before: now + self.settings.lookahead,
            limit: self.settings.max_occurrences,
        };

        let mut instants: BTreeSet<DateTime<Utc>> = BTreeSet::new();
        if rule.rrule.is_some() {
            instants.extend(self.expander.expand(event.master(), &window)?);
        }
        instants.extend(rule.rdates.iter().copied().filter(|rdate| window.contains(*rdate)));
        if window.contains(event.start()) {
            instants.insert(event.start());
        }
        instants.retain(|instant| !rule.exdates.contains(instant));

        let mut occurrences: Vec<Occurrence<'a>> = instants
            .iter()
            .take(usize::from(window.limit))
            .map(|instant| event.occurrence_at(*instant))
            .collect();

        // Overrides whose original slot was not expanded but that were moved
        // into the future.
        occurrences.extend(
            event
                .override_instances()
                .iter()
                .filter(|(recurrence_id, instance)| {
                    !instants.contains(recurrence_id)
                        && !rule.exdates.contains(recurrence_id)
                        && instance.component.start.instant > now
                })
                .map(|(_, instance)| Occurrence::Override(instance)),
        );

        occurrences.sort_by_key(|occurrence| (occurrence.start(), occurrence.recurrence_id()));
        Ok(occurrences)
    }
}

/// Earliest non-past alarm of one occurrence, if the recipient may have it.
fn decide(
    occurrence: Occurrence<'_>,
    recipient: &MailAddress,
    now: DateTime<Utc>,
    recurring: bool,
) -> Option<AlarmDecision> {
    let start = occurrence.start();
    if start <= now || !occurrence.is_eligible(recipient) {
        return None;
    }
    let end = occurrence.end();

    occurrence
        .valarms()
        .iter()
        .filter_map(|alarm| alarm.fire_time(start, end).map(|at| (at, alarm.action)))
        .filter(|(alarm_time, _)| *alarm_time >= now)
        .min_by_key(|(alarm_time, _)| *alarm_time)
        .map(|(alarm_time, action)| AlarmDecision {
            alarm_time,
            occurrence_start: start,
            recurring,
            recurrence_id: occurrence.recurrence_id(),
            action,
        })
}
