//! Reconciliation outcome and error types

use std::time::Duration;

use calarm_common::error::{ErrorClassification, ErrorSeverity};
use calarm_domain::{CalarmError, EventUid, MailAddress};
use thiserror::Error;

/// What a single notification did to the alarm store.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `None` when the payload could not be parsed.
    pub event_uid: Option<EventUid>,
    pub upserted: Vec<MailAddress>,
    pub deleted: Vec<MailAddress>,
    pub unchanged: Vec<MailAddress>,
    /// Recipients whose alarm could not be computed.
    pub faulted: Vec<MailAddress>,
    /// The payload was unusable and the notification was ignored.
    pub dropped: bool,
}

impl ReconcileReport {
    pub fn for_event(event_uid: EventUid) -> Self {
        Self { event_uid: Some(event_uid), ..Self::default() }
    }

    pub fn dropped() -> Self {
        Self { dropped: true, ..Self::default() }
    }

    /// Number of store writes performed.
    pub fn mutations(&self) -> usize {
        self.upserted.len() + self.deleted.len()
    }
}

#[derive(Debug, Error)]
pub enum ReconcileError {
    /// The alarm store failed; nothing after the failing call was applied.
    #[error("Alarm store failure: {0}")]
    Store(#[source] CalarmError),

    /// Some recipients faulted; the others were reconciled.
    #[error("{} recipient(s) could not be reconciled", report.faulted.len())]
    PartialFailure { report: ReconcileReport },
}

impl ErrorClassification for ReconcileError {
    fn is_retryable(&self) -> bool {
        matches!(self, Self::Store(_))
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Store(_) => ErrorSeverity::Warning,
            Self::PartialFailure { .. } => ErrorSeverity::Error,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }
}
