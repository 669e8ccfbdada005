//! In-memory `AlarmStore` mock with call counters and failure injection.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use calarm_core::AlarmStore;
use calarm_domain::{
    AlarmEvent, AlarmKey, CalarmError, EventUid, MailAddress, Result as DomainResult,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use parking_lot::Mutex;

#[derive(Default, Clone)]
pub struct MockAlarmStore {
    alarms: Arc<Mutex<BTreeMap<AlarmKey, AlarmEvent>>>,
    upserts: Arc<AtomicUsize>,
    deletes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl MockAlarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store without counting a write.
    pub fn with_alarm(self, alarm: AlarmEvent) -> Self {
        self.alarms.lock().insert(alarm.key(), alarm);
        self
    }

    /// Make every subsequent upsert/delete fail.
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    pub fn upserts(&self) -> usize {
        self.upserts.load(Ordering::SeqCst)
    }

    pub fn deletes(&self) -> usize {
        self.deletes.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> Vec<AlarmEvent> {
        self.alarms.lock().values().cloned().collect()
    }

    pub fn get(&self, uid: &str, recipient: &str) -> Option<AlarmEvent> {
        let key = AlarmKey::new(EventUid::from(uid), MailAddress::parse(recipient).ok()?);
        self.alarms.lock().get(&key).cloned()
    }

    fn check_writable(&self) -> DomainResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            Err(CalarmError::Database("store is read-only".to_string()))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl AlarmStore for MockAlarmStore {
    async fn find(
        &self,
        event_uid: &EventUid,
        recipient: &MailAddress,
    ) -> DomainResult<Option<AlarmEvent>> {
        let key = AlarmKey::new(event_uid.clone(), recipient.clone());
        Ok(self.alarms.lock().get(&key).cloned())
    }

    async fn find_by_event(&self, event_uid: &EventUid) -> DomainResult<Vec<AlarmEvent>> {
        Ok(self
            .alarms
            .lock()
            .values()
            .filter(|alarm| &alarm.event_uid == event_uid)
            .cloned()
            .collect())
    }

    async fn upsert(&self, alarm: AlarmEvent) -> DomainResult<()> {
        self.check_writable()?;
        self.upserts.fetch_add(1, Ordering::SeqCst);
        self.alarms.lock().insert(alarm.key(), alarm);
        Ok(())
    }

    async fn delete(&self, event_uid: &EventUid, recipient: &MailAddress) -> DomainResult<()> {
        self.check_writable()?;
        self.deletes.fetch_add(1, Ordering::SeqCst);
        self.alarms.lock().remove(&AlarmKey::new(event_uid.clone(), recipient.clone()));
        Ok(())
    }

    fn find_due_before(&self, instant: DateTime<Utc>) -> BoxStream<'_, DomainResult<AlarmEvent>> {
        let due: Vec<_> = self
            .alarms
            .lock()
            .values()
            .filter(|alarm| alarm.is_due(instant))
            .cloned()
            .map(Ok)
            .collect();
        stream::iter(due).boxed()
    }
}
