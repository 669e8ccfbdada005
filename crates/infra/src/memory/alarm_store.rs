//! `AlarmStore` kept in a concurrent hash map.

use std::sync::Arc;

use async_trait::async_trait;
use calarm_core::AlarmStore;
use calarm_domain::{AlarmEvent, AlarmKey, EventUid, MailAddress, Result};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use futures::stream::{self, BoxStream, StreamExt};
use tracing::{debug, instrument};

/// Non-persistent alarm store. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAlarmStore {
    alarms: Arc<DashMap<AlarmKey, AlarmEvent>>,
}

impl InMemoryAlarmStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.alarms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.alarms.is_empty()
    }
}

#[async_trait]
impl AlarmStore for InMemoryAlarmStore {
    async fn find(&self, event_uid: &EventUid, recipient: &MailAddress) -> Result<Option<AlarmEvent>> {
        let key = AlarmKey::new(event_uid.clone(), recipient.clone());
        Ok(self.alarms.get(&key).map(|entry| entry.value().clone()))
    }

    async fn find_by_event(&self, event_uid: &EventUid) -> Result<Vec<AlarmEvent>> {
        Ok(self
            .alarms
            .iter()
            .filter(|entry| &entry.key().event_uid == event_uid)
            .map(|entry| entry.value().clone())
            .collect())
    }

    #[instrument(skip(self, alarm), fields(uid = %alarm.event_uid, recipient = %alarm.recipient))]
    async fn upsert(&self, alarm: AlarmEvent) -> Result<()> {
        debug!(alarm_time = %alarm.alarm_time, "storing alarm");
        self.alarms.insert(alarm.key(), alarm);
        Ok(())
    }

    #[instrument(skip(self), fields(uid = %event_uid, recipient = %recipient))]
    async fn delete(&self, event_uid: &EventUid, recipient: &MailAddress) -> Result<()> {
        let removed = self.alarms.remove(&AlarmKey::new(event_uid.clone(), recipient.clone()));
        debug!(existed = removed.is_some(), "deleting alarm");
        Ok(())
    }

    fn find_due_before(&self, instant: DateTime<Utc>) -> BoxStream<'_, Result<AlarmEvent>> {
        // Snapshot the keys so no shard lock is held while the stream is
        // polled.
        let mut due: Vec<(DateTime<Utc>, AlarmKey)> = self
            .alarms
            .iter()
            .filter(|entry| entry.value().is_due(instant))
            .map(|entry| (entry.value().alarm_time, entry.key().clone()))
            .collect();
        due.sort();

        stream::iter(due)
            .filter_map(move |(_, key)| {
                let current = self.alarms.get(&key).map(|entry| entry.value().clone());
                async move { current.filter(|alarm| alarm.is_due(instant)).map(Ok) }
            })
            .boxed()
    }
}
