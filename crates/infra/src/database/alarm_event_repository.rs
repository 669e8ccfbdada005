//! SQLite-backed implementation of the `AlarmStore` port.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use calarm_common::{Clock, SystemClock};
use calarm_core::AlarmStore;
use calarm_domain::constants::DUE_QUERY_PAGE_SIZE;
use calarm_domain::{
    AlarmAction, AlarmEvent, CalarmError, EventUid, MailAddress, Result,
};
use chrono::{DateTime, Utc};
use futures::stream::{self, BoxStream, StreamExt};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::{debug, instrument};

use super::manager::DbManager;
use crate::errors::InfraError;

const SELECT_COLUMNS: &str = "event_uid, recipient, alarm_time, event_start_time, recurring,
    recurrence_id, ics, event_path, action";

/// SQLite implementation of [`AlarmStore`].
///
/// Blocking pool work runs on tokio's blocking threads. `updated_at` is
/// stamped from the injected clock.
#[derive(Clone)]
pub struct SqliteAlarmStore {
    db: Arc<DbManager>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for SqliteAlarmStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SqliteAlarmStore").field("db", &self.db).finish_non_exhaustive()
    }
}

impl SqliteAlarmStore {
    /// Create a new store over an already migrated database.
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db, clock: Arc::new(SystemClock) }
    }

    /// Replace the clock used for row timestamps.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    async fn with_connection<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            op(&conn)
        })
        .await
        .map_err(InfraError::from)?
    }

    async fn due_page(&self, cutoff: i64, cursor: DueCursor) -> Result<Vec<StoredAlarm>> {
        self.with_connection(move |conn| {
            let sql = format!(
                "SELECT {SELECT_COLUMNS}
                 FROM alarm_events
                 WHERE alarm_time <= ?1
                   AND (alarm_time, event_uid, recipient) > (?2, ?3, ?4)
                 ORDER BY alarm_time, event_uid, recipient
                 LIMIT ?5"
            );
            let mut stmt = conn.prepare_cached(&sql).map_err(InfraError::from)?;
            let rows = stmt
                .query_map(
                    params![
                        cutoff,
                        cursor.alarm_time,
                        cursor.event_uid,
                        cursor.recipient,
                        page_limit()
                    ],
                    StoredAlarm::from_row,
                )
                .map_err(InfraError::from)?;

            let mut page = Vec::new();
            for row in rows {
                page.push(row.map_err(InfraError::from)?);
            }
            Ok(page)
        })
        .await
    }
}

#[async_trait]
impl AlarmStore for SqliteAlarmStore {
    #[instrument(skip(self), fields(uid = %event_uid, recipient = %recipient))]
    async fn find(&self, event_uid: &EventUid, recipient: &MailAddress) -> Result<Option<AlarmEvent>> {
        let uid = event_uid.as_str().to_owned();
        let recipient = recipient.as_str().to_owned();

        let row = self
            .with_connection(move |conn| {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM alarm_events WHERE event_uid = ?1 AND recipient = ?2"
                );
                conn.query_row(&sql, params![uid, recipient], StoredAlarm::from_row)
                    .optional()
                    .map_err(|e| InfraError::from(e).into())
            })
            .await?;

        row.map(StoredAlarm::into_alarm).transpose()
    }

    #[instrument(skip(self), fields(uid = %event_uid))]
    async fn find_by_event(&self, event_uid: &EventUid) -> Result<Vec<AlarmEvent>> {
        let uid = event_uid.as_str().to_owned();

        let rows = self
            .with_connection(move |conn| {
                let sql = format!(
                    "SELECT {SELECT_COLUMNS} FROM alarm_events WHERE event_uid = ?1 ORDER BY recipient"
                );
                let mut stmt = conn.prepare(&sql).map_err(InfraError::from)?;
                let rows = stmt
                    .query_map(params![uid], StoredAlarm::from_row)
                    .map_err(InfraError::from)?;
                let mut out = Vec::new();
                for row in rows {
                    out.push(row.map_err(InfraError::from)?);
                }
                Ok(out)
            })
            .await?;

        rows.into_iter().map(StoredAlarm::into_alarm).collect()
    }

    #[instrument(skip(self, alarm), fields(uid = %alarm.event_uid, recipient = %alarm.recipient))]
    async fn upsert(&self, alarm: AlarmEvent) -> Result<()> {
        debug!(alarm_time = %alarm.alarm_time, "storing alarm");
        let row = StoredAlarm::from_alarm(&alarm);
        let now = self.clock.now().timestamp();

        self.with_connection(move |conn| {
            conn.execute(
                "INSERT INTO alarm_events (
                    event_uid, recipient, alarm_time, event_start_time, recurring,
                    recurrence_id, ics, event_path, action, updated_at
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                ON CONFLICT(event_uid, recipient) DO UPDATE SET
                    alarm_time = excluded.alarm_time,
                    event_start_time = excluded.event_start_time,
                    recurring = excluded.recurring,
                    recurrence_id = excluded.recurrence_id,
                    ics = excluded.ics,
                    event_path = excluded.event_path,
                    action = excluded.action,
                    updated_at = excluded.updated_at",
                params![
                    row.event_uid,
                    row.recipient,
                    row.alarm_time,
                    row.event_start_time,
                    row.recurring,
                    row.recurrence_id,
                    row.ics,
                    row.event_path,
                    row.action,
                    now
                ],
            )
            .map_err(InfraError::from)?;
            Ok(())
        })
        .await
    }

    #[instrument(skip(self), fields(uid = %event_uid, recipient = %recipient))]
    async fn delete(&self, event_uid: &EventUid, recipient: &MailAddress) -> Result<()> {
        let uid = event_uid.as_str().to_owned();
        let recipient = recipient.as_str().to_owned();

        let removed = self
            .with_connection(move |conn| {
                conn.execute(
                    "DELETE FROM alarm_events WHERE event_uid = ?1 AND recipient = ?2",
                    params![uid, recipient],
                )
                .map_err(|e| InfraError::from(e).into())
            })
            .await?;

        debug!(removed, "deleting alarm");
        Ok(())
    }

    fn find_due_before(&self, instant: DateTime<Utc>) -> BoxStream<'_, Result<AlarmEvent>> {
        let cutoff = instant.timestamp();

        stream::unfold(Some(DueCursor::origin()), move |cursor| async move {
            let cursor = cursor?;
            match self.due_page(cutoff, cursor).await {
                Ok(page) => {
                    let next = if page.len() < DUE_QUERY_PAGE_SIZE {
                        None
                    } else {
                        page.last().map(DueCursor::after)
                    };
                    debug!(rows = page.len(), more = next.is_some(), "loaded due alarm page");
                    let alarms: Vec<Result<AlarmEvent>> =
                        page.into_iter().map(StoredAlarm::into_alarm).collect();
                    Some((stream::iter(alarms), next))
                }
                Err(err) => Some((stream::iter(vec![Err(err)]), None)),
            }
        })
        .flatten()
        .boxed()
    }
}

fn page_limit() -> i64 {
    i64::try_from(DUE_QUERY_PAGE_SIZE).unwrap_or(i64::MAX)
}

/// Keyset position in the `(alarm_time, event_uid, recipient)` ordering.
struct DueCursor {
    alarm_time: i64,
    event_uid: String,
    recipient: String,
}

impl DueCursor {
    fn origin() -> Self {
        Self { alarm_time: i64::MIN, event_uid: String::new(), recipient: String::new() }
    }

    fn after(row: &StoredAlarm) -> Self {
        Self {
            alarm_time: row.alarm_time,
            event_uid: row.event_uid.clone(),
            recipient: row.recipient.clone(),
        }
    }
}

/// Column-level representation of an `alarm_events` row.
#[derive(Debug)]
struct StoredAlarm {
    event_uid: String,
    recipient: String,
    alarm_time: i64,
    event_start_time: i64,
    recurring: bool,
    recurrence_id: Option<String>,
    ics: String,
    event_path: String,
    action: String,
}

impl StoredAlarm {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            event_uid: row.get(0)?,
            recipient: row.get(1)?,
            alarm_time: row.get(2)?,
            event_start_time: row.get(3)?,
            recurring: row.get(4)?,
            recurrence_id: row.get(5)?,
            ics: row.get(6)?,
            event_path: row.get(7)?,
            action: row.get(8)?,
        })
    }

    fn from_alarm(alarm: &AlarmEvent) -> Self {
        Self {
            event_uid: alarm.event_uid.as_str().to_owned(),
            recipient: alarm.recipient.as_str().to_owned(),
            alarm_time: alarm.alarm_time.timestamp(),
            event_start_time: alarm.event_start_time.timestamp(),
            recurring: alarm.recurring,
            recurrence_id: alarm.recurrence_id_string(),
            ics: alarm.ics.clone(),
            event_path: alarm.event_path.clone(),
            action: alarm.action.as_str().to_owned(),
        }
    }

    fn into_alarm(self) -> Result<AlarmEvent> {
        let recurrence_id = self
            .recurrence_id
            .as_deref()
            .map(|raw| {
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| dt.with_timezone(&Utc))
                    .map_err(|e| CalarmError::Database(format!("invalid recurrence_id {raw}: {e}")))
            })
            .transpose()?;
        let action = self
            .action
            .parse::<AlarmAction>()
            .map_err(CalarmError::Database)?;

        Ok(AlarmEvent {
            event_uid: EventUid::new(self.event_uid),
            recipient: MailAddress::parse(&self.recipient)?,
            alarm_time: timestamp(self.alarm_time)?,
            event_start_time: timestamp(self.event_start_time)?,
            recurring: self.recurring,
            recurrence_id,
            ics: self.ics,
            event_path: self.event_path,
            action,
        })
    }
}

fn timestamp(secs: i64) -> Result<DateTime<Utc>> {
    DateTime::from_timestamp(secs, 0)
        .ok_or_else(|| CalarmError::Database(format!("timestamp out of range: {secs}")))
}
