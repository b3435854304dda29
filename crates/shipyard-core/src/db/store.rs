//! Local store: entity mirrors plus the operation log

use std::future::Future;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use libsql::{params_from_iter, Connection, Row, Value};
use tokio::sync::Mutex;

use super::Database;
use crate::error::{Error, Result};
use crate::models::{Entity, EntityKind, NewSyncEntry, SyncAction, SyncEntry};

/// Filter for [`LocalStore::query`]; unset fields match everything
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordFilter {
    pub app_id: Option<String>,
    pub user_id: Option<String>,
    pub status: Option<String>,
    pub synced: Option<bool>,
}

impl RecordFilter {
    #[must_use]
    pub fn for_app(mut self, app_id: impl Into<String>) -> Self {
        self.app_id = Some(app_id.into());
        self
    }

    #[must_use]
    pub fn for_user(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = Some(user_id.into());
        self
    }

    #[must_use]
    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.status = Some(status.into());
        self
    }

    #[must_use]
    pub const fn with_synced(mut self, synced: bool) -> Self {
        self.synced = Some(synced);
        self
    }
}

/// Local side of a queued mutation
#[derive(Debug, Clone, PartialEq)]
pub enum LocalMutation {
    /// Upsert the record
    Put(Entity),
    /// Hide the record until the remote delete is confirmed
    Tombstone { kind: EntityKind, id: String },
}

/// Durable, transactional mirror of the remote collections.
///
/// Every operation is local; none of them touch the network.
pub trait LocalStore: Clone + Send + Sync + 'static {
    /// Fetch a live (non-tombstoned) record
    fn get(&self, kind: EntityKind, id: &str) -> impl Future<Output = Result<Option<Entity>>> + Send;

    /// Upsert a record, clearing any tombstone
    fn put(&self, entity: &Entity) -> impl Future<Output = Result<()>> + Send;

    /// Remove a record outright
    fn delete(&self, kind: EntityKind, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Live records matching `filter`, newest first
    fn query(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
    ) -> impl Future<Output = Result<Vec<Entity>>> + Send;

    /// Append an intent to the operation log, returning its log id
    fn append_log(&self, entry: &NewSyncEntry) -> impl Future<Output = Result<i64>> + Send;

    /// Every queued entry in FIFO order, without removing any
    fn drain_log(&self) -> impl Future<Output = Result<Vec<SyncEntry>>> + Send;

    fn remove_log_entry(&self, log_id: i64) -> impl Future<Output = Result<()>> + Send;

    fn count_log(&self) -> impl Future<Output = Result<usize>> + Send;

    /// Apply `mutation` and append `entry` in one transaction
    fn commit_mutation(
        &self,
        mutation: &LocalMutation,
        entry: &NewSyncEntry,
    ) -> impl Future<Output = Result<i64>> + Send;

    /// Records deleted locally whose remote delete is still pending
    fn list_tombstones(&self, kind: EntityKind) -> impl Future<Output = Result<Vec<Entity>>> + Send;

    fn purge_tombstone(&self, kind: EntityKind, id: &str) -> impl Future<Output = Result<()>> + Send;

    fn mark_synced(&self, kind: EntityKind, id: &str) -> impl Future<Output = Result<()>> + Send;

    /// Whether any log entry still targets this record
    fn has_pending(&self, kind: EntityKind, id: &str) -> impl Future<Output = Result<bool>> + Send;

    /// Replace the synced subset of `kind` within `filter` with `records`,
    /// all marked synced.
    ///
    /// Rows with local changes not yet confirmed (unsynced or tombstoned)
    /// are left alone. Returns the number of records written.
    fn replace_synced(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        records: &[Entity],
    ) -> impl Future<Output = Result<usize>> + Send;
}

/// libSQL implementation of [`LocalStore`]
#[derive(Clone)]
pub struct LibSqlLocalStore {
    db: Arc<Mutex<Database>>,
}

impl LibSqlLocalStore {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(Mutex::new(db)),
        }
    }

    /// Open (or create) the store at `path`, creating parent directories
    pub async fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(Self::new(Database::open(path).await?))
    }

    /// Open an in-memory store (primarily for tests)
    pub async fn open_in_memory() -> Result<Self> {
        Ok(Self::new(Database::open_in_memory().await?))
    }

    /// Underlying database handle, for components sharing the same file
    pub fn shared(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }
}

const ENTITY_COLUMNS: &str =
    "id, user_id, app_id, status, data, synced, is_deleted, created_at, updated_at";

impl LocalStore for LibSqlLocalStore {
    async fn get(&self, kind: EntityKind, id: &str) -> Result<Option<Entity>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                &format!(
                    "SELECT data, synced FROM {} WHERE id = ? AND is_deleted = 0",
                    kind.table_name()
                ),
                [id],
            )
            .await?;

        match rows.next().await? {
            Some(row) => Ok(Some(parse_entity(kind, &row)?)),
            None => Ok(None),
        }
    }

    async fn put(&self, entity: &Entity) -> Result<()> {
        let db = self.db.lock().await;
        upsert_entity(db.connection(), entity, entity.synced()).await
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute(
                &format!("DELETE FROM {} WHERE id = ?", kind.table_name()),
                [id],
            )
            .await?;
        Ok(())
    }

    async fn query(&self, kind: EntityKind, filter: &RecordFilter) -> Result<Vec<Entity>> {
        let (clauses, values) = filter_clauses(filter);
        let sql = format!(
            "SELECT data, synced FROM {} WHERE is_deleted = 0{clauses} ORDER BY created_at DESC, id DESC",
            kind.table_name()
        );

        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(&sql, params_from_iter(values))
            .await?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            entities.push(parse_entity(kind, &row)?);
        }
        Ok(entities)
    }

    async fn append_log(&self, entry: &NewSyncEntry) -> Result<i64> {
        let db = self.db.lock().await;
        insert_log_entry(db.connection(), entry).await
    }

    async fn drain_log(&self) -> Result<Vec<SyncEntry>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT id, table_name, action, data, timestamp FROM sync_queue ORDER BY id ASC",
                (),
            )
            .await?;

        let mut entries = Vec::new();
        while let Some(row) = rows.next().await? {
            entries.push(parse_log_entry(&row)?);
        }
        Ok(entries)
    }

    async fn remove_log_entry(&self, log_id: i64) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute("DELETE FROM sync_queue WHERE id = ?", [log_id])
            .await?;
        Ok(())
    }

    async fn count_log(&self) -> Result<usize> {
        let db = self.db.lock().await;
        count_queued(db.connection()).await
    }

    async fn commit_mutation(&self, mutation: &LocalMutation, entry: &NewSyncEntry) -> Result<i64> {
        let db = self.db.lock().await;
        let conn = db.connection();

        conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            match mutation {
                LocalMutation::Put(entity) => upsert_entity(conn, entity, false).await?,
                LocalMutation::Tombstone { kind, id } => {
                    let changed = conn
                        .execute(
                            &format!(
                                "UPDATE {} SET is_deleted = 1, synced = 0, updated_at = ? WHERE id = ?",
                                kind.table_name()
                            ),
                            params_from_iter([
                                Value::Text(format_timestamp(entry.timestamp)),
                                Value::Text(id.clone()),
                            ]),
                        )
                        .await?;
                    if changed == 0 {
                        return Err(Error::NotFound(id.clone()));
                    }
                }
            }
            insert_log_entry(conn, entry).await
        }
        .await;

        match result {
            Ok(log_id) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(log_id)
            }
            Err(e) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }

    async fn list_tombstones(&self, kind: EntityKind) -> Result<Vec<Entity>> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                &format!(
                    "SELECT data, synced FROM {} WHERE is_deleted = 1 ORDER BY updated_at ASC",
                    kind.table_name()
                ),
                (),
            )
            .await?;

        let mut entities = Vec::new();
        while let Some(row) = rows.next().await? {
            entities.push(parse_entity(kind, &row)?);
        }
        Ok(entities)
    }

    async fn purge_tombstone(&self, kind: EntityKind, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute(
                &format!(
                    "DELETE FROM {} WHERE id = ? AND is_deleted = 1",
                    kind.table_name()
                ),
                [id],
            )
            .await?;
        Ok(())
    }

    async fn mark_synced(&self, kind: EntityKind, id: &str) -> Result<()> {
        let db = self.db.lock().await;
        db.connection()
            .execute(
                &format!(
                    "UPDATE {} SET synced = 1 WHERE id = ? AND is_deleted = 0",
                    kind.table_name()
                ),
                [id],
            )
            .await?;
        Ok(())
    }

    async fn has_pending(&self, kind: EntityKind, id: &str) -> Result<bool> {
        let db = self.db.lock().await;
        let mut rows = db
            .connection()
            .query(
                "SELECT EXISTS(SELECT 1 FROM sync_queue WHERE table_name = ? AND entity_id = ?)",
                [kind.table_name(), id],
            )
            .await?;

        Ok(match rows.next().await? {
            Some(row) => row.get::<i64>(0)? != 0,
            None => false,
        })
    }

    async fn replace_synced(
        &self,
        kind: EntityKind,
        filter: &RecordFilter,
        records: &[Entity],
    ) -> Result<usize> {
        let db = self.db.lock().await;
        let conn = db.connection();
        let table = kind.table_name();
        let scope = RecordFilter {
            synced: None,
            ..filter.clone()
        };
        let (clauses, values) = filter_clauses(&scope);

        conn.execute("BEGIN TRANSACTION", ()).await?;
        let result = async {
            conn.execute(
                &format!("DELETE FROM {table} WHERE synced = 1 AND is_deleted = 0{clauses}"),
                params_from_iter(values),
            )
            .await?;

            let mut written = 0;
            for entity in records.iter().filter(|entity| entity.kind() == kind) {
                let mut rows = conn
                    .query(
                        &format!(
                            "SELECT EXISTS(SELECT 1 FROM {table} WHERE id = ? AND (synced = 0 OR is_deleted = 1))"
                        ),
                        [entity.id()],
                    )
                    .await?;
                let has_local_changes = match rows.next().await? {
                    Some(row) => row.get::<i64>(0)? != 0,
                    None => false,
                };
                if has_local_changes {
                    continue;
                }
                upsert_entity(conn, entity, true).await?;
                written += 1;
            }
            Ok::<usize, Error>(written)
        }
        .await;

        match result {
            Ok(written) => {
                if let Err(e) = conn.execute("COMMIT", ()).await {
                    conn.execute("ROLLBACK", ()).await.ok();
                    return Err(e.into());
                }
                Ok(written)
            }
            Err(e) => {
                conn.execute("ROLLBACK", ()).await.ok();
                Err(e)
            }
        }
    }
}

/// RFC 3339 with fixed millisecond precision so text ordering matches time
/// ordering.
pub(crate) fn format_timestamp(value: DateTime<Utc>) -> String {
    value.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .map_err(|e| Error::Database(format!("invalid timestamp {value:?}: {e}")))
}

/// `AND column = ?` clauses for every set field of `filter`
fn filter_clauses(filter: &RecordFilter) -> (String, Vec<Value>) {
    let mut clauses = String::new();
    let mut values = Vec::new();

    if let Some(app_id) = &filter.app_id {
        clauses.push_str(" AND app_id = ?");
        values.push(Value::Text(app_id.clone()));
    }
    if let Some(user_id) = &filter.user_id {
        clauses.push_str(" AND user_id = ?");
        values.push(Value::Text(user_id.clone()));
    }
    if let Some(status) = &filter.status {
        clauses.push_str(" AND status = ?");
        values.push(Value::Text(status.clone()));
    }
    if let Some(synced) = filter.synced {
        clauses.push_str(" AND synced = ?");
        values.push(Value::Integer(i64::from(synced)));
    }

    (clauses, values)
}

fn optional_text(value: Option<&str>) -> Value {
    value.map_or(Value::Null, |text| Value::Text(text.to_string()))
}

async fn upsert_entity(conn: &Connection, entity: &Entity, synced: bool) -> Result<()> {
    let mut stored = entity.clone();
    stored.set_synced(synced);
    let data = serde_json::to_string(&stored.to_payload()?)?;

    conn.execute(
        &format!(
            "INSERT OR REPLACE INTO {} ({ENTITY_COLUMNS}) VALUES (?, ?, ?, ?, ?, ?, 0, ?, ?)",
            entity.kind().table_name()
        ),
        params_from_iter([
            Value::Text(stored.id().to_string()),
            Value::Text(stored.user_id().to_string()),
            optional_text(stored.app_id()),
            optional_text(stored.status()),
            Value::Text(data),
            Value::Integer(i64::from(synced)),
            Value::Text(format_timestamp(stored.created_at())),
            Value::Text(format_timestamp(stored.updated_at())),
        ]),
    )
    .await?;
    Ok(())
}

async fn insert_log_entry(conn: &Connection, entry: &NewSyncEntry) -> Result<i64> {
    let data = serde_json::to_string(&entry.entity.to_payload()?)?;
    conn.execute(
        "INSERT INTO sync_queue (table_name, action, entity_id, data, timestamp) VALUES (?, ?, ?, ?, ?)",
        params_from_iter([
            Value::Text(entry.kind().table_name().to_string()),
            Value::Text(entry.action.as_str().to_string()),
            Value::Text(entry.entity.id().to_string()),
            Value::Text(data),
            Value::Text(format_timestamp(entry.timestamp)),
        ]),
    )
    .await?;
    Ok(conn.last_insert_rowid())
}

async fn count_queued(conn: &Connection) -> Result<usize> {
    let mut rows = conn.query("SELECT COUNT(*) FROM sync_queue", ()).await?;
    let count = match rows.next().await? {
        Some(row) => row.get::<i64>(0)?,
        None => 0,
    };
    usize::try_from(count).map_err(|e| Error::Database(e.to_string()))
}

fn parse_entity(kind: EntityKind, row: &Row) -> Result<Entity> {
    let data: String = row.get(0)?;
    let synced = row.get::<i64>(1)? != 0;
    let payload: serde_json::Value = serde_json::from_str(&data)?;
    let mut entity = Entity::from_payload(kind, payload)?;
    entity.set_synced(synced);
    Ok(entity)
}

fn parse_log_entry(row: &Row) -> Result<SyncEntry> {
    let id: i64 = row.get(0)?;
    let table: String = row.get(1)?;
    let action: String = row.get(2)?;
    let data: String = row.get(3)?;
    let timestamp: String = row.get(4)?;

    let kind = EntityKind::from_str(&table)?;
    let payload: serde_json::Value = serde_json::from_str(&data)?;

    Ok(SyncEntry {
        id,
        action: SyncAction::from_str(&action)?,
        entity: Entity::from_payload(kind, payload)?,
        timestamp: parse_timestamp(&timestamp)?,
    })
}
