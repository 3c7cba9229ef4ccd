//! SQLite record store backend.
//!
//! Uses a single SQLite database file with one table:
//! - `memory_records` — the append-only compaction results, one row per
//!   record, key events serialized as a JSON column
//!
//! The table carries no UPDATE or DELETE path; immutability is enforced
//! by the trait surface and a plain INSERT (a duplicate ID is an error,
//! never an upsert).

use async_trait::async_trait;
use chrono::Utc;
use murmur_core::error::PersistenceError;
use murmur_core::message::SessionId;
use murmur_core::record::{KeyEvent, MemoryRecord, MemoryRecordStore};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Row, SqlitePool};
use std::str::FromStr;
use tracing::{debug, info};

/// A durable SQLite-backed memory record store.
pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Create a new SQLite store from a file path.
    ///
    /// The database and table are created automatically.
    /// Pass `"sqlite::memory:"` for an in-process ephemeral database
    /// (useful for tests).
    pub async fn new(path: &str) -> Result<Self, PersistenceError> {
        let options = SqliteConnectOptions::from_str(path)
            .map_err(|e| PersistenceError::Storage(format!("Invalid SQLite path: {e}")))?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal)
            .pragma("foreign_keys", "ON");

        let pool = SqlitePoolOptions::new()
            .max_connections(4)
            .connect_with(options)
            .await
            .map_err(|e| PersistenceError::Storage(format!("Failed to open SQLite: {e}")))?;

        let store = Self { pool };
        store.run_migrations().await?;
        info!("SQLite record store initialized at {path}");
        Ok(store)
    }

    /// Create from an existing pool (useful for testing).
    pub async fn from_pool(pool: SqlitePool) -> Result<Self, PersistenceError> {
        let store = Self { pool };
        store.run_migrations().await?;
        Ok(store)
    }

    /// Run schema migrations — creates the records table and its index.
    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS memory_records (
                id               TEXT PRIMARY KEY,
                session_id       TEXT NOT NULL,
                summary          TEXT NOT NULL,
                key_events       TEXT NOT NULL DEFAULT '[]',
                message_count    INTEGER NOT NULL,
                start_message_id TEXT NOT NULL,
                end_message_id   TEXT NOT NULL,
                end_message_at   TEXT NOT NULL,
                created_at       TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::MigrationFailed(format!("memory_records table: {e}")))?;

        // Per-session chronological reads are the only query shape
        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_memory_records_session_created
            ON memory_records(session_id, created_at)
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::MigrationFailed(format!("session index: {e}")))?;

        debug!("SQLite migrations complete");
        Ok(())
    }

    /// Parse a `MemoryRecord` from a SQLite row.
    fn row_to_record(row: &sqlx::sqlite::SqliteRow) -> Result<MemoryRecord, PersistenceError> {
        let id: String = row
            .try_get("id")
            .map_err(|e| PersistenceError::QueryFailed(format!("id column: {e}")))?;
        let session_id: String = row
            .try_get("session_id")
            .map_err(|e| PersistenceError::QueryFailed(format!("session_id column: {e}")))?;
        let summary: String = row
            .try_get("summary")
            .map_err(|e| PersistenceError::QueryFailed(format!("summary column: {e}")))?;
        let key_events_json: String = row
            .try_get("key_events")
            .map_err(|e| PersistenceError::QueryFailed(format!("key_events column: {e}")))?;
        let message_count: i64 = row
            .try_get("message_count")
            .map_err(|e| PersistenceError::QueryFailed(format!("message_count column: {e}")))?;
        let start_message_id: String = row
            .try_get("start_message_id")
            .map_err(|e| PersistenceError::QueryFailed(format!("start_message_id column: {e}")))?;
        let end_message_id: String = row
            .try_get("end_message_id")
            .map_err(|e| PersistenceError::QueryFailed(format!("end_message_id column: {e}")))?;
        let end_message_at_str: String = row
            .try_get("end_message_at")
            .map_err(|e| PersistenceError::QueryFailed(format!("end_message_at column: {e}")))?;
        let created_at_str: String = row
            .try_get("created_at")
            .map_err(|e| PersistenceError::QueryFailed(format!("created_at column: {e}")))?;

        let key_events: Vec<KeyEvent> = serde_json::from_str(&key_events_json)
            .map_err(|e| PersistenceError::QueryFailed(format!("key_events JSON: {e}")))?;

        let end_message_at = chrono::DateTime::parse_from_rfc3339(&end_message_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PersistenceError::QueryFailed(format!("end_message_at parse: {e}")))?;

        let created_at = chrono::DateTime::parse_from_rfc3339(&created_at_str)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| PersistenceError::QueryFailed(format!("created_at parse: {e}")))?;

        Ok(MemoryRecord {
            id,
            session_id: SessionId(session_id),
            summary,
            key_events,
            message_count: message_count as usize,
            start_message_id,
            end_message_id,
            end_message_at,
            created_at,
        })
    }
}

#[async_trait]
impl MemoryRecordStore for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite"
    }

    async fn append(
        &self,
        session_id: &SessionId,
        record: MemoryRecord,
    ) -> Result<MemoryRecord, PersistenceError> {
        let key_events_json = serde_json::to_string(&record.key_events)
            .map_err(|e| PersistenceError::Storage(format!("Key events serialization: {e}")))?;

        let result = sqlx::query(
            r#"
            INSERT INTO memory_records
                (id, session_id, summary, key_events, message_count,
                 start_message_id, end_message_id, end_message_at, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&record.id)
        .bind(&session_id.0)
        .bind(&record.summary)
        .bind(&key_events_json)
        .bind(record.message_count as i64)
        .bind(&record.start_message_id)
        .bind(&record.end_message_id)
        .bind(record.end_message_at.to_rfc3339())
        .bind(record.created_at.to_rfc3339())
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {
                debug!("Appended memory record {} for session {session_id}", record.id);
                let mut record = record;
                record.session_id = session_id.clone();
                Ok(record)
            }
            Err(sqlx::Error::Database(db)) if db.is_unique_violation() => {
                Err(PersistenceError::DuplicateId(record.id))
            }
            Err(e) => Err(PersistenceError::Storage(format!("INSERT failed: {e}"))),
        }
    }

    async fn list_all(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<MemoryRecord>, PersistenceError> {
        let rows = sqlx::query(
            r#"
            SELECT * FROM memory_records
            WHERE session_id = ?1
            ORDER BY created_at ASC, id ASC
            "#,
        )
        .bind(&session_id.0)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| PersistenceError::QueryFailed(format!("list_all: {e}")))?;

        rows.iter().map(Self::row_to_record).collect()
    }

    async fn latest(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<MemoryRecord>, PersistenceError> {
        let row = sqlx::query(
            r#"
            SELECT * FROM memory_records
            WHERE session_id = ?1
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(&session_id.0)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| PersistenceError::QueryFailed(format!("latest: {e}")))?;

        match row {
            Some(ref r) => Ok(Some(Self::row_to_record(r)?)),
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;
    use murmur_core::message::{Message, SenderKind};
    use murmur_core::record::Importance;

    async fn test_store() -> SqliteRecordStore {
        SqliteRecordStore::new("sqlite::memory:").await.unwrap()
    }

    fn record_at(session: &SessionId, summary: &str, secs: i64) -> MemoryRecord {
        let mut m = Message::new(session.clone(), "u1", SenderKind::HumanUser, "x");
        m.created_at = DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap();
        let mut record = MemoryRecord::from_compacted(session.clone(), summary, vec![], &[m]);
        record.created_at = DateTime::from_timestamp(1_700_000_000 + secs, 0).unwrap();
        record
    }

    #[tokio::test]
    async fn append_and_list_round_trip() {
        let store = test_store().await;
        let session = SessionId::from("s1");

        let mut record = record_at(&session, "They met at the harbor.", 0);
        record.key_events = vec![KeyEvent {
            timestamp: "2023-11-14T22:13:20Z".into(),
            description: "Mara revealed the map.".into(),
            participants: vec!["Mara".into(), "The Warden".into()],
            importance: Importance::High,
        }];

        store.append(&session, record.clone()).await.unwrap();

        let all = store.list_all(&session).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].summary, "They met at the harbor.");
        assert_eq!(all[0].key_events.len(), 1);
        assert_eq!(all[0].key_events[0].importance, Importance::High);
        assert_eq!(all[0].message_count, 1);
        assert_eq!(all[0].end_message_at, record.end_message_at);
    }

    #[tokio::test]
    async fn list_is_ascending_by_created_at() {
        let store = test_store().await;
        let session = SessionId::from("s1");
        store
            .append(&session, record_at(&session, "later", 100))
            .await
            .unwrap();
        store
            .append(&session, record_at(&session, "earlier", 10))
            .await
            .unwrap();

        let all = store.list_all(&session).await.unwrap();
        assert_eq!(all[0].summary, "earlier");
        assert_eq!(all[1].summary, "later");
    }

    #[tokio::test]
    async fn latest_picks_most_recent() {
        let store = test_store().await;
        let session = SessionId::from("s1");
        store
            .append(&session, record_at(&session, "old", 0))
            .await
            .unwrap();
        store
            .append(&session, record_at(&session, "new", 300))
            .await
            .unwrap();

        let latest = store.latest(&session).await.unwrap().unwrap();
        assert_eq!(latest.summary, "new");
    }

    #[tokio::test]
    async fn latest_none_for_unknown_session() {
        let store = test_store().await;
        assert!(store
            .latest(&SessionId::from("missing"))
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn duplicate_id_is_rejected_not_upserted() {
        let store = test_store().await;
        let session = SessionId::from("s1");
        let record = record_at(&session, "original", 0);
        store.append(&session, record.clone()).await.unwrap();

        let mut edited = record;
        edited.summary = "rewritten".into();
        let err = store.append(&session, edited).await.unwrap_err();
        assert!(matches!(err, PersistenceError::DuplicateId(_)));

        // The stored record is untouched.
        let all = store.list_all(&session).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].summary, "original");
    }

    #[tokio::test]
    async fn sessions_are_isolated() {
        let store = test_store().await;
        let a = SessionId::from("a");
        let b = SessionId::from("b");
        store.append(&a, record_at(&a, "a only", 0)).await.unwrap();

        assert_eq!(store.list_all(&a).await.unwrap().len(), 1);
        assert!(store.list_all(&b).await.unwrap().is_empty());
        assert!(store.latest(&b).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_key_events_round_trip() {
        let store = test_store().await;
        let session = SessionId::from("s1");
        store
            .append(&session, record_at(&session, "quiet stretch", 0))
            .await
            .unwrap();

        let all = store.list_all(&session).await.unwrap();
        assert!(all[0].key_events.is_empty());
    }

    #[tokio::test]
    async fn store_name() {
        let store = test_store().await;
        assert_eq!(store.name(), "sqlite");
    }

    #[tokio::test]
    async fn records_survive_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let url = format!("sqlite://{}", dir.path().join("records.db").display());
        let session = SessionId::from("s1");

        {
            let store = SqliteRecordStore::new(&url).await.unwrap();
            store
                .append(&session, record_at(&session, "durable", 0))
                .await
                .unwrap();
        }

        let reopened = SqliteRecordStore::new(&url).await.unwrap();
        let all = reopened.list_all(&session).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].summary, "durable");
    }
}
