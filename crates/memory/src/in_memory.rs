//! In-memory backends — useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murmur_core::error::PersistenceError;
use murmur_core::message::{Message, SessionId};
use murmur_core::record::{MemoryRecord, MemoryRecordStore};
use std::sync::Arc;
use tokio::sync::RwLock;

/// An in-memory record store backed by a Vec.
/// Useful for testing and sessions where persistence isn't needed.
pub struct InMemoryRecordStore {
    records: Arc<RwLock<Vec<MemoryRecord>>>,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl MemoryRecordStore for InMemoryRecordStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn append(
        &self,
        session_id: &SessionId,
        record: MemoryRecord,
    ) -> Result<MemoryRecord, PersistenceError> {
        let mut records = self.records.write().await;
        if records.iter().any(|r| r.id == record.id) {
            return Err(PersistenceError::DuplicateId(record.id));
        }
        let mut record = record;
        record.session_id = session_id.clone();
        records.push(record.clone());
        Ok(record)
    }

    async fn list_all(
        &self,
        session_id: &SessionId,
    ) -> Result<Vec<MemoryRecord>, PersistenceError> {
        let records = self.records.read().await;
        let mut results: Vec<MemoryRecord> = records
            .iter()
            .filter(|r| &r.session_id == session_id)
            .cloned()
            .collect();
        results.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(results)
    }

    async fn latest(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<MemoryRecord>, PersistenceError> {
        Ok(self.list_all(session_id).await?.pop())
    }
}

/// An in-memory message store implementing the external `MessageStore`
/// boundary. The real store belongs to the chat platform; this double
/// backs tests and embedded sessions.
pub struct InMemoryMessageStore {
    messages: Arc<RwLock<Vec<Message>>>,
}

impl InMemoryMessageStore {
    pub fn new() -> Self {
        Self {
            messages: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Add a message. Messages are kept sorted by `created_at` so reads
    /// stay ordered regardless of insertion order.
    pub async fn push(&self, message: Message) {
        let mut messages = self.messages.write().await;
        messages.push(message);
        messages.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    }
}

impl Default for InMemoryMessageStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl murmur_core::session::MessageStore for InMemoryMessageStore {
    async fn find_messages_after(
        &self,
        session_id: &SessionId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<Vec<Message>, PersistenceError> {
        let messages = self.messages.read().await;
        Ok(messages
            .iter()
            .filter(|m| &m.session_id == session_id)
            .filter(|m| cutoff.is_none_or(|c| m.created_at > c))
            .cloned()
            .collect())
    }

    async fn count_messages_after(
        &self,
        session_id: &SessionId,
        cutoff: Option<DateTime<Utc>>,
    ) -> Result<usize, PersistenceError> {
        Ok(self.find_messages_after(session_id, cutoff).await?.len())
    }
}
