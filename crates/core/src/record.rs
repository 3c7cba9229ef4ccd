//! Memory records — the immutable output of compaction.
//!
//! A `MemoryRecord` replaces a contiguous prefix of raw messages with a
//! generated summary plus the notable moments ("key events") the
//! provider extracted from it. Records are append-only: the store trait
//! exposes no update or delete, so immutability is enforced at the
//! interface level.

use crate::error::PersistenceError;
use crate::message::{Message, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How notable a key event is, as judged by the generation provider.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    High,
    #[default]
    Medium,
    Low,
}

/// A single notable moment extracted during compaction.
///
/// Produced only by the generation provider; the engine never
/// synthesizes these itself. `timestamp` is echoed from the transcript
/// and kept as provider-supplied text; `participants` holds display
/// names, deduplicated by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyEvent {
    /// When the event happened, as rendered in the transcript
    #[serde(default)]
    pub timestamp: String,

    /// One-sentence description of the event
    pub description: String,

    /// Display names of the participants involved
    #[serde(default)]
    pub participants: Vec<String>,

    /// How notable the event is
    #[serde(default)]
    pub importance: Importance,
}

/// One compaction result: a summary of a contiguous, never-overlapping
/// range of a session's message history.
///
/// For a given session, records ordered by `created_at` form a
/// gap-free partition of the compacted prefix: each record's range
/// starts strictly after the previous record's `end_message_at`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// Unique record ID
    pub id: String,

    /// Session this record belongs to
    pub session_id: SessionId,

    /// Short prose summary (2–3 sentences)
    pub summary: String,

    /// Notable moments, at most five, in transcript order
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub key_events: Vec<KeyEvent>,

    /// Number of messages this record compacts
    pub message_count: usize,

    /// First message of the compacted range (inclusive)
    pub start_message_id: String,

    /// Last message of the compacted range (inclusive)
    pub end_message_id: String,

    /// Timestamp of the last compacted message: the authoritative
    /// cutoff for the next compaction and for context assembly
    pub end_message_at: DateTime<Utc>,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl MemoryRecord {
    /// Build a record for a compacted message slice.
    ///
    /// The slice must be non-empty and in ascending `created_at` order;
    /// range bounds and the cutoff timestamp are taken from its ends.
    pub fn from_compacted(
        session_id: SessionId,
        summary: impl Into<String>,
        key_events: Vec<KeyEvent>,
        compacted: &[Message],
    ) -> Self {
        debug_assert!(!compacted.is_empty(), "compacted range must be non-empty");
        let first = &compacted[0];
        let last = &compacted[compacted.len() - 1];
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            summary: summary.into(),
            key_events,
            message_count: compacted.len(),
            start_message_id: first.id.clone(),
            end_message_id: last.id.clone(),
            end_message_at: last.created_at,
            created_at: Utc::now(),
        }
    }
}

/// The append-only memory record store.
///
/// Implementations: SQLite (durable), in-memory (tests, ephemeral
/// sessions). This is the only component allowed to write records.
#[async_trait]
pub trait MemoryRecordStore: Send + Sync {
    /// The backend name (e.g., "sqlite", "in_memory").
    fn name(&self) -> &str;

    /// Persist a new, immutable record.
    async fn append(
        &self,
        session_id: &SessionId,
        record: MemoryRecord,
    ) -> std::result::Result<MemoryRecord, PersistenceError>;

    /// All records for a session, ascending by `created_at`.
    async fn list_all(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Vec<MemoryRecord>, PersistenceError>;

    /// The most recent record for a session by `created_at`, if any.
    async fn latest(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<Option<MemoryRecord>, PersistenceError>;
}
