//! Session collaborator interfaces.
//!
//! The message store, participant snapshots, and session bookkeeping
//! all live outside this engine. Here they are specified only at the
//! boundary the engine consumes. Implementations belong to the
//! surrounding chat system (the `murmur-memory` crate ships in-memory
//! doubles for tests and embedded use).

use crate::error::PersistenceError;
use crate::message::{Message, SenderKind, SessionId};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One participant of a session, as seen in a read-only snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Sender identifier this participant answers to
    pub id: String,

    /// What kind of participant this is
    pub kind: SenderKind,

    /// Display name, if the participant has one set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

/// A read-only snapshot of a session's participants, ordered by join
/// time. Taken once per engine operation; never mutated.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionSnapshot {
    pub participants: Vec<Participant>,
}

impl SessionSnapshot {
    /// Find a participant by sender identity.
    pub fn find(&self, sender_id: &str, kind: SenderKind) -> Option<&Participant> {
        self.participants
            .iter()
            .find(|p| p.kind == kind && p.id == sender_id)
    }
}

/// Read access to the external message store.
///
/// Messages are ordered by `created_at` ascending within a session.
/// A `None` cutoff means "from session start".
#[async_trait]
pub trait MessageStore: Send + Sync {
    /// Messages with `created_at` strictly after the cutoff, ascending.
    async fn find_messages_after(
        &self,
        session_id: &SessionId,
        cutoff: Option<DateTime<Utc>>,
    ) -> std::result::Result<Vec<Message>, PersistenceError>;

    /// Count of messages strictly after the cutoff.
    async fn count_messages_after(
        &self,
        session_id: &SessionId,
        cutoff: Option<DateTime<Utc>>,
    ) -> std::result::Result<usize, PersistenceError>;
}

/// Provides the participant snapshot for a session.
#[async_trait]
pub trait SnapshotProvider: Send + Sync {
    async fn participants(
        &self,
        session_id: &SessionId,
    ) -> std::result::Result<SessionSnapshot, PersistenceError>;
}

/// Session bookkeeping owned by the external session store.
///
/// Called once per successful compaction; the engine never reads the
/// value back.
#[async_trait]
pub trait SessionBookkeeping: Send + Sync {
    async fn mark_memory_updated(
        &self,
        session_id: &SessionId,
        timestamp: DateTime<Utc>,
    ) -> std::result::Result<(), PersistenceError>;
}
