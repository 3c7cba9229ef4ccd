//! Message and session identity domain types.
//!
//! These are the value objects the memory engine reads but never writes:
//! the surrounding chat system creates messages continuously, and the
//! engine only ever sees them through the `MessageStore` collaborator.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What kind of participant sent a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SenderKind {
    /// A human account holder
    HumanUser,
    /// A scripted character driven by the platform
    ActingCharacter,
    /// An AI assistant assigned to the session
    ActingAssistant,
    /// Platform-generated notices (joins, renames, etc.)
    System,
}

/// A single chat message as persisted by the external message store.
///
/// `body` may be stored encoded (the platform encrypts at rest); the
/// engine decodes it through the `BodyDecoder` collaborator and treats
/// decoding as fallible per message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Stable, unique message ID
    pub id: String,

    /// Session this message belongs to
    pub session_id: SessionId,

    /// Sender identifier, scoped by `sender_kind`
    pub sender_id: String,

    /// Who (what kind of participant) sent this message
    pub sender_kind: SenderKind,

    /// The message body, possibly encoded
    pub body: String,

    /// Creation timestamp, the session ordering key
    pub created_at: DateTime<Utc>,
}

impl Message {
    /// Create a message with a fresh ID, stamped now.
    pub fn new(
        session_id: SessionId,
        sender_id: impl Into<String>,
        sender_kind: SenderKind,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            session_id,
            sender_id: sender_id.into(),
            sender_kind,
            body: body.into(),
            created_at: Utc::now(),
        }
    }
}
