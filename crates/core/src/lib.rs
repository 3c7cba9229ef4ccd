//! # Murmur Core
//!
//! Domain types, traits, and error definitions for the Murmur
//! conversation-memory engine. This crate has **zero framework
//! dependencies** — it defines the domain model that all other crates
//! implement against.
//!
//! ## Design Philosophy
//!
//! Every collaborator the engine consumes is defined as a trait here.
//! Implementations live in their respective crates (or in the
//! surrounding chat system, for the external ones). This enables:
//! - Swapping implementations via configuration
//! - Easy testing with mock/stub implementations
//! - Clean dependency graph (all crates depend inward on core)

pub mod decode;
pub mod error;
pub mod message;
pub mod provider;
pub mod record;
pub mod session;

// Re-export key types at crate root for ergonomics
pub use decode::BodyDecoder;
pub use error::{DecodeError, Error, PersistenceError, ProviderError, Result, SynthesisError};
pub use message::{Message, SenderKind, SessionId};
pub use provider::{GenerationOptions, GenerationProvider};
pub use record::{Importance, KeyEvent, MemoryRecord, MemoryRecordStore};
pub use session::{
    MessageStore, Participant, SessionBookkeeping, SessionSnapshot, SnapshotProvider,
};
