//! # Murmur Engine
//!
//! The conversation-memory compaction engine: keeps a long-running,
//! multi-party chat session usable as generation input despite an
//! unbounded message history and a fixed context budget.
//!
//! The engine is a stateless service object — construct one
//! [`MemoryEngine`] with its collaborators injected and share it across
//! sessions. Session data is fully partitioned by [`SessionId`], so the
//! read path (`build_context`) runs with unlimited concurrency. The
//! write path (`compact`) takes a per-session lock: two concurrent
//! compactions over the same uncompacted tail would both read the same
//! cutoff and append overlapping records.
//!
//! ## Control flow
//!
//! An external scheduler polls [`MemoryEngine::should_compact`] and, on
//! true, invokes [`MemoryEngine::compact`] once.
//! [`MemoryEngine::build_context`] is called on every
//! response-generation request regardless of whether compaction ran.

pub mod assembler;
pub mod compactor;
pub mod resolver;
pub mod synthesis;
pub mod token;
pub mod trigger;

#[cfg(test)]
pub(crate) mod test_support;

use murmur_config::EngineConfig;
use murmur_core::decode::BodyDecoder;
use murmur_core::message::SessionId;
use murmur_core::provider::GenerationProvider;
use murmur_core::record::MemoryRecordStore;
use murmur_core::session::{MessageStore, SessionBookkeeping, SnapshotProvider};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub use compactor::DECODE_PLACEHOLDER;
pub use synthesis::SynthesisDocument;
pub use token::estimate_tokens;

/// The conversation-memory engine.
///
/// Holds no session-specific mutable state beyond the compaction lock
/// registry; safe for concurrent use across sessions behind an `Arc`.
pub struct MemoryEngine {
    config: EngineConfig,
    messages: Arc<dyn MessageStore>,
    records: Arc<dyn MemoryRecordStore>,
    snapshots: Arc<dyn SnapshotProvider>,
    decoder: Arc<dyn BodyDecoder>,
    provider: Arc<dyn GenerationProvider>,
    bookkeeping: Arc<dyn SessionBookkeeping>,
    /// One mutex per session; held for the full duration of `compact`.
    /// Entries are a few words each and live for the process lifetime.
    compaction_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl MemoryEngine {
    /// Create a new engine with all collaborators injected.
    pub fn new(
        config: EngineConfig,
        messages: Arc<dyn MessageStore>,
        records: Arc<dyn MemoryRecordStore>,
        snapshots: Arc<dyn SnapshotProvider>,
        decoder: Arc<dyn BodyDecoder>,
        provider: Arc<dyn GenerationProvider>,
        bookkeeping: Arc<dyn SessionBookkeeping>,
    ) -> Self {
        Self {
            config,
            messages,
            records,
            snapshots,
            decoder,
            provider,
            bookkeeping,
            compaction_locks: Mutex::new(HashMap::new()),
        }
    }

    /// The engine's configured thresholds.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Fetch (or create) the compaction lock for a session.
    pub(crate) async fn session_lock(&self, session_id: &SessionId) -> Arc<Mutex<()>> {
        let mut locks = self.compaction_locks.lock().await;
        locks
            .entry(session_id.0.clone())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}
