//! Context assembly — builds the generation input from the ordered
//! chain of memory records plus the verbatim recent window.
//!
//! This is the read path: lock-free, safe under unlimited concurrency,
//! and it never errors out. Failing to produce any context would break
//! live response generation, which is strictly worse than a degraded
//! context, so every unexpected error collapses to a best-effort
//! "recent messages only" rendering.

use crate::MemoryEngine;
use chrono::SecondsFormat;
use murmur_core::error::Result;
use murmur_core::message::{Message, SessionId};
use murmur_core::record::{Importance, MemoryRecord};
use murmur_core::session::SessionSnapshot;
use tracing::warn;

const RECENT_HEADER: &str = "[Recent messages]";

impl MemoryEngine {
    /// Build the generation context with the configured recent window.
    pub async fn build_context(&self, session_id: &SessionId) -> String {
        self.build_context_with_limit(session_id, self.config().recent_messages_count)
            .await
    }

    /// Build the generation context, keeping up to `recent_limit`
    /// verbatim messages. Never fails; an empty session yields empty
    /// text.
    pub async fn build_context_with_limit(
        &self,
        session_id: &SessionId,
        recent_limit: usize,
    ) -> String {
        match self.assemble(session_id, recent_limit).await {
            Ok(context) => context,
            Err(e) => {
                warn!(
                    "Session {session_id}: context assembly failed, degrading to recent \
                     messages only: {e}"
                );
                self.degraded_context(session_id, recent_limit).await
            }
        }
    }

    /// The happy path: summaries block + recent block.
    async fn assemble(&self, session_id: &SessionId, recent_limit: usize) -> Result<String> {
        let records = self.records.list_all(session_id).await?;
        let snapshot = self.snapshots.participants(session_id).await?;

        let cutoff = records.last().map(|record| record.end_message_at);
        let tail = self
            .messages
            .find_messages_after(session_id, cutoff)
            .await?;
        let recent = last_n(&tail, recent_limit);

        let mut sections = Vec::with_capacity(2);
        if !records.is_empty() {
            sections.push(render_memory_blocks(&records));
        }
        if !recent.is_empty() {
            sections.push(self.render_recent_block(recent, &snapshot));
        }
        Ok(sections.join("\n\n"))
    }

    /// Best-effort degraded path: recent messages only, tolerating a
    /// missing snapshot. Returns empty text if even the message store
    /// is unreachable.
    async fn degraded_context(&self, session_id: &SessionId, recent_limit: usize) -> String {
        let all = match self.messages.find_messages_after(session_id, None).await {
            Ok(messages) => messages,
            Err(e) => {
                warn!("Session {session_id}: degraded context fetch failed: {e}");
                return String::new();
            }
        };

        let snapshot = self
            .snapshots
            .participants(session_id)
            .await
            .unwrap_or_default();

        let recent = last_n(&all, recent_limit);
        if recent.is_empty() {
            return String::new();
        }
        self.render_recent_block(recent, &snapshot)
    }

    fn render_recent_block(&self, messages: &[Message], snapshot: &SessionSnapshot) -> String {
        format!(
            "{RECENT_HEADER}\n{}",
            self.render_transcript(messages, snapshot)
        )
    }
}

/// The last `n` elements of a slice, in original (chronological) order.
fn last_n(messages: &[Message], n: usize) -> &[Message] {
    &messages[messages.len().saturating_sub(n)..]
}

/// Render the record chain as labeled blocks between start/end markers.
fn render_memory_blocks(records: &[MemoryRecord]) -> String {
    let mut blocks = Vec::with_capacity(records.len());
    for (index, record) in records.iter().enumerate() {
        let n = index + 1;
        let mut block = String::new();
        block.push_str(&format!("--- MEMORY {n} START ---\n"));
        block.push_str(&format!(
            "Covers {} messages up to {}\n",
            record.message_count,
            record.end_message_at.to_rfc3339_opts(SecondsFormat::Secs, true)
        ));
        block.push_str(&format!("Summary: {}\n", record.summary));
        if !record.key_events.is_empty() {
            block.push_str("Key events:\n");
            for event in &record.key_events {
                block.push_str(&format!(
                    "- ({}) {}",
                    importance_label(event.importance),
                    event.description
                ));
                if !event.timestamp.is_empty() {
                    block.push_str(&format!(" [{}]", event.timestamp));
                }
                if !event.participants.is_empty() {
                    block.push_str(&format!(" — {}", event.participants.join(", ")));
                }
                block.push('\n');
            }
        }
        block.push_str(&format!("--- MEMORY {n} END ---"));
        blocks.push(block);
    }
    blocks.join("\n\n")
}

fn importance_label(importance: Importance) -> &'static str {
    match importance {
        Importance::High => "high",
        Importance::Medium => "medium",
        Importance::Low => "low",
    }
}
