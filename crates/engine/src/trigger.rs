//! Compaction trigger — decides whether a session needs compaction now.

use crate::token::estimate_tokens;
use crate::MemoryEngine;
use chrono::{DateTime, Utc};
use murmur_core::error::Result;
use murmur_core::message::SessionId;
use tracing::debug;

impl MemoryEngine {
    /// The cutoff separating already-compacted history from the
    /// uncompacted tail: the last compacted message's timestamp, or
    /// `None` (session start) when no record exists.
    pub(crate) async fn compaction_cutoff(
        &self,
        session_id: &SessionId,
    ) -> Result<Option<DateTime<Utc>>> {
        Ok(self
            .records
            .latest(session_id)
            .await?
            .map(|record| record.end_message_at))
    }

    /// Should this session be compacted now?
    ///
    /// True iff the estimated total of uncompacted tail plus existing
    /// summaries meets the context budget AND the tail extends beyond
    /// the always-retained recent window. The second clause prevents
    /// compacting a trivially short conversation that merely contains
    /// long individual messages.
    pub async fn should_compact(&self, session_id: &SessionId) -> Result<bool> {
        let cutoff = self.compaction_cutoff(session_id).await?;

        // Cheap count first; most sessions fail this guard and never
        // need their bodies pulled for token sums.
        let tail_count = self
            .messages
            .count_messages_after(session_id, cutoff)
            .await?;
        if tail_count <= self.config().recent_messages_count {
            return Ok(false);
        }

        let tail = self
            .messages
            .find_messages_after(session_id, cutoff)
            .await?;
        let tail_tokens: usize = tail.iter().map(|m| estimate_tokens(&m.body)).sum();

        let compacted_tokens: usize = self
            .records
            .list_all(session_id)
            .await?
            .iter()
            .map(|r| estimate_tokens(&r.summary))
            .sum();

        let total = tail_tokens + compacted_tokens;
        let due = total >= self.config().max_context_tokens;
        debug!(
            "Session {session_id}: {total} estimated tokens across {tail_count} tail \
             messages (budget {}), compaction due: {due}",
            self.config().max_context_tokens
        );
        Ok(due)
    }
}
