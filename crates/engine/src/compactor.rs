//! The compactor — replaces a contiguous prefix of raw messages with
//! one generated memory record.
//!
//! The operation is driven entirely by persisted cutoffs, never by
//! in-memory state: any failure between transcript rendering and the
//! record append leaves the session unchanged, and the next trigger
//! evaluation recomputes the same (or a larger) tail and retries from
//! scratch.

use crate::token::estimate_message_tokens;
use crate::{resolver, synthesis, MemoryEngine};
use chrono::SecondsFormat;
use murmur_core::error::{Result, SynthesisError};
use murmur_core::message::{Message, SessionId};
use murmur_core::provider::GenerationOptions;
use murmur_core::record::MemoryRecord;
use murmur_core::session::SessionSnapshot;
use tracing::{debug, info, warn};

/// Substituted for a message body that fails to decode.
pub const DECODE_PLACEHOLDER: &str = "[message unavailable]";

impl MemoryEngine {
    /// Compact the session's uncompacted tail, keeping the recent
    /// window verbatim. Returns true iff a new record was written.
    ///
    /// Holds the session's compaction lock for the full call: two
    /// concurrent compactions over the same tail would otherwise both
    /// read the same cutoff and append overlapping records.
    pub async fn compact(&self, session_id: &SessionId) -> Result<bool> {
        let lock = self.session_lock(session_id).await;
        let _guard = lock.lock().await;

        let latest = self.records.latest(session_id).await?;
        let cutoff = latest.as_ref().map(|record| record.end_message_at);
        let tail = self
            .messages
            .find_messages_after(session_id, cutoff)
            .await?;

        if tail.len() <= self.config().recent_messages_count {
            debug!(
                "Session {session_id}: tail of {} within recent window, nothing to compact",
                tail.len()
            );
            return Ok(false);
        }

        // Everything but the retained recent window. Never empty here.
        let split = tail.len() - self.config().recent_messages_count;
        let to_compact = &tail[..split];

        let snapshot = self.snapshots.participants(session_id).await?;
        let transcript = self.render_transcript(to_compact, &snapshot);
        let transcript_tokens: usize = to_compact.iter().map(estimate_message_tokens).sum();
        debug!(
            "Session {session_id}: distilling {} messages (~{transcript_tokens} tokens)",
            to_compact.len()
        );

        let system_prompt = synthesis::build_system_prompt(self.config().max_compressed_tokens());
        let user_prompt = synthesis::build_user_prompt(
            latest.as_ref().map(|record| record.summary.as_str()),
            &transcript,
        );
        let options = GenerationOptions {
            max_tokens: Some(self.config().max_compressed_tokens() as u32),
            temperature: self.config().summary_temperature,
        };

        let raw = match tokio::time::timeout(
            self.config().generation_timeout(),
            self.provider.generate(&system_prompt, &user_prompt, &options),
        )
        .await
        {
            Ok(Ok(text)) => text,
            Ok(Err(e)) => return Err(SynthesisError::Generation(e.to_string()).into()),
            Err(_) => {
                return Err(SynthesisError::Timeout {
                    timeout_secs: self.config().generation_timeout_secs,
                }
                .into());
            }
        };

        let document = synthesis::parse_synthesis(&raw)?;
        let record = MemoryRecord::from_compacted(
            session_id.clone(),
            document.summary,
            document.key_events,
            to_compact,
        );
        let record = self.records.append(session_id, record).await?;

        // The record is durable at this point; a bookkeeping hiccup
        // must not fail the compaction that already committed.
        if let Err(e) = self
            .bookkeeping
            .mark_memory_updated(session_id, record.created_at)
            .await
        {
            warn!("Session {session_id}: bookkeeping update failed: {e}");
        }

        info!(
            "Session {session_id}: compacted {} messages into record {}",
            record.message_count, record.id
        );
        Ok(true)
    }

    /// Render messages as `[timestamp] name: body` transcript lines.
    ///
    /// A body that fails to decode becomes [`DECODE_PLACEHOLDER`]; one
    /// corrupted message never aborts the whole transcript.
    pub(crate) fn render_transcript(
        &self,
        messages: &[Message],
        snapshot: &SessionSnapshot,
    ) -> String {
        let mut lines = Vec::with_capacity(messages.len());
        for message in messages {
            let name = resolver::resolve(&message.sender_id, message.sender_kind, snapshot);
            let body = match self.decoder.decode(&message.body) {
                Ok(text) => text,
                Err(e) => {
                    debug!("Undecodable body in message {}: {e}", message.id);
                    DECODE_PLACEHOLDER.to_string()
                }
            };
            lines.push(format!(
                "[{}] {}: {}",
                message.created_at.to_rfc3339_opts(SecondsFormat::Secs, true),
                name,
                body
            ));
        }
        lines.join("\n")
    }
}
