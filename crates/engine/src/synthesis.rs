//! Summary synthesis: prompt construction and structured-response
//! parsing.
//!
//! The generation provider returns free-form text expected to match the
//! summary/key-event schema. All shape validation happens here, at one
//! boundary: the compactor either gets a typed [`SynthesisDocument`]
//! or a [`SynthesisError`], and the assembler never re-checks shapes.

use murmur_core::error::SynthesisError;
use murmur_core::record::KeyEvent;
use serde::Deserialize;

/// Upper bound on key events kept per record.
pub const MAX_KEY_EVENTS: usize = 5;

/// Fixed instruction for the summary generation call.
const SYNTHESIS_INSTRUCTION: &str = "\
You are the memory keeper for a long-running group chat. Older messages \
are being distilled into a compact memory document so the conversation \
can continue within a fixed context budget.

Respond with a single JSON object and nothing else:
{
  \"summary\": \"2-3 sentences covering what happened\",
  \"key_events\": [
    {
      \"timestamp\": \"when it happened, copied from the transcript\",
      \"description\": \"one sentence\",
      \"participants\": [\"display names involved\"],
      \"importance\": \"high | medium | low\"
    }
  ]
}

Include at most 5 key events, favoring moments that change \
relationships, goals, or established facts. If a previous summary is \
provided, treat it as already covered: carry its thread forward without \
restating it.";

/// Build the system prompt, bounding the output size.
pub fn build_system_prompt(max_summary_tokens: usize) -> String {
    format!(
        "{SYNTHESIS_INSTRUCTION}\n\nKeep the whole document under roughly \
         {max_summary_tokens} tokens."
    )
}

/// Build the user prompt from the optional prior summary and the
/// rendered transcript.
pub fn build_user_prompt(prior_summary: Option<&str>, transcript: &str) -> String {
    match prior_summary {
        Some(prior) => format!(
            "Previous summary (already covered, do not repeat):\n{prior}\n\n\
             Messages to distill:\n{transcript}"
        ),
        None => format!("Messages to distill:\n{transcript}"),
    }
}

/// The parsed synthesis response.
#[derive(Debug, Clone, Deserialize)]
pub struct SynthesisDocument {
    /// Short prose summary (2–3 sentences)
    pub summary: String,

    /// Notable moments, in transcript order
    #[serde(default)]
    pub key_events: Vec<KeyEvent>,
}

/// Parse a provider response into a [`SynthesisDocument`], or fail.
///
/// Providers routinely wrap JSON in markdown fences or a line of prose;
/// both are tolerated. Anything that still fails to parse (or parses
/// without a usable summary) aborts the compaction attempt with no
/// partial state.
pub fn parse_synthesis(raw: &str) -> Result<SynthesisDocument, SynthesisError> {
    let stripped = strip_code_fences(raw);

    let document: SynthesisDocument = serde_json::from_str(stripped)
        .or_else(|first_err| {
            // Fall back to the outermost JSON object in the text.
            match extract_json_object(stripped) {
                Some(slice) => serde_json::from_str(slice).map_err(|_| first_err),
                None => Err(first_err),
            }
        })
        .map_err(|e| SynthesisError::UnparsableResponse {
            reason: e.to_string(),
        })?;

    if document.summary.trim().is_empty() {
        return Err(SynthesisError::UnparsableResponse {
            reason: "summary is empty".into(),
        });
    }

    let mut document = document;
    document.key_events.truncate(MAX_KEY_EVENTS);
    Ok(document)
}

/// Remove a surrounding markdown code fence, if present.
fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let without_close = trimmed.trim_end_matches('`').trim_end();
    // Drop the fence line itself (may carry a language tag like ```json)
    match without_close.split_once('\n') {
        Some((_, body)) => body.trim(),
        None => trimmed,
    }
}

/// Slice out the outermost `{ ... }` object, if any.
fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}
