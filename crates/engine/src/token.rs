//! Token estimation utilities.
//!
//! Uses a character-based heuristic: ~4 characters per token. This
//! approximation is accurate within ~10% for BPE tokenizers on English
//! text, which is plenty for relative threshold decisions. Callers
//! must never treat the output as exact, and it is never used for
//! billing.

use murmur_core::message::Message;

/// Estimate the token count for a string.
///
/// Heuristic: 1 token ≈ 4 characters. Rounds up. Never fails; empty
/// text yields zero.
pub fn estimate_tokens(text: &str) -> usize {
    if text.is_empty() {
        return 0;
    }
    text.len().div_ceil(4)
}

/// Estimate tokens for a message as it appears in a rendered
/// transcript, including per-line overhead for the timestamp and
/// speaker framing.
pub fn estimate_message_tokens(message: &Message) -> usize {
    let overhead = 8;
    overhead + estimate_tokens(&message.body)
}
