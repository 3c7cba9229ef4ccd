//! Body decoder boundary.
//!
//! Message bodies are stored encoded by the surrounding platform; the
//! engine delegates decoding and treats every call as fallible. The
//! contract for callers: catch `DecodeError` per message, substitute a
//! placeholder, and keep going. One corrupted body must never blank
//! out a whole transcript or context.

use crate::error::DecodeError;

/// Decodes a stored message body to plaintext.
pub trait BodyDecoder: Send + Sync {
    /// The decoder name (e.g., "base64", "plaintext").
    fn name(&self) -> &str;

    /// Decode one body. Fails per call, never panics.
    fn decode(&self, body: &str) -> std::result::Result<String, DecodeError>;
}
