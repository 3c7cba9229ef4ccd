//! Body decoder implementations.
//!
//! The platform stores message bodies base64-encoded at rest; sessions
//! created before encoding was rolled out hold plaintext. Both decoders
//! satisfy the per-message failure contract: a bad body fails that call
//! only.

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use murmur_core::decode::BodyDecoder;
use murmur_core::error::DecodeError;

/// Pass-through decoder for plaintext bodies.
pub struct PlaintextDecoder;

impl BodyDecoder for PlaintextDecoder {
    fn name(&self) -> &str {
        "plaintext"
    }

    fn decode(&self, body: &str) -> Result<String, DecodeError> {
        Ok(body.to_string())
    }
}

/// Standard base64 decoder for encoded bodies.
pub struct Base64Decoder;

impl BodyDecoder for Base64Decoder {
    fn name(&self) -> &str {
        "base64"
    }

    fn decode(&self, body: &str) -> Result<String, DecodeError> {
        let bytes = STANDARD
            .decode(body.trim())
            .map_err(|e| DecodeError::InvalidEncoding(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| DecodeError::NotUtf8(e.to_string()))
    }
}
