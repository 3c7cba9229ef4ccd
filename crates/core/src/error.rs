//! Error types for the Murmur memory domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error variant. Token estimation is
//! deliberately absent: degraded estimates are an accepted property of
//! the estimator, never an error condition.

use thiserror::Error;

/// The top-level error type for all memory-engine operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Persistence errors ---
    #[error("Persistence error: {0}")]
    Persistence(#[from] PersistenceError),

    // --- Summary synthesis errors ---
    #[error("Synthesis error: {0}")]
    Synthesis(#[from] SynthesisError),

    // --- Generation provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

// --- Bounded context errors ---

/// Storage-layer failures. Propagated to the caller so the external
/// scheduler can log and retry on the next cycle.
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Duplicate record ID: {0}")]
    DuplicateId(String),
}

/// A compaction attempt that could not produce a valid memory record.
/// Always aborts the attempt cleanly, writing no partial record.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("Generation call failed: {0}")]
    Generation(String),

    #[error("Generation call timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    #[error("Unparsable synthesis response: {reason}")]
    UnparsableResponse { reason: String },
}

/// A message body that could not be decoded to plaintext.
///
/// Isolated per message: batch operations substitute a placeholder and
/// continue, they never abort on a single bad body.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    #[error("Invalid encoding: {0}")]
    InvalidEncoding(String),

    #[error("Decoded payload is not valid UTF-8: {0}")]
    NotUtf8(String),
}

/// Transport-level failures from the generation provider. Wrapped into
/// `SynthesisError` at the compactor boundary.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn persistence_error_displays_correctly() {
        let err = Error::Persistence(PersistenceError::Storage("disk full".into()));
        assert!(err.to_string().contains("disk full"));
    }

    #[test]
    fn synthesis_timeout_displays_correctly() {
        let err = Error::Synthesis(SynthesisError::Timeout { timeout_secs: 30 });
        assert!(err.to_string().contains("30"));
    }

    #[test]
    fn decode_error_is_cloneable() {
        let err = DecodeError::InvalidEncoding("bad padding".into());
        let clone = err.clone();
        assert_eq!(err.to_string(), clone.to_string());
    }
}
