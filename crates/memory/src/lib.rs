//! Memory record store implementations for Murmur.

pub mod decoders;
pub mod in_memory;

#[cfg(feature = "sqlite")]
pub mod sqlite;

pub use decoders::{Base64Decoder, PlaintextDecoder};
pub use in_memory::{InMemoryMessageStore, InMemoryRecordStore};

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteRecordStore;

#[cfg(feature = "sqlite")]
use murmur_config::StoreConfig;
#[cfg(feature = "sqlite")]
use murmur_core::error::PersistenceError;
#[cfg(feature = "sqlite")]
use murmur_core::record::MemoryRecordStore;
#[cfg(feature = "sqlite")]
use std::sync::Arc;

/// Build a record store from configuration.
#[cfg(feature = "sqlite")]
pub async fn record_store_from_config(
    config: &StoreConfig,
) -> Result<Arc<dyn MemoryRecordStore>, PersistenceError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(InMemoryRecordStore::new())),
        "sqlite" => Ok(Arc::new(SqliteRecordStore::new(&config.path).await?)),
        other => Err(PersistenceError::Storage(format!(
            "unknown store backend: {other}"
        ))),
    }
}
