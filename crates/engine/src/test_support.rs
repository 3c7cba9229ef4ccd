//! Shared fixtures and collaborator doubles for engine tests.

use crate::MemoryEngine;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use murmur_config::EngineConfig;
use murmur_core::decode::BodyDecoder;
use murmur_core::error::{DecodeError, PersistenceError, ProviderError};
use murmur_core::message::{Message, SenderKind, SessionId};
use murmur_core::provider::{GenerationOptions, GenerationProvider};
use murmur_core::record::{MemoryRecord, MemoryRecordStore};
use murmur_core::session::{Participant, SessionBookkeeping, SessionSnapshot, SnapshotProvider};
use murmur_memory::{InMemoryMessageStore, InMemoryRecordStore, PlaintextDecoder};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

const BASE_TS: i64 = 1_700_000_000;

const DEFAULT_RESPONSE: &str =
    r#"{"summary": "The conversation moved along.", "key_events": []}"#;

/// A scripted generation provider: queued responses, optional delay,
/// optional one-shot failure, and a record of every prompt pair.
pub struct MockProvider {
    responses: Mutex<VecDeque<String>>,
    pub calls: Mutex<Vec<(String, String)>>,
    delay: Mutex<Option<Duration>>,
    fail_next: AtomicBool,
}

impl MockProvider {
    pub fn new() -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            calls: Mutex::new(Vec::new()),
            delay: Mutex::new(None),
            fail_next: AtomicBool::new(false),
        }
    }

    pub async fn respond(&self, response: &str) {
        self.responses.lock().await.push_back(response.to_string());
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }

    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.lock().await = Some(delay);
    }
}

#[async_trait]
impl GenerationProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let delay = *self.delay.lock().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .await
            .push((system_prompt.to_string(), user_prompt.to_string()));
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(ProviderError::Network("mock outage".into()));
        }
        let mut responses = self.responses.lock().await;
        Ok(responses
            .pop_front()
            .unwrap_or_else(|| DEFAULT_RESPONSE.to_string()))
    }
}

/// Records `mark_memory_updated` calls; can fail on demand.
pub struct RecordingBookkeeping {
    pub calls: Mutex<Vec<(SessionId, DateTime<Utc>)>>,
    fail_next: AtomicBool,
}

impl RecordingBookkeeping {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            fail_next: AtomicBool::new(false),
        }
    }

    pub fn fail_next(&self) {
        self.fail_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionBookkeeping for RecordingBookkeeping {
    async fn mark_memory_updated(
        &self,
        session_id: &SessionId,
        timestamp: DateTime<Utc>,
    ) -> Result<(), PersistenceError> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(PersistenceError::Storage("bookkeeping offline".into()));
        }
        self.calls
            .lock()
            .await
            .push((session_id.clone(), timestamp));
        Ok(())
    }
}

/// Serves the same snapshot for every session.
pub struct StaticSnapshots(pub SessionSnapshot);

#[async_trait]
impl SnapshotProvider for StaticSnapshots {
    async fn participants(
        &self,
        _session_id: &SessionId,
    ) -> Result<SessionSnapshot, PersistenceError> {
        Ok(self.0.clone())
    }
}

/// A record store that is permanently unreachable.
pub struct FailingRecordStore;

#[async_trait]
impl MemoryRecordStore for FailingRecordStore {
    fn name(&self) -> &str {
        "failing"
    }

    async fn append(
        &self,
        _session_id: &SessionId,
        _record: MemoryRecord,
    ) -> Result<MemoryRecord, PersistenceError> {
        Err(PersistenceError::Storage("record store offline".into()))
    }

    async fn list_all(
        &self,
        _session_id: &SessionId,
    ) -> Result<Vec<MemoryRecord>, PersistenceError> {
        Err(PersistenceError::Storage("record store offline".into()))
    }

    async fn latest(
        &self,
        _session_id: &SessionId,
    ) -> Result<Option<MemoryRecord>, PersistenceError> {
        Err(PersistenceError::Storage("record store offline".into()))
    }
}

/// A decoder that rejects bodies containing a marker string.
pub struct FlakyDecoder {
    marker: String,
}

impl FlakyDecoder {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            marker: marker.to_string(),
        }
    }
}

impl BodyDecoder for FlakyDecoder {
    fn name(&self) -> &str {
        "flaky"
    }

    fn decode(&self, body: &str) -> Result<String, DecodeError> {
        if body.contains(&self.marker) {
            return Err(DecodeError::InvalidEncoding("marked corrupt".into()));
        }
        Ok(body.to_string())
    }
}

/// An engine wired to in-memory collaborators, plus handles to them.
pub struct EngineFixture {
    pub engine: Arc<MemoryEngine>,
    pub session: SessionId,
    pub messages: Arc<InMemoryMessageStore>,
    pub records: Arc<InMemoryRecordStore>,
    pub provider: Arc<MockProvider>,
    pub bookkeeping: Arc<RecordingBookkeeping>,
    seq: AtomicUsize,
}

impl EngineFixture {
    /// Queue the next provider response.
    pub async fn respond(&self, response: &str) {
        self.provider.respond(response).await;
    }

    /// Push a message from any participant; timestamps are strictly
    /// increasing in push order.
    pub async fn push_from(
        &self,
        sender_id: &str,
        kind: SenderKind,
        body: &str,
    ) -> Message {
        let seq = self.next_seq();
        self.push_at(sender_id, kind, body.to_string(), seq).await
    }

    /// Push a human message.
    pub async fn push_message(&self, sender_id: &str, body: &str) -> Message {
        self.push_from(sender_id, SenderKind::HumanUser, body).await
    }

    fn next_seq(&self) -> usize {
        self.seq.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn push_at(
        &self,
        sender_id: &str,
        kind: SenderKind,
        body: String,
        seq: usize,
    ) -> Message {
        let mut message = Message::new(self.session.clone(), sender_id, kind, body);
        message.created_at = DateTime::from_timestamp(BASE_TS + seq as i64, 0).unwrap();
        self.messages.push(message.clone()).await;
        message
    }
}

/// Snapshot used by every fixture: one named human, one character,
/// one assistant.
pub fn default_snapshot() -> SessionSnapshot {
    SessionSnapshot {
        participants: vec![
            Participant {
                id: "u1".into(),
                kind: SenderKind::HumanUser,
                display_name: Some("Mara".into()),
            },
            Participant {
                id: "char_1".into(),
                kind: SenderKind::ActingCharacter,
                display_name: Some("The Warden".into()),
            },
            Participant {
                id: "asst_1".into(),
                kind: SenderKind::ActingAssistant,
                display_name: Some("Quill".into()),
            },
        ],
    }
}

/// A body of exactly `chars` characters (before the sequence suffix
/// the seeder appends).
pub fn sized_body(chars: usize) -> String {
    "a".repeat(chars)
}

/// Push `n` human messages with bodies `"{base} {seq}"`, numbered by
/// the fixture-wide sequence. Returns them in push order.
pub async fn seed_messages(fx: &EngineFixture, n: usize, base: &str) -> Vec<Message> {
    let mut seeded = Vec::with_capacity(n);
    for _ in 0..n {
        let seq = fx.next_seq();
        let body = format!("{base} {seq}");
        seeded.push(
            fx.push_at("u1", SenderKind::HumanUser, body, seq).await,
        );
    }
    seeded
}

async fn fixture(
    max_context_tokens: usize,
    recent_messages_count: usize,
    decoder: Arc<dyn BodyDecoder>,
    failing_records: bool,
) -> EngineFixture {
    let config = EngineConfig {
        max_context_tokens,
        recent_messages_count,
        ..EngineConfig::default()
    };

    let messages = Arc::new(InMemoryMessageStore::new());
    let records = Arc::new(InMemoryRecordStore::new());
    let provider = Arc::new(MockProvider::new());
    let bookkeeping = Arc::new(RecordingBookkeeping::new());

    let record_store: Arc<dyn MemoryRecordStore> = if failing_records {
        Arc::new(FailingRecordStore)
    } else {
        records.clone()
    };

    let engine = Arc::new(MemoryEngine::new(
        config,
        messages.clone(),
        record_store,
        Arc::new(StaticSnapshots(default_snapshot())),
        decoder,
        provider.clone(),
        bookkeeping.clone(),
    ));

    EngineFixture {
        engine,
        session: SessionId::from("session_under_test"),
        messages,
        records,
        provider,
        bookkeeping,
        seq: AtomicUsize::new(0),
    }
}

/// Standard fixture: plaintext bodies, working stores.
pub async fn engine_fixture(
    max_context_tokens: usize,
    recent_messages_count: usize,
) -> EngineFixture {
    fixture(
        max_context_tokens,
        recent_messages_count,
        Arc::new(PlaintextDecoder),
        false,
    )
    .await
}

/// Fixture with a custom body decoder.
pub async fn engine_fixture_with_decoder(
    max_context_tokens: usize,
    recent_messages_count: usize,
    decoder: Arc<dyn BodyDecoder>,
) -> EngineFixture {
    fixture(max_context_tokens, recent_messages_count, decoder, false).await
}

/// Fixture whose record store always errors.
pub async fn engine_fixture_failing_records(
    max_context_tokens: usize,
    recent_messages_count: usize,
) -> EngineFixture {
    fixture(
        max_context_tokens,
        recent_messages_count,
        Arc::new(PlaintextDecoder),
        true,
    )
    .await
}
