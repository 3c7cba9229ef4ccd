//! Generation provider trait — the abstraction over the text-generation
//! backend.
//!
//! The engine owns prompt construction and response parsing; the
//! provider is an opaque capability that turns a system prompt and a
//! user prompt into text. Transport, model selection, and billing all
//! live behind this boundary.

use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Options for a single generation call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Maximum tokens to generate
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,

    /// Temperature (0.0 = deterministic, 1.0 = creative)
    #[serde(default = "default_temperature")]
    pub temperature: f32,
}

fn default_temperature() -> f32 {
    0.3
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: None,
            temperature: default_temperature(),
        }
    }
}

/// The core generation capability.
///
/// The engine calls `generate()` without knowing which backend answers.
/// Implementations are expected to be cheap to clone behind an `Arc`
/// and safe for concurrent use.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// A human-readable name for this provider.
    fn name(&self) -> &str;

    /// Send one prompt pair and get the full response text.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        options: &GenerationOptions,
    ) -> std::result::Result<String, ProviderError>;
}
