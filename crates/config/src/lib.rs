//! Configuration loading, validation, and management for Murmur.
//!
//! Loads configuration from a TOML file with environment variable
//! overrides, and validates all settings at startup. Thresholds are
//! plain struct fields rather than ambient globals so tests can run
//! the engine against arbitrary budgets deterministically.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The root configuration structure.
///
/// Maps directly to `murmur.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Memory engine thresholds
    #[serde(default)]
    pub engine: EngineConfig,

    /// Record store configuration
    #[serde(default)]
    pub store: StoreConfig,
}

/// Thresholds and limits for the memory engine.
///
/// This is the struct handed to `MemoryEngine::new`; the engine never
/// reads ambient environment state itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Total context budget in estimated tokens
    #[serde(default = "default_max_context_tokens")]
    pub max_context_tokens: usize,

    /// Size of the verbatim recent window, in messages
    #[serde(default = "default_recent_messages_count")]
    pub recent_messages_count: usize,

    /// Timeout for a single generation call, in seconds
    #[serde(default = "default_generation_timeout_secs")]
    pub generation_timeout_secs: u64,

    /// Temperature for summary generation calls
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
}

fn default_max_context_tokens() -> usize {
    8000
}
fn default_recent_messages_count() -> usize {
    10
}
fn default_generation_timeout_secs() -> u64 {
    30
}
fn default_summary_temperature() -> f32 {
    0.3
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_context_tokens: default_max_context_tokens(),
            recent_messages_count: default_recent_messages_count(),
            generation_timeout_secs: default_generation_timeout_secs(),
            summary_temperature: default_summary_temperature(),
        }
    }
}

impl EngineConfig {
    /// Budget for a compacted summary: 30% of the context budget.
    /// The remaining 70% is reserved for the verbatim recent window.
    pub fn max_compressed_tokens(&self) -> usize {
        self.max_context_tokens * 3 / 10
    }

    /// Generation timeout as a `Duration`.
    pub fn generation_timeout(&self) -> Duration {
        Duration::from_secs(self.generation_timeout_secs)
    }
}

/// Record store backend selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Backend: "sqlite" or "memory"
    #[serde(default = "default_store_backend")]
    pub backend: String,

    /// SQLite database path (ignored by the memory backend)
    #[serde(default = "default_store_path")]
    pub path: String,
}

fn default_store_backend() -> String {
    "sqlite".into()
}
fn default_store_path() -> String {
    "murmur-memory.db".into()
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: default_store_backend(),
            path: default_store_path(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path (`./murmur.toml`).
    ///
    /// Environment variable overrides (highest priority):
    /// - `MURMUR_MAX_CONTEXT_TOKENS`
    /// - `MURMUR_RECENT_MESSAGES`
    /// - `MURMUR_STORE_PATH`
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::load_from(Path::new("murmur.toml"))?;

        if let Ok(raw) = std::env::var("MURMUR_MAX_CONTEXT_TOKENS") {
            config.engine.max_context_tokens = raw
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!(
                    "MURMUR_MAX_CONTEXT_TOKENS is not a number: {raw}"
                )))?;
        }
        if let Ok(raw) = std::env::var("MURMUR_RECENT_MESSAGES") {
            config.engine.recent_messages_count = raw
                .parse()
                .map_err(|_| ConfigError::ValidationError(format!(
                    "MURMUR_RECENT_MESSAGES is not a number: {raw}"
                )))?;
        }
        if let Ok(path) = std::env::var("MURMUR_STORE_PATH") {
            config.store.path = path;
        }

        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific file path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            tracing::info!("No config file found at {}, using defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.max_context_tokens == 0 {
            return Err(ConfigError::ValidationError(
                "max_context_tokens must be greater than zero".into(),
            ));
        }

        if self.engine.recent_messages_count == 0 {
            return Err(ConfigError::ValidationError(
                "recent_messages_count must be at least 1".into(),
            ));
        }

        if self.engine.generation_timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "generation_timeout_secs must be greater than zero".into(),
            ));
        }

        if !(0.0..=2.0).contains(&self.engine.summary_temperature) {
            return Err(ConfigError::ValidationError(
                "summary_temperature must be between 0.0 and 2.0".into(),
            ));
        }

        match self.store.backend.as_str() {
            "sqlite" | "memory" => Ok(()),
            other => Err(ConfigError::ValidationError(format!(
                "unknown store backend: {other}"
            ))),
        }
    }

    /// Generate a default config TOML string.
    pub fn default_toml() -> String {
        toml::to_string_pretty(&Self::default()).unwrap_or_default()
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file at {path}: {reason}")]
    ReadError { path: PathBuf, reason: String },

    #[error("Failed to parse config file at {path}: {reason}")]
    ParseError { path: PathBuf, reason: String },

    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}
