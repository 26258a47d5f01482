// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parley translation pipeline.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use std::time::Duration;

use parley_core::types::{ChatId, ContextMode, DirectionSettings, TranslationSettings};
use serde::{Deserialize, Serialize};

/// Top-level Parley configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ParleyConfig {
    /// Process identity and logging.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Translation toggles, read live by every job.
    #[serde(default)]
    pub translation: TranslationConfig,

    /// Cache, catch-up, and retry tuning.
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Translation proxy endpoint.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Local message store.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Process identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Identity of the local account; messages authored by it are "own" messages.
    #[serde(default = "default_account_id")]
    pub account_id: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            account_id: default_account_id(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_account_id() -> String {
    "me".to_string()
}

/// Translation toggles.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TranslationConfig {
    /// Global switch. When off, no scan or notification proceeds.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Chats that are never translated.
    #[serde(default)]
    pub excluded_chats: Vec<String>,

    /// Peer messages translated into the local language.
    #[serde(default)]
    pub incoming: DirectionConfig,

    /// Own messages translated into the peer's language.
    #[serde(default)]
    pub outgoing: DirectionConfig,
}

impl Default for TranslationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            excluded_chats: Vec::new(),
            incoming: DirectionConfig::default(),
            outgoing: DirectionConfig::default(),
        }
    }
}

impl TranslationConfig {
    /// Converts the file representation into the live settings snapshot.
    pub fn to_settings(&self) -> TranslationSettings {
        TranslationSettings {
            enabled: self.enabled,
            incoming: self.incoming.to_settings(),
            outgoing: self.outgoing.to_settings(),
            excluded_chats: self.excluded_chats.iter().map(|c| ChatId::new(c.as_str())).collect(),
        }
    }
}

/// Per-direction translation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DirectionConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// `single` batches messages without context; `context` sends recent turns.
    #[serde(default)]
    pub mode: ContextMode,

    /// Number of recent turns sent in `context` mode. Zero sends none.
    #[serde(default = "default_context_size")]
    pub context_size: usize,
}

impl Default for DirectionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ContextMode::default(),
            context_size: default_context_size(),
        }
    }
}

impl DirectionConfig {
    pub fn to_settings(&self) -> DirectionSettings {
        DirectionSettings {
            enabled: self.enabled,
            mode: self.mode,
            context_size: self.context_size,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_context_size() -> usize {
    10
}

/// Pipeline tuning.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Maximum number of translations kept for the on-demand read path.
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,

    /// How many recent messages a catch-up scan inspects.
    #[serde(default = "default_catch_up_limit")]
    pub catch_up_limit: usize,

    /// Delay before each retry, in milliseconds. Its length is the retry budget.
    #[serde(default = "default_retry_delays_ms")]
    pub retry_delays_ms: Vec<u64>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
            catch_up_limit: default_catch_up_limit(),
            retry_delays_ms: default_retry_delays_ms(),
        }
    }
}

impl PipelineConfig {
    pub fn retry_delays(&self) -> Vec<Duration> {
        self.retry_delays_ms
            .iter()
            .map(|ms| Duration::from_millis(*ms))
            .collect()
    }
}

fn default_cache_capacity() -> usize {
    500
}

fn default_catch_up_limit() -> usize {
    50
}

fn default_retry_delays_ms() -> Vec<u64> {
    vec![2_000, 5_000, 10_000]
}

/// Translation proxy configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL of the translation proxy (without the `/translate` path).
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Maximum concurrent requests when fanning out a batch.
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            max_concurrency: default_max_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_max_concurrency() -> usize {
    4
}

/// Message store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable WAL (Write-Ahead Logging) mode for SQLite.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("parley").join("parley.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("parley.db"))
        .display()
        .to_string()
}

fn default_wal_mode() -> bool {
    true
}
