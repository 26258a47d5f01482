// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wire types for the translation proxy.

use parley_core::types::{ContextTurn, Direction};
use serde::{Deserialize, Serialize};

/// Body of `POST /translate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateRequest {
    pub text: String,
    pub direction: Direction,
    #[serde(default)]
    pub chat_id: String,
    /// Recent turns, oldest first. Empty for batch items.
    #[serde(default)]
    pub context: Vec<ContextTurn>,
}

/// Response of `POST /translate`.
///
/// When the proxy gives up it echoes the input and sets `translation_failed`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranslateResponse {
    pub translated_text: String,
    pub original_text: String,
    pub direction: Direction,
    #[serde(default)]
    pub translation_failed: bool,
}

/// Response of `GET /health`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub uptime_seconds: f64,
    /// Unix time (seconds) of the last successful translation.
    #[serde(default)]
    pub last_successful_translation: Option<f64>,
}

/// Response of `GET /stats`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackendStats {
    pub total_requests: u64,
    pub successful: u64,
    pub failed: u64,
    pub retries: u64,
    pub fallbacks: u64,
    pub success_rate: f64,
    pub avg_response_time_ms: f64,
}
