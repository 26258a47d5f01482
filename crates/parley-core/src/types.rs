// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the collaborator traits and the pipeline.

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Opaque identifier of a chat (peer, group, channel).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ChatId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ChatId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Identifier of a single message: the owning chat plus a per-chat sequence number.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MessageId {
    pub chat_id: ChatId,
    pub seq: i64,
}

impl MessageId {
    pub fn new(chat_id: impl Into<String>, seq: i64) -> Self {
        Self {
            chat_id: ChatId(chat_id.into()),
            seq,
        }
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.chat_id, self.seq)
    }
}

/// Which way a translation runs.
///
/// `Incoming` translates a peer's message into the local language;
/// `Outgoing` translates the local language into the peer's language.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumString, Serialize,
    Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    /// Direction that applies to a message given its authorship.
    pub fn for_message(is_own_message: bool) -> Self {
        if is_own_message {
            Direction::Outgoing
        } else {
            Direction::Incoming
        }
    }
}

/// Immutable snapshot of a message taken at scan time.
///
/// The authoritative record lives in the message store; `translation` reflects
/// the attachment state when the snapshot was read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageRef {
    pub id: MessageId,
    pub text: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub is_own_message: bool,
    #[serde(default)]
    pub translation: Option<String>,
}

impl MessageRef {
    pub fn chat_id(&self) -> &ChatId {
        &self.id.chat_id
    }

    pub fn direction(&self) -> Direction {
        Direction::for_message(self.is_own_message)
    }

    pub fn has_translation(&self) -> bool {
        self.translation.is_some()
    }

    /// Whether the message carries text worth sending to the backend.
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// Speaker of a context turn relative to the local account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum TurnRole {
    Me,
    Them,
}

/// One turn of recent conversation supplied as translation context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextTurn {
    pub role: TurnRole,
    pub text: String,
}

impl ContextTurn {
    pub fn from_message(message: &MessageRef) -> Self {
        Self {
            role: if message.is_own_message {
                TurnRole::Me
            } else {
                TurnRole::Them
            },
            text: message.text.clone(),
        }
    }
}

/// Per-message outcome of a translation attempt.
///
/// `succeeded == false` means the message must be retried and never written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationResult {
    pub message_id: MessageId,
    pub translated_text: String,
    pub succeeded: bool,
}

impl TranslationResult {
    pub fn success(message_id: MessageId, translated_text: String) -> Self {
        Self {
            message_id,
            translated_text,
            succeeded: true,
        }
    }

    pub fn failure(message_id: MessageId) -> Self {
        Self {
            message_id,
            translated_text: String::new(),
            succeeded: false,
        }
    }
}

/// A translation as reported by the backend for one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendTranslation {
    pub translated_text: String,
    /// Set when the backend gave up and echoed the input.
    #[serde(default)]
    pub failed: bool,
}

/// A single-message translation request carrying conversation context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextRequest {
    pub direction: Direction,
    pub chat_id: ChatId,
    pub text: String,
    /// Ordered oldest to newest.
    pub context: Vec<ContextTurn>,
}

/// A failed id-set waiting for its next attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryJob {
    pub message_ids: BTreeSet<MessageId>,
    pub direction: Direction,
    /// Number of resubmissions already performed (0 after the original try).
    pub attempt: u32,
    pub chat_hint: Option<ChatId>,
}

/// Result of attaching a translation to a stored message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttachOutcome {
    /// The translation was written.
    Attached,
    /// The message already carried a translation; nothing was written.
    AlreadyTranslated,
    /// The message no longer exists.
    Missing,
}

/// How a direction's messages are sent to the backend.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ContextMode {
    /// One batch call, no conversation context.
    #[default]
    Single,
    /// One call per message with a window of recent turns.
    Context,
}

/// Live settings for one translation direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectionSettings {
    pub enabled: bool,
    pub mode: ContextMode,
    pub context_size: usize,
}

impl Default for DirectionSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            mode: ContextMode::Single,
            context_size: 10,
        }
    }
}

/// Snapshot of the translation toggles, read fresh at every decision point.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslationSettings {
    pub enabled: bool,
    pub incoming: DirectionSettings,
    pub outgoing: DirectionSettings,
    #[serde(default)]
    pub excluded_chats: BTreeSet<ChatId>,
}

impl Default for TranslationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            incoming: DirectionSettings::default(),
            outgoing: DirectionSettings::default(),
            excluded_chats: BTreeSet::new(),
        }
    }
}

impl TranslationSettings {
    pub fn direction(&self, direction: Direction) -> &DirectionSettings {
        match direction {
            Direction::Incoming => &self.incoming,
            Direction::Outgoing => &self.outgoing,
        }
    }

    pub fn is_chat_enabled(&self, chat_id: &ChatId) -> bool {
        self.enabled && !self.excluded_chats.contains(chat_id)
    }

    /// Whether messages of `direction` in `chat_id` may be translated right now.
    pub fn allows(&self, direction: Direction, chat_id: &ChatId) -> bool {
        self.is_chat_enabled(chat_id) && self.direction(direction).enabled
    }
}

/// Identity of the local account the observer runs for.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AccountContext {
    pub account_id: String,
}

impl AccountContext {
    pub fn new(account_id: impl Into<String>) -> Self {
        Self {
            account_id: account_id.into(),
        }
    }
}

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays for the pipeline.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    MessageStore,
    TranslationBackend,
}
