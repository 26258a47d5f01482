// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Row types for the message store.

use parley_core::{MessageId, MessageRef};

/// A row of the `messages` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMessage {
    pub chat_id: String,
    pub seq: i64,
    pub sender_id: String,
    pub text: String,
    /// Seconds since the Unix epoch.
    pub timestamp: i64,
    pub translation: Option<String>,
}

impl StoredMessage {
    pub fn new(
        chat_id: impl Into<String>,
        seq: i64,
        sender_id: impl Into<String>,
        text: impl Into<String>,
        timestamp: i64,
    ) -> Self {
        Self {
            chat_id: chat_id.into(),
            seq,
            sender_id: sender_id.into(),
            text: text.into(),
            timestamp,
            translation: None,
        }
    }

    pub fn id(&self) -> MessageId {
        MessageId::new(self.chat_id.as_str(), self.seq)
    }

    /// Projects the row into the pipeline's view, as seen by `account_id`.
    pub fn to_message_ref(&self, account_id: &str) -> MessageRef {
        MessageRef {
            id: self.id(),
            text: self.text.clone(),
            timestamp: self.timestamp,
            is_own_message: self.sender_id == account_id,
            translation: self.translation.clone(),
        }
    }
}
