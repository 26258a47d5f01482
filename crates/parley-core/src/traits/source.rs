// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Read side of the host message store.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChatId, MessageId, MessageRef};

/// Source of message snapshots and arrival notifications.
#[async_trait]
pub trait MessageSource: PluginAdapter {
    /// Reads the current state of a message, or `None` if it no longer exists.
    async fn get_message(&self, id: &MessageId) -> Result<Option<MessageRef>, ParleyError>;

    /// Returns up to `limit` of the most recent messages in a chat, newest first.
    async fn scan_recent(
        &self,
        chat_id: &ChatId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError>;

    /// Returns up to `limit` of the messages that precede `id` in its chat,
    /// newest first. `id` itself is never included.
    async fn scan_before(
        &self,
        id: &MessageId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError>;

    /// Subscribes to batches of newly arrived incoming message ids.
    fn subscribe(&self) -> broadcast::Receiver<Vec<MessageId>>;
}
