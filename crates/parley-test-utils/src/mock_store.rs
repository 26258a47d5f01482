// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory message store for deterministic testing.
//!
//! `MemoryStore` implements both `MessageSource` and `TranslationSink`.
//! Tests insert messages, publish arrival notifications, and inspect every
//! `attach_translation` call afterwards.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::{broadcast, Mutex};

use parley_core::traits::adapter::PluginAdapter;
use parley_core::traits::{MessageSource, TranslationSink};
use parley_core::types::{
    AdapterType, AttachOutcome, ChatId, HealthStatus, MessageId, MessageRef,
};
use parley_core::ParleyError;

/// Base timestamp for fixture messages; sequence numbers are added to it.
const FIXTURE_EPOCH: i64 = 1_700_000_000;

/// A peer's message with no translation yet.
pub fn incoming_message(chat: &str, seq: i64, text: &str) -> MessageRef {
    MessageRef {
        id: MessageId::new(chat, seq),
        text: text.to_string(),
        timestamp: FIXTURE_EPOCH + seq,
        is_own_message: false,
        translation: None,
    }
}

/// A message authored by the local account with no translation yet.
pub fn own_message(chat: &str, seq: i64, text: &str) -> MessageRef {
    MessageRef {
        is_own_message: true,
        ..incoming_message(chat, seq, text)
    }
}

/// An in-memory message store.
///
/// Messages are kept ordered by chat then sequence number. Every call to
/// `attach_translation` is recorded, including ones that wrote nothing.
pub struct MemoryStore {
    messages: Mutex<BTreeMap<MessageId, MessageRef>>,
    attach_calls: Mutex<Vec<(MessageId, String)>>,
    arrivals: broadcast::Sender<Vec<MessageId>>,
    fail_reads: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        let (arrivals, _) = broadcast::channel(64);
        Self {
            messages: Mutex::new(BTreeMap::new()),
            attach_calls: Mutex::new(Vec::new()),
            arrivals,
            fail_reads: AtomicBool::new(false),
        }
    }

    /// Insert (or replace) a message and return its id.
    pub async fn insert(&self, message: MessageRef) -> MessageId {
        let id = message.id.clone();
        self.messages.lock().await.insert(id.clone(), message);
        id
    }

    /// Notify subscribers that `ids` arrived. Returns the number of receivers.
    pub fn publish(&self, ids: Vec<MessageId>) -> usize {
        self.arrivals.send(ids).unwrap_or(0)
    }

    /// Write a translation directly, bypassing the sink (another client or path).
    pub async fn set_translation(&self, id: &MessageId, text: &str) {
        if let Some(message) = self.messages.lock().await.get_mut(id) {
            message.translation = Some(text.to_string());
        }
    }

    pub async fn remove(&self, id: &MessageId) {
        self.messages.lock().await.remove(id);
    }

    /// Current state of a message.
    pub async fn message(&self, id: &MessageId) -> Option<MessageRef> {
        self.messages.lock().await.get(id).cloned()
    }

    /// Make every subsequent read fail with a storage error.
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// All `attach_translation` calls, in order.
    pub async fn attach_calls(&self) -> Vec<(MessageId, String)> {
        self.attach_calls.lock().await.clone()
    }

    /// Number of `attach_translation` calls made for `id`.
    pub async fn attach_count(&self, id: &MessageId) -> usize {
        self.attach_calls
            .lock()
            .await
            .iter()
            .filter(|(called, _)| called == id)
            .count()
    }

    pub async fn total_attach_calls(&self) -> usize {
        self.attach_calls.lock().await.len()
    }

    fn check_reads(&self) -> Result<(), ParleyError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(ParleyError::Storage {
                source: Box::new(std::io::Error::other("simulated read failure")),
            });
        }
        Ok(())
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MemoryStore {
    fn name(&self) -> &str {
        "memory-store"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::MessageStore
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl MessageSource for MemoryStore {
    async fn get_message(&self, id: &MessageId) -> Result<Option<MessageRef>, ParleyError> {
        self.check_reads()?;
        Ok(self.messages.lock().await.get(id).cloned())
    }

    async fn scan_recent(
        &self,
        chat_id: &ChatId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError> {
        self.check_reads()?;
        Ok(self
            .messages
            .lock()
            .await
            .values()
            .filter(|m| m.chat_id() == chat_id)
            .rev()
            .take(limit)
            .cloned()
            .collect())
    }

    async fn scan_before(
        &self,
        id: &MessageId,
        limit: usize,
    ) -> Result<Vec<MessageRef>, ParleyError> {
        self.check_reads()?;
        let start = MessageId {
            chat_id: id.chat_id.clone(),
            seq: i64::MIN,
        };
        Ok(self
            .messages
            .lock()
            .await
            .range(start..id.clone())
            .rev()
            .take(limit)
            .map(|(_, message)| message.clone())
            .collect())
    }

    fn subscribe(&self) -> broadcast::Receiver<Vec<MessageId>> {
        self.arrivals.subscribe()
    }
}

#[async_trait]
impl TranslationSink for MemoryStore {
    async fn attach_translation(
        &self,
        id: &MessageId,
        text: &str,
    ) -> Result<AttachOutcome, ParleyError> {
        self.attach_calls
            .lock()
            .await
            .push((id.clone(), text.to_string()));

        let mut messages = self.messages.lock().await;
        Ok(match messages.get_mut(id) {
            None => AttachOutcome::Missing,
            Some(message) if message.translation.is_some() => AttachOutcome::AlreadyTranslated,
            Some(message) => {
                message.translation = Some(text.to_string());
                AttachOutcome::Attached
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn scan_recent_is_newest_first_and_per_chat() {
        let store = MemoryStore::new();
        for seq in 1..=5 {
            store.insert(incoming_message("a", seq, "x")).await;
        }
        store.insert(incoming_message("b", 9, "y")).await;

        let recent = store.scan_recent(&ChatId::from("a"), 3).await.unwrap();
        let seqs: Vec<i64> = recent.iter().map(|m| m.id.seq).collect();
        assert_eq!(seqs, vec![5, 4, 3]);
    }

    #[tokio::test]
    async fn scan_before_excludes_the_anchor_and_later_messages() {
        let store = MemoryStore::new();
        for seq in 1..=6 {
            store.insert(incoming_message("a", seq, "x")).await;
        }
        store.insert(incoming_message("b", 2, "y")).await;

        let before = store.scan_before(&MessageId::new("a", 4), 2).await.unwrap();
        let seqs: Vec<i64> = before.iter().map(|m| m.id.seq).collect();
        assert_eq!(seqs, vec![3, 2]);

        let first = store.scan_before(&MessageId::new("a", 1), 5).await.unwrap();
        assert!(first.is_empty());
    }

    #[tokio::test]
    async fn attach_is_first_writer_wins() {
        let store = MemoryStore::new();
        let id = store.insert(incoming_message("a", 1, "hola")).await;

        assert_eq!(
            store.attach_translation(&id, "hello").await.unwrap(),
            AttachOutcome::Attached
        );
        assert_eq!(
            store.attach_translation(&id, "hi").await.unwrap(),
            AttachOutcome::AlreadyTranslated
        );
        assert_eq!(
            store.message(&id).await.unwrap().translation.as_deref(),
            Some("hello")
        );
        assert_eq!(store.attach_count(&id).await, 2);
    }

    #[tokio::test]
    async fn publish_reaches_subscribers() {
        let store = MemoryStore::new();
        let mut rx = store.subscribe();
        assert_eq!(store.publish(vec![MessageId::new("a", 1)]), 1);
        assert_eq!(rx.recv().await.unwrap(), vec![MessageId::new("a", 1)]);
    }

    #[tokio::test]
    async fn failing_reads_surface_storage_errors() {
        let store = MemoryStore::new();
        store.fail_reads(true);
        let err = store.get_message(&MessageId::new("a", 1)).await.unwrap_err();
        assert!(matches!(err, ParleyError::Storage { .. }));
    }
}
