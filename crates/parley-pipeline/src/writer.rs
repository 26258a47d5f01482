// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Idempotent persistence of translation results.

use std::sync::Arc;

use parley_core::error::ParleyError;
use parley_core::traits::{MessageSource, TranslationSink};
use parley_core::types::{AttachOutcome, MessageId};
use tracing::debug;

/// Attaches translations to stored messages without ever overwriting one.
///
/// The current record is read first so a message that already carries a
/// translation never reaches the sink. The sink's own first-writer-wins check
/// covers two jobs racing past the read.
pub struct PersistenceWriter {
    source: Arc<dyn MessageSource>,
    sink: Arc<dyn TranslationSink>,
}

impl PersistenceWriter {
    pub fn new(source: Arc<dyn MessageSource>, sink: Arc<dyn TranslationSink>) -> Self {
        Self { source, sink }
    }

    pub async fn store(&self, id: &MessageId, text: &str) -> Result<AttachOutcome, ParleyError> {
        match self.source.get_message(id).await? {
            None => {
                debug!(message_id = %id, "message gone before write");
                Ok(AttachOutcome::Missing)
            }
            Some(current) if current.has_translation() => {
                debug!(message_id = %id, "message already translated, skipping write");
                Ok(AttachOutcome::AlreadyTranslated)
            }
            Some(_) => {
                let outcome = self.sink.attach_translation(id, text).await?;
                debug!(message_id = %id, ?outcome, "translation stored");
                Ok(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_test_utils::{incoming_message, MemoryStore};

    fn writer(store: &Arc<MemoryStore>) -> PersistenceWriter {
        PersistenceWriter::new(store.clone(), store.clone())
    }

    #[tokio::test]
    async fn attaches_translation_once() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(incoming_message("c", 1, "hola")).await;
        let writer = writer(&store);

        assert_eq!(writer.store(&id, "hello").await.unwrap(), AttachOutcome::Attached);
        assert_eq!(
            writer.store(&id, "hi there").await.unwrap(),
            AttachOutcome::AlreadyTranslated
        );

        let stored = store.message(&id).await.unwrap();
        assert_eq!(stored.translation.as_deref(), Some("hello"));
        assert_eq!(stored.text, "hola");
        assert_eq!(store.attach_count(&id).await, 1);
    }

    #[tokio::test]
    async fn missing_message_is_not_an_error() {
        let store = Arc::new(MemoryStore::new());
        let outcome = writer(&store)
            .store(&MessageId::new("c", 99), "x")
            .await
            .unwrap();
        assert_eq!(outcome, AttachOutcome::Missing);
        assert_eq!(store.total_attach_calls().await, 0);
    }

    #[tokio::test]
    async fn read_failure_propagates() {
        let store = Arc::new(MemoryStore::new());
        let id = store.insert(incoming_message("c", 1, "hola")).await;
        store.fail_reads(true);
        assert!(writer(&store).store(&id, "hello").await.is_err());
    }
}
