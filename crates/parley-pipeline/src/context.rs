// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Per-message translation carrying a window of recent conversation.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use parley_core::traits::{MessageSource, TranslationBackend};
use parley_core::types::{
    ChatId, ContextRequest, ContextTurn, Direction, MessageId, MessageRef, TranslationResult,
};
use tracing::{debug, warn};

/// Translates messages one at a time with their chat's recent turns as context.
///
/// Chats are processed concurrently; messages within a chat are sent one
/// after another, each with the turns that precede it.
pub struct ContextTranslator {
    source: Arc<dyn MessageSource>,
    backend: Arc<dyn TranslationBackend>,
}

impl ContextTranslator {
    pub fn new(source: Arc<dyn MessageSource>, backend: Arc<dyn TranslationBackend>) -> Self {
        Self { source, backend }
    }

    /// Translates `messages`, returning one result per message.
    ///
    /// A failed call marks only that message failed; its siblings are unaffected.
    pub async fn translate(
        &self,
        direction: Direction,
        window: usize,
        messages: Vec<MessageRef>,
    ) -> Vec<TranslationResult> {
        let mut by_chat: BTreeMap<ChatId, Vec<MessageRef>> = BTreeMap::new();
        for message in messages {
            by_chat
                .entry(message.chat_id().clone())
                .or_default()
                .push(message);
        }

        let chats = by_chat
            .into_iter()
            .map(|(chat_id, messages)| self.translate_chat(direction, window, chat_id, messages));

        join_all(chats).await.into_iter().flatten().collect()
    }

    async fn translate_chat(
        &self,
        direction: Direction,
        window: usize,
        chat_id: ChatId,
        mut messages: Vec<MessageRef>,
    ) -> Vec<TranslationResult> {
        messages.sort_by_key(|m| (m.timestamp, m.id.seq));

        let mut results = Vec::with_capacity(messages.len());
        for message in messages {
            let request = ContextRequest {
                direction,
                chat_id: chat_id.clone(),
                text: message.text.clone(),
                context: self.context_window(&chat_id, window, Some(&message.id)).await,
            };
            let result = match self.backend.translate_with_context(request).await {
                Ok(translation) if !translation.failed => {
                    if translation.translated_text == message.text {
                        debug!(message_id = %message.id, "translation identical to source");
                    }
                    TranslationResult::success(message.id, translation.translated_text)
                }
                Ok(_) => {
                    debug!(message_id = %message.id, "backend flagged translation as failed");
                    TranslationResult::failure(message.id)
                }
                Err(e) => {
                    warn!(
                        message_id = %message.id,
                        direction = %direction,
                        error = %e,
                        "context translation failed"
                    );
                    TranslationResult::failure(message.id)
                }
            };
            results.push(result);
        }

        let succeeded = results.iter().filter(|r| r.succeeded).count();
        debug!(
            chat_id = %chat_id,
            succeeded,
            failed = results.len() - succeeded,
            "chat translated"
        );
        results
    }

    /// Builds the context window for `chat_id`: up to `window` messages with
    /// text, oldest first. With `before` set, only messages preceding it are
    /// used; otherwise the chat's newest ones. A store error yields an empty
    /// window.
    pub async fn context_window(
        &self,
        chat_id: &ChatId,
        window: usize,
        before: Option<&MessageId>,
    ) -> Vec<ContextTurn> {
        if window == 0 {
            return Vec::new();
        }

        // Over-fetch so text-less messages don't shrink the window.
        let limit = window.saturating_mul(2);
        let scanned = match before {
            Some(id) => self.source.scan_before(id, limit).await,
            None => self.source.scan_recent(chat_id, limit).await,
        };
        match scanned {
            Ok(recent) => {
                let mut turns: Vec<ContextTurn> = recent
                    .iter()
                    .filter(|m| m.has_text())
                    .take(window)
                    .map(ContextTurn::from_message)
                    .collect();
                turns.reverse();
                turns
            }
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "failed to load context, translating without it");
                Vec::new()
            }
        }
    }

    /// Translates a text for `chat_id`, returning `None` on any failure.
    ///
    /// `before` names the stored message the text belongs to, if any; a draft
    /// passes `None` and gets the chat's newest turns.
    pub async fn translate_text(
        &self,
        direction: Direction,
        chat_id: &ChatId,
        window: usize,
        text: &str,
        before: Option<&MessageId>,
    ) -> Option<String> {
        let request = ContextRequest {
            direction,
            chat_id: chat_id.clone(),
            text: text.to_string(),
            context: self.context_window(chat_id, window, before).await,
        };
        match self.backend.translate_with_context(request).await {
            Ok(translation) if !translation.failed => Some(translation.translated_text),
            Ok(_) => None,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "context translation failed");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::TurnRole;
    use parley_test_utils::{incoming_message, own_message, MemoryStore, MockBackend};

    async fn seeded_store(chat: &str, count: i64) -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::new());
        for seq in 1..=count {
            let message = if seq % 2 == 0 {
                own_message(chat, seq, &format!("mine {seq}"))
            } else {
                incoming_message(chat, seq, &format!("theirs {seq}"))
            };
            store.insert(message).await;
        }
        store
    }

    #[tokio::test]
    async fn window_holds_preceding_turns_oldest_first() {
        let store = seeded_store("c", 15).await;
        let backend = Arc::new(MockBackend::new());
        let translator = ContextTranslator::new(store.clone(), backend.clone());

        let pending = store.message(&parley_core::MessageId::new("c", 15)).await.unwrap();
        let results = translator.translate(Direction::Incoming, 10, vec![pending]).await;
        assert!(results[0].succeeded);

        let requests = backend.context_requests().await;
        assert_eq!(requests[0].text, "theirs 15");
        let texts: Vec<_> = requests[0].context.iter().map(|t| t.text.clone()).collect();
        let expected: Vec<_> = (5..=14)
            .map(|s| {
                if s % 2 == 0 {
                    format!("mine {s}")
                } else {
                    format!("theirs {s}")
                }
            })
            .collect();
        assert_eq!(texts, expected);
        assert_eq!(requests[0].context[0].role, TurnRole::Them);
        assert_eq!(requests[0].context[9].role, TurnRole::Me);
    }

    #[tokio::test]
    async fn single_turn_window_is_the_previous_message() {
        let store = Arc::new(MemoryStore::new());
        store.insert(own_message("c", 1, "how are you?")).await;
        let reply = store.insert(incoming_message("c", 2, "gut, danke")).await;
        let backend = Arc::new(MockBackend::new());
        let translator = ContextTranslator::new(store.clone(), backend.clone());

        let pending = store.message(&reply).await.unwrap();
        translator.translate(Direction::Incoming, 1, vec![pending]).await;

        let requests = backend.context_requests().await;
        assert_eq!(requests[0].text, "gut, danke");
        assert_eq!(
            requests[0].context,
            vec![ContextTurn {
                role: TurnRole::Me,
                text: "how are you?".to_string(),
            }]
        );
    }

    #[tokio::test]
    async fn older_message_never_sees_later_turns() {
        let store = seeded_store("c", 6).await;
        let backend = Arc::new(MockBackend::new());
        let translator = ContextTranslator::new(store.clone(), backend.clone());

        let older = store.message(&parley_core::MessageId::new("c", 3)).await.unwrap();
        let newer = store.message(&parley_core::MessageId::new("c", 5)).await.unwrap();
        translator
            .translate(Direction::Incoming, 5, vec![newer, older])
            .await;

        let requests = backend.context_requests().await;
        let windows: Vec<Vec<String>> = requests
            .iter()
            .map(|r| r.context.iter().map(|t| t.text.clone()).collect())
            .collect();
        assert_eq!(windows[0], vec!["theirs 1", "mine 2"]);
        assert_eq!(windows[1], vec!["theirs 1", "mine 2", "theirs 3", "mine 4"]);
    }

    #[tokio::test]
    async fn zero_window_sends_no_context() {
        let store = seeded_store("c", 5).await;
        let backend = Arc::new(MockBackend::new());
        let translator = ContextTranslator::new(store.clone(), backend.clone());

        let message = incoming_message("c", 6, "neu");
        translator.translate(Direction::Incoming, 0, vec![message]).await;
        assert!(backend.context_requests().await[0].context.is_empty());
    }

    #[tokio::test]
    async fn one_failed_message_does_not_fail_siblings() {
        let store = seeded_store("c", 2).await;
        let backend = Arc::new(MockBackend::new());
        backend.flag_failed("bad").await;
        let translator = ContextTranslator::new(store, backend.clone());

        let results = translator
            .translate(
                Direction::Incoming,
                5,
                vec![
                    incoming_message("c", 3, "good"),
                    incoming_message("c", 4, "bad"),
                    incoming_message("c", 5, "also good"),
                ],
            )
            .await;

        let succeeded: Vec<bool> = results.iter().map(|r| r.succeeded).collect();
        assert_eq!(succeeded, vec![true, false, true]);
        assert_eq!(backend.context_call_count().await, 3);
    }

    #[tokio::test]
    async fn each_chat_gets_its_own_window() {
        let store = Arc::new(MemoryStore::new());
        store.insert(incoming_message("a", 1, "from a")).await;
        store.insert(incoming_message("b", 1, "from b")).await;
        let backend = Arc::new(MockBackend::new());
        let translator = ContextTranslator::new(store, backend.clone());

        translator
            .translate(
                Direction::Incoming,
                5,
                vec![incoming_message("a", 2, "x"), incoming_message("b", 2, "y")],
            )
            .await;

        let mut requests = backend.context_requests().await;
        requests.sort_by(|l, r| l.chat_id.cmp(&r.chat_id));
        assert_eq!(requests[0].context[0].text, "from a");
        assert_eq!(requests[1].context[0].text, "from b");
    }
}
