// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Batch translation without conversation context.

use std::collections::BTreeMap;
use std::sync::Arc;

use parley_core::traits::TranslationBackend;
use parley_core::types::{Direction, MessageId, TranslationResult};
use tracing::{debug, warn};

/// Sends a whole set of messages in one backend call.
///
/// Items are keyed by their position in the input, never by text or id, so
/// two messages with the same text stay distinct.
pub struct BatchTranslator {
    backend: Arc<dyn TranslationBackend>,
}

impl BatchTranslator {
    pub fn new(backend: Arc<dyn TranslationBackend>) -> Self {
        Self { backend }
    }

    /// Translates `items` and returns one result per item, in input order.
    ///
    /// A transport error or an empty response fails every item. Otherwise an
    /// item fails when its key is missing from the response or flagged failed.
    /// A translation equal to its source counts as success.
    pub async fn translate(
        &self,
        direction: Direction,
        items: &[(MessageId, String)],
    ) -> Vec<TranslationResult> {
        if items.is_empty() {
            return Vec::new();
        }

        let request: BTreeMap<String, String> = items
            .iter()
            .enumerate()
            .map(|(index, (_, text))| (index.to_string(), text.clone()))
            .collect();

        let mut response = match self.backend.translate_batch(direction, request).await {
            Ok(response) if !response.is_empty() => response,
            Ok(_) => {
                warn!(
                    direction = %direction,
                    count = items.len(),
                    "backend returned an empty batch response"
                );
                return fail_all(items);
            }
            Err(e) => {
                warn!(
                    direction = %direction,
                    count = items.len(),
                    error = %e,
                    "batch translation failed"
                );
                return fail_all(items);
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(index, (id, source))| match response.remove(&index.to_string()) {
                Some(item) if !item.failed => {
                    if item.translated_text == *source {
                        debug!(message_id = %id, "translation identical to source");
                    }
                    TranslationResult::success(id.clone(), item.translated_text)
                }
                Some(_) => {
                    debug!(message_id = %id, "backend flagged item as failed");
                    TranslationResult::failure(id.clone())
                }
                None => {
                    debug!(message_id = %id, "item missing from batch response");
                    TranslationResult::failure(id.clone())
                }
            })
            .collect()
    }

    /// Translates a single free-standing text, returning `None` on any failure.
    pub async fn translate_text(&self, direction: Direction, text: &str) -> Option<String> {
        let mut request = BTreeMap::new();
        request.insert("0".to_string(), text.to_string());

        match self.backend.translate_batch(direction, request).await {
            Ok(mut response) => match response.remove("0") {
                Some(item) if !item.failed => Some(item.translated_text),
                _ => None,
            },
            Err(e) => {
                warn!(direction = %direction, error = %e, "translation failed");
                None
            }
        }
    }
}

fn fail_all(items: &[(MessageId, String)]) -> Vec<TranslationResult> {
    items
        .iter()
        .map(|(id, _)| TranslationResult::failure(id.clone()))
        .collect()
}
