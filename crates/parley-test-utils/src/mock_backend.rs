// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Scripted translation backend for deterministic testing.
//!
//! `MockBackend` implements `TranslationBackend` without any network access.
//! By default every text translates to [`MockBackend::render`] of itself; tests
//! script transport failures, empty responses, flagged or omitted items, and
//! echoed output, then assert on the recorded requests.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use parley_core::traits::adapter::PluginAdapter;
use parley_core::traits::TranslationBackend;
use parley_core::types::{
    AdapterType, BackendTranslation, ContextRequest, Direction, HealthStatus,
};
use parley_core::ParleyError;

/// One recorded `translate_batch` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCall {
    pub direction: Direction,
    pub items: BTreeMap<String, String>,
}

#[derive(Debug, Default)]
struct Script {
    /// Remaining calls that fail with a transport error.
    transport_failures: u32,
    fail_always: bool,
    /// Remaining batch calls that return an empty map.
    empty_responses: u32,
    /// Texts reported back with `failed = true`.
    failed_texts: HashSet<String>,
    /// Texts left out of batch responses.
    omitted_texts: HashSet<String>,
    echo: bool,
    delay: Option<Duration>,
}

/// A translation backend with scripted behaviour.
pub struct MockBackend {
    script: Mutex<Script>,
    batch_calls: Mutex<Vec<BatchCall>>,
    context_calls: Mutex<Vec<ContextRequest>>,
}

impl MockBackend {
    /// Create a backend that translates everything successfully.
    pub fn new() -> Self {
        Self {
            script: Mutex::new(Script::default()),
            batch_calls: Mutex::new(Vec::new()),
            context_calls: Mutex::new(Vec::new()),
        }
    }

    /// The translation this mock produces for `text`.
    pub fn render(direction: Direction, text: &str) -> String {
        format!("[{direction}] {text}")
    }

    /// Fail the next `count` calls (batch or context) with a transport error.
    pub async fn fail_next(&self, count: u32) {
        self.script.lock().await.transport_failures = count;
    }

    /// Fail every call with a transport error until turned off.
    pub async fn fail_always(&self, fail: bool) {
        self.script.lock().await.fail_always = fail;
    }

    /// Answer the next `count` batch calls with an empty map.
    pub async fn respond_empty_next(&self, count: u32) {
        self.script.lock().await.empty_responses = count;
    }

    /// Flag `text` as failed whenever it is translated.
    pub async fn flag_failed(&self, text: &str) {
        self.script.lock().await.failed_texts.insert(text.to_string());
    }

    /// Leave `text` out of batch responses.
    pub async fn omit(&self, text: &str) {
        self.script.lock().await.omitted_texts.insert(text.to_string());
    }

    /// Return the input unchanged instead of rendering a translation.
    pub async fn set_echo(&self, echo: bool) {
        self.script.lock().await.echo = echo;
    }

    /// Sleep for `delay` inside every call.
    pub async fn set_delay(&self, delay: Duration) {
        self.script.lock().await.delay = Some(delay);
    }

    pub async fn batch_calls(&self) -> Vec<BatchCall> {
        self.batch_calls.lock().await.clone()
    }

    pub async fn batch_call_count(&self) -> usize {
        self.batch_calls.lock().await.len()
    }

    pub async fn context_requests(&self) -> Vec<ContextRequest> {
        self.context_calls.lock().await.clone()
    }

    pub async fn context_call_count(&self) -> usize {
        self.context_calls.lock().await.len()
    }

    /// Total calls of either shape.
    pub async fn call_count(&self) -> usize {
        self.batch_call_count().await + self.context_call_count().await
    }

    /// Applies the delay and consumes one scripted transport failure.
    async fn begin_call(&self) -> Result<(), ParleyError> {
        let delay = self.script.lock().await.delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut script = self.script.lock().await;
        if script.fail_always {
            return Err(ParleyError::backend("mock transport failure"));
        }
        if script.transport_failures > 0 {
            script.transport_failures -= 1;
            return Err(ParleyError::backend("mock transport failure"));
        }
        Ok(())
    }

    async fn translate_one(&self, direction: Direction, text: &str) -> BackendTranslation {
        let script = self.script.lock().await;
        if script.failed_texts.contains(text) {
            return BackendTranslation {
                translated_text: text.to_string(),
                failed: true,
            };
        }
        let translated_text = if script.echo {
            text.to_string()
        } else {
            Self::render(direction, text)
        };
        BackendTranslation {
            translated_text,
            failed: false,
        }
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockBackend {
    fn name(&self) -> &str {
        "mock-backend"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TranslationBackend
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        Ok(())
    }
}

#[async_trait]
impl TranslationBackend for MockBackend {
    async fn translate_batch(
        &self,
        direction: Direction,
        items: BTreeMap<String, String>,
    ) -> Result<HashMap<String, BackendTranslation>, ParleyError> {
        self.batch_calls.lock().await.push(BatchCall {
            direction,
            items: items.clone(),
        });
        self.begin_call().await?;

        {
            let mut script = self.script.lock().await;
            if script.empty_responses > 0 {
                script.empty_responses -= 1;
                return Ok(HashMap::new());
            }
        }

        let omitted = self.script.lock().await.omitted_texts.clone();
        let mut response = HashMap::with_capacity(items.len());
        for (key, text) in items {
            if omitted.contains(&text) {
                continue;
            }
            let translation = self.translate_one(direction, &text).await;
            response.insert(key, translation);
        }
        Ok(response)
    }

    async fn translate_with_context(
        &self,
        request: ContextRequest,
    ) -> Result<BackendTranslation, ParleyError> {
        self.context_calls.lock().await.push(request.clone());
        self.begin_call().await?;
        Ok(self.translate_one(request.direction, &request.text).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::ChatId;

    fn batch(texts: &[&str]) -> BTreeMap<String, String> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| (i.to_string(), t.to_string()))
            .collect()
    }

    #[tokio::test]
    async fn default_translation_is_rendered() {
        let backend = MockBackend::new();
        let response = backend
            .translate_batch(Direction::Incoming, batch(&["hola"]))
            .await
            .unwrap();
        assert_eq!(response["0"].translated_text, "[incoming] hola");
        assert!(!response["0"].failed);
    }

    #[tokio::test]
    async fn scripted_failures_are_consumed_in_order() {
        let backend = MockBackend::new();
        backend.fail_next(2).await;
        let request = ContextRequest {
            direction: Direction::Outgoing,
            chat_id: ChatId::from("c"),
            text: "hi".into(),
            context: vec![],
        };
        assert!(backend.translate_with_context(request.clone()).await.is_err());
        assert!(backend.translate_batch(Direction::Outgoing, batch(&["hi"])).await.is_err());
        assert!(backend.translate_with_context(request).await.is_ok());
        assert_eq!(backend.call_count().await, 3);
    }

    #[tokio::test]
    async fn omitted_and_flagged_items() {
        let backend = MockBackend::new();
        backend.omit("gone").await;
        backend.flag_failed("bad").await;
        let response = backend
            .translate_batch(Direction::Incoming, batch(&["gone", "bad", "ok"]))
            .await
            .unwrap();
        assert!(!response.contains_key("0"));
        assert!(response["1"].failed);
        assert!(!response["2"].failed);
    }
}
