// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the translation proxy.
//!
//! Provides [`ProxyClient`] which handles request construction, timeouts,
//! and a single retry on transient HTTP statuses.

use std::time::Duration;

use parley_core::ParleyError;
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::types::{BackendStats, HealthResponse, TranslateRequest, TranslateResponse};

/// HTTP client for translation proxy communication.
#[derive(Debug, Clone)]
pub struct ProxyClient {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    max_retries: u32,
    retry_delay: Duration,
}

impl ProxyClient {
    /// Creates a client for the proxy at `base_url` (without a trailing path).
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ParleyError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ParleyError::Backend {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries: 1,
            retry_delay: Duration::from_secs(1),
        })
    }

    /// Overrides the pause before the transient-status retry.
    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /translate`.
    pub async fn translate(
        &self,
        request: &TranslateRequest,
    ) -> Result<TranslateResponse, ParleyError> {
        let url = format!("{}/translate", self.base_url);
        self.send_json(|| self.client.post(&url).json(request), "translate")
            .await
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthResponse, ParleyError> {
        let url = format!("{}/health", self.base_url);
        self.send_json(|| self.client.get(&url), "health").await
    }

    /// `GET /stats`.
    pub async fn stats(&self) -> Result<BackendStats, ParleyError> {
        let url = format!("{}/stats", self.base_url);
        self.send_json(|| self.client.get(&url), "stats").await
    }

    /// Sends the request built by `build`, retrying once on a transient status,
    /// and decodes a JSON body.
    async fn send_json<T, F>(&self, build: F, operation: &str) -> Result<T, ParleyError>
    where
        T: DeserializeOwned,
        F: Fn() -> RequestBuilder,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                warn!(operation, attempt, "retrying proxy request after transient error");
                tokio::time::sleep(self.retry_delay).await;
            }

            let response = build()
                .send()
                .await
                .map_err(|e| self.transport_error(operation, e))?;

            let status = response.status();
            debug!(operation, status = %status, attempt, "proxy response received");

            if status.is_success() {
                return decode(operation, response).await;
            }

            let body = response.text().await.unwrap_or_default();
            let error = ParleyError::backend(format!("proxy {operation} returned {status}: {body}"));

            if is_transient_error(status) && attempt < self.max_retries {
                warn!(operation, status = %status, "transient error, will retry");
                last_error = Some(error);
                continue;
            }

            return Err(error);
        }

        Err(last_error.unwrap_or_else(|| {
            ParleyError::backend(format!("proxy {operation} failed after retries"))
        }))
    }

    fn transport_error(&self, operation: &str, e: reqwest::Error) -> ParleyError {
        if e.is_timeout() {
            ParleyError::Timeout {
                duration: self.timeout,
            }
        } else {
            ParleyError::Backend {
                message: format!("proxy {operation} request failed: {e}"),
                source: Some(Box::new(e)),
            }
        }
    }
}

async fn decode<T: DeserializeOwned>(operation: &str, response: Response) -> Result<T, ParleyError> {
    let body = response.text().await.map_err(|e| ParleyError::Backend {
        message: format!("failed to read proxy {operation} response: {e}"),
        source: Some(Box::new(e)),
    })?;
    serde_json::from_str(&body).map_err(|e| ParleyError::Backend {
        message: format!("failed to parse proxy {operation} response: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Returns true for HTTP status codes that indicate transient errors worth retrying.
fn is_transient_error(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 502 | 503 | 529)
}

#[cfg(test)]
mod tests {
    use super::*;
    use parley_core::types::{ContextTurn, Direction, TurnRole};
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_client(base_url: &str) -> ProxyClient {
        ProxyClient::new(base_url, Duration::from_secs(5))
            .unwrap()
            .with_retry_delay(Duration::from_millis(10))
    }

    fn request(text: &str) -> TranslateRequest {
        TranslateRequest {
            text: text.into(),
            direction: Direction::Incoming,
            chat_id: "chat-1".into(),
            context: vec![],
        }
    }

    fn ok_body(translated: &str, original: &str) -> serde_json::Value {
        serde_json::json!({
            "translated_text": translated,
            "original_text": original,
            "direction": "incoming",
            "translation_failed": false
        })
    }

    #[tokio::test]
    async fn translate_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("hello", "hola")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri()).translate(&request("hola")).await.unwrap();
        assert_eq!(response.translated_text, "hello");
        assert!(!response.translation_failed);
    }

    #[tokio::test]
    async fn translate_sends_context_and_direction() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .and(body_partial_json(serde_json::json!({
                "direction": "outgoing",
                "chat_id": "chat-9",
                "context": [{"role": "them", "text": "¿qué tal?"}]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("bien", "fine")))
            .expect(1)
            .mount(&server)
            .await;

        let req = TranslateRequest {
            text: "fine".into(),
            direction: Direction::Outgoing,
            chat_id: "chat-9".into(),
            context: vec![ContextTurn {
                role: TurnRole::Them,
                text: "¿qué tal?".into(),
            }],
        };
        test_client(&server.uri()).translate(&req).await.unwrap();
    }

    #[tokio::test]
    async fn translate_retries_once_on_503() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(ok_body("hi", "hola")))
            .mount(&server)
            .await;

        let response = test_client(&server.uri()).translate(&request("hola")).await.unwrap();
        assert_eq!(response.translated_text, "hi");
    }

    #[tokio::test]
    async fn translate_exhausts_retries_on_500() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .expect(2)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .translate(&request("hola"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
        assert!(err.to_string().contains("500"), "got: {err}");
    }

    #[tokio::test]
    async fn client_error_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(422).set_body_string("bad direction"))
            .expect(1)
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .translate(&request("hola"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("bad direction"), "got: {err}");
    }

    #[tokio::test]
    async fn malformed_body_is_a_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let err = test_client(&server.uri())
            .translate(&request("hola"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }

    #[tokio::test]
    async fn slow_proxy_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/translate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(ok_body("late", "hola"))
                    .set_delay(Duration::from_millis(500)),
            )
            .mount(&server)
            .await;

        let client = ProxyClient::new(&server.uri(), Duration::from_millis(50)).unwrap();
        let err = client.translate(&request("hola")).await.unwrap_err();
        assert!(matches!(err, ParleyError::Timeout { .. }), "got: {err:?}");
    }

    #[tokio::test]
    async fn stats_decodes_integer_rates() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stats"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "total_requests": 0,
                "successful": 0,
                "failed": 0,
                "retries": 0,
                "fallbacks": 0,
                "success_rate": 0,
                "avg_response_time_ms": 0
            })))
            .mount(&server)
            .await;

        let stats = test_client(&server.uri()).stats().await.unwrap();
        assert_eq!(stats.total_requests, 0);
        assert_eq!(stats.success_rate, 0.0);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let client = ProxyClient::new("http://proxy:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://proxy:8080");
    }
}
