// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP translation backend for Parley.
//!
//! Talks to a translation proxy exposing `POST /translate`, `GET /health`
//! and `GET /stats`. The proxy translates one text per request, so a batch
//! is fanned out as concurrent requests bounded by `max_concurrency`.

pub mod client;
pub mod types;

pub use client::ProxyClient;
pub use types::{BackendStats, HealthResponse};

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use parley_config::model::BackendConfig;
use parley_core::{
    AdapterType, BackendTranslation, ContextRequest, Direction, HealthStatus, ParleyError,
    PluginAdapter, TranslationBackend,
};
use tracing::{debug, warn};

use crate::types::{TranslateRequest, TranslateResponse};

/// Translation backend backed by the HTTP proxy.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: ProxyClient,
    max_concurrency: usize,
}

impl HttpBackend {
    /// Creates a backend from configuration.
    pub fn new(config: &BackendConfig) -> Result<Self, ParleyError> {
        let client = ProxyClient::new(&config.base_url, Duration::from_secs(config.timeout_secs))?;
        Ok(Self::with_client(client, config.max_concurrency))
    }

    pub fn with_client(client: ProxyClient, max_concurrency: usize) -> Self {
        Self {
            client,
            max_concurrency: max_concurrency.max(1),
        }
    }

    /// Fetches the proxy's request counters.
    pub async fn stats(&self) -> Result<BackendStats, ParleyError> {
        self.client.stats().await
    }
}

fn to_translation(response: TranslateResponse) -> BackendTranslation {
    BackendTranslation {
        translated_text: response.translated_text,
        failed: response.translation_failed,
    }
}

#[async_trait]
impl PluginAdapter for HttpBackend {
    fn name(&self) -> &str {
        "http-proxy"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::TranslationBackend
    }

    async fn health_check(&self) -> Result<HealthStatus, ParleyError> {
        match self.client.health().await {
            Ok(health) if health.status == "ok" => Ok(HealthStatus::Healthy),
            Ok(health) => Ok(HealthStatus::Degraded(health.status)),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), ParleyError> {
        debug!("http translation backend shutting down");
        Ok(())
    }
}

#[async_trait]
impl TranslationBackend for HttpBackend {
    async fn translate_batch(
        &self,
        direction: Direction,
        items: BTreeMap<String, String>,
    ) -> Result<HashMap<String, BackendTranslation>, ParleyError> {
        if items.is_empty() {
            return Ok(HashMap::new());
        }

        let total = items.len();
        let outcomes: Vec<(String, String, Result<TranslateResponse, ParleyError>)> =
            stream::iter(items)
                .map(|(key, text)| async move {
                    let request = TranslateRequest {
                        text: text.clone(),
                        direction,
                        chat_id: String::new(),
                        context: Vec::new(),
                    };
                    let result = self.client.translate(&request).await;
                    (key, text, result)
                })
                .buffer_unordered(self.max_concurrency)
                .collect()
                .await;

        let mut translations = HashMap::with_capacity(total);
        let mut last_error = None;
        for (key, text, result) in outcomes {
            match result {
                Ok(response) => {
                    translations.insert(key, to_translation(response));
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "batch item failed in transport");
                    translations.insert(
                        key,
                        BackendTranslation {
                            translated_text: text,
                            failed: true,
                        },
                    );
                    last_error = Some(e);
                }
            }
        }

        // Nothing got through; surface the transport error itself.
        if let Some(e) = last_error
            && translations.values().all(|t| t.failed)
        {
            return Err(e);
        }

        debug!(direction = %direction, items = total, "batch translated");
        Ok(translations)
    }

    async fn translate_with_context(
        &self,
        request: ContextRequest,
    ) -> Result<BackendTranslation, ParleyError> {
        let wire = TranslateRequest {
            text: request.text,
            direction: request.direction,
            chat_id: request.chat_id.to_string(),
            context: request.context,
        };
        let response = self.client.translate(&wire).await?;
        Ok(to_translation(response))
    }
}
