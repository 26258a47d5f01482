// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `parley serve` command implementation.
//!
//! Opens the SQLite message store, connects the HTTP translation backend,
//! and runs the background pipeline until SIGINT/SIGTERM. SIGHUP reloads the
//! translation settings without a restart.

use std::path::PathBuf;
use std::sync::Arc;

use parley_backend::HttpBackend;
use parley_config::model::ParleyConfig;
use parley_config::LiveSettings;
use parley_core::{AccountContext, ChatId, ParleyError, PluginAdapter};
use parley_pipeline::{Pipeline, PipelineOptions, RetryPolicy};
use parley_storage::SqliteMessageStore;
use tracing::{info, warn};

use crate::shutdown;

/// The adapters and pipeline shared by every command that translates.
pub struct Service {
    pub store: Arc<SqliteMessageStore>,
    pub backend: Arc<HttpBackend>,
    pub settings: Arc<LiveSettings>,
    pub pipeline: Pipeline,
}

impl Service {
    pub async fn open(config: &ParleyConfig) -> Result<Self, ParleyError> {
        let account = AccountContext::new(config.agent.account_id.as_str());
        let store = Arc::new(SqliteMessageStore::open(&config.storage, account).await?);
        let backend = Arc::new(HttpBackend::new(&config.backend)?);
        let settings = Arc::new(LiveSettings::from_config(&config.translation));

        let pipeline = Pipeline::new(
            store.clone(),
            store.clone(),
            backend.clone(),
            settings.clone(),
            pipeline_options(config),
        );

        Ok(Self {
            store,
            backend,
            settings,
            pipeline,
        })
    }

    /// Stops the pipeline and flushes the store.
    pub async fn close(&self) {
        self.pipeline.shutdown().await;
        if let Err(e) = self.backend.shutdown().await {
            warn!(error = %e, "backend shutdown failed");
        }
        if let Err(e) = self.store.shutdown().await {
            warn!(error = %e, "message store shutdown failed");
        }
    }
}

/// Maps the `[pipeline]` section onto pipeline options.
pub fn pipeline_options(config: &ParleyConfig) -> PipelineOptions {
    PipelineOptions {
        cache_capacity: config.pipeline.cache_capacity,
        catch_up_limit: config.pipeline.catch_up_limit,
        retry: RetryPolicy::new(config.pipeline.retry_delays()),
    }
}

/// Runs the `parley serve` command.
pub async fn run_serve(
    config: ParleyConfig,
    config_path: Option<PathBuf>,
    catch_up: Vec<String>,
) -> Result<(), ParleyError> {
    info!(
        account = %config.agent.account_id,
        backend = %config.backend.base_url,
        database = %config.storage.database_path,
        "starting parley serve"
    );

    let service = Service::open(&config).await?;
    let cancel = shutdown::install_signal_handler();
    shutdown::spawn_reload_on_hangup(service.settings.clone(), config_path, cancel.clone());

    let account = AccountContext::new(config.agent.account_id.as_str());
    service.pipeline.start_background_observer(account);

    for chat in catch_up {
        service.pipeline.catch_up(ChatId::new(chat));
    }

    info!("parley is running, waiting for messages");
    cancel.cancelled().await;

    info!("shutting down");
    service.close().await;
    info!("parley stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn options_follow_pipeline_section() {
        let mut config = ParleyConfig::default();
        config.pipeline.cache_capacity = 42;
        config.pipeline.catch_up_limit = 7;
        config.pipeline.retry_delays_ms = vec![100, 200];

        let options = pipeline_options(&config);
        assert_eq!(options.cache_capacity, 42);
        assert_eq!(options.catch_up_limit, 7);
        assert_eq!(options.retry.max_retries(), 2);
        assert_eq!(options.retry.delay_for(1), Some(Duration::from_millis(200)));
    }

    #[tokio::test]
    async fn service_opens_against_temp_database() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = ParleyConfig::default();
        config.storage.database_path = dir.path().join("serve.db").display().to_string();

        let service = Service::open(&config).await.unwrap();
        assert!(!service.pipeline.is_started());
        service.close().await;
    }
}
