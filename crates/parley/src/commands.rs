// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-shot commands: `catch-up`, `health`, and `config`.

use parley_backend::HttpBackend;
use parley_config::model::ParleyConfig;
use parley_core::{AccountContext, ChatId, HealthStatus, ParleyError, PluginAdapter};
use parley_pipeline::CatchUpOutcome;
use parley_storage::SqliteMessageStore;
use tracing::info;

use crate::serve::Service;

/// Translates the recent untranslated messages of each chat, then waits for
/// any scheduled retries to finish.
pub async fn run_catch_up(config: &ParleyConfig, chats: &[String]) -> Result<(), ParleyError> {
    let service = Service::open(config).await?;

    for chat in chats {
        let chat_id = ChatId::new(chat.as_str());
        match service.pipeline.run_catch_up(&chat_id).await {
            CatchUpOutcome::Completed(report) => println!(
                "{chat}: {} attached, {} skipped, {} pending retry",
                report.attached,
                report.skipped,
                report.failed.len()
            ),
            CatchUpOutcome::Disabled => println!("{chat}: translation disabled"),
            CatchUpOutcome::ScanFailed => println!("{chat}: could not read messages"),
            CatchUpOutcome::AlreadyRunning => println!("{chat}: catch-up already running"),
        }
    }

    info!("waiting for pending retries");
    service.pipeline.wait_idle().await;
    service.close().await;
    Ok(())
}

/// Checks the message store and the translation proxy.
///
/// Returns `false` when either is unhealthy.
pub async fn run_health(config: &ParleyConfig) -> Result<bool, ParleyError> {
    let account = AccountContext::new(config.agent.account_id.as_str());
    let store = SqliteMessageStore::open(&config.storage, account).await?;
    let backend = HttpBackend::new(&config.backend)?;

    let store_status = store.health_check().await?;
    let backend_status = backend.health_check().await?;

    println!("store   ({}): {}", config.storage.database_path, describe(&store_status));
    println!("backend ({}): {}", config.backend.base_url, describe(&backend_status));

    if !matches!(backend_status, HealthStatus::Unhealthy(_)) {
        match backend.stats().await {
            Ok(stats) => {
                let rendered = serde_json::to_string_pretty(&stats).map_err(|e| {
                    ParleyError::Internal(format!("failed to render stats: {e}"))
                })?;
                println!("{rendered}");
            }
            Err(e) => println!("stats unavailable: {e}"),
        }
    }

    store.shutdown().await?;
    Ok(![store_status, backend_status]
        .iter()
        .any(|s| matches!(s, HealthStatus::Unhealthy(_))))
}

fn describe(status: &HealthStatus) -> String {
    match status {
        HealthStatus::Healthy => "healthy".to_string(),
        HealthStatus::Degraded(reason) => format!("degraded ({reason})"),
        HealthStatus::Unhealthy(reason) => format!("unhealthy ({reason})"),
    }
}

/// Renders the effective configuration as TOML.
pub fn render_config(config: &ParleyConfig) -> Result<String, ParleyError> {
    toml::to_string_pretty(config)
        .map_err(|e| ParleyError::Config(format!("failed to render configuration: {e}")))
}
