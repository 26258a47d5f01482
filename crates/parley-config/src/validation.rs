// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Validates semantic constraints that cannot be expressed via serde attributes,
//! such as non-empty paths, positive capacities, and a usable retry table.

use crate::diagnostic::ConfigError;
use crate::model::ParleyConfig;

/// Upper bound for a per-direction context window.
pub const MAX_CONTEXT_SIZE: usize = 100;

/// Validate a deserialized configuration for semantic correctness.
///
/// Returns `Ok(())` if all validations pass, or `Err(Vec<ConfigError>)` with
/// all collected validation errors (does not fail fast).
pub fn validate_config(config: &ParleyConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    if config.agent.account_id.trim().is_empty() {
        errors.push(validation("agent.account_id must not be empty"));
    }

    let base_url = config.backend.base_url.trim();
    if base_url.is_empty() {
        errors.push(validation("backend.base_url must not be empty"));
    } else if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        errors.push(validation(format!(
            "backend.base_url `{base_url}` must start with http:// or https://"
        )));
    }

    if config.backend.timeout_secs == 0 {
        errors.push(validation("backend.timeout_secs must be at least 1"));
    }

    if config.backend.max_concurrency == 0 {
        errors.push(validation("backend.max_concurrency must be at least 1"));
    }

    if config.storage.database_path.trim().is_empty() {
        errors.push(validation("storage.database_path must not be empty"));
    }

    if config.pipeline.cache_capacity == 0 {
        errors.push(validation("pipeline.cache_capacity must be at least 1"));
    }

    if config.pipeline.catch_up_limit == 0 {
        errors.push(validation("pipeline.catch_up_limit must be at least 1"));
    }

    if config.pipeline.retry_delays_ms.is_empty() {
        errors.push(validation(
            "pipeline.retry_delays_ms must list at least one delay",
        ));
    }
    for (i, delay) in config.pipeline.retry_delays_ms.iter().enumerate() {
        if *delay == 0 {
            errors.push(validation(format!(
                "pipeline.retry_delays_ms[{i}] must be greater than zero"
            )));
        }
    }

    for (name, direction) in [
        ("incoming", &config.translation.incoming),
        ("outgoing", &config.translation.outgoing),
    ] {
        if direction.context_size > MAX_CONTEXT_SIZE {
            errors.push(validation(format!(
                "translation.{name}.context_size must be at most {MAX_CONTEXT_SIZE}, got {}",
                direction.context_size
            )));
        }
    }

    for (i, chat) in config.translation.excluded_chats.iter().enumerate() {
        if chat.trim().is_empty() {
            errors.push(validation(format!(
                "translation.excluded_chats[{i}] must not be empty"
            )));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validation(message: impl Into<String>) -> ConfigError {
    ConfigError::Validation {
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_error(errors: &[ConfigError], needle: &str) -> bool {
        errors
            .iter()
            .any(|e| matches!(e, ConfigError::Validation { message } if message.contains(needle)))
    }

    #[test]
    fn default_config_validates() {
        let config = ParleyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn empty_database_path_fails_validation() {
        let mut config = ParleyConfig::default();
        config.storage.database_path = "".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "database_path"));
    }

    #[test]
    fn zero_cache_capacity_fails_validation() {
        let mut config = ParleyConfig::default();
        config.pipeline.cache_capacity = 0;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "cache_capacity"));
    }

    #[test]
    fn empty_retry_table_fails_validation() {
        let mut config = ParleyConfig::default();
        config.pipeline.retry_delays_ms = vec![];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "retry_delays_ms"));
    }

    #[test]
    fn zero_retry_delay_is_reported_with_index() {
        let mut config = ParleyConfig::default();
        config.pipeline.retry_delays_ms = vec![2_000, 0];
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "retry_delays_ms[1]"));
    }

    #[test]
    fn non_http_base_url_fails_validation() {
        let mut config = ParleyConfig::default();
        config.backend.base_url = "ftp://proxy".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "base_url"));
    }

    #[test]
    fn oversized_context_window_fails_validation() {
        let mut config = ParleyConfig::default();
        config.translation.outgoing.context_size = 500;
        let errors = validate_config(&config).unwrap_err();
        assert!(has_error(&errors, "translation.outgoing.context_size"));
    }

    #[test]
    fn collects_all_errors() {
        let mut config = ParleyConfig::default();
        config.pipeline.cache_capacity = 0;
        config.pipeline.catch_up_limit = 0;
        config.backend.timeout_secs = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }
}
