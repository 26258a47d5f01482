// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live configuration capability injected into the pipeline.

use std::sync::Arc;

use crate::types::TranslationSettings;

/// Supplies the current translation toggles.
///
/// Called at every decision point instead of being cached, so a settings
/// change applies to the next batch without a restart.
pub trait SettingsProvider: Send + Sync + 'static {
    fn snapshot(&self) -> Arc<TranslationSettings>;
}

/// Fixed settings, useful for tools and tests that never change them.
impl SettingsProvider for TranslationSettings {
    fn snapshot(&self) -> Arc<TranslationSettings> {
        Arc::new(self.clone())
    }
}
