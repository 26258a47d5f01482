// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mutable settings provider for tests that flip toggles mid-run.

use std::sync::{Arc, Mutex, PoisonError};

use parley_core::traits::SettingsProvider;
use parley_core::types::TranslationSettings;

/// Settings that a test can change while the pipeline is running.
#[derive(Debug, Default)]
pub struct MockSettings {
    current: Mutex<Arc<TranslationSettings>>,
}

impl MockSettings {
    pub fn new(settings: TranslationSettings) -> Self {
        Self {
            current: Mutex::new(Arc::new(settings)),
        }
    }

    /// Apply `f` to the current settings; later snapshots see the change.
    pub fn update(&self, f: impl FnOnce(&mut TranslationSettings)) {
        let mut current = self.current.lock().unwrap_or_else(PoisonError::into_inner);
        let mut next = TranslationSettings::clone(&current);
        f(&mut next);
        *current = Arc::new(next);
    }
}

impl SettingsProvider for MockSettings {
    fn snapshot(&self) -> Arc<TranslationSettings> {
        Arc::clone(&self.current.lock().unwrap_or_else(PoisonError::into_inner))
    }
}
