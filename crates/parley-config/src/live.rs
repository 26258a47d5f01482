// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Hot-swappable translation settings.

use std::sync::Arc;

use arc_swap::ArcSwap;
use parley_core::traits::SettingsProvider;
use parley_core::types::TranslationSettings;
use tracing::info;

use crate::model::TranslationConfig;

/// Settings store read by the pipeline at every decision point.
///
/// Readers get a consistent snapshot without locking; writers replace the
/// whole snapshot atomically.
#[derive(Debug)]
pub struct LiveSettings {
    current: ArcSwap<TranslationSettings>,
}

impl LiveSettings {
    pub fn new(settings: TranslationSettings) -> Self {
        Self {
            current: ArcSwap::from_pointee(settings),
        }
    }

    pub fn from_config(config: &TranslationConfig) -> Self {
        Self::new(config.to_settings())
    }

    /// Replaces the current settings. In-flight jobs keep the snapshot they read.
    pub fn update(&self, settings: TranslationSettings) {
        info!(
            enabled = settings.enabled,
            incoming = settings.incoming.enabled,
            outgoing = settings.outgoing.enabled,
            excluded = settings.excluded_chats.len(),
            "translation settings updated"
        );
        self.current.store(Arc::new(settings));
    }

    /// Applies `f` to a copy of the current settings and stores the result.
    pub fn modify(&self, f: impl Fn(&mut TranslationSettings)) {
        self.current.rcu(|current| {
            let mut next = TranslationSettings::clone(current);
            f(&mut next);
            next
        });
    }
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self::new(TranslationSettings::default())
    }
}

impl SettingsProvider for LiveSettings {
    fn snapshot(&self) -> Arc<TranslationSettings> {
        self.current.load_full()
    }
}
