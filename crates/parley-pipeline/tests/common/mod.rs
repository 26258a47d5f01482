// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared wiring for pipeline integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use parley_core::types::TranslationSettings;
use parley_pipeline::{Pipeline, PipelineOptions};
use parley_test_utils::{MemoryStore, MockBackend, MockSettings};

/// A pipeline wired to an in-memory store, a scripted backend, and mutable settings.
pub struct TestHarness {
    pub store: Arc<MemoryStore>,
    pub backend: Arc<MockBackend>,
    pub settings: Arc<MockSettings>,
    pub pipeline: Pipeline,
}

impl TestHarness {
    pub fn new() -> Self {
        Self::with_settings(TranslationSettings::default())
    }

    pub fn with_settings(settings: TranslationSettings) -> Self {
        Self::build(settings, PipelineOptions::default())
    }

    pub fn build(settings: TranslationSettings, options: PipelineOptions) -> Self {
        let store = Arc::new(MemoryStore::new());
        let backend = Arc::new(MockBackend::new());
        let settings = Arc::new(MockSettings::new(settings));
        let pipeline = Pipeline::new(
            store.clone(),
            store.clone(),
            backend.clone(),
            settings.clone(),
            options,
        );
        Self {
            store,
            backend,
            settings,
            pipeline,
        }
    }
}
