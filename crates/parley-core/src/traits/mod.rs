// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions for the translation pipeline.
//!
//! The pipeline owns none of its collaborators: the message store, the
//! translation backend, and the settings store are all reached through the
//! traits below. Async traits use `#[async_trait]` for dynamic dispatch.

pub mod adapter;
pub mod backend;
pub mod settings;
pub mod sink;
pub mod source;

pub use adapter::PluginAdapter;
pub use backend::TranslationBackend;
pub use settings::SettingsProvider;
pub use sink::TranslationSink;
pub use source::MessageSource;
