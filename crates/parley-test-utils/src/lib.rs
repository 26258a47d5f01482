// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parley integration tests.
//!
//! Provides mock adapters for fast, deterministic tests without a database or
//! a running translation proxy.
//!
//! # Components
//!
//! - [`MemoryStore`] - in-memory message store with arrival publishing and attach counting
//! - [`MockBackend`] - scripted translation backend recording every request
//! - [`MockSettings`] - settings provider that can be changed mid-test

pub mod mock_backend;
pub mod mock_settings;
pub mod mock_store;

pub use mock_backend::{BatchCall, MockBackend};
pub use mock_settings::MockSettings;
pub use mock_store::{incoming_message, own_message, MemoryStore};
