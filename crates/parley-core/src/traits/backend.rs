// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Translation backend trait for the external translation service.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{BackendTranslation, ContextRequest, Direction};

/// Adapter for the external service that performs the actual translation.
///
/// An `Err` from either method is a transport failure (network, timeout,
/// decoding) and is always retryable.
#[async_trait]
pub trait TranslationBackend: PluginAdapter {
    /// Translates every value of `items` in one call.
    ///
    /// Keys are opaque to the backend and echoed back in the response. A key
    /// missing from the response, or flagged `failed`, did not translate.
    async fn translate_batch(
        &self,
        direction: Direction,
        items: BTreeMap<String, String>,
    ) -> Result<HashMap<String, BackendTranslation>, ParleyError>;

    /// Translates a single message with a window of conversation context.
    async fn translate_with_context(
        &self,
        request: ContextRequest,
    ) -> Result<BackendTranslation, ParleyError>;
}
