// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Write side of the host message store.

use async_trait::async_trait;

use crate::error::ParleyError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{AttachOutcome, MessageId};

/// Attaches translation results to stored messages.
#[async_trait]
pub trait TranslationSink: PluginAdapter {
    /// Attaches `text` as the translation of `id`.
    ///
    /// Implementations must be first-writer-wins: when the message already
    /// carries a translation the call returns [`AttachOutcome::AlreadyTranslated`]
    /// and leaves the record untouched. All other message fields pass through
    /// unchanged.
    async fn attach_translation(
        &self,
        id: &MessageId,
        text: &str,
    ) -> Result<AttachOutcome, ParleyError>;
}
