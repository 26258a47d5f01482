// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parley translation pipeline.
//!
//! This crate provides the error type, the domain types, and the collaborator
//! traits (message store, translation backend, settings) that the pipeline is
//! built against. Concrete adapters live in their own crates.

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::ParleyError;
pub use types::{
    AccountContext, AdapterType, AttachOutcome, BackendTranslation, ChatId, ContextMode,
    ContextRequest, ContextTurn, Direction, DirectionSettings, HealthStatus, MessageId,
    MessageRef, RetryJob, TranslationResult, TranslationSettings, TurnRole,
};

pub use traits::{
    MessageSource, PluginAdapter, SettingsProvider, TranslationBackend, TranslationSink,
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn message(seq: i64, own: bool, text: &str) -> MessageRef {
        MessageRef {
            id: MessageId::new("chat-1", seq),
            text: text.to_string(),
            timestamp: 1_700_000_000 + seq,
            is_own_message: own,
            translation: None,
        }
    }

    #[test]
    fn parley_error_variants_render() {
        let err = ParleyError::backend("connection refused");
        assert!(err.is_transport());
        assert_eq!(err.to_string(), "backend error: connection refused");

        let timeout = ParleyError::Timeout {
            duration: std::time::Duration::from_secs(15),
        };
        assert!(timeout.is_transport());

        let storage = ParleyError::Storage {
            source: Box::new(std::io::Error::other("disk full")),
        };
        assert!(!storage.is_transport());

        let missing = ParleyError::NotFound {
            kind: "message".into(),
            id: "chat-1/4".into(),
        };
        assert_eq!(missing.to_string(), "message not found: chat-1/4");
    }

    #[test]
    fn direction_follows_authorship() {
        assert_eq!(message(1, true, "hi").direction(), Direction::Outgoing);
        assert_eq!(message(2, false, "hallo").direction(), Direction::Incoming);
    }

    #[test]
    fn direction_and_mode_parse_lowercase() {
        assert_eq!(Direction::from_str("incoming").unwrap(), Direction::Incoming);
        assert_eq!(Direction::Outgoing.to_string(), "outgoing");
        assert_eq!(ContextMode::from_str("context").unwrap(), ContextMode::Context);

        let json = serde_json::to_string(&ContextMode::Single).unwrap();
        assert_eq!(json, "\"single\"");
    }

    #[test]
    fn message_id_orders_by_chat_then_sequence() {
        let a = MessageId::new("a", 9);
        let b = MessageId::new("b", 1);
        let a2 = MessageId::new("a", 10);
        assert!(a < a2);
        assert!(a2 < b);
        assert_eq!(a.to_string(), "a/9");
    }

    #[test]
    fn context_turn_labels_speaker() {
        assert_eq!(ContextTurn::from_message(&message(1, true, "x")).role, TurnRole::Me);
        assert_eq!(
            ContextTurn::from_message(&message(2, false, "y")).role,
            TurnRole::Them
        );
        assert_eq!(serde_json::to_string(&TurnRole::Them).unwrap(), "\"them\"");
    }

    #[test]
    fn whitespace_only_text_is_not_translatable() {
        assert!(!message(1, false, "  \n").has_text());
        assert!(message(1, false, "Guten Tag").has_text());
    }

    #[test]
    fn settings_gate_by_global_direction_and_chat() {
        let mut settings = TranslationSettings::default();
        let chat = ChatId::from("chat-1");
        assert!(settings.allows(Direction::Incoming, &chat));

        settings.outgoing.enabled = false;
        assert!(!settings.allows(Direction::Outgoing, &chat));
        assert!(settings.allows(Direction::Incoming, &chat));

        settings.excluded_chats.insert(chat.clone());
        assert!(!settings.allows(Direction::Incoming, &chat));

        settings.excluded_chats.clear();
        settings.enabled = false;
        assert!(!settings.allows(Direction::Incoming, &chat));
    }

    #[test]
    fn static_settings_act_as_provider() {
        let settings = TranslationSettings::default();
        let provider: &dyn SettingsProvider = &settings;
        assert_eq!(*provider.snapshot(), settings);
    }

    #[test]
    fn all_traits_are_object_safe() {
        fn _source(_: &dyn MessageSource) {}
        fn _sink(_: &dyn TranslationSink) {}
        fn _backend(_: &dyn TranslationBackend) {}
        fn _settings(_: &dyn SettingsProvider) {}
    }
}
