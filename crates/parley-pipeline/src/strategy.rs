// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Routing between batch and context-aware translation.

use parley_core::types::{ContextMode, Direction, TranslationSettings};

/// How one job's messages are sent to the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// One batch call for the whole set, no conversation context.
    Batch,
    /// One call per message carrying up to `window` recent turns of its chat.
    Contextual { window: usize },
}

/// Picks the strategy for `direction` from a settings snapshot.
///
/// Pure; callers pass a fresh snapshot per job so mode changes apply to the
/// next batch.
pub fn select_strategy(settings: &TranslationSettings, direction: Direction) -> Strategy {
    let direction = settings.direction(direction);
    match direction.mode {
        ContextMode::Single => Strategy::Batch,
        ContextMode::Context => Strategy::Contextual {
            window: direction.context_size,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn directions_are_routed_independently() {
        let mut settings = TranslationSettings::default();
        settings.incoming.mode = ContextMode::Context;
        settings.incoming.context_size = 6;

        assert_eq!(
            select_strategy(&settings, Direction::Incoming),
            Strategy::Contextual { window: 6 }
        );
        assert_eq!(select_strategy(&settings, Direction::Outgoing), Strategy::Batch);
    }

    #[test]
    fn zero_context_size_keeps_per_message_calls_with_empty_window() {
        let mut settings = TranslationSettings::default();
        settings.outgoing.mode = ContextMode::Context;
        settings.outgoing.context_size = 0;
        assert_eq!(
            select_strategy(&settings, Direction::Outgoing),
            Strategy::Contextual { window: 0 }
        );
    }
}
