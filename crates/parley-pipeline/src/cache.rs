// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded recency cache for the on-demand read path.

use std::num::NonZeroUsize;
use std::sync::{Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use parley_core::types::MessageId;

/// Least-recently-used map from message id to translated text.
///
/// All operations take a single short-lived lock; it is never held across an
/// `.await`.
pub struct RecencyCache {
    entries: Mutex<LruCache<MessageId, String>>,
}

impl RecencyCache {
    /// Creates a cache holding at most `capacity` entries (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Returns the cached translation and marks the key most recently used.
    pub fn get(&self, id: &MessageId) -> Option<String> {
        self.lock().get(id).cloned()
    }

    /// Inserts or replaces a translation.
    ///
    /// Replacing an existing key bumps its recency; inserting a new key into a
    /// full cache evicts the least recently used entry first.
    pub fn set(&self, id: MessageId, text: String) {
        self.lock().put(id, text);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    // Poisoning is ignored: every operation leaves the map consistent.
    fn lock(&self) -> MutexGuard<'_, LruCache<MessageId, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl std::fmt::Debug for RecencyCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecencyCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn id(seq: i64) -> MessageId {
        MessageId::new("chat", seq)
    }

    #[test]
    fn overflow_evicts_least_recently_used() {
        let cache = RecencyCache::new(3);
        for seq in 1..=3 {
            cache.set(id(seq), format!("t{seq}"));
        }
        cache.set(id(4), "t4".into());

        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&id(1)), None);
        assert_eq!(cache.get(&id(4)).as_deref(), Some("t4"));
    }

    #[test]
    fn get_changes_eviction_victim() {
        let cache = RecencyCache::new(3);
        for seq in 1..=3 {
            cache.set(id(seq), format!("t{seq}"));
        }
        assert!(cache.get(&id(1)).is_some());
        cache.set(id(4), "t4".into());

        assert_eq!(cache.len(), 3);
        assert!(cache.get(&id(1)).is_some());
        assert_eq!(cache.get(&id(2)), None);
    }

    #[test]
    fn replacing_a_key_bumps_recency_without_growing() {
        let cache = RecencyCache::new(2);
        cache.set(id(1), "old".into());
        cache.set(id(2), "t2".into());
        cache.set(id(1), "new".into());
        assert_eq!(cache.len(), 2);

        cache.set(id(3), "t3".into());
        assert_eq!(cache.get(&id(1)).as_deref(), Some("new"));
        assert_eq!(cache.get(&id(2)), None);
    }

    #[test]
    fn clear_empties_the_cache() {
        let cache = RecencyCache::new(4);
        cache.set(id(1), "x".into());
        cache.clear();
        assert!(cache.is_empty());
        assert_eq!(cache.get(&id(1)), None);
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let cache = RecencyCache::new(0);
        assert_eq!(cache.capacity(), 1);
        cache.set(id(1), "a".into());
        cache.set(id(2), "b".into());
        assert_eq!(cache.len(), 1);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Set(i64),
        Get(i64),
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![(0i64..8).prop_map(Op::Set), (0i64..8).prop_map(Op::Get)]
    }

    proptest! {
        #[test]
        fn matches_recency_ordered_model(capacity in 1usize..5, ops in prop::collection::vec(op(), 0..64)) {
            let cache = RecencyCache::new(capacity);
            // Most recently used last.
            let mut model: Vec<i64> = Vec::new();

            for op in ops {
                match op {
                    Op::Set(seq) => {
                        cache.set(id(seq), format!("t{seq}"));
                        model.retain(|s| *s != seq);
                        model.push(seq);
                        if model.len() > capacity {
                            model.remove(0);
                        }
                    }
                    Op::Get(seq) => {
                        let hit = cache.get(&id(seq));
                        if let Some(pos) = model.iter().position(|s| *s == seq) {
                            let expected = format!("t{seq}");
                            prop_assert_eq!(hit.as_deref(), Some(expected.as_str()));
                            model.remove(pos);
                            model.push(seq);
                        } else {
                            prop_assert_eq!(hit, None);
                        }
                    }
                }
                prop_assert!(cache.len() <= capacity);
                prop_assert_eq!(cache.len(), model.len());
            }
        }
    }
}
