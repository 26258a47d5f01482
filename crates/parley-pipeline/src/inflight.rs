// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-flight tracking for messages and catch-up scans.
//!
//! A message id is owned by at most one job at a time. Ownership is expressed
//! as a [`Reservation`] guard that releases its ids when dropped, so every exit
//! path of a job (success, failure, panic, cancellation) gives the ids back
//! exactly once.

use std::collections::{BTreeSet, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use parley_core::types::{ChatId, MessageId};
use tracing::trace;

/// Sets of message ids and chat ids currently owned by a running job.
#[derive(Debug, Default)]
pub struct InFlightTracker {
    messages: Mutex<HashSet<MessageId>>,
    chats: Mutex<HashSet<ChatId>>,
}

impl InFlightTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomically reserves every id not already in flight and returns that subset.
    pub fn try_reserve<I>(&self, ids: I) -> BTreeSet<MessageId>
    where
        I: IntoIterator<Item = MessageId>,
    {
        let mut messages = lock(&self.messages);
        ids.into_iter()
            .filter(|id| messages.insert(id.clone()))
            .collect()
    }

    pub fn release<'a, I>(&self, ids: I)
    where
        I: IntoIterator<Item = &'a MessageId>,
    {
        let mut messages = lock(&self.messages);
        for id in ids {
            messages.remove(id);
        }
    }

    pub fn is_in_flight(&self, id: &MessageId) -> bool {
        lock(&self.messages).contains(id)
    }

    pub fn in_flight_count(&self) -> usize {
        lock(&self.messages).len()
    }

    /// Marks a catch-up scan for `chat_id` as running. Returns `false` if one already is.
    pub fn try_start_catch_up(&self, chat_id: &ChatId) -> bool {
        lock(&self.chats).insert(chat_id.clone())
    }

    pub fn finish_catch_up(&self, chat_id: &ChatId) {
        lock(&self.chats).remove(chat_id);
    }

    pub fn is_catching_up(&self, chat_id: &ChatId) -> bool {
        lock(&self.chats).contains(chat_id)
    }

    /// Like [`try_reserve`](Self::try_reserve), but returns a guard owning the reserved ids.
    pub fn reserve<I>(self: &Arc<Self>, ids: I) -> Reservation
    where
        I: IntoIterator<Item = MessageId>,
    {
        let ids = self.try_reserve(ids);
        trace!(count = ids.len(), "reserved message ids");
        Reservation {
            tracker: Arc::clone(self),
            ids,
        }
    }

    /// Like [`try_start_catch_up`](Self::try_start_catch_up), but returns a guard.
    pub fn catch_up_guard(self: &Arc<Self>, chat_id: &ChatId) -> Option<CatchUpGuard> {
        self.try_start_catch_up(chat_id).then(|| CatchUpGuard {
            tracker: Arc::clone(self),
            chat_id: chat_id.clone(),
        })
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Message ids owned by one job. Released on drop.
#[derive(Debug)]
pub struct Reservation {
    tracker: Arc<InFlightTracker>,
    ids: BTreeSet<MessageId>,
}

impl Reservation {
    pub fn ids(&self) -> &BTreeSet<MessageId> {
        &self.ids
    }

    pub fn contains(&self, id: &MessageId) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

impl Drop for Reservation {
    fn drop(&mut self) {
        if !self.ids.is_empty() {
            self.tracker.release(&self.ids);
            trace!(count = self.ids.len(), "released message ids");
        }
    }
}

/// A running catch-up scan for one chat. Cleared on drop.
#[derive(Debug)]
pub struct CatchUpGuard {
    tracker: Arc<InFlightTracker>,
    chat_id: ChatId,
}

impl CatchUpGuard {
    pub fn chat_id(&self) -> &ChatId {
        &self.chat_id
    }
}

impl Drop for CatchUpGuard {
    fn drop(&mut self) {
        self.tracker.finish_catch_up(&self.chat_id);
    }
}
