// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The translation pipeline and its entry points.
//!
//! A [`Pipeline`] is an explicitly constructed handle (cheap to clone) that
//! owns the recency cache, the in-flight tracker, and every background task it
//! spawns. Candidate messages flow through one path regardless of where they
//! came from:
//!
//! 1. filter to messages that have text, lack a translation, and are allowed
//!    by the current settings
//! 2. reserve ids in the in-flight tracker (already reserved ids are dropped)
//! 3. pick batch or context translation from a fresh settings snapshot
//! 4. write successes through the persistence writer, release the ids, and
//!    hand failures to the retry scheduler

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use parley_core::traits::{MessageSource, SettingsProvider, TranslationBackend, TranslationSink};
use parley_core::types::{
    AccountContext, AttachOutcome, ChatId, Direction, MessageId, MessageRef, RetryJob,
    TranslationSettings,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, warn};

use crate::batch::BatchTranslator;
use crate::cache::RecencyCache;
use crate::context::ContextTranslator;
use crate::inflight::{CatchUpGuard, InFlightTracker, Reservation};
use crate::observer;
use crate::retry::RetryPolicy;
use crate::strategy::{select_strategy, Strategy};
use crate::writer::PersistenceWriter;

/// Tuning knobs fixed at construction time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PipelineOptions {
    /// Entries kept by the recency cache.
    pub cache_capacity: usize,
    /// Most recent messages inspected by a catch-up scan.
    pub catch_up_limit: usize,
    pub retry: RetryPolicy,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            cache_capacity: 500,
            catch_up_limit: 50,
            retry: RetryPolicy::default(),
        }
    }
}

/// What happened to the messages a job (or a retry) handled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobReport {
    /// Translations written to the store.
    pub attached: usize,
    /// Successful translations not written because the message was already
    /// translated or had disappeared.
    pub skipped: usize,
    /// Candidates dropped because another job already owned them.
    pub superseded: usize,
    /// Messages handed to the retry scheduler.
    pub failed: BTreeSet<MessageId>,
}

impl JobReport {
    pub fn merge(mut self, other: JobReport) -> JobReport {
        self.attached += other.attached;
        self.skipped += other.skipped;
        self.superseded += other.superseded;
        self.failed.extend(other.failed);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.attached == 0 && self.skipped == 0 && self.superseded == 0 && self.failed.is_empty()
    }
}

/// Result of a catch-up scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatchUpOutcome {
    /// Another scan of the same chat was running; nothing was done.
    AlreadyRunning,
    /// Translation is off globally or for this chat.
    Disabled,
    /// The recent-history read failed.
    ScanFailed,
    Completed(JobReport),
}

/// Background translation pipeline.
#[derive(Clone)]
pub struct Pipeline {
    inner: Arc<Inner>,
}

pub(crate) struct Inner {
    source: Arc<dyn MessageSource>,
    settings: Arc<dyn SettingsProvider>,
    batch: BatchTranslator,
    context: ContextTranslator,
    writer: PersistenceWriter,
    cache: RecencyCache,
    in_flight: Arc<InFlightTracker>,
    retry: RetryPolicy,
    catch_up_limit: usize,
    pub(crate) tasks: TaskTracker,
    pub(crate) shutdown: CancellationToken,
    started: AtomicBool,
    account: OnceLock<AccountContext>,
    observer: Mutex<Option<JoinHandle<()>>>,
}

impl Pipeline {
    pub fn new(
        source: Arc<dyn MessageSource>,
        sink: Arc<dyn TranslationSink>,
        backend: Arc<dyn TranslationBackend>,
        settings: Arc<dyn SettingsProvider>,
        options: PipelineOptions,
    ) -> Self {
        let inner = Inner {
            batch: BatchTranslator::new(Arc::clone(&backend)),
            context: ContextTranslator::new(Arc::clone(&source), Arc::clone(&backend)),
            writer: PersistenceWriter::new(Arc::clone(&source), sink),
            source,
            settings,
            cache: RecencyCache::new(options.cache_capacity),
            in_flight: Arc::new(InFlightTracker::new()),
            retry: options.retry,
            catch_up_limit: options.catch_up_limit,
            tasks: TaskTracker::new(),
            shutdown: CancellationToken::new(),
            started: AtomicBool::new(false),
            account: OnceLock::new(),
            observer: Mutex::new(None),
        };
        Self {
            inner: Arc::new(inner),
        }
    }

    /// Subscribes to message arrivals and translates them in the background.
    ///
    /// Returns `false` (and does nothing) if the observer was already started.
    /// Must be called from within a tokio runtime.
    ///
    /// `account` is recorded for logging and [`Pipeline::account`] only.
    /// Whether a message is the account's own comes from the source's
    /// `is_own_message`, never from this value.
    pub fn start_background_observer(&self, account: AccountContext) -> bool {
        if self
            .inner
            .started
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!("background observer already started");
            return false;
        }

        info!(account_id = account.account_id.as_str(), "starting background observer");
        let _ = self.inner.account.set(account);

        // Subscribe before returning so no arrival after this call is missed.
        let receiver = self.inner.source.subscribe();
        let handle = tokio::spawn(observer::run(Arc::clone(&self.inner), receiver));
        *self
            .inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = Some(handle);
        true
    }

    pub fn is_started(&self) -> bool {
        self.inner.started.load(Ordering::Acquire)
    }

    /// Account the observer was started for, if any. Informational only.
    pub fn account(&self) -> Option<&AccountContext> {
        self.inner.account.get()
    }

    /// Starts a catch-up scan of `chat_id` in the background.
    ///
    /// Returns `false` immediately if a scan of the same chat is already running.
    pub fn catch_up(&self, chat_id: ChatId) -> bool {
        let Some(guard) = self.inner.in_flight.catch_up_guard(&chat_id) else {
            debug!(chat_id = %chat_id, "catch-up already running");
            return false;
        };
        let inner = Arc::clone(&self.inner);
        self.inner.tasks.spawn(async move {
            inner.catch_up_guarded(guard).await;
        });
        true
    }

    /// Runs a catch-up scan of `chat_id` to completion.
    ///
    /// Retries scheduled for failed messages continue in the background.
    pub async fn run_catch_up(&self, chat_id: &ChatId) -> CatchUpOutcome {
        match self.inner.in_flight.catch_up_guard(chat_id) {
            Some(guard) => self.inner.catch_up_guarded(guard).await,
            None => {
                debug!(chat_id = %chat_id, "catch-up already running");
                CatchUpOutcome::AlreadyRunning
            }
        }
    }

    /// Processes one batch of arrival notifications, as the observer does.
    pub async fn handle_incoming(&self, ids: Vec<MessageId>) -> JobReport {
        self.inner.handle_incoming(ids).await
    }

    /// Returns an already computed translation without touching the backend.
    pub fn lookup_cached(&self, id: &MessageId) -> Option<String> {
        self.inner.cache.get(id)
    }

    pub fn clear_cache(&self) {
        self.inner.cache.clear();
        debug!("translation cache cleared");
    }

    /// Returns a translation for `message`, asking the backend only when
    /// neither the cache nor the message itself has one.
    ///
    /// Empty messages come back unchanged. Backend failures yield `None`;
    /// nothing is written to the store.
    pub async fn translate_on_demand(&self, message: &MessageRef) -> Option<String> {
        if let Some(cached) = self.inner.cache.get(&message.id) {
            return Some(cached);
        }
        if let Some(existing) = &message.translation {
            self.inner.cache.set(message.id.clone(), existing.clone());
            return Some(existing.clone());
        }
        if !message.has_text() {
            return Some(message.text.clone());
        }

        let direction = message.direction();
        let settings = self.inner.settings.snapshot();
        let translated = self
            .inner
            .translate_text(
                &settings,
                direction,
                message.chat_id(),
                &message.text,
                Some(&message.id),
            )
            .await?;
        self.inner.cache.set(message.id.clone(), translated.clone());
        Some(translated)
    }

    /// Translates a draft before it is sent, falling back to the original
    /// text when outgoing translation is off or the backend fails.
    pub async fn translate_outgoing(&self, chat_id: &ChatId, text: &str) -> String {
        let settings = self.inner.settings.snapshot();
        if text.trim().is_empty() || !settings.allows(Direction::Outgoing, chat_id) {
            return text.to_string();
        }

        match self
            .inner
            .translate_text(&settings, Direction::Outgoing, chat_id, text, None)
            .await
        {
            Some(translated) => translated,
            None => {
                warn!(chat_id = %chat_id, "outgoing translation failed, sending original text");
                text.to_string()
            }
        }
    }

    pub fn in_flight(&self) -> &InFlightTracker {
        &self.inner.in_flight
    }

    pub fn cache(&self) -> &RecencyCache {
        &self.inner.cache
    }

    /// Token cancelled by [`shutdown`](Self::shutdown).
    pub fn cancellation_token(&self) -> CancellationToken {
        self.inner.shutdown.clone()
    }

    /// Waits until every spawned job and pending retry has finished.
    ///
    /// Not meant to be called from two places at once.
    pub async fn wait_idle(&self) {
        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        self.inner.tasks.reopen();
    }

    /// Stops the observer, abandons pending retry timers, and waits for
    /// running jobs to finish.
    pub async fn shutdown(&self) {
        info!("shutting down translation pipeline");
        self.inner.shutdown.cancel();

        let observer = self
            .inner
            .observer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(handle) = observer
            && let Err(e) = handle.await
        {
            warn!(error = %e, "observer task ended abnormally");
        }

        self.inner.tasks.close();
        self.inner.tasks.wait().await;
        info!("translation pipeline stopped");
    }
}

impl Inner {
    pub(crate) async fn handle_incoming(self: &Arc<Self>, ids: Vec<MessageId>) -> JobReport {
        let settings = self.settings.snapshot();
        if !settings.enabled {
            debug!(count = ids.len(), "translation disabled, ignoring arrivals");
            return JobReport::default();
        }

        let ids: BTreeSet<MessageId> = ids.into_iter().collect();
        let mut candidates = Vec::with_capacity(ids.len());
        for id in ids {
            if self.in_flight.is_in_flight(&id) {
                continue;
            }
            match self.source.get_message(&id).await {
                Ok(Some(message)) if is_candidate(&settings, &message) => candidates.push(message),
                Ok(Some(_)) => debug!(message_id = %id, "arrival needs no translation"),
                Ok(None) => debug!(message_id = %id, "arrival no longer exists"),
                Err(e) => warn!(message_id = %id, error = %e, "failed to read arrival"),
            }
        }

        self.dispatch(candidates, 0, None).await
    }

    async fn catch_up_guarded(self: &Arc<Self>, guard: CatchUpGuard) -> CatchUpOutcome {
        let chat_id = guard.chat_id().clone();
        let settings = self.settings.snapshot();
        if !settings.is_chat_enabled(&chat_id) {
            debug!(chat_id = %chat_id, "translation disabled for chat, skipping catch-up");
            return CatchUpOutcome::Disabled;
        }

        let recent = match self.source.scan_recent(&chat_id, self.catch_up_limit).await {
            Ok(recent) => recent,
            Err(e) => {
                warn!(chat_id = %chat_id, error = %e, "catch-up scan failed");
                return CatchUpOutcome::ScanFailed;
            }
        };

        let candidates: Vec<MessageRef> = recent
            .into_iter()
            .filter(|m| is_candidate(&settings, m) && !self.in_flight.is_in_flight(&m.id))
            .collect();
        if candidates.is_empty() {
            debug!(chat_id = %chat_id, "catch-up found nothing to translate");
            return CatchUpOutcome::Completed(JobReport::default());
        }

        info!(chat_id = %chat_id, count = candidates.len(), "catching up on missed messages");
        let report = self.dispatch(candidates, 0, Some(chat_id)).await;
        drop(guard);
        CatchUpOutcome::Completed(report)
    }

    /// Splits candidates by direction and runs both directions concurrently.
    async fn dispatch(
        self: &Arc<Self>,
        messages: Vec<MessageRef>,
        attempt: u32,
        chat_hint: Option<ChatId>,
    ) -> JobReport {
        let (outgoing, incoming): (Vec<_>, Vec<_>) =
            messages.into_iter().partition(|m| m.is_own_message);
        let (incoming, outgoing) = tokio::join!(
            self.reserve_and_run(Direction::Incoming, incoming, attempt, chat_hint.clone()),
            self.reserve_and_run(Direction::Outgoing, outgoing, attempt, chat_hint),
        );
        incoming.merge(outgoing)
    }

    async fn reserve_and_run(
        self: &Arc<Self>,
        direction: Direction,
        messages: Vec<MessageRef>,
        attempt: u32,
        chat_hint: Option<ChatId>,
    ) -> JobReport {
        let unique: BTreeMap<MessageId, MessageRef> =
            messages.into_iter().map(|m| (m.id.clone(), m)).collect();
        if unique.is_empty() {
            return JobReport::default();
        }

        let reservation = self.in_flight.reserve(unique.keys().cloned());
        let superseded = unique.len() - reservation.len();
        if superseded > 0 {
            debug!(direction = %direction, superseded, "skipping messages owned by another job");
        }
        if reservation.is_empty() {
            return JobReport {
                superseded,
                ..JobReport::default()
            };
        }

        let owned: Vec<MessageRef> = unique
            .into_values()
            .filter(|m| reservation.contains(&m.id))
            .collect();
        let mut report = self
            .run_job(direction, reservation, owned, attempt, chat_hint)
            .await;
        report.superseded += superseded;
        report
    }

    async fn run_job(
        self: &Arc<Self>,
        direction: Direction,
        reservation: Reservation,
        messages: Vec<MessageRef>,
        attempt: u32,
        chat_hint: Option<ChatId>,
    ) -> JobReport {
        let settings = self.settings.snapshot();
        let strategy = select_strategy(&settings, direction);
        debug!(
            direction = %direction,
            count = messages.len(),
            attempt,
            ?strategy,
            "translating messages"
        );

        let results = match strategy {
            Strategy::Batch => {
                let items: Vec<(MessageId, String)> = messages
                    .iter()
                    .map(|m| (m.id.clone(), m.text.clone()))
                    .collect();
                self.batch.translate(direction, &items).await
            }
            Strategy::Contextual { window } => {
                self.context.translate(direction, window, messages).await
            }
        };

        let mut report = JobReport::default();
        for result in results {
            if !result.succeeded {
                report.failed.insert(result.message_id);
                continue;
            }
            match self
                .writer
                .store(&result.message_id, &result.translated_text)
                .await
            {
                Ok(AttachOutcome::Attached) => {
                    self.cache.set(result.message_id, result.translated_text);
                    report.attached += 1;
                }
                Ok(_) => report.skipped += 1,
                Err(e) => {
                    warn!(message_id = %result.message_id, error = %e, "failed to store translation");
                    report.failed.insert(result.message_id);
                }
            }
        }

        // Ids go back before the retry is scheduled; the retry re-reserves them.
        drop(reservation);

        if !report.failed.is_empty() {
            self.schedule_retry(RetryJob {
                message_ids: report.failed.clone(),
                direction,
                attempt,
                chat_hint,
            });
        }
        report
    }

    fn schedule_retry(self: &Arc<Self>, job: RetryJob) {
        let Some(delay) = self.retry.delay_for(job.attempt) else {
            error!(
                direction = %job.direction,
                attempts = job.attempt + 1,
                count = job.message_ids.len(),
                chat_id = job.chat_hint.as_ref().map(ChatId::as_str),
                "retries exhausted, giving up on messages"
            );
            return;
        };

        warn!(
            direction = %job.direction,
            attempt = job.attempt + 1,
            count = job.message_ids.len(),
            delay_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
            "scheduling retry"
        );

        let inner = Arc::clone(self);
        self.tasks.spawn(async move {
            tokio::select! {
                _ = inner.shutdown.cancelled() => {
                    debug!(count = job.message_ids.len(), "pending retry dropped on shutdown");
                }
                _ = tokio::time::sleep(delay) => {
                    inner.fire_retry(job).await;
                }
            }
        });
    }

    /// Revalidates a failed set against the store and resubmits what is left.
    async fn fire_retry(self: &Arc<Self>, job: RetryJob) -> JobReport {
        let next_attempt = job.attempt + 1;
        let settings = self.settings.snapshot();

        let mut survivors = Vec::with_capacity(job.message_ids.len());
        let mut unreadable = BTreeSet::new();
        for id in &job.message_ids {
            match self.source.get_message(id).await {
                Ok(Some(message)) if message.has_translation() => {
                    debug!(message_id = %id, "translated elsewhere, dropping from retry");
                }
                Ok(Some(message)) if !settings.allows(job.direction, message.chat_id()) => {
                    debug!(message_id = %id, "translation disabled, dropping from retry");
                }
                Ok(Some(message)) => survivors.push(message),
                Ok(None) => debug!(message_id = %id, "message gone, dropping from retry"),
                Err(e) => {
                    warn!(message_id = %id, error = %e, "failed to revalidate message");
                    unreadable.insert(id.clone());
                }
            }
        }

        let mut report = JobReport::default();
        if survivors.is_empty() {
            debug!(attempt = next_attempt, "nothing left to retry");
        } else {
            info!(
                direction = %job.direction,
                attempt = next_attempt,
                count = survivors.len(),
                "resubmitting failed messages"
            );
            report = self
                .reserve_and_run(job.direction, survivors, next_attempt, job.chat_hint.clone())
                .await;
        }

        if !unreadable.is_empty() {
            report.failed.extend(unreadable.iter().cloned());
            self.schedule_retry(RetryJob {
                message_ids: unreadable,
                direction: job.direction,
                attempt: next_attempt,
                chat_hint: job.chat_hint,
            });
        }
        report
    }

    async fn translate_text(
        &self,
        settings: &TranslationSettings,
        direction: Direction,
        chat_id: &ChatId,
        text: &str,
        before: Option<&MessageId>,
    ) -> Option<String> {
        match select_strategy(settings, direction) {
            Strategy::Batch => self.batch.translate_text(direction, text).await,
            Strategy::Contextual { window } => {
                self.context
                    .translate_text(direction, chat_id, window, text, before)
                    .await
            }
        }
    }
}

fn is_candidate(settings: &TranslationSettings, message: &MessageRef) -> bool {
    message.has_text()
        && !message.has_translation()
        && settings.allows(message.direction(), message.chat_id())
}
