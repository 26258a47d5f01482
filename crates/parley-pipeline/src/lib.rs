// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Background translation pipeline for the Parley chat translator.
//!
//! Watches a stream of message arrivals, decides which messages need a
//! translation, keeps two jobs from working on the same message, calls the
//! translation backend in batch or context mode, retries transient failures
//! on a fixed schedule, and attaches each result to its message exactly once.
//!
//! # Components
//!
//! - [`RecencyCache`] - bounded LRU of finished translations for read paths
//! - [`InFlightTracker`] - message-level and chat-level ownership guards
//! - [`select_strategy`] - batch vs. context routing per direction
//! - [`BatchTranslator`] / [`ContextTranslator`] - the two backend call shapes
//! - [`RetryPolicy`] - the fixed delay table for resubmissions
//! - [`PersistenceWriter`] - first-writer-wins result storage
//! - [`Pipeline`] - the entry points tying it all together

pub mod batch;
pub mod cache;
pub mod context;
pub mod inflight;
mod observer;
pub mod pipeline;
pub mod retry;
pub mod strategy;
pub mod writer;

pub use batch::BatchTranslator;
pub use cache::RecencyCache;
pub use context::ContextTranslator;
pub use inflight::{CatchUpGuard, InFlightTracker, Reservation};
pub use pipeline::{CatchUpOutcome, JobReport, Pipeline, PipelineOptions};
pub use retry::RetryPolicy;
pub use strategy::{select_strategy, Strategy};
pub use writer::PersistenceWriter;
