// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live arrival loop behind `Pipeline::start_background_observer`.

use std::sync::Arc;

use parley_core::types::MessageId;
use tokio::sync::broadcast::{
    self,
    error::{RecvError, TryRecvError},
};
use tracing::{debug, info, warn};

use crate::pipeline::Inner;

/// Fans each arrival notification out into its own tracked job until the
/// pipeline shuts down or the source closes its channel.
///
/// Notifications already queued when shutdown is requested are still
/// dispatched, so the pipeline's shutdown waits for them too.
pub(crate) async fn run(inner: Arc<Inner>, mut arrivals: broadcast::Receiver<Vec<MessageId>>) {
    info!("background observer running");

    loop {
        tokio::select! {
            _ = inner.shutdown.cancelled() => {
                info!("shutdown requested, stopping background observer");
                drain(&inner, &mut arrivals);
                break;
            }
            received = arrivals.recv() => match received {
                Ok(ids) => dispatch(&inner, ids),
                Err(RecvError::Lagged(skipped)) => {
                    // Missed ids stay untranslated until a catch-up scan finds them.
                    warn!(skipped, "background observer lagged behind arrivals");
                }
                Err(RecvError::Closed) => {
                    info!("message source closed, stopping background observer");
                    break;
                }
            }
        }
    }
}

fn drain(inner: &Arc<Inner>, arrivals: &mut broadcast::Receiver<Vec<MessageId>>) {
    loop {
        match arrivals.try_recv() {
            Ok(ids) => dispatch(inner, ids),
            Err(TryRecvError::Lagged(skipped)) => {
                warn!(skipped, "background observer lagged behind arrivals");
            }
            Err(TryRecvError::Empty | TryRecvError::Closed) => break,
        }
    }
}

fn dispatch(inner: &Arc<Inner>, ids: Vec<MessageId>) {
    if ids.is_empty() {
        return;
    }
    debug!(count = ids.len(), "messages arrived");
    let job = Arc::clone(inner);
    inner.tasks.spawn(async move {
        job.handle_incoming(ids).await;
    });
}
