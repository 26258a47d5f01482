// SPDX-FileCopyrightText: 2026 Parley Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Fixed-table retry policy for failed message sets.

use std::time::Duration;

/// Delays applied before each resubmission of a failed set.
///
/// The table length is the retry budget: a set that fails its original try
/// and every resubmission is retried exactly `delays.len()` times.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    delays: Vec<Duration>,
}

impl RetryPolicy {
    pub fn new(delays: Vec<Duration>) -> Self {
        Self { delays }
    }

    /// A policy that never retries.
    pub fn disabled() -> Self {
        Self { delays: Vec::new() }
    }

    /// Delay before the resubmission that follows `attempt` completed tries
    /// beyond the original, or `None` once the budget is spent.
    pub fn delay_for(&self, attempt: u32) -> Option<Duration> {
        self.delays.get(attempt as usize).copied()
    }

    pub fn max_retries(&self) -> u32 {
        u32::try_from(self.delays.len()).unwrap_or(u32::MAX)
    }

    pub fn delays(&self) -> &[Duration] {
        &self.delays
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(vec![
            Duration::from_secs(2),
            Duration::from_secs(5),
            Duration::from_secs(10),
        ])
    }
}
