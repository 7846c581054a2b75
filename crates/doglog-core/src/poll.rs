// Copyright 2025-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Adaptive delay between tail cycles.

use std::time::Duration;

use async_trait::async_trait;

/// Minimum delay between two searches while tailing.
pub const MIN_DELAY: Duration = Duration::from_secs(5);
/// Maximum delay between two searches while tailing.
pub const MAX_DELAY: Duration = Duration::from_secs(30);
/// Back-off factor applied when a cycle found nothing.
pub const DELAY_INCREASE_FACTOR: u32 = 2;

/// Tracks the delay between tail cycles.
///
/// Every cycle that found nothing waits the current delay, then doubles it
/// (up to the maximum). A cycle that found records drops it back to the
/// minimum before waiting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollState {
    delay: Duration,
    min: Duration,
    max: Duration,
}

impl Default for PollState {
    fn default() -> Self {
        PollState::new(MIN_DELAY, MAX_DELAY)
    }
}

impl PollState {
    pub fn new(min: Duration, max: Duration) -> Self {
        let max = max.max(min);
        PollState {
            delay: min,
            min,
            max,
        }
    }

    /// Delay the next empty cycle will wait.
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Records a completed cycle and returns how long to wait before the next one.
    ///
    /// A failed cycle counts as one that found nothing.
    pub fn register(&mut self, found: bool) -> Duration {
        if found {
            self.delay = self.min;
            return self.delay;
        }
        let wait = self.delay;
        self.delay = self
            .delay
            .saturating_mul(DELAY_INCREASE_FACTOR)
            .min(self.max);
        wait
    }
}

/// Source of the waits between tail cycles.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Real clock backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

#[async_trait]
impl Clock for TokioClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}
