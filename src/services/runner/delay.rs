// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::COUNTDOWN_TICK;
use crate::common::time_utils::format_remaining;
use crate::domain::types::DelayBounds;
use rand::Rng;
use std::time::Duration;
use tokio::time::{Instant, sleep};
use tokio_util::sync::CancellationToken;

/// Picks the pause between two iterations of a batch.
pub trait DelayStrategy: Send + Sync {
    fn next_delay(&self, bounds: DelayBounds) -> Duration;
}

/// Uniform over `[min_ms, max_ms]`, both ends inclusive.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformDelay;

impl DelayStrategy for UniformDelay {
    fn next_delay(&self, bounds: DelayBounds) -> Duration {
        if bounds.max_ms <= bounds.min_ms {
            return Duration::from_millis(bounds.min_ms);
        }
        let ms = rand::thread_rng().gen_range(bounds.min_ms..=bounds.max_ms);
        Duration::from_millis(ms)
    }
}

/// Shutdown-aware timer. Every suspension point in the runner goes through here.
#[derive(Debug, Clone)]
pub struct Countdown {
    shutdown: CancellationToken,
    tick: Duration,
}

impl Countdown {
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            tick: COUNTDOWN_TICK,
        }
    }

    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick.max(Duration::from_millis(1));
        self
    }

    pub fn is_cancelled(&self) -> bool {
        self.shutdown.is_cancelled()
    }

    /// Silent pause. Returns `false` if shutdown fired first.
    pub async fn pause(&self, duration: Duration) -> bool {
        if duration.is_zero() {
            return !self.shutdown.is_cancelled();
        }
        tokio::select! {
            _ = self.shutdown.cancelled() => false,
            _ = sleep(duration) => true,
        }
    }

    /// Pause while logging the remaining time once per tick.
    pub async fn countdown(&self, duration: Duration, label: &str) -> bool {
        let deadline = Instant::now() + duration;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return !self.shutdown.is_cancelled();
            }
            tracing::info!(
                target: "cycle",
                %label,
                remaining = %format_remaining(remaining),
                "Countdown"
            );
            if !self.pause(remaining.min(self.tick)).await {
                tracing::info!(target: "cycle", %label, "Shutdown requested during countdown");
                return false;
            }
        }
    }
}
