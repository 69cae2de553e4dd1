// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::constants::DEFAULT_CYCLE_COOLDOWN;
use crate::common::time_utils::format_remaining;
use crate::domain::error::AppError;
use crate::domain::types::{BatchSpec, CycleSummary};
use crate::services::runner::delay::{Countdown, DelayStrategy, UniformDelay};
use crate::services::runner::executor::ActionExecutor;
use futures::StreamExt;
use futures::future::BoxFuture;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Called with the 1-based cycle number after each completed cycle.
pub type CycleHook = Box<dyn Fn(u64) -> BoxFuture<'static, ()> + Send + Sync>;

/// Runs the configured batches strictly in order, cools down, and repeats.
///
/// Without a cycle limit this only returns once the shutdown token fires.
pub struct CycleOrchestrator<D: DelayStrategy = UniformDelay> {
    executor: ActionExecutor<D>,
    countdown: Countdown,
    cooldown: Duration,
    max_cycles: Option<u64>,
    on_cycle_complete: Option<CycleHook>,
}

pub fn validate_batches(batches: &[BatchSpec]) -> Result<(), AppError> {
    for (idx, batch) in batches.iter().enumerate() {
        if batch.spec.name.trim().is_empty() {
            return Err(AppError::validation(
                format!("batches[{idx}].name"),
                "batch name is empty",
            ));
        }
        batch.spec.delay.validate(&format!("batches[{idx}].delay"))?;
    }
    Ok(())
}

impl<D: DelayStrategy> CycleOrchestrator<D> {
    pub fn new(executor: ActionExecutor<D>, shutdown: CancellationToken) -> Self {
        Self {
            executor,
            countdown: Countdown::new(shutdown),
            cooldown: DEFAULT_CYCLE_COOLDOWN,
            max_cycles: None,
            on_cycle_complete: None,
        }
    }

    pub fn with_cooldown(mut self, cooldown: Duration) -> Self {
        self.cooldown = cooldown;
        self
    }

    /// `None` runs until shutdown, `Some(0)` runs nothing. No cooldown follows
    /// the final cycle.
    pub fn with_max_cycles(mut self, max_cycles: Option<u64>) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn with_countdown_tick(mut self, tick: Duration) -> Self {
        self.countdown = self.countdown.with_tick(tick);
        self
    }

    pub fn with_cycle_hook(mut self, hook: CycleHook) -> Self {
        self.on_cycle_complete = Some(hook);
        self
    }

    pub async fn run(&self, batches: &[BatchSpec]) -> Result<CycleSummary, AppError> {
        validate_batches(batches)?;
        let mut summary = CycleSummary::default();
        if self.max_cycles == Some(0) {
            tracing::info!(target: "cycle", "Cycle limit is zero; nothing to run");
            return Ok(summary);
        }

        loop {
            let cycle = summary.cycles_completed + 1;
            tracing::info!(
                target: "cycle",
                cycle,
                batches = batches.len(),
                "Starting cycle"
            );

            for (pos, batch) in batches.iter().enumerate() {
                if self.countdown.is_cancelled() {
                    return Ok(self.stopped(summary));
                }
                let total = batch.spec.iteration_count();
                if total == 0 {
                    tracing::info!(
                        target: "cycle",
                        cycle,
                        batch = %batch.spec.name,
                        configured = batch.spec.iterations,
                        "Skipping batch with non-positive count"
                    );
                    continue;
                }

                tracing::info!(
                    target: "cycle",
                    cycle,
                    position = pos + 1,
                    batch = %batch.spec.name,
                    mode = ?batch.mode,
                    iterations = total,
                    "Running batch"
                );
                let (mut ok, mut failed) = (0u64, 0u64);
                let outcomes = self.executor.run(&batch.spec, batch.mode);
                futures::pin_mut!(outcomes);
                while let Some(outcome) = outcomes.next().await {
                    if outcome.succeeded {
                        ok += 1;
                    } else {
                        failed += 1;
                    }
                }
                summary.iterations_succeeded += ok;
                summary.iterations_failed += failed;
                tracing::info!(
                    target: "cycle",
                    cycle,
                    batch = %batch.spec.name,
                    succeeded = ok,
                    failed,
                    "Batch finished"
                );
            }

            if self.countdown.is_cancelled() {
                return Ok(self.stopped(summary));
            }
            summary.cycles_completed += 1;
            if let Some(hook) = &self.on_cycle_complete {
                hook(cycle).await;
            }

            if let Some(max) = self.max_cycles
                && summary.cycles_completed >= max
            {
                tracing::info!(target: "cycle", cycles = max, "Cycle limit reached");
                return Ok(summary);
            }

            summary.cooldowns_entered += 1;
            tracing::info!(
                target: "cycle",
                cycle,
                cooldown = %format_remaining(self.cooldown),
                "Cycle complete; cooling down"
            );
            if !self.countdown.countdown(self.cooldown, "next cycle").await {
                return Ok(self.stopped(summary));
            }
            if self.cooldown.is_zero() {
                tokio::task::yield_now().await;
            }
        }
    }

    fn stopped(&self, summary: CycleSummary) -> CycleSummary {
        tracing::info!(
            target: "cycle",
            cycles = summary.cycles_completed,
            succeeded = summary.iterations_succeeded,
            failed = summary.iterations_failed,
            "Shutdown requested; orchestrator stopped"
        );
        summary
    }
}
