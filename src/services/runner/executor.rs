// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::types::{ActionSpec, BatchMode, Direction, IterationOutcome};
use crate::services::runner::delay::{Countdown, DelayStrategy, UniformDelay};
use futures::Stream;
use futures::stream;
use tokio_util::sync::CancellationToken;

/// Drives one batch: N iterations of a single action with paced gaps.
///
/// Outcomes are yielded lazily; the pause before iteration `i + 1` only runs
/// once the consumer polls for it, and no pause follows the final iteration.
/// An action error marks its own iteration failed and never ends the batch.
pub struct ActionExecutor<D: DelayStrategy = UniformDelay> {
    delay: D,
    countdown: Countdown,
}

struct RunState {
    index: u64,
    direction: Option<Direction>,
}

impl<D: DelayStrategy> ActionExecutor<D> {
    pub fn new(delay: D, shutdown: CancellationToken) -> Self {
        Self {
            delay,
            countdown: Countdown::new(shutdown),
        }
    }

    pub fn run_action<'a>(
        &'a self,
        spec: &'a ActionSpec,
    ) -> impl Stream<Item = IterationOutcome> + Send + 'a {
        self.run(spec, BatchMode::Single)
    }

    /// Direction starts at `Forward` and flips after every iteration,
    /// whatever the iteration's outcome.
    pub fn run_bidirectional<'a>(
        &'a self,
        spec: &'a ActionSpec,
    ) -> impl Stream<Item = IterationOutcome> + Send + 'a {
        self.run(spec, BatchMode::Bidirectional)
    }

    pub fn run<'a>(
        &'a self,
        spec: &'a ActionSpec,
        mode: BatchMode,
    ) -> impl Stream<Item = IterationOutcome> + Send + 'a {
        let total = spec.iteration_count();
        let start = RunState {
            index: 1,
            direction: match mode {
                BatchMode::Single => None,
                BatchMode::Bidirectional => Some(Direction::Forward),
            },
        };

        stream::unfold(start, move |state| async move {
            if state.index > total {
                return None;
            }
            if state.index > 1 {
                let pause = self.delay.next_delay(spec.delay);
                tracing::debug!(
                    target: "runner",
                    batch = %spec.name,
                    pause_ms = pause.as_millis() as u64,
                    "Pausing before next iteration"
                );
                if !self.countdown.pause(pause).await {
                    tracing::info!(
                        target: "runner",
                        batch = %spec.name,
                        completed = state.index - 1,
                        total,
                        "Shutdown requested; ending batch early"
                    );
                    return None;
                }
            }

            let outcome = self.execute_once(spec, state.index, total, state.direction).await;
            let next = RunState {
                index: state.index + 1,
                direction: state.direction.map(Direction::flipped),
            };
            Some((outcome, next))
        })
    }

    async fn execute_once(
        &self,
        spec: &ActionSpec,
        index: u64,
        total: u64,
        direction: Option<Direction>,
    ) -> IterationOutcome {
        let amount = spec.amount.next_amount();
        let leg = direction.map(|d| d.to_string()).unwrap_or_default();
        tracing::info!(
            target: "runner",
            batch = %spec.name,
            iteration = index,
            total,
            direction = %leg,
            amount = %amount,
            "Executing {}",
            spec.action.label()
        );

        match spec.action.execute(direction, amount).await {
            Ok(receipt) => {
                tracing::info!(
                    target: "runner",
                    outcome = "success",
                    batch = %spec.name,
                    iteration = index,
                    total,
                    direction = %leg,
                    tx = ?receipt.tx_hash,
                    note = receipt.note.as_deref().unwrap_or(""),
                    "Iteration succeeded"
                );
                IterationOutcome {
                    index,
                    direction,
                    amount,
                    succeeded: true,
                    tx_hash: receipt.tx_hash,
                    error_message: None,
                }
            }
            Err(e) => {
                tracing::error!(
                    target: "runner",
                    outcome = "failure",
                    batch = %spec.name,
                    iteration = index,
                    total,
                    direction = %leg,
                    error = %e,
                    "Iteration failed; continuing with next"
                );
                IterationOutcome {
                    index,
                    direction,
                    amount,
                    succeeded: false,
                    tx_hash: None,
                    error_message: Some(e.to_string()),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::error::AppError;
    use crate::domain::types::{Action, ActionReceipt, AmountStrategy, DelayBounds};
    use crate::services::runner::amount::FixedAmount;
    use alloy::primitives::U256;
    use futures::StreamExt;
    use futures::future::{BoxFuture, FutureExt};
    use std::collections::HashSet;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Default)]
    struct ScriptedAction {
        fail_on: HashSet<usize>,
        calls: Mutex<Vec<(Option<Direction>, U256)>>,
    }

    impl ScriptedAction {
        fn failing_on(iterations: &[usize]) -> Self {
            Self {
                fail_on: iterations.iter().copied().collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<(Option<Direction>, U256)> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Action for ScriptedAction {
        fn label(&self) -> &str {
            "scripted"
        }

        fn execute(
            &self,
            direction: Option<Direction>,
            amount: U256,
        ) -> BoxFuture<'_, Result<ActionReceipt, AppError>> {
            let call_no = {
                let mut calls = self.calls.lock().unwrap();
                calls.push((direction, amount));
                calls.len()
            };
            let fail = self.fail_on.contains(&call_no);
            async move {
                if fail {
                    Err(AppError::Transaction {
                        hash: "0xdead".into(),
                        reason: "reverted on-chain".into(),
                    })
                } else {
                    Ok(ActionReceipt::default())
                }
            }
            .boxed()
        }
    }

    /// Wraps the real strategy and remembers every draw.
    #[derive(Default)]
    struct RecordingDelay {
        drawn: Mutex<Vec<Duration>>,
    }

    impl DelayStrategy for RecordingDelay {
        fn next_delay(&self, bounds: DelayBounds) -> Duration {
            let d = UniformDelay.next_delay(bounds);
            self.drawn.lock().unwrap().push(d);
            d
        }
    }

    fn spec(iterations: i64, delay: DelayBounds, action: Arc<ScriptedAction>) -> ActionSpec {
        ActionSpec {
            name: "test".into(),
            iterations,
            delay,
            amount: Arc::new(FixedAmount(U256::from(1u64))) as Arc<dyn AmountStrategy>,
            action,
        }
    }

    #[tokio::test]
    async fn non_positive_counts_run_nothing() {
        let executor = ActionExecutor::new(UniformDelay, CancellationToken::new());
        for n in [0, -1, -50] {
            let action = Arc::new(ScriptedAction::default());
            let spec = spec(n, DelayBounds::ZERO, action.clone());
            let outcomes: Vec<_> = executor.run_action(&spec).collect().await;
            assert!(outcomes.is_empty());
            assert!(action.calls().is_empty());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn n_iterations_pause_n_minus_one_times_within_bounds() {
        let executor = ActionExecutor::new(RecordingDelay::default(), CancellationToken::new());
        let action = Arc::new(ScriptedAction::default());
        let bounds = DelayBounds { min_ms: 100, max_ms: 250 };
        let spec = spec(5, bounds, action.clone());

        let outcomes: Vec<_> = executor.run_action(&spec).collect().await;

        assert_eq!(outcomes.len(), 5);
        assert_eq!(
            outcomes.iter().map(|o| o.index).collect::<Vec<_>>(),
            vec![1, 2, 3, 4, 5]
        );
        let drawn = executor.delay.drawn.lock().unwrap().clone();
        assert_eq!(drawn.len(), 4);
        assert!(
            drawn
                .iter()
                .all(|d| *d >= Duration::from_millis(100) && *d <= Duration::from_millis(250))
        );
    }

    #[tokio::test]
    async fn failed_iteration_does_not_stop_the_batch() {
        let executor = ActionExecutor::new(UniformDelay, CancellationToken::new());
        let action = Arc::new(ScriptedAction::failing_on(&[2]));
        let spec = spec(3, DelayBounds::ZERO, action.clone());

        let outcomes: Vec<_> = executor.run_action(&spec).collect().await;

        assert_eq!(
            outcomes.iter().map(|o| o.succeeded).collect::<Vec<_>>(),
            vec![true, false, true]
        );
        assert!(
            outcomes[1]
                .error_message
                .as_deref()
                .unwrap()
                .contains("reverted")
        );
        assert_eq!(action.calls().len(), 3);
    }

    #[tokio::test]
    async fn single_mode_passes_no_direction() {
        let executor = ActionExecutor::new(UniformDelay, CancellationToken::new());
        let action = Arc::new(ScriptedAction::default());
        let spec = spec(2, DelayBounds::ZERO, action.clone());
        let _: Vec<_> = executor.run_action(&spec).collect().await;
        assert!(action.calls().iter().all(|(d, _)| d.is_none()));
    }

    #[tokio::test]
    async fn bidirectional_alternates_regardless_of_failures() {
        let executor = ActionExecutor::new(UniformDelay, CancellationToken::new());
        let action = Arc::new(ScriptedAction::failing_on(&[1, 2]));
        let spec = spec(5, DelayBounds::ZERO, action.clone());

        let outcomes: Vec<_> = executor.run_bidirectional(&spec).collect().await;

        let firsts: Vec<bool> = outcomes
            .iter()
            .map(|o| o.direction.unwrap().is_first())
            .collect();
        assert_eq!(firsts, vec![true, false, true, false, true]);
        let passed: Vec<bool> = action
            .calls()
            .iter()
            .map(|(d, _)| d.unwrap().is_first())
            .collect();
        assert_eq!(passed, firsts);
    }

    #[tokio::test]
    async fn shutdown_ends_batch_at_next_pause() {
        let token = CancellationToken::new();
        let executor = ActionExecutor::new(UniformDelay, token.clone());
        let action = Arc::new(ScriptedAction::default());
        let spec = spec(3, DelayBounds { min_ms: 10, max_ms: 10 }, action.clone());
        token.cancel();

        let outcomes: Vec<_> = executor.run_action(&spec).collect().await;

        assert_eq!(outcomes.len(), 1);
        assert_eq!(action.calls().len(), 1);
    }
}
