// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::domain::error::AppError;
use alloy::primitives::{B256, U256};
use futures::future::BoxFuture;
use std::fmt;
use std::sync::Arc;

/// Leg hint threaded through bidirectional batches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// A→B. Every bidirectional batch starts here.
    Forward,
    /// B→A.
    Reverse,
}

impl Direction {
    pub fn is_first(self) -> bool {
        matches!(self, Direction::Forward)
    }

    pub fn flipped(self) -> Self {
        match self {
            Direction::Forward => Direction::Reverse,
            Direction::Reverse => Direction::Forward,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Forward => f.write_str("A→B"),
            Direction::Reverse => f.write_str("B→A"),
        }
    }
}

/// What an action reports back after its transaction settled.
#[derive(Debug, Clone, Default)]
pub struct ActionReceipt {
    pub tx_hash: Option<B256>,
    pub approval_hash: Option<B256>,
    pub note: Option<String>,
}

/// One on-chain operation the runner can repeat.
pub trait Action: Send + Sync {
    /// Short label used in logs (e.g. "swap").
    fn label(&self) -> &str;

    /// `direction` is `None` for single-direction batches.
    fn execute(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> BoxFuture<'_, Result<ActionReceipt, AppError>>;
}

/// Produces the amount (smallest unit) for the next iteration.
pub trait AmountStrategy: Send + Sync {
    fn next_amount(&self) -> U256;
}

/// Inclusive bounds for the pause between two iterations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DelayBounds {
    pub min_ms: u64,
    pub max_ms: u64,
}

impl DelayBounds {
    pub const ZERO: DelayBounds = DelayBounds { min_ms: 0, max_ms: 0 };

    pub fn new(min_ms: u64, max_ms: u64) -> Result<Self, AppError> {
        let bounds = Self { min_ms, max_ms };
        bounds.validate("delay")?;
        Ok(bounds)
    }

    pub fn validate(&self, field: &str) -> Result<(), AppError> {
        if self.max_ms < self.min_ms {
            return Err(AppError::validation(
                field,
                format!(
                    "max_delay_ms ({}) must be >= min_delay_ms ({})",
                    self.max_ms, self.min_ms
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Clone)]
pub struct ActionSpec {
    pub name: String,
    /// Non-positive counts mean "skip this batch".
    pub iterations: i64,
    pub delay: DelayBounds,
    pub amount: Arc<dyn AmountStrategy>,
    pub action: Arc<dyn Action>,
}

impl ActionSpec {
    pub fn iteration_count(&self) -> u64 {
        u64::try_from(self.iterations).unwrap_or(0)
    }
}

impl fmt::Debug for ActionSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionSpec")
            .field("name", &self.name)
            .field("iterations", &self.iterations)
            .field("delay", &self.delay)
            .field("action", &self.action.label())
            .finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchMode {
    Single,
    Bidirectional,
}

#[derive(Debug, Clone)]
pub struct BatchSpec {
    pub mode: BatchMode,
    pub spec: ActionSpec,
}

impl BatchSpec {
    pub fn single(spec: ActionSpec) -> Self {
        Self {
            mode: BatchMode::Single,
            spec,
        }
    }

    pub fn bidirectional(spec: ActionSpec) -> Self {
        Self {
            mode: BatchMode::Bidirectional,
            spec,
        }
    }
}

#[derive(Debug, Clone)]
pub struct IterationOutcome {
    /// 1-based.
    pub index: u64,
    pub direction: Option<Direction>,
    pub amount: U256,
    pub succeeded: bool,
    pub tx_hash: Option<B256>,
    pub error_message: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleSummary {
    pub cycles_completed: u64,
    pub cooldowns_entered: u64,
    pub iterations_succeeded: u64,
    pub iterations_failed: u64,
}
