// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod amount;
pub mod approval;
pub mod delay;
pub mod executor;
pub mod orchestrator;

pub use approval::{ApprovalGate, ApprovalOutcome};
pub use delay::{Countdown, DelayStrategy, UniformDelay};
pub use executor::ActionExecutor;
pub use orchestrator::CycleOrchestrator;
