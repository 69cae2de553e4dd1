// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use std::time::Duration;

// =============================================================================
// CYCLE PACING
// =============================================================================

pub const SECONDS_PER_DAY: u64 = 24 * 60 * 60;
pub const DEFAULT_CYCLE_COOLDOWN: Duration = Duration::from_secs(SECONDS_PER_DAY);

/// Countdown lines are emitted at most this often while a long pause runs.
pub const COUNTDOWN_TICK: Duration = Duration::from_secs(15 * 60);

// =============================================================================
// APPROVALS
// =============================================================================

/// Whole-token allowance granted when the current one is insufficient.
pub const DEFAULT_APPROVAL_CEILING_UNITS: u64 = 1_000_000;

// =============================================================================
// TRANSACTIONS
// =============================================================================

pub const DEFAULT_DEADLINE_SECS: u64 = 300;
pub const DEFAULT_SLIPPAGE_BPS: u64 = 100;
pub const MAX_SLIPPAGE_BPS: u64 = 10_000;

pub const DEFAULT_RECEIPT_POLL_MS: u64 = 1_000;
pub const DEFAULT_RECEIPT_TIMEOUT_MS: u64 = 120_000;
pub const DEFAULT_RECEIPT_CONFIRM_BLOCKS: u64 = 1;

pub const NATIVE_DECIMALS: u8 = 18;
/// 10^77 is the largest power of ten that fits in a U256.
pub const MAX_TOKEN_DECIMALS: u8 = 77;

// Read-only RPC retries
pub const READ_RETRY_ATTEMPTS: usize = 3;
pub const READ_RETRY_INITIAL_DELAY: Duration = Duration::from_millis(200);
