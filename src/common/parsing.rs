// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::domain::error::AppError;
use alloy::primitives::U256;
use alloy::primitives::utils::{format_units, parse_units};

/// Parse a human decimal amount ("0.25") into the token's smallest unit.
/// Zero, negative and non-numeric inputs are rejected.
pub fn parse_token_amount(field: &str, raw: &str, decimals: u8) -> Result<U256, AppError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AppError::validation(field, "amount is empty"));
    }
    if trimmed.starts_with('-') {
        return Err(AppError::validation(
            field,
            format!("amount '{trimmed}' must be positive"),
        ));
    }
    let parsed = parse_units(trimmed, decimals).map_err(|e| {
        AppError::validation(field, format!("amount '{trimmed}' is not a number: {e}"))
    })?;
    let value = parsed.get_absolute();
    if value.is_zero() {
        return Err(AppError::validation(
            field,
            format!("amount '{trimmed}' must be positive"),
        ));
    }
    Ok(value)
}

/// Render a smallest-unit amount for logs. Falls back to the raw integer.
pub fn format_token_amount(value: U256, decimals: u8) -> String {
    format_units(value, decimals).unwrap_or_else(|_| value.to_string())
}

/// `10^decimals`, saturating at `U256::MAX` past 77 decimals.
pub fn unit_scale(decimals: u8) -> U256 {
    U256::from(10u64)
        .checked_pow(U256::from(decimals))
        .unwrap_or(U256::MAX)
}

/// Re-express a smallest-unit amount at another decimal precision.
pub fn rescale_units(amount: U256, from_decimals: u8, to_decimals: u8) -> U256 {
    match from_decimals.cmp(&to_decimals) {
        std::cmp::Ordering::Equal => amount,
        std::cmp::Ordering::Less => {
            amount.saturating_mul(unit_scale(to_decimals - from_decimals))
        }
        std::cmp::Ordering::Greater => amount / unit_scale(from_decimals - to_decimals),
    }
}

/// Iteration counts arrive as numbers from TOML and as strings from the
/// environment. Anything that is not an integer fails fast.
pub fn parse_count(field: &str, raw: &str) -> Result<i64, AppError> {
    raw.trim().parse::<i64>().map_err(|_| {
        AppError::validation(field, format!("iteration count '{}' is not an integer", raw.trim()))
    })
}
