// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::unit_scale;
use crate::domain::error::AppError;
use crate::domain::types::AmountStrategy;
use alloy::primitives::U256;
use rand::Rng;

/// Same amount every iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedAmount(pub U256);

impl FixedAmount {
    /// One whole token at the given decimals.
    pub fn one_token(decimals: u8) -> Self {
        FixedAmount(unit_scale(decimals))
    }
}

impl AmountStrategy for FixedAmount {
    fn next_amount(&self) -> U256 {
        self.0
    }
}

/// Uniform over `[min, max]` in smallest units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RandomAmount {
    min: U256,
    max: U256,
}

impl RandomAmount {
    pub fn new(field: &str, min: U256, max: U256) -> Result<Self, AppError> {
        if max < min {
            return Err(AppError::validation(
                field,
                format!("amount_max ({max}) must be >= amount ({min})"),
            ));
        }
        Ok(Self { min, max })
    }
}

impl AmountStrategy for RandomAmount {
    fn next_amount(&self) -> U256 {
        let span = self.max - self.min;
        if span.is_zero() {
            return self.min;
        }
        let raw = U256::from_limbs(rand::thread_rng().r#gen::<[u64; 4]>());
        match span.checked_add(U256::from(1u64)) {
            Some(modulus) => self.min + raw % modulus,
            None => raw,
        }
    }
}
