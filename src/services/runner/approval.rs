// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::unit_scale;
use crate::domain::error::AppError;
use crate::network::ledger::Ledger;
use alloy::primitives::{Address, B256, U256};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApprovalOutcome {
    AlreadySufficient { allowance: U256 },
    Approved { hash: B256, ceiling: U256 },
}

impl ApprovalOutcome {
    pub fn approval_hash(&self) -> Option<B256> {
        match self {
            ApprovalOutcome::Approved { hash, .. } => Some(*hash),
            ApprovalOutcome::AlreadySufficient { .. } => None,
        }
    }
}

/// Approves a spender only when the live allowance is short, and then for a
/// large round ceiling so later iterations skip the extra transaction.
/// Allowances are never cached.
pub struct ApprovalGate<L> {
    ledger: Arc<L>,
    ceiling_units: U256,
}

impl<L> Clone for ApprovalGate<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            ceiling_units: self.ceiling_units,
        }
    }
}

impl<L: Ledger> ApprovalGate<L> {
    pub fn new(ledger: Arc<L>, ceiling_units: u64) -> Self {
        Self {
            ledger,
            ceiling_units: U256::from(ceiling_units),
        }
    }

    pub fn ceiling_for(&self, required: U256, decimals: u8) -> U256 {
        self.ceiling_units
            .saturating_mul(unit_scale(decimals))
            .max(required)
    }

    /// Submits at most one approval. `required` is in the token's smallest unit.
    pub async fn ensure_approval(
        &self,
        token: Address,
        spender: Address,
        required: U256,
        decimals: u8,
    ) -> Result<ApprovalOutcome, AppError> {
        let owner = self.ledger.owner();
        let allowance = self.ledger.allowance(token, owner, spender).await?;
        if allowance >= required {
            tracing::debug!(
                target: "approval",
                token = %format!("{:#x}", token),
                spender = %format!("{:#x}", spender),
                %allowance,
                %required,
                "Allowance sufficient"
            );
            return Ok(ApprovalOutcome::AlreadySufficient { allowance });
        }

        let ceiling = self.ceiling_for(required, decimals);
        tracing::info!(
            target: "approval",
            token = %format!("{:#x}", token),
            spender = %format!("{:#x}", spender),
            %allowance,
            %required,
            %ceiling,
            "Allowance insufficient; approving"
        );
        let handle = self.ledger.approve(token, spender, ceiling).await?;
        let receipt = self.ledger.await_receipt(handle).await?;
        tracing::info!(
            target: "approval",
            outcome = "success",
            hash = %format!("{:#x}", receipt.hash),
            "Approval confirmed"
        );
        Ok(ApprovalOutcome::Approved {
            hash: receipt.hash,
            ceiling,
        })
    }
}
