// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::contracts::IStaking;
use crate::domain::error::AppError;
use crate::domain::types::{Action, ActionReceipt, Direction};
use crate::network::ledger::{ContractCall, Ledger};
use crate::services::actions::{ActionContext, TokenRef};
use alloy::primitives::{Address, U256};
use futures::FutureExt;
use futures::future::BoxFuture;

/// ERC-20 stake into a fixed staking contract.
pub struct StakeAction<L> {
    ctx: ActionContext<L>,
    staking: Address,
    token: TokenRef,
}

impl<L: Ledger> StakeAction<L> {
    pub fn new(ctx: ActionContext<L>, staking: Address, token: TokenRef) -> Self {
        Self {
            ctx,
            staking,
            token,
        }
    }

    async fn stake(&self, amount: U256) -> Result<ActionReceipt, AppError> {
        self.ctx.ensure_token_balance(&self.token, amount).await?;
        let approval = self
            .ctx
            .gate
            .ensure_approval(self.token.address, self.staking, amount, self.token.decimals)
            .await?;
        let receipt = self
            .ctx
            .settle(ContractCall::new(
                self.staking,
                IStaking::stakeCall { amount },
                "stake",
            ))
            .await?;
        Ok(ActionReceipt {
            tx_hash: Some(receipt.hash),
            approval_hash: approval.approval_hash(),
            note: Some(format!(
                "staked {} {}",
                self.token.fmt_amount(amount),
                self.token.label
            )),
        })
    }
}

impl<L: Ledger + 'static> Action for StakeAction<L> {
    fn label(&self) -> &str {
        "stake"
    }

    fn execute(
        &self,
        _direction: Option<Direction>,
        amount: U256,
    ) -> BoxFuture<'_, Result<ActionReceipt, AppError>> {
        self.stake(amount).boxed()
    }
}
