// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::data::contracts::IWrappedNative;
use crate::domain::error::AppError;
use crate::domain::types::{Action, ActionReceipt, Direction};
use crate::network::ledger::{ContractCall, Ledger};
use crate::services::actions::{ActionContext, TokenRef};
use alloy::primitives::U256;
use futures::FutureExt;
use futures::future::BoxFuture;

/// Forward wraps native into the wrapped token, reverse unwraps it.
pub struct WrapAction<L> {
    ctx: ActionContext<L>,
    wrapped: TokenRef,
}

impl<L: Ledger> WrapAction<L> {
    pub fn new(ctx: ActionContext<L>, wrapped: TokenRef) -> Self {
        Self { ctx, wrapped }
    }

    async fn wrap(&self, amount: U256) -> Result<ActionReceipt, AppError> {
        self.ctx.ensure_native_balance(amount).await?;
        let receipt = self
            .ctx
            .settle(
                ContractCall::new(self.wrapped.address, IWrappedNative::depositCall {}, "deposit")
                    .with_value(amount),
            )
            .await?;
        Ok(ActionReceipt {
            tx_hash: Some(receipt.hash),
            approval_hash: None,
            note: Some(format!(
                "wrapped {} into {}",
                self.wrapped.fmt_amount(amount),
                self.wrapped.label
            )),
        })
    }

    async fn unwrap(&self, amount: U256) -> Result<ActionReceipt, AppError> {
        self.ctx.ensure_token_balance(&self.wrapped, amount).await?;
        let receipt = self
            .ctx
            .settle(ContractCall::new(
                self.wrapped.address,
                IWrappedNative::withdrawCall { amount },
                "withdraw",
            ))
            .await?;
        Ok(ActionReceipt {
            tx_hash: Some(receipt.hash),
            approval_hash: None,
            note: Some(format!(
                "unwrapped {} {}",
                self.wrapped.fmt_amount(amount),
                self.wrapped.label
            )),
        })
    }
}

impl<L: Ledger + 'static> Action for WrapAction<L> {
    fn label(&self) -> &str {
        "wrap"
    }

    fn execute(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> BoxFuture<'_, Result<ActionReceipt, AppError>> {
        match direction {
            Some(Direction::Reverse) => self.unwrap(amount).boxed(),
            _ => self.wrap(amount).boxed(),
        }
    }
}
