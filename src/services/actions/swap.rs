// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use crate::common::parsing::rescale_units;
use crate::data::contracts::IUniswapV2Router;
use crate::domain::error::AppError;
use crate::domain::types::{Action, ActionReceipt, Direction};
use crate::network::ledger::{ContractCall, Ledger};
use crate::services::actions::{ActionContext, TokenRef, legs};
use alloy::primitives::{Address, U256};
use futures::FutureExt;
use futures::future::BoxFuture;

/// V2 router swap between `token_a` and `token_b`. The batch amount is
/// denominated in `token_a` and rescaled when selling `token_b`.
pub struct SwapAction<L> {
    ctx: ActionContext<L>,
    router: Address,
    token_a: TokenRef,
    token_b: TokenRef,
}

impl<L: Ledger> SwapAction<L> {
    pub fn new(ctx: ActionContext<L>, router: Address, token_a: TokenRef, token_b: TokenRef) -> Self {
        Self {
            ctx,
            router,
            token_a,
            token_b,
        }
    }

    async fn swap(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> Result<ActionReceipt, AppError> {
        let (token_in, token_out) = legs(direction, &self.token_a, &self.token_b);
        let amount_in = rescale_units(amount, self.token_a.decimals, token_in.decimals);
        if amount_in.is_zero() {
            return Err(AppError::validation(
                "amount",
                format!("amount rounds to zero in {}", token_in.label),
            ));
        }

        self.ctx.ensure_token_balance(token_in, amount_in).await?;
        let path = vec![token_in.address, token_out.address];
        let quoted = self.ctx.quote(self.router, amount_in, path.clone()).await?;
        let min_out = self.ctx.min_out(quoted);

        let approval = self
            .ctx
            .gate
            .ensure_approval(token_in.address, self.router, amount_in, token_in.decimals)
            .await?;
        let receipt = self
            .ctx
            .settle(ContractCall::new(
                self.router,
                IUniswapV2Router::swapExactTokensForTokensCall {
                    amountIn: amount_in,
                    amountOutMin: min_out,
                    path,
                    to: self.ctx.owner(),
                    deadline: self.ctx.deadline(),
                },
                "swap",
            ))
            .await?;

        Ok(ActionReceipt {
            tx_hash: Some(receipt.hash),
            approval_hash: approval.approval_hash(),
            note: Some(format!(
                "swapped {} {} for >= {} {}",
                token_in.fmt_amount(amount_in),
                token_in.label,
                token_out.fmt_amount(min_out),
                token_out.label
            )),
        })
    }
}

impl<L: Ledger + 'static> Action for SwapAction<L> {
    fn label(&self) -> &str {
        "swap"
    }

    fn execute(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> BoxFuture<'_, Result<ActionReceipt, AppError>> {
        self.swap(direction, amount).boxed()
    }
}
