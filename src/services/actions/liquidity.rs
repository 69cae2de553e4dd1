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

/// V2 `addLiquidity` for the `token_a`/`token_b` pair. The base side gets the
/// batch amount, the other side follows the pair's reserve ratio.
pub struct AddLiquidityAction<L> {
    ctx: ActionContext<L>,
    router: Address,
    pair: Address,
    token_a: TokenRef,
    token_b: TokenRef,
}

/// Router `quote()`: amount of the other side at the current reserve ratio.
pub fn reserve_quote(amount: U256, reserve_base: U256, reserve_other: U256) -> Option<U256> {
    if reserve_base.is_zero() || reserve_other.is_zero() {
        return None;
    }
    Some(amount.saturating_mul(reserve_other) / reserve_base)
}

impl<L: Ledger> AddLiquidityAction<L> {
    pub fn new(
        ctx: ActionContext<L>,
        router: Address,
        pair: Address,
        token_a: TokenRef,
        token_b: TokenRef,
    ) -> Self {
        Self {
            ctx,
            router,
            pair,
            token_a,
            token_b,
        }
    }

    async fn add_liquidity(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> Result<ActionReceipt, AppError> {
        let (base, quote) = legs(direction, &self.token_a, &self.token_b);
        let base_amount = rescale_units(amount, self.token_a.decimals, base.decimals);
        if base_amount.is_zero() {
            return Err(AppError::validation(
                "amount",
                format!("amount rounds to zero in {}", base.label),
            ));
        }
        let (reserve_base, reserve_other) = self.ctx.reserves(self.pair, base.address).await?;
        let quote_amount = reserve_quote(base_amount, reserve_base, reserve_other)
            .filter(|v| !v.is_zero())
            .ok_or_else(|| {
                AppError::submission(format!(
                    "pair {:#x} cannot price {} {}",
                    self.pair,
                    base.fmt_amount(base_amount),
                    base.label
                ))
            })?;

        self.ctx.ensure_token_balance(base, base_amount).await?;
        self.ctx.ensure_token_balance(quote, quote_amount).await?;

        let base_approval = self
            .ctx
            .gate
            .ensure_approval(base.address, self.router, base_amount, base.decimals)
            .await?;
        let quote_approval = self
            .ctx
            .gate
            .ensure_approval(quote.address, self.router, quote_amount, quote.decimals)
            .await?;

        let receipt = self
            .ctx
            .settle(ContractCall::new(
                self.router,
                IUniswapV2Router::addLiquidityCall {
                    tokenA: base.address,
                    tokenB: quote.address,
                    amountADesired: base_amount,
                    amountBDesired: quote_amount,
                    amountAMin: self.ctx.min_out(base_amount),
                    amountBMin: self.ctx.min_out(quote_amount),
                    to: self.ctx.owner(),
                    deadline: self.ctx.deadline(),
                },
                "addLiquidity",
            ))
            .await?;

        Ok(ActionReceipt {
            tx_hash: Some(receipt.hash),
            approval_hash: base_approval
                .approval_hash()
                .or(quote_approval.approval_hash()),
            note: Some(format!(
                "added {} {} + {} {}",
                base.fmt_amount(base_amount),
                base.label,
                quote.fmt_amount(quote_amount),
                quote.label
            )),
        })
    }
}

impl<L: Ledger + 'static> Action for AddLiquidityAction<L> {
    fn label(&self) -> &str {
        "add_liquidity"
    }

    fn execute(
        &self,
        direction: Option<Direction>,
        amount: U256,
    ) -> BoxFuture<'_, Result<ActionReceipt, AppError>> {
        self.add_liquidity(direction, amount).boxed()
    }
}
