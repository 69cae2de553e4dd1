// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

pub mod liquidity;
pub mod stake;
pub mod swap;
pub mod wrap;

use crate::app::config::{ActionKind, BatchSettings, GlobalSettings};
use crate::common::constants::{MAX_TOKEN_DECIMALS, NATIVE_DECIMALS};
use crate::common::parsing::{format_token_amount, parse_token_amount, rescale_units};
use crate::common::time_utils::current_unix;
use crate::data::contracts::{IUniswapV2Factory, IUniswapV2Pair, IUniswapV2Router};
use crate::domain::error::AppError;
use crate::domain::types::{
    Action, ActionSpec, AmountStrategy, BatchSpec, DelayBounds, Direction,
};
use crate::network::ledger::{ContractCall, Ledger, TxReceiptSummary};
use crate::services::runner::amount::{FixedAmount, RandomAmount};
use crate::services::runner::approval::ApprovalGate;
use alloy::primitives::{Address, U256};
use alloy::sol_types::SolCall;
use std::collections::HashMap;
use std::sync::Arc;

pub use liquidity::AddLiquidityAction;
pub use stake::StakeAction;
pub use swap::SwapAction;
pub use wrap::WrapAction;

/// Token address with the precision it was resolved at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenRef {
    pub label: String,
    pub address: Address,
    pub decimals: u8,
}

impl TokenRef {
    pub fn fmt_amount(&self, amount: U256) -> String {
        format_token_amount(amount, self.decimals)
    }
}

/// Shared plumbing every concrete action needs.
pub struct ActionContext<L> {
    pub ledger: Arc<L>,
    pub gate: ApprovalGate<L>,
    pub slippage_bps: u64,
    pub deadline_secs: u64,
}

impl<L> Clone for ActionContext<L> {
    fn clone(&self) -> Self {
        Self {
            ledger: self.ledger.clone(),
            gate: self.gate.clone(),
            slippage_bps: self.slippage_bps,
            deadline_secs: self.deadline_secs,
        }
    }
}

impl<L: Ledger> ActionContext<L> {
    pub fn new(
        ledger: Arc<L>,
        approval_ceiling_units: u64,
        slippage_bps: u64,
        deadline_secs: u64,
    ) -> Self {
        Self {
            gate: ApprovalGate::new(ledger.clone(), approval_ceiling_units),
            ledger,
            slippage_bps,
            deadline_secs,
        }
    }

    pub fn from_settings(ledger: Arc<L>, settings: &GlobalSettings) -> Self {
        Self::new(
            ledger,
            settings.approval_ceiling_units,
            settings.slippage_bps,
            settings.deadline_secs,
        )
    }

    pub fn owner(&self) -> Address {
        self.ledger.owner()
    }

    /// Pre-flight check; nothing is submitted when it fails.
    pub async fn ensure_token_balance(
        &self,
        token: &TokenRef,
        required: U256,
    ) -> Result<(), AppError> {
        let available = self.ledger.balance_of(token.address, self.owner()).await?;
        if available < required {
            return Err(AppError::InsufficientFunds {
                asset: token.label.clone(),
                required: token.fmt_amount(required),
                available: token.fmt_amount(available),
            });
        }
        Ok(())
    }

    pub async fn ensure_native_balance(&self, required: U256) -> Result<(), AppError> {
        let available = self.ledger.native_balance().await?;
        if available < required {
            return Err(AppError::InsufficientFunds {
                asset: "native".to_string(),
                required: format_token_amount(required, NATIVE_DECIMALS),
                available: format_token_amount(available, NATIVE_DECIMALS),
            });
        }
        Ok(())
    }

    pub fn min_out(&self, quoted: U256) -> U256 {
        let keep = 10_000u64.saturating_sub(self.slippage_bps);
        quoted.saturating_mul(U256::from(keep)) / U256::from(10_000u64)
    }

    pub fn deadline(&self) -> U256 {
        U256::from(current_unix().saturating_add(self.deadline_secs))
    }

    /// Router quote for `amount_in` along `path`; returns the final hop.
    pub async fn quote(
        &self,
        router: Address,
        amount_in: U256,
        path: Vec<Address>,
    ) -> Result<U256, AppError> {
        let raw = self
            .ledger
            .read(ContractCall::new(
                router,
                IUniswapV2Router::getAmountsOutCall {
                    amountIn: amount_in,
                    path,
                },
                "getAmountsOut",
            ))
            .await?;
        let amounts = IUniswapV2Router::getAmountsOutCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Connection(format!("getAmountsOut decode failed: {e}")))?;
        amounts
            .last()
            .copied()
            .filter(|v| !v.is_zero())
            .ok_or_else(|| AppError::Connection("getAmountsOut returned no output".into()))
    }

    /// V2 pair for `a`/`b` via the router's factory; `Address::ZERO` when none exists.
    pub async fn pair_for(
        &self,
        router: Address,
        a: Address,
        b: Address,
    ) -> Result<Address, AppError> {
        let raw = self
            .ledger
            .read(ContractCall::new(router, IUniswapV2Router::factoryCall {}, "factory"))
            .await?;
        let factory = IUniswapV2Router::factoryCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Connection(format!("factory decode failed: {e}")))?;
        let raw = self
            .ledger
            .read(ContractCall::new(
                factory,
                IUniswapV2Factory::getPairCall { tokenA: a, tokenB: b },
                "getPair",
            ))
            .await?;
        IUniswapV2Factory::getPairCall::abi_decode_returns(&raw)
            .map_err(|e| AppError::Connection(format!("getPair decode failed: {e}")))
    }

    /// Pair reserves ordered as (`base`, other side).
    pub async fn reserves(&self, pair: Address, base: Address) -> Result<(U256, U256), AppError> {
        let raw = self
            .ledger
            .read(ContractCall::new(pair, IUniswapV2Pair::token0Call {}, "token0"))
            .await?;
        let token0 = IUniswapV2Pair::token0Call::abi_decode_returns(&raw)
            .map_err(|e| AppError::Connection(format!("token0 decode failed: {e}")))?;
        let data = self
            .ledger
            .read(ContractCall::new(
                pair,
                IUniswapV2Pair::getReservesCall {},
                "getReserves",
            ))
            .await?;
        if data.len() < 64 {
            return Err(AppError::Connection(format!(
                "getReserves returned {} bytes",
                data.len()
            )));
        }
        let reserve0 = U256::from_be_slice(&data[0..32]);
        let reserve1 = U256::from_be_slice(&data[32..64]);
        if token0 == base {
            Ok((reserve0, reserve1))
        } else {
            Ok((reserve1, reserve0))
        }
    }

    /// Submit and block until confirmed.
    pub async fn settle(&self, call: ContractCall) -> Result<TxReceiptSummary, AppError> {
        let label = call.label;
        let handle = self.ledger.submit(call).await?;
        let receipt = self.ledger.await_receipt(handle).await?;
        tracing::debug!(
            target: "runner",
            label,
            hash = %format!("{:#x}", receipt.hash),
            block = ?receipt.block_number,
            gas_used = receipt.gas_used,
            "Transaction confirmed"
        );
        Ok(receipt)
    }
}

/// Pick (in, out) for a two-token action. `None` behaves like `Forward`.
pub(crate) fn legs<'a>(
    direction: Option<Direction>,
    a: &'a TokenRef,
    b: &'a TokenRef,
) -> (&'a TokenRef, &'a TokenRef) {
    match direction {
        Some(Direction::Reverse) => (b, a),
        _ => (a, b),
    }
}

struct TokenResolver<L> {
    ledger: Arc<L>,
    decimals: HashMap<Address, u8>,
}

impl<L: Ledger> TokenResolver<L> {
    fn new(ledger: Arc<L>) -> Self {
        Self {
            ledger,
            decimals: HashMap::new(),
        }
    }

    async fn resolve(
        &mut self,
        label: &str,
        address: Option<Address>,
    ) -> Result<TokenRef, AppError> {
        let address = required_contract(label, address)?;
        let decimals = match self.decimals.get(&address) {
            Some(d) => *d,
            None => {
                let d = self.ledger.decimals(address).await?;
                if d > MAX_TOKEN_DECIMALS {
                    return Err(AppError::validation(
                        format!("contracts.{label}"),
                        format!("decimals() returned {d}, above {MAX_TOKEN_DECIMALS}"),
                    ));
                }
                self.decimals.insert(address, d);
                d
            }
        };
        Ok(TokenRef {
            label: label.to_string(),
            address,
            decimals,
        })
    }
}

fn required_contract(label: &str, address: Option<Address>) -> Result<Address, AppError> {
    address.ok_or_else(|| {
        AppError::validation(format!("contracts.{label}"), "address is not configured")
    })
}

/// Strategy plus its smallest possible draw.
fn amount_strategy(
    idx: usize,
    batch: &BatchSettings,
    decimals: u8,
) -> Result<(Arc<dyn AmountStrategy>, U256), AppError> {
    let field = format!("batches[{idx}].amount");
    let min = match batch.amount.as_deref() {
        Some(raw) => parse_token_amount(&field, raw, decimals)?,
        None => FixedAmount::one_token(decimals).0,
    };
    match batch.amount_max.as_deref() {
        Some(raw) => {
            let max_field = format!("batches[{idx}].amount_max");
            let max = parse_token_amount(&max_field, raw, decimals)?;
            Ok((Arc::new(RandomAmount::new(&max_field, min, max)?), min))
        }
        None => Ok((Arc::new(FixedAmount(min)), min)),
    }
}

/// Turn configuration into runnable batches. Every input problem surfaces
/// here, before the first batch starts.
pub async fn build_batches<L: Ledger + 'static>(
    settings: &GlobalSettings,
    ledger: Arc<L>,
) -> Result<Vec<BatchSpec>, AppError> {
    settings.validate()?;
    let ctx = ActionContext::from_settings(ledger.clone(), settings);
    let mut tokens = TokenResolver::new(ledger);
    let contracts = &settings.contracts;
    let mut out = Vec::with_capacity(settings.batches.len());

    for (idx, batch) in settings.batches.iter().enumerate() {
        let iterations = batch.iteration_count(idx)?;
        let delay = DelayBounds {
            min_ms: batch.min_delay_ms,
            max_ms: batch.max_delay_ms,
        };
        delay.validate(&format!("batches[{idx}]"))?;

        let bidirectional = batch.is_bidirectional();
        // Second leg of a two-token action, when the batch alternates.
        let mut reverse_leg: Option<TokenRef> = None;
        let (action, amount_decimals): (Arc<dyn Action>, u8) = match batch.action {
            ActionKind::Stake => {
                let staking = required_contract("staking", contracts.staking)?;
                let token = tokens.resolve("stake_token", settings.stake_token()).await?;
                let decimals = token.decimals;
                (Arc::new(StakeAction::new(ctx.clone(), staking, token)), decimals)
            }
            ActionKind::Swap => {
                let router = required_contract("router", contracts.router)?;
                let a = tokens.resolve("token_a", contracts.token_a).await?;
                let b = tokens.resolve("token_b", contracts.token_b).await?;
                let decimals = a.decimals;
                if bidirectional {
                    reverse_leg = Some(b.clone());
                }
                (Arc::new(SwapAction::new(ctx.clone(), router, a, b)), decimals)
            }
            ActionKind::AddLiquidity => {
                let router = required_contract("router", contracts.router)?;
                let a = tokens.resolve("token_a", contracts.token_a).await?;
                let b = tokens.resolve("token_b", contracts.token_b).await?;
                let pair = ctx.pair_for(router, a.address, b.address).await?;
                if pair.is_zero() {
                    return Err(AppError::validation(
                        format!("batches[{idx}].action"),
                        "router factory has no pair for token_a/token_b",
                    ));
                }
                let decimals = a.decimals;
                if bidirectional {
                    reverse_leg = Some(b.clone());
                }
                (
                    Arc::new(AddLiquidityAction::new(ctx.clone(), router, pair, a, b)),
                    decimals,
                )
            }
            ActionKind::Wrap => {
                let wrapped = tokens
                    .resolve("wrapped_native", contracts.wrapped_native)
                    .await?;
                (Arc::new(WrapAction::new(ctx.clone(), wrapped)), NATIVE_DECIMALS)
            }
        };

        let (amount, min_amount) = amount_strategy(idx, batch, amount_decimals)?;
        if let Some(leg) = &reverse_leg
            && rescale_units(min_amount, amount_decimals, leg.decimals).is_zero()
        {
            return Err(AppError::validation(
                format!("batches[{idx}].amount"),
                format!(
                    "amount rounds to zero in {} ({} decimals)",
                    leg.label, leg.decimals
                ),
            ));
        }

        let spec = ActionSpec {
            name: batch.display_name(),
            iterations,
            delay,
            amount,
            action,
        };
        tracing::info!(
            target: "config",
            position = idx + 1,
            batch = %spec.name,
            action = batch.action.as_str(),
            bidirectional,
            iterations,
            min_delay_ms = delay.min_ms,
            max_delay_ms = delay.max_ms,
            "Batch configured"
        );
        out.push(if bidirectional {
            BatchSpec::bidirectional(spec)
        } else {
            BatchSpec::single(spec)
        });
    }

    Ok(out)
}
