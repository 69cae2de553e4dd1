// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::constants::{READ_RETRY_ATTEMPTS, READ_RETRY_INITIAL_DELAY};
use crate::common::error::AppError;
use crate::common::retry::retry_async;
use crate::data::contracts::IERC20;
use crate::network::provider::SigningProvider;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::providers::Provider;
use alloy::rpc::types::TransactionRequest;
use alloy::sol_types::SolCall;
use std::future::Future;
use std::time::Duration;
use tokio::time::{Instant, sleep};

/// Encoded call against a fixed contract.
#[derive(Debug, Clone)]
pub struct ContractCall {
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub label: &'static str,
}

impl ContractCall {
    pub fn new<C: SolCall>(to: Address, call: C, label: &'static str) -> Self {
        Self {
            to,
            input: Bytes::from(call.abi_encode()),
            value: U256::ZERO,
            label,
        }
    }

    pub fn with_value(mut self, value: U256) -> Self {
        self.value = value;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TxHandle {
    pub hash: B256,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceiptSummary {
    pub hash: B256,
    pub block_number: Option<u64>,
    pub gas_used: u64,
}

/// Wallet + chain access used by every action. One signing identity per
/// instance; never more than one operation in flight.
pub trait Ledger: Send + Sync {
    fn owner(&self) -> Address;

    fn native_balance(&self) -> impl Future<Output = Result<U256, AppError>> + Send;

    fn balance_of(
        &self,
        token: Address,
        owner: Address,
    ) -> impl Future<Output = Result<U256, AppError>> + Send;

    fn decimals(&self, token: Address) -> impl Future<Output = Result<u8, AppError>> + Send;

    fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> impl Future<Output = Result<U256, AppError>> + Send;

    fn submit(&self, call: ContractCall)
    -> impl Future<Output = Result<TxHandle, AppError>> + Send;

    /// `eth_call` against the latest block.
    fn read(&self, call: ContractCall) -> impl Future<Output = Result<Bytes, AppError>> + Send;

    /// Resolves once the transaction is confirmed; reverts and timeouts
    /// surface as `AppError::Transaction`.
    fn await_receipt(
        &self,
        handle: TxHandle,
    ) -> impl Future<Output = Result<TxReceiptSummary, AppError>> + Send;

    fn approve(
        &self,
        token: Address,
        spender: Address,
        amount: U256,
    ) -> impl Future<Output = Result<TxHandle, AppError>> + Send {
        self.submit(ContractCall::new(
            token,
            IERC20::approveCall { spender, amount },
            "approve",
        ))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ReceiptPolicy {
    pub poll: Duration,
    pub timeout: Duration,
    pub confirm_blocks: u64,
}

impl ReceiptPolicy {
    pub fn from_millis(poll_ms: u64, timeout_ms: u64, confirm_blocks: u64) -> Self {
        let poll_ms = poll_ms.max(100);
        Self {
            poll: Duration::from_millis(poll_ms),
            timeout: Duration::from_millis(timeout_ms.max(poll_ms)),
            confirm_blocks: confirm_blocks.max(1),
        }
    }
}

fn receipt_is_confirmed(current_head: u64, receipt_block: u64, confirm_blocks: u64) -> bool {
    let needed_head = receipt_block.saturating_add(confirm_blocks.saturating_sub(1));
    current_head >= needed_head
}

/// JSON-RPC ledger backed by a signing alloy provider.
#[derive(Clone)]
pub struct RpcLedger {
    provider: SigningProvider,
    owner: Address,
    receipts: ReceiptPolicy,
}

impl RpcLedger {
    pub fn new(provider: SigningProvider, owner: Address, receipts: ReceiptPolicy) -> Self {
        Self {
            provider,
            owner,
            receipts,
        }
    }

    pub async fn chain_id(&self) -> Result<u64, AppError> {
        self.provider
            .get_chain_id()
            .await
            .map_err(|e| AppError::Connection(format!("chain_id lookup failed: {e}")))
    }
}

impl Ledger for RpcLedger {
    fn owner(&self) -> Address {
        self.owner
    }

    async fn native_balance(&self) -> Result<U256, AppError> {
        let provider = self.provider.clone();
        let addr = self.owner;
        retry_async(
            move |_| {
                let provider = provider.clone();
                async move { provider.get_balance(addr).await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_INITIAL_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Balance check failed: {}", e)))
    }

    async fn balance_of(&self, token: Address, owner: Address) -> Result<U256, AppError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        retry_async(
            move |_| {
                let c = erc20.clone();
                async move { c.balanceOf(owner).call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_INITIAL_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("balanceOf {:#x} failed: {}", token, e)))
    }

    async fn decimals(&self, token: Address) -> Result<u8, AppError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        retry_async(
            move |_| {
                let c = erc20.clone();
                async move { c.decimals().call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_INITIAL_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("decimals {:#x} failed: {}", token, e)))
    }

    async fn allowance(
        &self,
        token: Address,
        owner: Address,
        spender: Address,
    ) -> Result<U256, AppError> {
        let erc20 = IERC20::new(token, self.provider.clone());
        retry_async(
            move |_| {
                let c = erc20.clone();
                async move { c.allowance(owner, spender).call().await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_INITIAL_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("Allowance check failed: {}", e)))
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHandle, AppError> {
        let request = TransactionRequest::default()
            .with_from(self.owner)
            .with_to(call.to)
            .with_input(call.input)
            .with_value(call.value);
        let pending = self
            .provider
            .send_transaction(request)
            .await
            .map_err(|e| AppError::submission(format!("{} rejected: {}", call.label, e)))?;
        let hash = *pending.tx_hash();
        tracing::debug!(
            target: "ledger",
            label = call.label,
            to = %format!("{:#x}", call.to),
            hash = %format!("{:#x}", hash),
            "Transaction submitted"
        );
        Ok(TxHandle { hash })
    }

    async fn read(&self, call: ContractCall) -> Result<Bytes, AppError> {
        let provider = self.provider.clone();
        let request = TransactionRequest::default()
            .with_from(self.owner)
            .with_to(call.to)
            .with_input(call.input);
        retry_async(
            move |_| {
                let provider = provider.clone();
                let request = request.clone();
                async move { provider.call(request).await }
            },
            READ_RETRY_ATTEMPTS,
            READ_RETRY_INITIAL_DELAY,
        )
        .await
        .map_err(|e| AppError::Connection(format!("{} call failed: {}", call.label, e)))
    }

    async fn await_receipt(&self, handle: TxHandle) -> Result<TxReceiptSummary, AppError> {
        let started = Instant::now();
        let hash_str = format!("{:#x}", handle.hash);

        loop {
            if started.elapsed() >= self.receipts.timeout {
                return Err(AppError::Transaction {
                    hash: hash_str,
                    reason: format!(
                        "no confirmed receipt after {}ms",
                        self.receipts.timeout.as_millis()
                    ),
                });
            }

            match self.provider.get_transaction_receipt(handle.hash).await {
                Ok(Some(rcpt)) => {
                    if !rcpt.status() {
                        return Err(AppError::Transaction {
                            hash: hash_str,
                            reason: "reverted on-chain".to_string(),
                        });
                    }
                    let block_number = rcpt.block_number();
                    let confirmed = match block_number {
                        Some(receipt_block) if self.receipts.confirm_blocks > 1 => {
                            let head = self
                                .provider
                                .get_block_number()
                                .await
                                .unwrap_or(receipt_block);
                            receipt_is_confirmed(
                                head.max(receipt_block),
                                receipt_block,
                                self.receipts.confirm_blocks,
                            )
                        }
                        _ => true,
                    };
                    if confirmed {
                        return Ok(TxReceiptSummary {
                            hash: handle.hash,
                            block_number,
                            gas_used: rcpt.gas_used(),
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::debug!(
                        target: "ledger",
                        error = %e,
                        hash = %hash_str,
                        "Receipt lookup error; retrying"
                    );
                }
            }

            sleep(self.receipts.poll).await;
        }
    }
}
