// SPDX-License-Identifier: MIT
// In-memory ledger shared by the integration tests. Approvals update the
// stored allowance; every other submission is only recorded.

#![allow(dead_code)]

use alloy::primitives::{Address, B256, Bytes, U256};
use alloy::sol_types::{SolCall, SolValue};
use oxidity_pacer::app::config::{ContractSettings, GlobalSettings};
use oxidity_pacer::data::contracts::{IERC20, IUniswapV2Factory, IUniswapV2Router};
use oxidity_pacer::domain::error::AppError;
use oxidity_pacer::network::ledger::{ContractCall, Ledger, TxHandle, TxReceiptSummary};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

pub const OWNER: Address = Address::repeat_byte(0x01);
pub const ROUTER: Address = Address::repeat_byte(0x10);
pub const STAKING: Address = Address::repeat_byte(0x20);
pub const WRAPPED: Address = Address::repeat_byte(0x30);
pub const TOKEN_A: Address = Address::repeat_byte(0x40);
pub const TOKEN_B: Address = Address::repeat_byte(0x50);
pub const FACTORY: Address = Address::repeat_byte(0x60);
pub const PAIR: Address = Address::repeat_byte(0x70);

#[derive(Debug, Clone)]
pub struct Submitted {
    pub label: &'static str,
    pub to: Address,
    pub input: Bytes,
    pub value: U256,
    pub at: tokio::time::Instant,
}

pub struct MemoryLedger {
    native: Mutex<U256>,
    balances: Mutex<HashMap<Address, U256>>,
    decimals: Mutex<HashMap<Address, u8>>,
    pair: Mutex<Address>,
    reserves: Mutex<(U256, U256)>,
    allowances: Mutex<HashMap<(Address, Address), U256>>,
    submitted: Mutex<Vec<Submitted>>,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
    revert_labels: Mutex<Vec<&'static str>>,
}

impl MemoryLedger {
    /// Every token at 18 decimals except `TOKEN_B` at 6, all funded. The
    /// `TOKEN_A`/`TOKEN_B` pair holds 1000 A against 2000 B.
    pub fn funded() -> Self {
        let decimals = HashMap::from([(TOKEN_A, 18), (TOKEN_B, 6), (WRAPPED, 18)]);
        let balances = HashMap::from([
            (TOKEN_A, U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64))),
            (TOKEN_B, U256::from(1_000_000_000u64)),
            (WRAPPED, U256::from(50u64) * U256::from(10u64).pow(U256::from(18u64))),
        ]);
        Self {
            native: Mutex::new(U256::from(100u64) * U256::from(10u64).pow(U256::from(18u64))),
            balances: Mutex::new(balances),
            decimals: Mutex::new(decimals),
            pair: Mutex::new(PAIR),
            reserves: Mutex::new((
                U256::from(1_000u64) * U256::from(10u64).pow(U256::from(18u64)),
                U256::from(2_000_000_000u64),
            )),
            allowances: Mutex::new(HashMap::new()),
            submitted: Mutex::new(Vec::new()),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            revert_labels: Mutex::new(Vec::new()),
        }
    }

    pub fn set_balance(&self, token: Address, amount: U256) {
        self.balances.lock().unwrap().insert(token, amount);
    }

    pub fn set_decimals(&self, token: Address, decimals: u8) {
        self.decimals.lock().unwrap().insert(token, decimals);
    }

    /// `Address::ZERO` makes the factory report no pair.
    pub fn set_pair(&self, pair: Address) {
        *self.pair.lock().unwrap() = pair;
    }

    /// Reserves as (`TOKEN_A`, `TOKEN_B`).
    pub fn set_reserves(&self, reserve_a: U256, reserve_b: U256) {
        *self.reserves.lock().unwrap() = (reserve_a, reserve_b);
    }

    pub fn set_native(&self, amount: U256) {
        *self.native.lock().unwrap() = amount;
    }

    pub fn revert(&self, label: &'static str) {
        self.revert_labels.lock().unwrap().push(label);
    }

    pub fn submitted(&self) -> Vec<Submitted> {
        self.submitted.lock().unwrap().clone()
    }

    pub fn labels(&self) -> Vec<&'static str> {
        self.submitted().iter().map(|s| s.label).collect()
    }

    pub fn count(&self, label: &str) -> usize {
        self.submitted().iter().filter(|s| s.label == label).count()
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

impl Ledger for MemoryLedger {
    fn owner(&self) -> Address {
        OWNER
    }

    async fn native_balance(&self) -> Result<U256, AppError> {
        Ok(*self.native.lock().unwrap())
    }

    async fn balance_of(&self, token: Address, _owner: Address) -> Result<U256, AppError> {
        Ok(self
            .balances
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .unwrap_or_default())
    }

    async fn decimals(&self, token: Address) -> Result<u8, AppError> {
        self.decimals
            .lock()
            .unwrap()
            .get(&token)
            .copied()
            .ok_or_else(|| AppError::Connection(format!("decimals {:#x} failed", token)))
    }

    async fn allowance(
        &self,
        token: Address,
        _owner: Address,
        spender: Address,
    ) -> Result<U256, AppError> {
        Ok(self
            .allowances
            .lock()
            .unwrap()
            .get(&(token, spender))
            .copied()
            .unwrap_or_default())
    }

    async fn submit(&self, call: ContractCall) -> Result<TxHandle, AppError> {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);

        if call.label == "approve" {
            let decoded = IERC20::approveCall::abi_decode(&call.input)
                .map_err(|e| AppError::submission(e.to_string()))?;
            self.allowances
                .lock()
                .unwrap()
                .insert((call.to, decoded.spender), decoded.amount);
        }
        let mut submitted = self.submitted.lock().unwrap();
        submitted.push(Submitted {
            label: call.label,
            to: call.to,
            input: call.input.clone(),
            value: call.value,
            at: tokio::time::Instant::now(),
        });
        Ok(TxHandle {
            hash: B256::with_last_byte(submitted.len() as u8),
        })
    }

    async fn read(&self, call: ContractCall) -> Result<Bytes, AppError> {
        let encoded = match call.label {
            "factory" => (FACTORY,).abi_encode_params(),
            "getPair" => {
                let query = IUniswapV2Factory::getPairCall::abi_decode(&call.input)
                    .map_err(|e| AppError::Connection(e.to_string()))?;
                assert_eq!((query.tokenA, query.tokenB), (TOKEN_A, TOKEN_B));
                (*self.pair.lock().unwrap(),).abi_encode_params()
            }
            "token0" => (TOKEN_A,).abi_encode_params(),
            "getReserves" => {
                let (a, b) = *self.reserves.lock().unwrap();
                (a, b, U256::ZERO).abi_encode_params()
            }
            _ => {
                let quote = IUniswapV2Router::getAmountsOutCall::abi_decode(&call.input)
                    .map_err(|e| AppError::Connection(e.to_string()))?;
                let out = quote.amountIn * U256::from(2u64);
                (vec![quote.amountIn, out],).abi_encode_params()
            }
        };
        Ok(Bytes::from(encoded))
    }

    async fn await_receipt(&self, handle: TxHandle) -> Result<TxReceiptSummary, AppError> {
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        let label = self
            .submitted
            .lock()
            .unwrap()
            .last()
            .map(|s| s.label)
            .unwrap_or_default();
        if self.revert_labels.lock().unwrap().contains(&label) {
            return Err(AppError::Transaction {
                hash: format!("{:#x}", handle.hash),
                reason: "reverted on-chain".into(),
            });
        }
        Ok(TxReceiptSummary {
            hash: handle.hash,
            block_number: Some(1),
            gas_used: 21_000,
        })
    }
}

pub fn settings() -> GlobalSettings {
    GlobalSettings {
        debug: false,
        json_logs: false,
        rpc_url: Some("http://127.0.0.1:8545".into()),
        chain_id: None,
        wallet_key: "unused".into(),
        wallet_address: None,
        cycle_cooldown_secs: 86_400,
        approval_ceiling_units: 1_000_000,
        slippage_bps: 100,
        deadline_secs: 300,
        receipt_poll_ms: 1_000,
        receipt_timeout_ms: 120_000,
        receipt_confirm_blocks: 1,
        contracts: ContractSettings {
            router: Some(ROUTER),
            staking: Some(STAKING),
            stake_token: None,
            wrapped_native: Some(WRAPPED),
            token_a: Some(TOKEN_A),
            token_b: Some(TOKEN_B),
        },
        batches: Vec::new(),
    }
}
