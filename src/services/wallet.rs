// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@on1.no>

use crate::common::constants::NATIVE_DECIMALS;
use crate::common::parsing::format_token_amount;
use crate::domain::error::AppError;
use crate::network::ledger::Ledger;
use alloy::primitives::{Address, U256};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenBalance {
    pub label: String,
    pub address: Address,
    pub decimals: u8,
    pub balance: U256,
}

/// Point-in-time view of the wallet. Read failures are logged and the
/// affected line is left out; collecting never fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletSummary {
    pub owner: Address,
    pub native: Option<U256>,
    pub tokens: Vec<TokenBalance>,
}

impl WalletSummary {
    pub async fn collect<L: Ledger>(ledger: &L, watched: &[(String, Address)]) -> Self {
        let owner = ledger.owner();
        let native = match ledger.native_balance().await {
            Ok(v) => Some(v),
            Err(e) => {
                tracing::warn!(target: "wallet", error = %e, "Native balance unavailable");
                None
            }
        };

        let mut tokens = Vec::with_capacity(watched.len());
        for (label, address) in watched {
            let read = async {
                let decimals = ledger.decimals(*address).await?;
                let balance = ledger.balance_of(*address, owner).await?;
                Ok::<_, AppError>((decimals, balance))
            };
            match read.await {
                Ok((decimals, balance)) => tokens.push(TokenBalance {
                    label: label.clone(),
                    address: *address,
                    decimals,
                    balance,
                }),
                Err(e) => tracing::warn!(
                    target: "wallet",
                    token = %label,
                    address = %format!("{:#x}", address),
                    error = %e,
                    "Token balance unavailable"
                ),
            }
        }

        Self {
            owner,
            native,
            tokens,
        }
    }

    pub fn log(&self) {
        tracing::info!(
            target: "wallet",
            owner = %format!("{:#x}", self.owner),
            native = %self
                .native
                .map(|v| format_token_amount(v, NATIVE_DECIMALS))
                .unwrap_or_else(|| "n/a".to_string()),
            "Wallet summary"
        );
        for token in &self.tokens {
            tracing::info!(
                target: "wallet",
                token = %token.label,
                address = %format!("{:#x}", token.address),
                balance = %format_token_amount(token.balance, token.decimals),
                "Token balance"
            );
        }
    }
}
