// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@oxidity.com>

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Connection failed to endpoint: {0}")]
    Connection(String),

    /// Submission or confirmation rejected by the ledger. Recovered per iteration.
    #[error("Transaction failed: {hash}, reason: {reason}")]
    Transaction { hash: String, reason: String },

    /// Pre-flight balance check failed; nothing was submitted.
    #[error("Insufficient funds for {asset}. Required: {required}, Available: {available}")]
    InsufficientFunds {
        asset: String,
        required: String,
        available: String,
    },

    /// Malformed operator input, surfaced before any batch starts.
    #[error("Validation failed for field {field}: {message}")]
    Validation { field: String, message: String },

    #[error(transparent)]
    Unknown(#[from] anyhow::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Transaction failure that never reached the mempool.
    pub fn submission(reason: impl std::fmt::Display) -> Self {
        AppError::Transaction {
            hash: "<unsent>".to_string(),
            reason: reason.to_string(),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}
