// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use crate::common::parsing::parse_count;
use crate::domain::constants;
use crate::domain::error::AppError;
use crate::network::ledger::ReceiptPolicy;
use alloy::primitives::Address;
use config::{Config, Environment, File};
use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct GlobalSettings {
    // General
    #[serde(default = "default_debug")]
    pub debug: bool,
    #[serde(default = "default_false")]
    pub json_logs: bool,
    pub rpc_url: Option<String>,
    /// Expected chain id; checked against the RPC at startup when set.
    pub chain_id: Option<u64>,

    // Identity
    #[serde(default)]
    pub wallet_key: String,
    pub wallet_address: Option<Address>,

    // Pacing
    #[serde(default = "default_cycle_cooldown_secs")]
    pub cycle_cooldown_secs: u64,

    // Transaction
    #[serde(default = "default_approval_ceiling_units")]
    pub approval_ceiling_units: u64,
    #[serde(default = "default_slippage_bps")]
    pub slippage_bps: u64,
    #[serde(default = "default_deadline_secs")]
    pub deadline_secs: u64,
    #[serde(default = "default_receipt_poll_ms")]
    pub receipt_poll_ms: u64,
    #[serde(default = "default_receipt_timeout_ms")]
    pub receipt_timeout_ms: u64,
    #[serde(default = "default_receipt_confirm_blocks")]
    pub receipt_confirm_blocks: u64,

    #[serde(default)]
    pub contracts: ContractSettings,
    #[serde(default)]
    pub batches: Vec<BatchSettings>,
}

/// The fixed contract set the bot talks to.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ContractSettings {
    pub router: Option<Address>,
    pub staking: Option<Address>,
    /// Token staked into `staking`; defaults to `token_a`.
    pub stake_token: Option<Address>,
    pub wrapped_native: Option<Address>,
    pub token_a: Option<Address>,
    pub token_b: Option<Address>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Stake,
    Swap,
    AddLiquidity,
    Wrap,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Stake => "stake",
            ActionKind::Swap => "swap",
            ActionKind::AddLiquidity => "add_liquidity",
            ActionKind::Wrap => "wrap",
        }
    }

    /// Swaps and wraps alternate legs unless the batch says otherwise.
    pub fn bidirectional_by_default(&self) -> bool {
        matches!(self, ActionKind::Swap | ActionKind::Wrap)
    }
}

/// TOML gives numbers, the environment gives strings.
#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum RawCount {
    Number(i64),
    Text(String),
}

#[derive(Debug, Deserialize, Clone)]
pub struct BatchSettings {
    pub action: ActionKind,
    pub name: Option<String>,
    pub iterations: RawCount,
    #[serde(default)]
    pub min_delay_ms: u64,
    #[serde(default)]
    pub max_delay_ms: u64,
    /// Human decimal amount per iteration ("0.01"). Defaults to one token.
    pub amount: Option<String>,
    /// Upper bound for a random amount; `amount` is then the lower bound.
    pub amount_max: Option<String>,
    pub bidirectional: Option<bool>,
}

impl BatchSettings {
    pub fn display_name(&self) -> String {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .unwrap_or_else(|| self.action.as_str().to_string())
    }

    pub fn is_bidirectional(&self) -> bool {
        self.bidirectional
            .unwrap_or_else(|| self.action.bidirectional_by_default())
    }

    pub fn iteration_count(&self, idx: usize) -> Result<i64, AppError> {
        match &self.iterations {
            RawCount::Number(n) => Ok(*n),
            RawCount::Text(raw) => parse_count(&format!("batches[{idx}].iterations"), raw),
        }
    }
}

// Defaults
fn default_debug() -> bool {
    false
}
fn default_false() -> bool {
    false
}
fn default_cycle_cooldown_secs() -> u64 {
    constants::SECONDS_PER_DAY
}
fn default_approval_ceiling_units() -> u64 {
    constants::DEFAULT_APPROVAL_CEILING_UNITS
}
fn default_slippage_bps() -> u64 {
    constants::DEFAULT_SLIPPAGE_BPS
}
fn default_deadline_secs() -> u64 {
    constants::DEFAULT_DEADLINE_SECS
}
fn default_receipt_poll_ms() -> u64 {
    constants::DEFAULT_RECEIPT_POLL_MS
}
fn default_receipt_timeout_ms() -> u64 {
    constants::DEFAULT_RECEIPT_TIMEOUT_MS
}
fn default_receipt_confirm_blocks() -> u64 {
    constants::DEFAULT_RECEIPT_CONFIRM_BLOCKS
}

impl GlobalSettings {
    pub fn load_with_path(path: Option<&str>) -> Result<Self, AppError> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        let selected_config = resolve_config_path(path);
        let mut builder = Config::builder();

        if let Some(ref selected_path) = selected_config {
            builder = builder.add_source(File::from(Path::new(selected_path)).required(true));
        } else {
            builder = builder.add_source(File::with_name("config").required(false));
        }
        // Deterministic precedence: CLI (in main) > env/.env > selected profile file.
        builder = builder.add_source(Environment::default());

        let settings: GlobalSettings = builder.build()?.try_deserialize()?;

        if settings.wallet_key.trim().is_empty() {
            return Err(AppError::Config("WALLET_KEY is missing".to_string()));
        }

        Ok(settings)
    }

    pub fn load() -> Result<Self, AppError> {
        Self::load_with_path(None)
    }

    pub fn rpc_url(&self) -> Result<String, AppError> {
        self.rpc_url
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(ToString::to_string)
            .ok_or_else(|| AppError::Config("RPC_URL is missing".to_string()))
    }

    pub fn cycle_cooldown(&self) -> Duration {
        Duration::from_secs(self.cycle_cooldown_secs)
    }

    pub fn receipt_policy(&self) -> ReceiptPolicy {
        ReceiptPolicy::from_millis(
            self.receipt_poll_ms,
            self.receipt_timeout_ms,
            self.receipt_confirm_blocks,
        )
    }

    pub fn stake_token(&self) -> Option<Address> {
        self.contracts.stake_token.or(self.contracts.token_a)
    }

    /// Tokens worth showing in the wallet summary, deduplicated.
    pub fn watched_tokens(&self) -> Vec<(String, Address)> {
        let candidates = [
            ("token_a", self.contracts.token_a),
            ("token_b", self.contracts.token_b),
            ("stake_token", self.contracts.stake_token),
            ("wrapped_native", self.contracts.wrapped_native),
        ];
        let mut out: Vec<(String, Address)> = Vec::new();
        for (label, addr) in candidates {
            if let Some(addr) = addr
                && !out.iter().any(|(_, a)| *a == addr)
            {
                out.push((label.to_string(), addr));
            }
        }
        out
    }

    /// Everything that can be checked without touching the chain. Amounts
    /// need token decimals and are checked when batches are built.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.slippage_bps > constants::MAX_SLIPPAGE_BPS {
            return Err(AppError::validation(
                "slippage_bps",
                format!("{} exceeds {}", self.slippage_bps, constants::MAX_SLIPPAGE_BPS),
            ));
        }
        if self.cycle_cooldown_secs == 0 {
            return Err(AppError::validation(
                "cycle_cooldown_secs",
                "must be greater than zero",
            ));
        }
        if self.approval_ceiling_units == 0 {
            return Err(AppError::validation(
                "approval_ceiling_units",
                "must be greater than zero",
            ));
        }

        for (idx, batch) in self.batches.iter().enumerate() {
            batch.iteration_count(idx)?;
            if batch.max_delay_ms < batch.min_delay_ms {
                return Err(AppError::validation(
                    format!("batches[{idx}].max_delay_ms"),
                    format!(
                        "max_delay_ms ({}) must be >= min_delay_ms ({})",
                        batch.max_delay_ms, batch.min_delay_ms
                    ),
                ));
            }
            self.require_contracts(idx, batch.action)?;
        }
        Ok(())
    }

    fn require_contracts(&self, idx: usize, action: ActionKind) -> Result<(), AppError> {
        let c = &self.contracts;
        let required: Vec<(&str, bool)> = match action {
            ActionKind::Stake => vec![
                ("contracts.staking", c.staking.is_some()),
                ("contracts.stake_token", self.stake_token().is_some()),
            ],
            ActionKind::Swap | ActionKind::AddLiquidity => vec![
                ("contracts.router", c.router.is_some()),
                ("contracts.token_a", c.token_a.is_some()),
                ("contracts.token_b", c.token_b.is_some()),
            ],
            ActionKind::Wrap => vec![("contracts.wrapped_native", c.wrapped_native.is_some())],
        };
        for (field, present) in required {
            if !present {
                return Err(AppError::validation(
                    field,
                    format!("required by batches[{idx}] ({})", action.as_str()),
                ));
            }
        }
        Ok(())
    }
}

fn resolve_config_path(path: Option<&str>) -> Option<String> {
    if let Some(path) = path {
        return Some(path.to_string());
    }
    detect_active_config_file()
}

fn detect_active_config_file() -> Option<String> {
    let priority_files = ["config.testnet.toml", "config.dev.toml", "config.toml"];

    for file in priority_files.iter() {
        if let Some(true) = config_has_active_flag(file) {
            return Some((*file).to_string());
        }
    }

    // Fallback: scan current dir for config.*.toml with THIS_ACTIVE = true
    if let Ok(entries) = fs::read_dir(".") {
        for entry in entries.flatten() {
            let path = entry.path();
            if let Some(name) = path.file_name().and_then(|n| n.to_str())
                && name.starts_with("config.")
                && name.ends_with(".toml")
                && let Some(true) = config_has_active_flag(name)
            {
                return Some(name.to_string());
            }
        }
    }

    None
}

fn config_has_active_flag(path: &str) -> Option<bool> {
    let p = Path::new(path);
    if !p.exists() {
        return None;
    }

    Config::builder()
        .add_source(File::from(p))
        .build()
        .ok()?
        .get_bool("THIS_ACTIVE")
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Mutex, OnceLock};

    fn env_lock_guard() -> std::sync::MutexGuard<'static, ()> {
        static ENV_LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        ENV_LOCK
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }

    fn base_settings() -> GlobalSettings {
        GlobalSettings {
            debug: default_debug(),
            json_logs: default_false(),
            rpc_url: Some("http://127.0.0.1:8545".to_string()),
            chain_id: None,
            wallet_key: "0x0".to_string(),
            wallet_address: None,
            cycle_cooldown_secs: default_cycle_cooldown_secs(),
            approval_ceiling_units: default_approval_ceiling_units(),
            slippage_bps: default_slippage_bps(),
            deadline_secs: default_deadline_secs(),
            receipt_poll_ms: default_receipt_poll_ms(),
            receipt_timeout_ms: default_receipt_timeout_ms(),
            receipt_confirm_blocks: default_receipt_confirm_blocks(),
            contracts: ContractSettings {
                router: Some(Address::repeat_byte(0x01)),
                staking: Some(Address::repeat_byte(0x02)),
                stake_token: None,
                wrapped_native: Some(Address::repeat_byte(0x03)),
                token_a: Some(Address::repeat_byte(0x04)),
                token_b: Some(Address::repeat_byte(0x05)),
            },
            batches: Vec::new(),
        }
    }

    fn batch(action: ActionKind, iterations: RawCount) -> BatchSettings {
        BatchSettings {
            action,
            name: None,
            iterations,
            min_delay_ms: 0,
            max_delay_ms: 0,
            amount: None,
            amount_max: None,
            bidirectional: None,
        }
    }

    #[test]
    fn defaults_match_daily_cycle() {
        let s = base_settings();
        assert_eq!(s.cycle_cooldown(), Duration::from_secs(86_400));
        assert_eq!(s.approval_ceiling_units, 1_000_000);
        assert!(s.validate().is_ok());
    }

    #[test]
    fn zero_cooldown_is_rejected() {
        let mut s = base_settings();
        s.cycle_cooldown_secs = 0;
        assert!(matches!(
            s.validate(),
            Err(AppError::Validation { ref field, .. }) if field == "cycle_cooldown_secs"
        ));
    }

    #[test]
    fn non_numeric_count_fails_fast() {
        let mut s = base_settings();
        s.batches
            .push(batch(ActionKind::Stake, RawCount::Text("NaN".into())));
        let err = s.validate().unwrap_err();
        assert!(
            matches!(err, AppError::Validation { ref field, .. } if field == "batches[0].iterations")
        );
    }

    #[test]
    fn string_and_negative_counts_are_accepted() {
        let mut s = base_settings();
        s.batches
            .push(batch(ActionKind::Swap, RawCount::Text(" 4 ".into())));
        s.batches.push(batch(ActionKind::Wrap, RawCount::Number(-2)));
        assert!(s.validate().is_ok());
        assert_eq!(s.batches[0].iteration_count(0).unwrap(), 4);
        assert_eq!(s.batches[1].iteration_count(1).unwrap(), -2);
    }

    #[test]
    fn inverted_delay_bounds_are_rejected() {
        let mut s = base_settings();
        let mut b = batch(ActionKind::Stake, RawCount::Number(1));
        b.min_delay_ms = 5_000;
        b.max_delay_ms = 1_000;
        s.batches.push(b);
        assert!(matches!(
            s.validate(),
            Err(AppError::Validation { ref field, .. }) if field == "batches[0].max_delay_ms"
        ));
    }

    #[test]
    fn missing_contract_is_reported_by_field() {
        let mut s = base_settings();
        s.contracts.router = None;
        s.batches
            .push(batch(ActionKind::AddLiquidity, RawCount::Number(1)));
        assert!(matches!(
            s.validate(),
            Err(AppError::Validation { ref field, .. }) if field == "contracts.router"
        ));
    }

    #[test]
    fn stake_token_falls_back_to_token_a() {
        let mut s = base_settings();
        assert_eq!(s.stake_token(), Some(Address::repeat_byte(0x04)));
        s.contracts.stake_token = Some(Address::repeat_byte(0x09));
        assert_eq!(s.stake_token(), Some(Address::repeat_byte(0x09)));
    }

    #[test]
    fn watched_tokens_are_deduplicated() {
        let mut s = base_settings();
        s.contracts.stake_token = s.contracts.token_a;
        let watched = s.watched_tokens();
        assert_eq!(watched.len(), 3);
        assert_eq!(watched[0].0, "token_a");
    }

    #[test]
    fn bidirectional_defaults_follow_action_kind() {
        let swap = batch(ActionKind::Swap, RawCount::Number(1));
        let stake = batch(ActionKind::Stake, RawCount::Number(1));
        assert!(swap.is_bidirectional());
        assert!(!stake.is_bidirectional());
        let mut one_way = swap.clone();
        one_way.bidirectional = Some(false);
        assert!(!one_way.is_bidirectional());
        assert_eq!(one_way.display_name(), "swap");
    }

    #[test]
    fn loads_batches_from_toml_file() {
        let _guard = env_lock_guard();
        let path = std::env::temp_dir().join(format!("pacer-config-{}.toml", std::process::id()));
        fs::write(
            &path,
            r#"
rpc_url = "http://127.0.0.1:8545"
wallet_key = "0x59c6995e998f97a5a0044966f0945389dc9e86dae88c7a8412f4603b6b78690d"
cycle_cooldown_secs = 60

[contracts]
staking = "0x2222222222222222222222222222222222222222"
token_a = "0x4444444444444444444444444444444444444444"

[[batches]]
action = "stake"
name = "Stake"
iterations = 2
min_delay_ms = 1000
max_delay_ms = 2000
amount = "0.01"

[[batches]]
action = "wrap"
iterations = "0"
"#,
        )
        .unwrap();

        let loaded = GlobalSettings::load_with_path(path.to_str());
        let _ = fs::remove_file(&path);
        let s = loaded.unwrap();

        assert_eq!(s.cycle_cooldown(), Duration::from_secs(60));
        assert_eq!(s.batches.len(), 2);
        assert_eq!(s.batches[0].action, ActionKind::Stake);
        assert_eq!(s.batches[0].iteration_count(0).unwrap(), 2);
        assert_eq!(s.batches[1].iteration_count(1).unwrap(), 0);
        assert_eq!(s.batches[0].amount.as_deref(), Some("0.01"));
    }
}
