// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2026 ® John Hauger Mitander <john@mitander.dev>

use alloy::signers::local::PrivateKeySigner;
use clap::Parser;
use futures::FutureExt;
use oxidity_pacer::app::config::GlobalSettings;
use oxidity_pacer::app::logging::setup_logging;
use oxidity_pacer::domain::error::AppError;
use oxidity_pacer::infrastructure::network::ledger::RpcLedger;
use oxidity_pacer::infrastructure::network::provider::ConnectionFactory;
use oxidity_pacer::services::actions::build_batches;
use oxidity_pacer::services::runner::{ActionExecutor, CycleOrchestrator, UniformDelay};
use oxidity_pacer::services::wallet::WalletSummary;
use std::str::FromStr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

#[derive(Parser, Debug)]
#[command(author, version, about = "oxidity pacer: paced testnet activity runner")]
struct Cli {
    /// Path to config file (default: active config.*.toml, then config.toml)
    #[arg(long)]
    config: Option<String>,

    /// Stop after this many cycles instead of running until Ctrl-C
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    cycles: Option<u64>,

    /// Print the wallet summary and exit
    #[arg(long, default_value_t = false)]
    balances: bool,

    /// Emit JSON log lines (overrides config/env)
    #[arg(long, default_value_t = false)]
    json_logs: bool,
}

#[tokio::main]
async fn main() -> Result<(), AppError> {
    let cli = Cli::parse();

    let settings = GlobalSettings::load_with_path(cli.config.as_deref())?;
    setup_logging(
        if settings.debug { "debug" } else { "info" },
        cli.json_logs || settings.json_logs,
    );
    settings.validate()?;

    let wallet_signer = PrivateKeySigner::from_str(settings.wallet_key.trim())
        .map_err(|e| AppError::Config(format!("Invalid wallet key: {}", e)))?;
    let wallet_address = wallet_signer.address();
    if let Some(expected) = settings.wallet_address
        && expected != wallet_address
    {
        return Err(AppError::Config(format!(
            "wallet_address {:#x} does not match wallet_key address {:#x}",
            expected, wallet_address
        )));
    }

    let rpc_url = settings.rpc_url()?;
    let provider = ConnectionFactory::signing(&rpc_url, wallet_signer)?;
    let ledger = Arc::new(RpcLedger::new(
        provider,
        wallet_address,
        settings.receipt_policy(),
    ));

    let chain_id = ledger.chain_id().await?;
    if let Some(expected) = settings.chain_id
        && expected != chain_id
    {
        return Err(AppError::Config(format!(
            "chain_id {} configured but RPC reports {}",
            expected, chain_id
        )));
    }
    tracing::info!(
        target: "config",
        chain_id,
        rpc = %rpc_url,
        wallet = %format!("{:#x}", wallet_address),
        cooldown_secs = settings.cycle_cooldown_secs,
        "Connected"
    );

    let watched = settings.watched_tokens();
    WalletSummary::collect(ledger.as_ref(), &watched).await.log();
    if cli.balances {
        return Ok(());
    }

    let batches = build_batches(&settings, ledger.clone()).await?;
    if batches.is_empty() {
        tracing::warn!(target: "config", "No batches configured; cycles will only cool down");
    }

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received; finishing current step and shutting down");
            signal_token.cancel();
        }
    });

    let hook_ledger = ledger.clone();
    let orchestrator = CycleOrchestrator::new(
        ActionExecutor::new(UniformDelay, shutdown.clone()),
        shutdown,
    )
    .with_cooldown(settings.cycle_cooldown())
    .with_max_cycles(cli.cycles)
    .with_cycle_hook(Box::new(move |_cycle| {
        let ledger = hook_ledger.clone();
        let watched = watched.clone();
        async move {
            WalletSummary::collect(ledger.as_ref(), &watched).await.log();
        }
        .boxed()
    }));

    let summary = orchestrator.run(&batches).await?;
    tracing::info!(
        target: "cycle",
        cycles = summary.cycles_completed,
        cooldowns = summary.cooldowns_entered,
        succeeded = summary.iterations_succeeded,
        failed = summary.iterations_failed,
        "Runner stopped"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycles_flag_rejects_zero() {
        assert!(Cli::try_parse_from(["oxidity-pacer", "--cycles", "0"]).is_err());
        let cli = Cli::try_parse_from(["oxidity-pacer", "--cycles", "2"]).unwrap();
        assert_eq!(cli.cycles, Some(2));
    }
}
