//! Tally balance replay.
//!
//! Loads a tenant snapshot (accounts and transactions as JSON), re-validates
//! every posted transaction, rebuilds balances from the transaction log and
//! prints the drift report to stdout.
//!
//! Usage: tally-replay <snapshot.json>

mod audit;

use std::process::ExitCode;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use tally_core::ledger::PermissionTable;
use tally_shared::{AppConfig, LoggingConfig};

use crate::audit::{Snapshot, audit};

fn main() -> anyhow::Result<ExitCode> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("failed to load configuration")?;
    init_tracing(&config.logging);

    let path = std::env::args()
        .nth(1)
        .context("usage: tally-replay <snapshot.json>")?;
    let raw = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let snapshot: Snapshot =
        serde_json::from_str(&raw).with_context(|| format!("parsing snapshot {path}"))?;

    let permissions = match &config.ledger.permissions_path {
        Some(table_path) => {
            let json = std::fs::read_to_string(table_path)
                .with_context(|| format!("reading {}", table_path.display()))?;
            PermissionTable::from_json(&json)?
        }
        None => PermissionTable::builtin(),
    };
    info!(
        version = permissions.version,
        tolerance = %config.ledger.balance_tolerance,
        accounts = snapshot.accounts.len(),
        transactions = snapshot.transactions.len(),
        "Replaying snapshot"
    );

    let report = audit(&snapshot, &permissions, config.ledger.balance_tolerance)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    Ok(if report.is_clean() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.filter));
    let registry = tracing_subscriber::registry().with(filter);

    // Logs go to stderr so stdout carries only the report.
    if logging.json {
        registry
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry.with(fmt::layer().with_writer(std::io::stderr)).init();
    }
}
