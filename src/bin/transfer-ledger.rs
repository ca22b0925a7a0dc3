use std::fs::File;

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;
use transfer_ledger::{bin_utils::Service, config::LedgerConfig};

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut args = std::env::args().skip(1);
    let accounts_file = args
        .next()
        .context("Expected an accounts file name as the first argument")?;
    let transfers_file = args
        .next()
        .context("Expected a transfers file name as the second argument")?;
    let accounts = File::open(&accounts_file)
        .with_context(|| format!("Failed to open `{accounts_file}`"))?;
    let transfers = File::open(&transfers_file)
        .with_context(|| format!("Failed to open `{transfers_file}`"))?;

    let service = Service {
        accounts,
        transfers,
        output: &mut std::io::stdout(),
        config: LedgerConfig::from_env().context("Invalid configuration")?,
    };
    service.run().await
}
