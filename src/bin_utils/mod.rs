//! Wires the library together for the binary: CSV in, bulk transfer, CSV out.
//! Kept inside the library so the integration tests can drive it too.

use std::{
    io::{Read, Write},
    sync::Arc,
};

use anyhow::{Context as _, Result};
use tracing::info;

use crate::{
    account::Account,
    config::LedgerConfig,
    context::Context,
    store::in_memory_store::InMemoryAccountStore,
    transfer::{TransferRequest, bulk::BulkTransferPipeline, engine::TransferEngine},
};
use csv_parser::{AccountRecord, CsvRecordParser};
use csv_printer::{ResultRecord, print_results};
pub mod csv_parser;
pub mod csv_printer;

pub struct Service<'w, A, T, W: 'w> {
    pub accounts: A,
    pub transfers: T,
    pub output: &'w mut W,
    pub config: LedgerConfig,
}

impl<'w, A, T, W> Service<'w, A, T, W>
where
    A: Read,
    T: Read,
    W: Write + 'w,
{
    pub async fn run(self) -> Result<()> {
        let mut seed = Vec::new();
        for (line, row) in CsvRecordParser::<_, AccountRecord>::new(self.accounts) {
            let record = row.with_context(|| format!("Malformed account at line {line}"))?;
            let account = Account::try_from(record)
                .with_context(|| format!("Invalid account at line {line}"))?;
            seed.push(account);
        }
        let store = Arc::new(
            InMemoryAccountStore::with_accounts(self.config.store_latency, seed)
                .context("Failed to seed accounts")?,
        );

        let mut requests = Vec::new();
        for (line, row) in CsvRecordParser::<_, TransferRequest>::new(self.transfers) {
            requests.push(row.with_context(|| format!("Malformed transfer at line {line}"))?);
        }

        let engine = Arc::new(TransferEngine::with_timeout(
            store.clone(),
            self.config.transfer_timeout,
        ));
        let pipeline = BulkTransferPipeline::with_workers(engine, self.config.bulk_workers);
        let results = pipeline
            .bulk_transfer(&Context::background(), requests)
            .await;

        print_results(self.output, results.iter().map(ResultRecord::from))?;

        for account in store.accounts() {
            info!(
                account_id = account.id(),
                name = account.name(),
                balance = %account.balance(),
                "Final balance"
            );
        }
        let stats = pipeline.engine().stats();
        info!(total = stats.total, succeeded = stats.succeeded, "Transfer stats");
        Ok(())
    }
}
