use std::{collections::HashSet, str::from_utf8, sync::Arc};

use rust_decimal_macros::dec;
use transfer_ledger::{
    account::Account,
    bin_utils::Service,
    config::LedgerConfig,
    context::Context,
    store::in_memory_store::{InMemoryAccountStore, StoreLatency},
    transfer::{bulk::BulkTransferPipeline, engine::TransferEngine},
};

const ACCOUNTS_FILE: &str = include_str!("accounts.csv");
const TRANSFERS_FILE: &str = include_str!("transfers.csv");

#[tokio::test]
async fn process_transfer_file() {
    let mut output = Vec::new();
    let service = Service {
        accounts: ACCOUNTS_FILE.as_bytes(),
        transfers: TRANSFERS_FILE.as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
    };
    service.run().await.unwrap();
    // results come back in completion order, so compare as a set
    let lines: HashSet<String> = from_utf8(&output)
        .unwrap()
        .lines()
        .map(ToOwned::to_owned)
        .collect();
    assert_eq!(lines.len(), 8);
    assert!(lines.contains("request_id,success,code,message"));
    assert!(lines.contains("REQ-1,true,,"));
    assert!(lines.contains("REQ-2,true,,"));
    assert!(lines.contains("REQ-3,true,,"));
    assert!(lines.contains("REQ-4,false,SAME_ACCOUNT_TRANSFER,Cannot transfer from account 1 to itself"));
    assert!(lines.contains("REQ-5,false,ACCOUNT_NOT_FOUND,Account 999 not found"));
    assert!(lines.iter().any(|l| l.starts_with("REQ-6,false,INSUFFICIENT_BALANCE,")));
    assert!(lines.contains("REQ-7,false,INVALID_AMOUNT,Invalid transfer amount: 0"));
}

#[tokio::test]
async fn malformed_transfer_file_is_rejected() {
    let mut output = Vec::new();
    let service = Service {
        accounts: ACCOUNTS_FILE.as_bytes(),
        transfers: "request_id,from,to,amount\nREQ-1,1,2,ten\n".as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
    };
    let err = service.run().await.unwrap_err();
    assert!(err.to_string().starts_with("Malformed transfer at line"));
    assert!(output.is_empty());
}

#[tokio::test]
async fn duplicate_seed_is_rejected() {
    let mut output = Vec::new();
    let service = Service {
        accounts: "id,name,balance\n1,Alice,10\n1,Alias,20\n".as_bytes(),
        transfers: TRANSFERS_FILE.as_bytes(),
        output: &mut output,
        config: LedgerConfig::default(),
    };
    let err = service.run().await.unwrap_err();
    assert_eq!(err.to_string(), "Failed to seed accounts");
}

#[tokio::test]
async fn single_and_bulk_transfers_share_one_store() {
    let store = Arc::new(
        InMemoryAccountStore::with_accounts(
            StoreLatency::default(),
            [
                Account::new("1", "Alice", dec!(1000)).unwrap(),
                Account::new("2", "Bob", dec!(500)).unwrap(),
                Account::new("3", "Charlie", dec!(750)).unwrap(),
            ],
        )
        .unwrap(),
    );
    let engine = Arc::new(TransferEngine::new(store.clone()));
    let pipeline = BulkTransferPipeline::new(engine.clone());
    let ctx = Context::background();

    engine.transfer(&ctx, "1", "2", dec!(150)).await.unwrap();
    assert_eq!(engine.get_account_balance(&ctx, "1").await.unwrap(), dec!(850));
    assert_eq!(engine.get_account_balance(&ctx, "2").await.unwrap(), dec!(650));

    let requests = (0..30)
        .map(|i| {
            let (from, to) = if i % 2 == 0 { ("2", "3") } else { ("3", "2") };
            transfer_ledger::transfer::TransferRequest::new(format!("R{i}"), from, to, dec!(20))
        })
        .collect();
    let results = pipeline.bulk_transfer(&ctx, requests).await;
    assert_eq!(results.len(), 30);
    assert!(results.iter().all(|r| r.success()));

    assert_eq!(store.total_balance(), dec!(2250));
    assert_eq!(engine.get_account_balance(&ctx, "2").await.unwrap(), dec!(650));
    assert_eq!(engine.get_account_balance(&ctx, "3").await.unwrap(), dec!(750));
    let stats = engine.stats();
    assert_eq!((stats.total, stats.succeeded), (31, 31));
}
