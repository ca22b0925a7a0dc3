use std::sync::Arc;

use proptest::prelude::*;
use rust_decimal::Decimal;
use transfer_ledger::{
    account::Account,
    context::Context,
    store::in_memory_store::{InMemoryAccountStore, StoreLatency},
    transfer::{TransferRequest, bulk::BulkTransferPipeline, engine::TransferEngine},
};

const IDS: [&str; 4] = ["a", "b", "c", "d"];

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap()
}

fn store_with(balances: &[Decimal]) -> Arc<InMemoryAccountStore> {
    let accounts = IDS
        .iter()
        .zip(balances)
        .map(|(id, balance)| Account::new(*id, id.to_uppercase(), *balance).unwrap());
    Arc::new(InMemoryAccountStore::with_accounts(StoreLatency::default(), accounts).unwrap())
}

fn balances_of(store: &InMemoryAccountStore) -> Vec<Decimal> {
    store.accounts().iter().map(|acc| acc.balance()).collect()
}

/// Amounts with two decimal places, from 0.01 to 5000.00.
fn arb_amount() -> impl Strategy<Value = Decimal> {
    (1i64..=500_000).prop_map(|cents| Decimal::new(cents, 2))
}

fn arb_balances() -> impl Strategy<Value = Vec<Decimal>> {
    prop::collection::vec((0i64..=1_000_000).prop_map(|cents| Decimal::new(cents, 2)), 4)
}

fn arb_pair() -> impl Strategy<Value = (usize, usize)> {
    (0..IDS.len(), 0..IDS.len()).prop_filter("distinct accounts", |(a, b)| a != b)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    // A transfer either moves exactly `amount` or leaves both sides untouched.
    #[test]
    fn transfer_moves_exact_amount(
        balances in arb_balances(),
        (from, to) in arb_pair(),
        amount in arb_amount(),
    ) {
        let store = store_with(&balances);
        let engine = TransferEngine::new(store.clone());
        let outcome = runtime().block_on(
            engine.transfer(&Context::background(), IDS[from], IDS[to], amount),
        );

        let after = balances_of(&store);
        if balances[from] >= amount {
            prop_assert!(outcome.is_ok());
            prop_assert_eq!(after[from], balances[from] - amount);
            prop_assert_eq!(after[to], balances[to] + amount);
        } else {
            let err = outcome.unwrap_err();
            prop_assert_eq!(err.code(), "INSUFFICIENT_BALANCE");
            prop_assert_eq!(&after, &balances);
        }
        prop_assert_eq!(after.iter().sum::<Decimal>(), balances.iter().sum::<Decimal>());
    }

    // Amounts that aren't strictly positive are rejected up front.
    #[test]
    fn non_positive_amount_rejected(cents in -100_000i64..=0, (from, to) in arb_pair()) {
        let balances = vec![Decimal::new(1000, 0); 4];
        let store = store_with(&balances);
        let engine = TransferEngine::new(store.clone());
        let err = runtime()
            .block_on(engine.transfer(&Context::background(), IDS[from], IDS[to], Decimal::new(cents, 2)))
            .unwrap_err();
        prop_assert_eq!(err.code(), "INVALID_AMOUNT");
        prop_assert_eq!(balances_of(&store), balances);
    }

    // With plenty of funds every valid request succeeds in any order, so the bulk
    // run must match running the same requests one by one.
    #[test]
    fn bulk_matches_sequential(
        batch in prop::collection::vec(
            (0..IDS.len(), 0..IDS.len(), -50i64..=50),
            0..40,
        ),
        workers in 1usize..6,
    ) {
        let balances = vec![Decimal::new(10_000, 0); 4];
        let requests: Vec<_> = batch
            .iter()
            .enumerate()
            .map(|(i, (from, to, amount))| {
                TransferRequest::new(format!("R{i}"), IDS[*from], IDS[*to], Decimal::from(*amount))
            })
            .collect();

        let rt = runtime();
        let sequential = {
            let engine = TransferEngine::new(store_with(&balances));
            let ctx = Context::background();
            rt.block_on(async {
                let mut succeeded = 0;
                for r in &requests {
                    if engine.transfer(&ctx, &r.from_account_id, &r.to_account_id, r.amount).await.is_ok() {
                        succeeded += 1;
                    }
                }
                succeeded
            })
        };

        let store = store_with(&balances);
        let engine = Arc::new(TransferEngine::new(store.clone()));
        let pipeline = BulkTransferPipeline::with_workers(engine, workers);
        let results = rt.block_on(pipeline.bulk_transfer(&Context::background(), requests.clone()));

        prop_assert_eq!(results.len(), requests.len());
        let mut ids: Vec<_> = results.iter().map(|r| r.request_id.clone()).collect();
        ids.sort();
        let mut expected: Vec<_> = requests.iter().map(|r| r.request_id.clone()).collect();
        expected.sort();
        prop_assert_eq!(ids, expected);

        prop_assert_eq!(results.iter().filter(|r| r.success()).count(), sequential);
        prop_assert_eq!(store.total_balance(), Decimal::new(40_000, 0));
        prop_assert_eq!(pipeline.engine().stats().total, requests.len() as u64);
    }
}
