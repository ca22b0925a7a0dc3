use std::{sync::Arc, time::Duration};

use futures::future::try_join;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::{
    account::Account,
    context::{Context, ContextError},
    stats::{StatsCounter, TransferStats},
    store::{AccountStore, StoreError},
};

use super::TransferError;

pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(3);

/// Executes single transfers against an [`AccountStore`].
pub struct TransferEngine {
    store: Arc<dyn AccountStore>,
    stats: StatsCounter,
    timeout: Duration,
}

impl TransferEngine {
    pub fn new(store: Arc<dyn AccountStore>) -> Self {
        Self::with_timeout(store, DEFAULT_TRANSFER_TIMEOUT)
    }

    /// `timeout` bounds every single [`TransferEngine::transfer`] call, on top of
    /// whatever deadline the caller's context already carries.
    pub fn with_timeout(store: Arc<dyn AccountStore>, timeout: Duration) -> Self {
        Self {
            store,
            stats: StatsCounter::default(),
            timeout,
        }
    }

    /// Moves `amount` from `from_id` to `to_id`.
    ///
    /// Balances change in one critical section holding both account locks;
    /// the two accounts are then persisted concurrently.
    pub async fn transfer(
        &self,
        ctx: &Context,
        from_id: &str,
        to_id: &str,
        amount: Decimal,
    ) -> Result<(), TransferError> {
        self.stats.record_attempt();
        validate(from_id, to_id, amount)?;

        let ctx = ctx.with_timeout(self.timeout);
        let ids = [from_id.to_owned(), to_id.to_owned()];
        let mut accounts = self.store.get_multiple_accounts(&ctx, &ids).await?.into_iter();
        let (Some(from), Some(to)) = (accounts.next(), accounts.next()) else {
            return Err(StoreError::Backend(format!(
                "batch lookup of {from_id} and {to_id} returned too few accounts"
            ))
            .into());
        };
        if Arc::ptr_eq(&from, &to) {
            return Err(TransferError::SameAccountTransfer {
                account_id: from_id.to_owned(),
            });
        }

        if let Err(balance) = move_funds(&from, &to, amount) {
            debug!(from_id, to_id, %amount, %balance, "Transfer rejected");
            return Err(TransferError::InsufficientBalance {
                account_id: from_id.to_owned(),
                balance,
                required: amount,
            });
        }

        let persist = try_join(
            self.store.update_account(&ctx, Arc::clone(&from)),
            self.store.update_account(&ctx, Arc::clone(&to)),
        );
        let persisted = tokio::select! {
            persisted = persist => persisted.map(|_| ()).map_err(TransferError::from),
            err = ctx.done() => Err(err.into()),
        };
        if let Err(err) = persisted {
            let err = match err {
                TransferError::Context(ContextError::DeadlineExceeded)
                | TransferError::Store(StoreError::Context(ContextError::DeadlineExceeded)) => {
                    TransferError::TransferTimeout
                }
                err => err,
            };
            warn!(from_id, to_id, %amount, error = %err, "Funds moved but not persisted");
            return Err(err);
        }

        self.stats.record_success();
        info!(from_id, to_id, %amount, "Transfer committed");
        Ok(())
    }

    pub async fn get_account_balance(
        &self,
        ctx: &Context,
        account_id: &str,
    ) -> Result<Decimal, TransferError> {
        if account_id.is_empty() {
            return Err(TransferError::EmptyAccountId);
        }
        let account = self.store.get_account_by_id(ctx, account_id).await?;
        Ok(account.balance())
    }

    pub fn stats(&self) -> TransferStats {
        self.stats.snapshot()
    }
}

fn validate(from_id: &str, to_id: &str, amount: Decimal) -> Result<(), TransferError> {
    if amount <= Decimal::ZERO {
        return Err(TransferError::InvalidAmount { amount });
    }
    if from_id.is_empty() || to_id.is_empty() {
        return Err(TransferError::EmptyAccountId);
    }
    if from_id == to_id {
        return Err(TransferError::SameAccountTransfer {
            account_id: from_id.to_owned(),
        });
    }
    Ok(())
}

/// Debits `from` and credits `to` while holding both balance locks.
/// On insufficient funds nothing changes and the observed balance is returned.
///
/// Locks are always taken in account id order, whichever direction the
/// money flows, so transfers over the same pair can't wait on each other in a cycle.
fn move_funds(from: &Account, to: &Account, amount: Decimal) -> Result<(), Decimal> {
    let from_first = from.id() < to.id();
    let (first, second) = if from_first { (from, to) } else { (to, from) };
    let mut first = first.lock_balance();
    let mut second = second.lock_balance();
    let (from_balance, to_balance) = if from_first {
        (&mut *first, &mut *second)
    } else {
        (&mut *second, &mut *first)
    };

    if *from_balance < amount {
        return Err(*from_balance);
    }
    *from_balance -= amount;
    *to_balance += amount;
    Ok(())
}
