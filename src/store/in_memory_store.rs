use std::{
    collections::HashMap,
    sync::{Arc, PoisonError, RwLock},
    time::Duration,
};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::debug;

use crate::{
    account::{Account, AccountId},
    context::Context,
};

use super::{AccountStore, StoreError};

/// Artificial I/O delay applied before each store call touches the map.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StoreLatency {
    pub lookup: Duration,
    pub update: Duration,
}

#[derive(Debug, Default)]
pub struct InMemoryAccountStore {
    accounts: RwLock<HashMap<AccountId, Arc<Account>>>,
    latency: StoreLatency,
}

impl InMemoryAccountStore {
    pub fn new(latency: StoreLatency) -> Self {
        Self {
            accounts: RwLock::default(),
            latency,
        }
    }

    pub fn with_accounts(
        latency: StoreLatency,
        accounts: impl IntoIterator<Item = Account>,
    ) -> Result<Self, StoreError> {
        let store = Self::new(latency);
        for account in accounts {
            store.insert_account(account)?;
        }
        Ok(store)
    }

    pub fn insert_account(&self, account: Account) -> Result<(), StoreError> {
        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        if accounts.contains_key(account.id()) {
            return Err(StoreError::DuplicateAccount {
                account_id: account.id().to_owned(),
            });
        }
        accounts.insert(account.id().to_owned(), Arc::new(account));
        Ok(())
    }

    /// Point-in-time list of all accounts, sorted by id.
    pub fn accounts(&self) -> Vec<Arc<Account>> {
        let mut accounts: Vec<_> = self
            .accounts
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .values()
            .cloned()
            .collect();
        accounts.sort_by(|a, b| a.id().cmp(b.id()));
        accounts
    }

    pub fn total_balance(&self) -> Decimal {
        self.accounts().iter().map(|acc| acc.balance()).sum()
    }

    async fn simulate_io(ctx: &Context, latency: Duration) -> Result<(), StoreError> {
        ctx.check()?;
        if latency.is_zero() {
            return Ok(());
        }
        tokio::select! {
            _ = tokio::time::sleep(latency) => Ok(()),
            err = ctx.done() => Err(err.into()),
        }
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn get_account_by_id(&self, ctx: &Context, id: &str) -> Result<Arc<Account>, StoreError> {
        Self::simulate_io(ctx, self.latency.lookup).await?;

        let accounts = self.accounts.read().unwrap_or_else(PoisonError::into_inner);
        match accounts.get(id) {
            Some(account) => Ok(Arc::clone(account)),
            None => {
                debug!(account_id = id, "Account lookup missed");
                Err(StoreError::AccountNotFound {
                    account_id: id.to_owned(),
                })
            }
        }
    }

    async fn update_account(&self, ctx: &Context, account: Arc<Account>) -> Result<(), StoreError> {
        Self::simulate_io(ctx, self.latency.update).await?;

        let mut accounts = self.accounts.write().unwrap_or_else(PoisonError::into_inner);
        match accounts.get_mut(account.id()) {
            Some(stored) => {
                *stored = account;
                Ok(())
            }
            None => Err(StoreError::AccountNotFound {
                account_id: account.id().to_owned(),
            }),
        }
    }
}
