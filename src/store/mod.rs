use std::sync::Arc;

use async_trait::async_trait;
use futures::{StreamExt, stream::FuturesUnordered};
use thiserror::Error;

use crate::{
    account::{Account, AccountId},
    context::{Context, ContextError},
};

pub mod in_memory_store;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Account {account_id} not found")]
    AccountNotFound { account_id: AccountId },
    #[error("Account {account_id} already exists")]
    DuplicateAccount { account_id: AccountId },
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error("Store backend failure: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn code(&self) -> &'static str {
        match self {
            StoreError::AccountNotFound { .. } => "ACCOUNT_NOT_FOUND",
            StoreError::DuplicateAccount { .. } => "DUPLICATE_ACCOUNT",
            StoreError::Context(err) => err.code(),
            StoreError::Backend(_) => "STORE_FAILURE",
        }
    }
}

/// Lookup and update of accounts by id.
///
/// Implementations own the canonical account records. Callers receive shared
/// handles and must drop them once their operation is over.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Fails with [`ContextError`] without looking anything up if `ctx` is already done.
    async fn get_account_by_id(&self, ctx: &Context, id: &str) -> Result<Arc<Account>, StoreError>;

    /// Replaces the stored account. Fails with [`StoreError::AccountNotFound`]
    /// if the id is no longer known.
    async fn update_account(&self, ctx: &Context, account: Arc<Account>) -> Result<(), StoreError>;

    /// Resolves every id concurrently, returning accounts in input order.
    ///
    /// The first failing lookup (by completion, not by position) fails the
    /// whole call; lookups still in flight are dropped, as they are when `ctx`
    /// is done first.
    async fn get_multiple_accounts(
        &self,
        ctx: &Context,
        ids: &[AccountId],
    ) -> Result<Vec<Arc<Account>>, StoreError> {
        let mut lookups: FuturesUnordered<_> = ids
            .iter()
            .enumerate()
            .map(|(index, id)| async move { (index, self.get_account_by_id(ctx, id).await) })
            .collect();

        let mut accounts: Vec<Option<Arc<Account>>> = vec![None; ids.len()];
        loop {
            tokio::select! {
                next = lookups.next() => match next {
                    Some((index, Ok(account))) => accounts[index] = Some(account),
                    Some((_, Err(err))) => return Err(err),
                    None => break,
                },
                err = ctx.done() => return Err(err.into()),
            }
        }
        Ok(accounts.into_iter().flatten().collect())
    }
}
