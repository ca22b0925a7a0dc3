use std::sync::{PoisonError, RwLock, RwLockWriteGuard};

use rust_decimal::Decimal;
use thiserror::Error;

pub type AccountId = String;

#[derive(Debug, Error)]
pub enum AccountError {
    #[error("Account {account_id} cannot be opened with negative balance {balance}")]
    NegativeBalance {
        account_id: AccountId,
        balance: Decimal,
    },
    #[error("Account id must not be empty")]
    EmptyId,
}

/// Ledger account. The balance is only reachable through its lock.
#[derive(Debug)]
pub struct Account {
    id: AccountId,
    name: String,
    balance: RwLock<Decimal>,
}

impl Account {
    pub fn new(
        id: impl Into<AccountId>,
        name: impl Into<String>,
        balance: Decimal,
    ) -> Result<Self, AccountError> {
        let id = id.into();
        if id.is_empty() {
            return Err(AccountError::EmptyId);
        }
        if balance < Decimal::ZERO {
            return Err(AccountError::NegativeBalance {
                account_id: id,
                balance,
            });
        }
        Ok(Self {
            id,
            name: name.into(),
            balance: RwLock::new(balance),
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn balance(&self) -> Decimal {
        *self.balance.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subtracts `amount` only if it is covered by the balance.
    pub fn debit(&self, amount: Decimal) -> bool {
        let mut balance = self.lock_balance();
        if *balance >= amount {
            *balance -= amount;
            true
        } else {
            false
        }
    }

    pub fn credit(&self, amount: Decimal) {
        *self.lock_balance() += amount;
    }

    /// Exclusive access to the balance, for callers that need to hold
    /// several account locks at once.
    pub(crate) fn lock_balance(&self) -> RwLockWriteGuard<'_, Decimal> {
        // a panic while holding the guard can't leave a half-written Decimal
        self.balance.write().unwrap_or_else(PoisonError::into_inner)
    }
}
