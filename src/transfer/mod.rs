use rust_decimal::Decimal;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    account::AccountId,
    context::ContextError,
    store::StoreError,
};

pub mod bulk;
pub mod engine;

pub type RequestId = String;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TransferRequest {
    pub request_id: RequestId,
    #[serde(rename = "from")]
    pub from_account_id: AccountId,
    #[serde(rename = "to")]
    pub to_account_id: AccountId,
    pub amount: Decimal,
}

impl TransferRequest {
    pub fn new(
        request_id: impl Into<RequestId>,
        from: impl Into<AccountId>,
        to: impl Into<AccountId>,
        amount: Decimal,
    ) -> Self {
        Self {
            request_id: request_id.into(),
            from_account_id: from.into(),
            to_account_id: to.into(),
            amount,
        }
    }
}

/// Outcome of one [`TransferRequest`] within a bulk run.
#[derive(Debug)]
pub struct TransferResult {
    pub request_id: RequestId,
    pub outcome: Result<(), TransferError>,
}

impl TransferResult {
    pub fn success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn error(&self) -> Option<&TransferError> {
        self.outcome.as_ref().err()
    }
}

/// Structured context attached to a [`TransferError`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorDetails {
    pub account_id: Option<AccountId>,
    pub balance: Option<Decimal>,
    pub amount: Option<Decimal>,
}

#[derive(Debug, Error)]
pub enum TransferError {
    #[error("Invalid transfer amount: {amount}")]
    InvalidAmount { amount: Decimal },
    #[error("Account id must not be empty")]
    EmptyAccountId,
    #[error("Cannot transfer from account {account_id} to itself")]
    SameAccountTransfer { account_id: AccountId },
    #[error("Account {account_id} has insufficient balance {balance} for {required}")]
    InsufficientBalance {
        account_id: AccountId,
        balance: Decimal,
        required: Decimal,
    },
    #[error("Transfer timed out before it was persisted")]
    TransferTimeout,
    #[error(transparent)]
    Context(#[from] ContextError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransferError {
    pub fn code(&self) -> &'static str {
        match self {
            TransferError::InvalidAmount { .. } => "INVALID_AMOUNT",
            TransferError::EmptyAccountId => "EMPTY_ACCOUNT_ID",
            TransferError::SameAccountTransfer { .. } => "SAME_ACCOUNT_TRANSFER",
            TransferError::InsufficientBalance { .. } => "INSUFFICIENT_BALANCE",
            TransferError::TransferTimeout => "TRANSFER_TIMEOUT",
            TransferError::Context(err) => err.code(),
            TransferError::Store(err) => err.code(),
        }
    }

    pub fn details(&self) -> ErrorDetails {
        match self {
            TransferError::InvalidAmount { amount } => ErrorDetails {
                amount: Some(*amount),
                ..Default::default()
            },
            TransferError::SameAccountTransfer { account_id }
            | TransferError::Store(
                StoreError::AccountNotFound { account_id }
                | StoreError::DuplicateAccount { account_id },
            ) => ErrorDetails {
                account_id: Some(account_id.clone()),
                ..Default::default()
            },
            TransferError::InsufficientBalance {
                account_id,
                balance,
                required,
            } => ErrorDetails {
                account_id: Some(account_id.clone()),
                balance: Some(*balance),
                amount: Some(*required),
            },
            TransferError::EmptyAccountId
            | TransferError::TransferTimeout
            | TransferError::Context(_)
            | TransferError::Store(StoreError::Context(_) | StoreError::Backend(_)) => {
                ErrorDetails::default()
            }
        }
    }
}
