use thiserror::Error;

use crate::domain::{AccountId, LedgerError};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Account not found: {0}")]
    AccountNotFound(AccountId),

    #[error("Transfer target not found: {0}")]
    InvalidTarget(AccountId),

    #[error("Account name must not be empty")]
    EmptyName,

    #[error("{0}")]
    Ledger(#[from] LedgerError),

    #[error("Invalid snapshot data: {0}")]
    InvalidData(String),

    #[error("Storage error: {0}")]
    Storage(#[from] anyhow::Error),
}
