// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use bankbok::application::AccountDirectory;
use bankbok::domain::{AccountId, AccountType, Cents, Currency};
use tempfile::TempDir;

/// Helper to create a test directory with a temporary database
pub async fn test_directory() -> Result<(AccountDirectory, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let directory = AccountDirectory::init(db_path.to_str().unwrap()).await?;
    Ok((directory, temp_dir))
}

pub async fn create_checking(
    directory: &mut AccountDirectory,
    name: &str,
    balance_cents: Cents,
) -> Result<AccountId> {
    let account = directory
        .create_account(
            name.into(),
            AccountType::Checking,
            Currency::Sek,
            balance_cents,
            None,
        )
        .await?;
    Ok(account.id)
}

pub async fn create_savings(
    directory: &mut AccountDirectory,
    name: &str,
    balance_cents: Cents,
    rate: f64,
) -> Result<AccountId> {
    let account = directory
        .create_account(
            name.into(),
            AccountType::Savings,
            Currency::Sek,
            balance_cents,
            Some(rate),
        )
        .await?;
    Ok(account.id)
}
