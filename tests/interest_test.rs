mod common;

use anyhow::Result;
use bankbok::application::AccountDirectory;
use bankbok::domain::TransactionKind;
use common::{create_checking, create_savings, test_directory};

#[tokio::test]
async fn test_savings_interest_credits_and_reports() -> Result<()> {
    let (mut directory, _temp) = test_directory().await?;
    let id = create_savings(&mut directory, "Nest egg", 100000, 0.01).await?;

    // 1000.00 at 1% credits exactly 10.00
    let credited = directory.apply_interest(id).await?;
    assert_eq!(credited, 1000);

    let account = directory.account(id).await?;
    assert_eq!(account.balance_cents, 101000);
    assert_eq!(account.transactions.len(), 1);

    let tx = &account.transactions[0];
    assert_eq!(tx.kind, TransactionKind::Interest);
    assert_eq!(tx.amount_cents, 1000);
    assert_eq!(tx.balance_after, 101000);

    Ok(())
}

#[tokio::test]
async fn test_checking_accounts_never_accrue() -> Result<()> {
    let (mut directory, _temp) = test_directory().await?;
    let id = create_checking(&mut directory, "Everyday", 100000).await?;

    assert_eq!(directory.apply_interest(id).await?, 0);

    let account = directory.account(id).await?;
    assert_eq!(account.balance_cents, 100000);
    assert!(account.transactions.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_interest_rounds_half_away_from_zero() -> Result<()> {
    let (mut directory, _temp) = test_directory().await?;

    // 0.50 at 1% is exactly half a cent and rounds up to one cent
    let exactly_half = create_savings(&mut directory, "Half", 50, 0.01).await?;
    assert_eq!(directory.apply_interest(exactly_half).await?, 1);
    assert_eq!(directory.account(exactly_half).await?.balance_cents, 51);

    // 0.49 at 1% rounds to zero: a no-op with no transaction
    let below_half = create_savings(&mut directory, "Below", 49, 0.01).await?;
    assert_eq!(directory.apply_interest(below_half).await?, 0);
    let account = directory.account(below_half).await?;
    assert_eq!(account.balance_cents, 49);
    assert!(account.transactions.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_sweep_covers_all_savings_and_skips_the_rest() -> Result<()> {
    let (mut directory, _temp) = test_directory().await?;
    let first = create_savings(&mut directory, "First", 100000, 0.01).await?;
    let second = create_savings(&mut directory, "Second", 50000, 0.02).await?;
    let checking = create_checking(&mut directory, "Everyday", 100000).await?;
    let empty = create_savings(&mut directory, "Empty", 0, 0.01).await?;

    let accruals = directory.apply_interest_to_all().await?;
    assert_eq!(accruals.len(), 2);

    let by_id = |id| accruals.iter().find(|a| a.account == id);
    assert_eq!(by_id(first).unwrap().amount_cents, 1000);
    assert_eq!(by_id(second).unwrap().amount_cents, 1000);
    assert!(by_id(checking).is_none());
    assert!(by_id(empty).is_none());

    assert!(directory.account(checking).await?.transactions.is_empty());
    assert!(directory.account(empty).await?.transactions.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_sweep_results_survive_reconnect() -> Result<()> {
    let temp_dir = tempfile::TempDir::new()?;
    let db_path = temp_dir.path().join("bank.db");
    let db_path = db_path.to_str().unwrap();

    let id = {
        let mut directory = AccountDirectory::init(db_path).await?;
        let id = create_savings(&mut directory, "Nest egg", 100000, 0.01).await?;
        directory.apply_interest_to_all().await?;
        id
    };

    let mut reconnected = AccountDirectory::connect(db_path).await?;
    let account = reconnected.account(id).await?;
    assert_eq!(account.balance_cents, 101000);
    assert_eq!(account.transactions.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_repeated_accrual_compounds() -> Result<()> {
    let (mut directory, _temp) = test_directory().await?;
    let id = create_savings(&mut directory, "Nest egg", 100000, 0.01).await?;

    assert_eq!(directory.apply_interest(id).await?, 1000);
    assert_eq!(directory.apply_interest(id).await?, 1010);

    let account = directory.account(id).await?;
    assert_eq!(account.balance_cents, 102010);
    assert_eq!(account.transactions.len(), 2);

    Ok(())
}
