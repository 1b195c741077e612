use std::io::Write;

use anyhow::Result;

use crate::domain::Account;

/// Write one row per account with its current balance.
pub fn write_balances_csv<W: Write>(accounts: &[Account], writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record(["id", "name", "type", "currency", "balance_cents"])?;

    let mut count = 0;
    for account in accounts {
        csv_writer.write_record([
            account.id.to_string(),
            account.name.clone(),
            account.account_type.as_str().to_string(),
            account.currency.as_str().to_string(),
            account.balance_cents.to_string(),
        ])?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}

/// Write one account's transaction history, oldest first.
pub fn write_history_csv<W: Write>(account: &Account, writer: W) -> Result<usize> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    csv_writer.write_record([
        "id",
        "timestamp",
        "kind",
        "amount_cents",
        "from_account",
        "to_account",
        "balance_after",
    ])?;

    let mut count = 0;
    for tx in &account.transactions {
        csv_writer.write_record([
            tx.id.to_string(),
            tx.timestamp.to_rfc3339(),
            tx.kind.as_str().to_string(),
            tx.amount_cents.to_string(),
            tx.from_account.map(|id| id.to_string()).unwrap_or_default(),
            tx.to_account.map(|id| id.to_string()).unwrap_or_default(),
            tx.balance_after.to_string(),
        ])?;
        count += 1;
    }

    csv_writer.flush()?;
    Ok(count)
}
