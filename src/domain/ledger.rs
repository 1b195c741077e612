use chrono::{DateTime, Utc};

use super::{Account, Cents, LedgerError, Transaction, TransactionKind, format_cents};

/// Move money between two accounts. Both sides are updated before this
/// returns: the source gets a transfer-out entry, the target a transfer-in
/// entry, each stamped with its own post-operation balance and carrying both
/// account ids.
///
/// Validation order is amount, then funds, then target.
pub fn transfer(
    from: &mut Account,
    to: &mut Account,
    amount_cents: Cents,
    now: DateTime<Utc>,
) -> Result<(), LedgerError> {
    if amount_cents <= 0 {
        return Err(LedgerError::InvalidAmount { amount_cents });
    }
    if amount_cents > from.balance_cents {
        return Err(LedgerError::InsufficientFunds {
            balance_cents: from.balance_cents,
            requested_cents: amount_cents,
        });
    }
    if from.id == to.id {
        return Err(LedgerError::InvalidTarget);
    }

    from.balance_cents -= amount_cents;
    from.last_updated = now;
    from.transactions.push(
        Transaction::new(
            TransactionKind::TransferOut,
            amount_cents,
            from.balance_cents,
            now,
        )
        .with_from(from.id)
        .with_to(to.id),
    );

    to.balance_cents += amount_cents;
    to.last_updated = now;
    to.transactions.push(
        Transaction::new(
            TransactionKind::TransferIn,
            amount_cents,
            to.balance_cents,
            now,
        )
        .with_from(from.id)
        .with_to(to.id),
    );

    Ok(())
}

/// Check that an account's transaction log is internally consistent and
/// agrees with its balance. Returns one human-readable line per problem;
/// an empty vec means the history is sound.
///
/// The opening balance is not recorded as a transaction, so the chain is
/// anchored at the first entry's `balance_after` and verified forward.
pub fn verify_history(account: &Account) -> Vec<String> {
    let mut issues = Vec::new();

    for (idx, tx) in account.transactions.iter().enumerate() {
        if tx.amount_cents <= 0 {
            issues.push(format!(
                "transaction {} has non-positive amount {}",
                idx,
                format_cents(tx.amount_cents)
            ));
        }
        if tx.balance_after < 0 {
            issues.push(format!(
                "transaction {} leaves a negative balance {}",
                idx,
                format_cents(tx.balance_after)
            ));
        }
    }

    for (idx, pair) in account.transactions.windows(2).enumerate() {
        let expected = pair[0].balance_after + pair[1].signed_amount();
        if pair[1].balance_after != expected {
            issues.push(format!(
                "transaction {} breaks the balance chain: expected {}, recorded {}",
                idx + 1,
                format_cents(expected),
                format_cents(pair[1].balance_after)
            ));
        }
    }

    if let Some(last) = account.transactions.last() {
        if last.balance_after != account.balance_cents {
            issues.push(format!(
                "last transaction records balance {}, account holds {}",
                format_cents(last.balance_after),
                format_cents(account.balance_cents)
            ));
        }
    }

    issues
}
