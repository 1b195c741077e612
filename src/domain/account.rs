use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, Transaction, TransactionKind, format_cents, interest_on};

pub type AccountId = Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    /// Everyday account, no interest
    Checking,
    /// Interest-bearing account
    Savings,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Checking => "checking",
            AccountType::Savings => "savings",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            // "deposit" is the legacy name for a checking account
            "checking" | "deposit" => Some(AccountType::Checking),
            "savings" => Some(AccountType::Savings),
            _ => None,
        }
    }
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Sek,
}

impl Currency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Currency::Sek => "SEK",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "SEK" => Some(Currency::Sek),
            _ => None,
        }
    }
}

impl std::fmt::Display for Currency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single bank account: identity, balance, and its full transaction log.
/// All mutations go through the methods below (or `ledger::transfer`), which
/// keep the balance and the log in step.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    pub account_type: AccountType,
    pub currency: Currency,
    pub balance_cents: Cents,
    /// Fraction per accrual, e.g. 0.01 for 1%. Only meaningful for savings.
    pub interest_rate: Option<f64>,
    pub created_at: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
    pub transactions: Vec<Transaction>,
}

impl Account {
    pub fn new(
        name: String,
        account_type: AccountType,
        currency: Currency,
        opening_balance_cents: Cents,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            name,
            account_type,
            currency,
            balance_cents: opening_balance_cents,
            interest_rate: None,
            created_at: now,
            last_updated: now,
            transactions: Vec::new(),
        }
    }

    pub fn with_interest_rate(mut self, rate: f64) -> Self {
        self.interest_rate = Some(rate);
        self
    }

    /// Credit the account. The amount must be positive.
    pub fn deposit(&mut self, amount_cents: Cents, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount { amount_cents });
        }

        self.balance_cents += amount_cents;
        self.last_updated = now;
        self.transactions.push(
            Transaction::new(TransactionKind::Deposit, amount_cents, self.balance_cents, now)
                .with_to(self.id),
        );
        Ok(())
    }

    /// Debit the account. The amount must be positive and covered by the
    /// current balance; the balance never goes negative.
    pub fn withdraw(&mut self, amount_cents: Cents, now: DateTime<Utc>) -> Result<(), LedgerError> {
        if amount_cents <= 0 {
            return Err(LedgerError::InvalidAmount { amount_cents });
        }
        if amount_cents > self.balance_cents {
            return Err(LedgerError::InsufficientFunds {
                balance_cents: self.balance_cents,
                requested_cents: amount_cents,
            });
        }

        self.balance_cents -= amount_cents;
        self.last_updated = now;
        self.transactions.push(
            Transaction::new(
                TransactionKind::Withdrawal,
                amount_cents,
                self.balance_cents,
                now,
            )
            .with_from(self.id),
        );
        Ok(())
    }

    /// Accrue one round of interest. Returns the credited cents, which is 0
    /// (and leaves the account untouched) unless this is a savings account
    /// with a positive rate, a positive balance, and an interest amount that
    /// rounds to at least one cent.
    pub fn apply_interest(&mut self, now: DateTime<Utc>) -> Cents {
        if self.account_type != AccountType::Savings {
            return 0;
        }
        let rate = match self.interest_rate {
            Some(rate) if rate > 0.0 => rate,
            _ => return 0,
        };
        if self.balance_cents <= 0 {
            return 0;
        }

        let interest = interest_on(self.balance_cents, rate);
        if interest == 0 {
            return 0;
        }

        self.balance_cents += interest;
        self.last_updated = now;
        self.transactions.push(
            Transaction::new(TransactionKind::Interest, interest, self.balance_cents, now)
                .with_to(self.id),
        );
        interest
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    InvalidAmount {
        amount_cents: Cents,
    },
    InsufficientFunds {
        balance_cents: Cents,
        requested_cents: Cents,
    },
    InvalidTarget,
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::InvalidAmount { amount_cents } => {
                write!(f, "Amount must be positive, got {}", format_cents(*amount_cents))
            }
            LedgerError::InsufficientFunds {
                balance_cents,
                requested_cents,
            } => {
                write!(
                    f,
                    "Insufficient funds: balance {}, requested {}",
                    format_cents(*balance_cents),
                    format_cents(*requested_cents)
                )
            }
            LedgerError::InvalidTarget => {
                write!(f, "Transfer target must be a different account")
            }
        }
    }
}

impl std::error::Error for LedgerError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn checking(balance: Cents) -> Account {
        Account::new(
            "Checking".into(),
            AccountType::Checking,
            Currency::Sek,
            balance,
            Utc::now(),
        )
    }

    fn savings(balance: Cents, rate: f64) -> Account {
        Account::new(
            "Savings".into(),
            AccountType::Savings,
            Currency::Sek,
            balance,
            Utc::now(),
        )
        .with_interest_rate(rate)
    }

    #[test]
    fn test_new_account_has_empty_history() {
        let account = checking(10000);
        assert_eq!(account.balance_cents, 10000);
        assert!(account.transactions.is_empty());
        assert_eq!(account.interest_rate, None);
    }

    #[test]
    fn test_deposit_appends_one_transaction() {
        let mut account = checking(10000);
        account.deposit(5000, Utc::now()).unwrap();

        assert_eq!(account.balance_cents, 15000);
        assert_eq!(account.transactions.len(), 1);

        let tx = &account.transactions[0];
        assert_eq!(tx.kind, TransactionKind::Deposit);
        assert_eq!(tx.amount_cents, 5000);
        assert_eq!(tx.balance_after, 15000);
        assert_eq!(tx.to_account, Some(account.id));
        assert_eq!(tx.from_account, None);
    }

    #[test]
    fn test_deposit_rejects_non_positive_amounts() {
        let mut account = checking(10000);

        for amount in [0, -1, -5000] {
            let err = account.deposit(amount, Utc::now()).unwrap_err();
            assert!(matches!(err, LedgerError::InvalidAmount { .. }));
        }
        assert_eq!(account.balance_cents, 10000);
        assert!(account.transactions.is_empty());
    }

    #[test]
    fn test_withdraw_updates_balance_and_history() {
        let mut account = checking(10000);
        account.withdraw(4000, Utc::now()).unwrap();

        assert_eq!(account.balance_cents, 6000);
        let tx = &account.transactions[0];
        assert_eq!(tx.kind, TransactionKind::Withdrawal);
        assert_eq!(tx.balance_after, 6000);
        assert_eq!(tx.from_account, Some(account.id));
    }

    #[test]
    fn test_withdraw_beyond_balance_leaves_state_untouched() {
        let mut account = checking(10000);
        let err = account.withdraw(10001, Utc::now()).unwrap_err();

        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                balance_cents: 10000,
                requested_cents: 10001,
            }
        );
        assert_eq!(account.balance_cents, 10000);
        assert!(account.transactions.is_empty());
    }

    #[test]
    fn test_withdraw_entire_balance_is_allowed() {
        let mut account = checking(10000);
        account.withdraw(10000, Utc::now()).unwrap();
        assert_eq!(account.balance_cents, 0);
    }

    #[test]
    fn test_interest_on_savings() {
        let mut account = savings(100000, 0.01);
        let credited = account.apply_interest(Utc::now());

        assert_eq!(credited, 1000);
        assert_eq!(account.balance_cents, 101000);

        let tx = &account.transactions[0];
        assert_eq!(tx.kind, TransactionKind::Interest);
        assert_eq!(tx.amount_cents, 1000);
        assert_eq!(tx.balance_after, 101000);
    }

    #[test]
    fn test_interest_is_noop_for_checking() {
        let mut account = checking(100000);
        assert_eq!(account.apply_interest(Utc::now()), 0);
        assert!(account.transactions.is_empty());
    }

    #[test]
    fn test_interest_is_noop_without_rate_or_balance() {
        let mut no_rate = Account::new(
            "S".into(),
            AccountType::Savings,
            Currency::Sek,
            100000,
            Utc::now(),
        );
        assert_eq!(no_rate.apply_interest(Utc::now()), 0);

        let mut empty = savings(0, 0.01);
        assert_eq!(empty.apply_interest(Utc::now()), 0);
        assert!(empty.transactions.is_empty());
    }

    #[test]
    fn test_interest_below_half_a_cent_is_noop() {
        let mut account = savings(49, 0.01);
        assert_eq!(account.apply_interest(Utc::now()), 0);
        assert!(account.transactions.is_empty());

        let mut account = savings(50, 0.01);
        assert_eq!(account.apply_interest(Utc::now()), 1);
        assert_eq!(account.balance_cents, 51);
    }

    #[test]
    fn test_account_type_aliases() {
        assert_eq!(AccountType::from_str("checking"), Some(AccountType::Checking));
        assert_eq!(AccountType::from_str("deposit"), Some(AccountType::Checking));
        assert_eq!(AccountType::from_str("Savings"), Some(AccountType::Savings));
        assert_eq!(AccountType::from_str("credit"), None);
    }
}
