use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{AccountId, Cents};

pub type TransactionId = Uuid;

/// What a transaction did to the balance of the account that owns it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Deposit,
    Withdrawal,
    TransferIn,
    TransferOut,
    Interest,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdrawal => "withdrawal",
            TransactionKind::TransferIn => "transfer_in",
            TransactionKind::TransferOut => "transfer_out",
            TransactionKind::Interest => "interest",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdrawal" => Some(TransactionKind::Withdrawal),
            "transfer_in" => Some(TransactionKind::TransferIn),
            "transfer_out" => Some(TransactionKind::TransferOut),
            "interest" => Some(TransactionKind::Interest),
            _ => None,
        }
    }

    /// Whether this kind credits (+) or debits (-) the owning account.
    pub fn signum(&self) -> Cents {
        match self {
            TransactionKind::Deposit | TransactionKind::TransferIn | TransactionKind::Interest => 1,
            TransactionKind::Withdrawal | TransactionKind::TransferOut => -1,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One balance-affecting event in an account's history. Transactions are
/// immutable once appended; the log is never rewritten.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    /// Account the money left, when there is one
    pub from_account: Option<AccountId>,
    /// Account the money entered, when there is one
    pub to_account: Option<AccountId>,
    /// Amount in cents (always positive, direction comes from `kind`)
    pub amount_cents: Cents,
    pub timestamp: DateTime<Utc>,
    pub kind: TransactionKind,
    /// Owning account's balance right after this entry was appended
    pub balance_after: Cents,
}

impl Transaction {
    pub fn new(
        kind: TransactionKind,
        amount_cents: Cents,
        balance_after: Cents,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            from_account: None,
            to_account: None,
            amount_cents,
            timestamp,
            kind,
            balance_after,
        }
    }

    pub fn with_from(mut self, account: AccountId) -> Self {
        self.from_account = Some(account);
        self
    }

    pub fn with_to(mut self, account: AccountId) -> Self {
        self.to_account = Some(account);
        self
    }

    /// Signed effect of this entry on the owning account's balance.
    pub fn signed_amount(&self) -> Cents {
        self.kind.signum() * self.amount_cents
    }
}
