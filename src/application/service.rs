use anyhow::Context;
use chrono::Utc;
use tokio::sync::broadcast;

use crate::domain::{
    Account, AccountId, AccountType, Cents, Currency, LedgerError, ledger, verify_history,
};
use crate::io::{ImportReport, Snapshot};
use crate::storage::{ACCOUNTS_KEY, Store};

use super::AppError;

/// Where the directory stands with respect to the backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadState {
    Uninitialized,
    Loading,
    Ready,
}

/// Whether an account may open with a zero balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OpeningBalancePolicy {
    #[default]
    NonNegative,
    Positive,
}

/// Published on the broadcast channel after each successful persist.
#[derive(Debug, Clone)]
pub enum DirectoryEvent {
    AccountCreated {
        account: AccountId,
    },
    Deposited {
        account: AccountId,
        amount_cents: Cents,
    },
    Withdrawn {
        account: AccountId,
        amount_cents: Cents,
    },
    Transferred {
        from: AccountId,
        to: AccountId,
        amount_cents: Cents,
    },
    InterestAccrued {
        account: AccountId,
        amount_cents: Cents,
    },
    AccountClosed {
        account: AccountId,
    },
    SnapshotImported {
        imported: usize,
        skipped: usize,
    },
}

/// Both sides of a completed transfer.
#[derive(Debug)]
pub struct TransferOutcome {
    pub from: Account,
    pub to: Account,
    pub amount_cents: Cents,
}

/// One account's share of an interest sweep.
pub struct InterestAccrual {
    pub account: AccountId,
    pub name: String,
    pub amount_cents: Cents,
}

/// Application service owning the full account collection. Loads the
/// collection from the store before first use and writes it back, whole,
/// after every mutation, so callers observe mutation and durability as one
/// step. This is the primary interface for any client (CLI, TUI, tests).
pub struct AccountDirectory {
    store: Store,
    accounts: Vec<Account>,
    state: LoadState,
    policy: OpeningBalancePolicy,
    events: broadcast::Sender<DirectoryEvent>,
}

impl AccountDirectory {
    /// Create a directory over the given store. Nothing is read until the
    /// first operation (or an explicit `ensure_loaded`).
    pub fn new(store: Store) -> Self {
        let (events, _) = broadcast::channel(64);
        Self {
            store,
            accounts: Vec::new(),
            state: LoadState::Uninitialized,
            policy: OpeningBalancePolicy::default(),
            events,
        }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let store = Store::init(&db_url).await?;
        Ok(Self::new(store))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let store = Store::connect(&db_url).await?;
        Ok(Self::new(store))
    }

    pub fn with_policy(mut self, policy: OpeningBalancePolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn load_state(&self) -> LoadState {
        self.state
    }

    /// Receiver for change events. Events published while no receiver exists
    /// are discarded.
    pub fn subscribe(&self) -> broadcast::Receiver<DirectoryEvent> {
        self.events.subscribe()
    }

    /// Idempotent lazy load of the collection from the store. A missing key
    /// yields an empty collection; a corrupt blob is `InvalidData` and the
    /// directory drops back to `Uninitialized` so the next call retries.
    pub async fn ensure_loaded(&mut self) -> Result<(), AppError> {
        if self.state == LoadState::Ready {
            return Ok(());
        }
        self.state = LoadState::Loading;
        match self.load().await {
            Ok(accounts) => {
                self.accounts = accounts;
                self.state = LoadState::Ready;
                Ok(())
            }
            Err(err) => {
                self.state = LoadState::Uninitialized;
                Err(err)
            }
        }
    }

    async fn load(&self) -> Result<Vec<Account>, AppError> {
        match self.store.get(ACCOUNTS_KEY).await? {
            Some(blob) => serde_json::from_str(&blob).map_err(|err| {
                AppError::InvalidData(format!("stored account collection is unreadable: {err}"))
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Write the entire collection back to the store.
    async fn persist(&self) -> Result<(), AppError> {
        let blob = serde_json::to_string(&self.accounts).context("Failed to encode accounts")?;
        self.store.set(ACCOUNTS_KEY, &blob).await?;
        Ok(())
    }

    fn publish(&self, event: DirectoryEvent) {
        let _ = self.events.send(event);
    }

    fn index_of(&self, id: AccountId) -> Option<usize> {
        self.accounts.iter().position(|account| account.id == id)
    }

    fn account_mut(&mut self, id: AccountId) -> Result<&mut Account, AppError> {
        self.accounts
            .iter_mut()
            .find(|account| account.id == id)
            .ok_or(AppError::AccountNotFound(id))
    }

    // ========================
    // Account operations
    // ========================

    /// Create and register a new account. The interest rate is kept only
    /// for savings accounts; the opening balance is validated against the
    /// configured policy.
    pub async fn create_account(
        &mut self,
        name: String,
        account_type: AccountType,
        currency: Currency,
        opening_balance_cents: Cents,
        interest_rate: Option<f64>,
    ) -> Result<Account, AppError> {
        self.ensure_loaded().await?;

        if name.trim().is_empty() {
            return Err(AppError::EmptyName);
        }
        let minimum_ok = match self.policy {
            OpeningBalancePolicy::NonNegative => opening_balance_cents >= 0,
            OpeningBalancePolicy::Positive => opening_balance_cents > 0,
        };
        if !minimum_ok {
            return Err(LedgerError::InvalidAmount {
                amount_cents: opening_balance_cents,
            }
            .into());
        }

        let mut account = Account::new(
            name,
            account_type,
            currency,
            opening_balance_cents,
            Utc::now(),
        );
        if account_type == AccountType::Savings {
            if let Some(rate) = interest_rate {
                account = account.with_interest_rate(rate);
            }
        }

        self.accounts.push(account.clone());
        self.persist().await?;
        self.publish(DirectoryEvent::AccountCreated {
            account: account.id,
        });
        Ok(account)
    }

    /// The full collection, cloned. Later mutations do not show through.
    pub async fn accounts(&mut self) -> Result<Vec<Account>, AppError> {
        self.ensure_loaded().await?;
        Ok(self.accounts.clone())
    }

    /// A single account by id.
    pub async fn account(&mut self, id: AccountId) -> Result<Account, AppError> {
        self.ensure_loaded().await?;
        self.accounts
            .iter()
            .find(|account| account.id == id)
            .cloned()
            .ok_or(AppError::AccountNotFound(id))
    }

    /// Remove an account from the directory.
    pub async fn close_account(&mut self, id: AccountId) -> Result<Account, AppError> {
        self.ensure_loaded().await?;
        let idx = self.index_of(id).ok_or(AppError::AccountNotFound(id))?;
        let removed = self.accounts.remove(idx);
        self.persist().await?;
        self.publish(DirectoryEvent::AccountClosed { account: id });
        Ok(removed)
    }

    // ========================
    // Money movement
    // ========================

    pub async fn deposit(&mut self, id: AccountId, amount_cents: Cents) -> Result<Account, AppError> {
        self.ensure_loaded().await?;
        let account = self.account_mut(id)?;
        account.deposit(amount_cents, Utc::now())?;
        let updated = account.clone();
        self.persist().await?;
        self.publish(DirectoryEvent::Deposited {
            account: id,
            amount_cents,
        });
        Ok(updated)
    }

    pub async fn withdraw(
        &mut self,
        id: AccountId,
        amount_cents: Cents,
    ) -> Result<Account, AppError> {
        self.ensure_loaded().await?;
        let account = self.account_mut(id)?;
        account.withdraw(amount_cents, Utc::now())?;
        let updated = account.clone();
        self.persist().await?;
        self.publish(DirectoryEvent::Withdrawn {
            account: id,
            amount_cents,
        });
        Ok(updated)
    }

    /// Transfer between two accounts. A missing source is `AccountNotFound`,
    /// a missing target `InvalidTarget`; amount validation happens after
    /// both resolve.
    pub async fn transfer(
        &mut self,
        from_id: AccountId,
        to_id: AccountId,
        amount_cents: Cents,
    ) -> Result<TransferOutcome, AppError> {
        self.ensure_loaded().await?;

        let from_idx = self
            .index_of(from_id)
            .ok_or(AppError::AccountNotFound(from_id))?;
        let to_idx = self.index_of(to_id).ok_or(AppError::InvalidTarget(to_id))?;

        if from_idx == to_idx {
            // Same account on both sides; keep the ledger's validation order
            let balance_cents = self.accounts[from_idx].balance_cents;
            if amount_cents <= 0 {
                return Err(LedgerError::InvalidAmount { amount_cents }.into());
            }
            if amount_cents > balance_cents {
                return Err(LedgerError::InsufficientFunds {
                    balance_cents,
                    requested_cents: amount_cents,
                }
                .into());
            }
            return Err(LedgerError::InvalidTarget.into());
        }

        let (from, to) = if from_idx < to_idx {
            let (head, tail) = self.accounts.split_at_mut(to_idx);
            (&mut head[from_idx], &mut tail[0])
        } else {
            let (head, tail) = self.accounts.split_at_mut(from_idx);
            (&mut tail[0], &mut head[to_idx])
        };
        ledger::transfer(from, to, amount_cents, Utc::now())?;

        let outcome = TransferOutcome {
            from: from.clone(),
            to: to.clone(),
            amount_cents,
        };
        self.persist().await?;
        self.publish(DirectoryEvent::Transferred {
            from: from_id,
            to: to_id,
            amount_cents,
        });
        Ok(outcome)
    }

    // ========================
    // Interest
    // ========================

    /// Accrue one round of interest on a single account. Returns the
    /// credited cents; 0 means nothing changed and nothing was persisted.
    pub async fn apply_interest(&mut self, id: AccountId) -> Result<Cents, AppError> {
        self.ensure_loaded().await?;
        let account = self.account_mut(id)?;
        let credited = account.apply_interest(Utc::now());
        if credited > 0 {
            self.persist().await?;
            self.publish(DirectoryEvent::InterestAccrued {
                account: id,
                amount_cents: credited,
            });
        }
        Ok(credited)
    }

    /// Accrue interest across every account, persisting once for the whole
    /// sweep. Accounts that credited nothing are left out of the result.
    pub async fn apply_interest_to_all(&mut self) -> Result<Vec<InterestAccrual>, AppError> {
        self.ensure_loaded().await?;
        let now = Utc::now();

        let mut accruals = Vec::new();
        for account in &mut self.accounts {
            let credited = account.apply_interest(now);
            if credited > 0 {
                accruals.push(InterestAccrual {
                    account: account.id,
                    name: account.name.clone(),
                    amount_cents: credited,
                });
            }
        }

        if !accruals.is_empty() {
            self.persist().await?;
            for accrual in &accruals {
                self.publish(DirectoryEvent::InterestAccrued {
                    account: accrual.account,
                    amount_cents: accrual.amount_cents,
                });
            }
        }
        Ok(accruals)
    }

    // ========================
    // Snapshot export / import
    // ========================

    /// Serialize the full collection to the transportable snapshot form.
    pub async fn export_snapshot(&mut self) -> Result<String, AppError> {
        self.ensure_loaded().await?;
        let snapshot = Snapshot::new(self.accounts.clone());
        Ok(snapshot.to_json().context("Failed to encode snapshot")?)
    }

    /// Parse a snapshot and adopt its accounts. With `replace` the current
    /// collection is discarded first; otherwise imported accounts whose id
    /// already exists are skipped with a warning. Inconsistent histories are
    /// imported anyway and reported as warnings.
    pub async fn import_snapshot(
        &mut self,
        data: &str,
        replace: bool,
    ) -> Result<ImportReport, AppError> {
        self.ensure_loaded().await?;

        if data.trim().is_empty() {
            return Err(AppError::InvalidData("empty payload".into()));
        }
        let snapshot =
            Snapshot::from_json(data).map_err(|err| AppError::InvalidData(err.to_string()))?;

        if replace {
            self.accounts.clear();
        }

        let mut report = ImportReport::default();
        for account in snapshot.accounts {
            if self.accounts.iter().any(|existing| existing.id == account.id) {
                report.skipped += 1;
                report.warnings.push(format!(
                    "skipped account {} (\"{}\"): id already exists",
                    account.id, account.name
                ));
                continue;
            }
            for issue in verify_history(&account) {
                report.warnings.push(format!(
                    "account {} (\"{}\"): {}",
                    account.id, account.name, issue
                ));
            }
            self.accounts.push(account);
            report.imported += 1;
        }

        self.persist().await?;
        self.publish(DirectoryEvent::SnapshotImported {
            imported: report.imported,
            skipped: report.skipped,
        });
        Ok(report)
    }
}
