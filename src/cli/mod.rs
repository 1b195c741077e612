use std::io::Read;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::{Mutex, broadcast};
use uuid::Uuid;

use crate::application::{AccountDirectory, DirectoryEvent, InterestScheduler};
use crate::domain::{Account, AccountId, AccountType, Currency, format_cents, parse_cents};
use crate::io::export::{write_balances_csv, write_history_csv};

/// Bankbok - Personal Banking Ledger
#[derive(Parser)]
#[command(name = "bankbok")]
#[command(about = "A local-first personal banking ledger")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, default_value = "bankbok.db")]
    pub database: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Account management commands
    #[command(subcommand)]
    Account(AccountCommands),

    /// Deposit money into an account
    Deposit {
        /// Account id or name
        account: String,

        /// Amount to deposit (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw money from an account
    Withdraw {
        /// Account id or name
        account: String,

        /// Amount to withdraw (e.g., "50.00" or "50")
        amount: String,
    },

    /// Transfer money between accounts
    Transfer {
        /// Amount to transfer (e.g., "50.00" or "50")
        amount: String,

        /// Source account id or name
        #[arg(long)]
        from: String,

        /// Destination account id or name
        #[arg(long)]
        to: String,
    },

    /// Apply interest to one savings account, or to all of them
    Interest {
        /// Account id or name (omit to sweep every account)
        account: Option<String>,
    },

    /// Keep accruing interest on a fixed interval until interrupted
    Watch {
        /// Seconds between sweeps
        #[arg(short, long, default_value = "30")]
        every: u64,
    },

    /// Export data as a JSON snapshot or CSV
    Export {
        /// What to export: snapshot, balances, history
        #[arg(default_value = "snapshot")]
        export_type: String,

        /// Account id or name (required for history)
        #[arg(short, long)]
        account: Option<String>,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Import a JSON snapshot
    Import {
        /// Input file (stdin if omitted)
        #[arg(short, long)]
        input: Option<String>,

        /// Replace the current accounts instead of merging
        #[arg(long)]
        replace: bool,
    },
}

#[derive(Subcommand)]
pub enum AccountCommands {
    /// Create a new account
    Create {
        /// Display name
        name: String,

        /// Account type: checking, savings
        #[arg(short = 't', long = "type", default_value = "checking")]
        account_type: String,

        /// Currency code
        #[arg(short, long, default_value = "SEK")]
        currency: String,

        /// Opening balance (e.g., "100.00")
        #[arg(short, long, default_value = "0")]
        balance: String,

        /// Interest rate as a fraction (e.g., 0.01 for 1%), savings only
        #[arg(short, long)]
        rate: Option<f64>,
    },

    /// List all accounts
    List,

    /// Show detailed account information
    Show {
        /// Account id or name
        account: String,
    },

    /// Show an account's transaction history
    History {
        /// Account id or name
        account: String,
    },

    /// Close an account and drop it from the directory
    Close {
        /// Account id or name
        account: String,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        match self.command {
            Commands::Init => {
                AccountDirectory::init(&self.database).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Account(account_cmd) => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                run_account_command(&mut directory, account_cmd).await?;
            }

            Commands::Deposit { account, amount } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let id = resolve_account(&mut directory, &account).await?;

                let updated = directory.deposit(id, amount_cents).await?;
                println!(
                    "Deposited {} into {} (balance {})",
                    format_cents(amount_cents),
                    updated.name,
                    format_cents(updated.balance_cents)
                );
            }

            Commands::Withdraw { account, amount } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let id = resolve_account(&mut directory, &account).await?;

                let updated = directory.withdraw(id, amount_cents).await?;
                println!(
                    "Withdrew {} from {} (balance {})",
                    format_cents(amount_cents),
                    updated.name,
                    format_cents(updated.balance_cents)
                );
            }

            Commands::Transfer { amount, from, to } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                let amount_cents =
                    parse_cents(&amount).context("Invalid amount format. Use '50.00' or '50'")?;
                let from_id = resolve_account(&mut directory, &from).await?;
                let to_id = resolve_account(&mut directory, &to).await?;

                let outcome = directory.transfer(from_id, to_id, amount_cents).await?;
                println!(
                    "Transferred {} from {} (balance {}) to {} (balance {})",
                    format_cents(outcome.amount_cents),
                    outcome.from.name,
                    format_cents(outcome.from.balance_cents),
                    outcome.to.name,
                    format_cents(outcome.to.balance_cents)
                );
            }

            Commands::Interest { account } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                match account {
                    Some(reference) => {
                        let id = resolve_account(&mut directory, &reference).await?;
                        let credited = directory.apply_interest(id).await?;
                        if credited > 0 {
                            println!("Credited {} of interest", format_cents(credited));
                        } else {
                            println!("No interest due");
                        }
                    }
                    None => {
                        let accruals = directory.apply_interest_to_all().await?;
                        if accruals.is_empty() {
                            println!("No interest due on any account");
                        } else {
                            for accrual in accruals {
                                println!(
                                    "Credited {} on {}",
                                    format_cents(accrual.amount_cents),
                                    accrual.name
                                );
                            }
                        }
                    }
                }
            }

            Commands::Watch { every } => {
                let directory = AccountDirectory::connect(&self.database).await?;
                run_watch_command(directory, every).await?;
            }

            Commands::Export {
                export_type,
                account,
                output,
            } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                run_export_command(&mut directory, &export_type, account.as_deref(), output.as_deref())
                    .await?;
            }

            Commands::Import { input, replace } => {
                let mut directory = AccountDirectory::connect(&self.database).await?;
                run_import_command(&mut directory, input.as_deref(), replace).await?;
            }
        }

        Ok(())
    }
}

/// Resolve an account reference given either as a UUID or as a unique name.
async fn resolve_account(directory: &mut AccountDirectory, reference: &str) -> Result<AccountId> {
    if let Ok(id) = Uuid::parse_str(reference) {
        return Ok(id);
    }

    let accounts = directory.accounts().await?;
    let matches: Vec<&Account> = accounts
        .iter()
        .filter(|account| account.name == reference)
        .collect();

    match matches.len() {
        0 => anyhow::bail!("No account named '{}'", reference),
        1 => Ok(matches[0].id),
        _ => anyhow::bail!(
            "Account name '{}' is ambiguous, refer to it by id instead",
            reference
        ),
    }
}

async fn run_account_command(directory: &mut AccountDirectory, cmd: AccountCommands) -> Result<()> {
    match cmd {
        AccountCommands::Create {
            name,
            account_type,
            currency,
            balance,
            rate,
        } => {
            let account_type = AccountType::from_str(&account_type).ok_or_else(|| {
                anyhow::anyhow!(
                    "Invalid account type '{}'. Valid types: checking, savings",
                    account_type
                )
            })?;
            let currency = Currency::from_str(&currency)
                .ok_or_else(|| anyhow::anyhow!("Unsupported currency '{}'", currency))?;
            let balance_cents =
                parse_cents(&balance).context("Invalid balance format. Use '100.00' or '100'")?;

            let account = directory
                .create_account(name, account_type, currency, balance_cents, rate)
                .await?;
            println!(
                "Created {} account {} with balance {} ({})",
                account.account_type,
                account.name,
                format_cents(account.balance_cents),
                account.id
            );
        }

        AccountCommands::List => {
            let accounts = directory.accounts().await?;
            if accounts.is_empty() {
                println!("No accounts found.");
            } else {
                println!(
                    "{:<36} {:<20} {:<9} {:<9} {:>14}",
                    "ID", "NAME", "TYPE", "CURRENCY", "BALANCE"
                );
                println!("{}", "-".repeat(92));
                for account in accounts {
                    println!(
                        "{:<36} {:<20} {:<9} {:<9} {:>14}",
                        account.id,
                        account.name,
                        account.account_type,
                        account.currency,
                        format_cents(account.balance_cents)
                    );
                }
            }
        }

        AccountCommands::Show { account } => {
            let id = resolve_account(directory, &account).await?;
            let account = directory.account(id).await?;

            println!("Account:      {}", account.name);
            println!("Id:           {}", account.id);
            println!("Type:         {}", account.account_type);
            println!("Currency:     {}", account.currency);
            println!("Balance:      {}", format_cents(account.balance_cents));
            if let Some(rate) = account.interest_rate {
                println!("Interest:     {:.2}%", rate * 100.0);
            }
            println!("Created:      {}", account.created_at.format("%Y-%m-%d %H:%M"));
            println!("Last updated: {}", account.last_updated.format("%Y-%m-%d %H:%M"));
            println!("Transactions: {}", account.transactions.len());
        }

        AccountCommands::History { account } => {
            let id = resolve_account(directory, &account).await?;
            let account = directory.account(id).await?;

            if account.transactions.is_empty() {
                println!("No transactions for {}.", account.name);
            } else {
                println!(
                    "{:<17} {:<13} {:>12} {:>14}",
                    "TIMESTAMP", "KIND", "AMOUNT", "BALANCE"
                );
                println!("{}", "-".repeat(60));
                for tx in &account.transactions {
                    println!(
                        "{:<17} {:<13} {:>12} {:>14}",
                        tx.timestamp.format("%Y-%m-%d %H:%M"),
                        tx.kind,
                        format_cents(tx.amount_cents),
                        format_cents(tx.balance_after)
                    );
                }
            }
        }

        AccountCommands::Close { account } => {
            let id = resolve_account(directory, &account).await?;
            let closed = directory.close_account(id).await?;
            println!(
                "Closed account {} (final balance {})",
                closed.name,
                format_cents(closed.balance_cents)
            );
        }
    }

    Ok(())
}

async fn run_watch_command(mut directory: AccountDirectory, every: u64) -> Result<()> {
    anyhow::ensure!(every > 0, "--every must be at least 1 second");
    directory.ensure_loaded().await?;
    let mut events = directory.subscribe();

    let directory = Arc::new(Mutex::new(directory));
    let scheduler = InterestScheduler::spawn(directory.clone(), Duration::from_secs(every));
    println!("Accruing interest every {}s. Press Ctrl-C to stop.", every);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            event = events.recv() => match event {
                Ok(DirectoryEvent::InterestAccrued { account, amount_cents }) => {
                    let name = directory
                        .lock()
                        .await
                        .account(account)
                        .await
                        .map(|a| a.name)
                        .unwrap_or_else(|_| account.to_string());
                    println!("Credited {} on {}", format_cents(amount_cents), name);
                }
                Ok(_) => {}
                Err(broadcast::error::RecvError::Lagged(_)) => continue,
                Err(broadcast::error::RecvError::Closed) => break,
            },
        }
    }

    scheduler.stop();
    println!("Stopped.");
    Ok(())
}

async fn run_export_command(
    directory: &mut AccountDirectory,
    export_type: &str,
    account: Option<&str>,
    output: Option<&str>,
) -> Result<()> {
    let data = match export_type {
        "snapshot" => directory.export_snapshot().await?,
        "balances" => {
            let accounts = directory.accounts().await?;
            let mut buf = Vec::new();
            write_balances_csv(&accounts, &mut buf)?;
            String::from_utf8(buf).context("CSV output was not valid UTF-8")?
        }
        "history" => {
            let reference = account.context("--account is required when exporting history")?;
            let id = resolve_account(directory, reference).await?;
            let account = directory.account(id).await?;
            let mut buf = Vec::new();
            write_history_csv(&account, &mut buf)?;
            String::from_utf8(buf).context("CSV output was not valid UTF-8")?
        }
        other => anyhow::bail!(
            "Unknown export type '{}'. Valid types: snapshot, balances, history",
            other
        ),
    };

    match output {
        Some(path) => {
            std::fs::write(path, &data).with_context(|| format!("Failed to write {}", path))?;
            println!("Wrote {}", path);
        }
        None => print!("{}", data),
    }
    Ok(())
}

async fn run_import_command(
    directory: &mut AccountDirectory,
    input: Option<&str>,
    replace: bool,
) -> Result<()> {
    let data = match input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path))?,
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read stdin")?;
            buf
        }
    };

    let report = directory.import_snapshot(&data, replace).await?;
    println!(
        "Imported {} account(s), skipped {}",
        report.imported, report.skipped
    );
    for warning in &report.warnings {
        eprintln!("warning: {}", warning);
    }
    Ok(())
}
