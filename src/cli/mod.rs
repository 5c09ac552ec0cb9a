use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::application::{parse_amount, ApplyResult, LedgerService, TransactionForm};
use crate::config::{LedgerConfig, DEFAULT_MAX_CONNECTIONS};
use crate::domain::{format_cents, TransactionKind};

/// Teller - single-account deposit/withdraw ledger
#[derive(Parser)]
#[command(name = "teller")]
#[command(about = "Keep one balance per owner with a full deposit/withdraw history")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "TELLER_DB", default_value = "teller.db")]
    pub database: String,

    /// Maximum number of pooled database connections
    #[arg(long, env = "TELLER_MAX_CONNECTIONS", default_value_t = DEFAULT_MAX_CONNECTIONS)]
    pub max_connections: u32,

    /// Milliseconds to wait for a concurrent writer before giving up
    #[arg(long, env = "TELLER_BUSY_TIMEOUT_MS", default_value_t = 5000)]
    pub busy_timeout_ms: u64,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Open the account of a new owner
    Open {
        /// Owner identity (must be unique)
        owner: String,

        /// Account type label
        #[arg(short = 't', long = "type")]
        account_type: Option<String>,
    },

    /// Deposit money into an owner's account
    Deposit {
        owner: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Withdraw money from an owner's account
    Withdraw {
        owner: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Submit a deposit or withdrawal by type name
    Transact {
        owner: String,

        /// Transaction type: deposit, withdraw
        #[arg(short = 't', long = "type")]
        kind: String,

        /// Amount (e.g., "50.00" or "50")
        amount: String,
    },

    /// Show an owner's balance
    Balance { owner: String },

    /// List an owner's transactions, newest first
    History {
        owner: String,

        /// Maximum number of transactions to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Close an owner's account and delete its history
    Close { owner: String },
}

impl Cli {
    /// Install the logger. Call once, at startup.
    pub fn init_logging(&self) {
        pretty_env_logger::formatted_builder()
            .parse_filters(&self.log_filter(std::env::var("RUST_LOG").ok()))
            .init();
    }

    /// `RUST_LOG` takes precedence over `--verbose`.
    fn log_filter(&self, rust_log: Option<String>) -> String {
        rust_log.unwrap_or_else(|| {
            if self.verbose {
                "teller=debug".to_string()
            } else {
                "teller=warn".to_string()
            }
        })
    }

    fn config(&self) -> LedgerConfig {
        LedgerConfig::new(&self.database)
            .with_max_connections(self.max_connections)
            .with_busy_timeout(Duration::from_millis(self.busy_timeout_ms))
    }

    pub async fn run(self) -> Result<()> {
        let config = self.config();

        match self.command {
            Commands::Init => {
                LedgerService::init_with(&config.with_create_if_missing(true)).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Open {
                owner,
                account_type,
            } => {
                let service = LedgerService::connect_with(&config).await?;
                let account = service.open_account(&owner, account_type).await?;
                println!(
                    "Opened {} account for {} ({})",
                    account.account_type, account.owner, account.id
                );
            }

            Commands::Deposit { owner, amount } => {
                let service = LedgerService::connect_with(&config).await?;
                let result = run_apply(&service, &owner, TransactionKind::Deposit, &amount).await?;
                print_apply_result(&owner, &result);
            }

            Commands::Withdraw { owner, amount } => {
                let service = LedgerService::connect_with(&config).await?;
                let result =
                    run_apply(&service, &owner, TransactionKind::Withdraw, &amount).await?;
                print_apply_result(&owner, &result);
            }

            Commands::Transact {
                owner,
                kind,
                amount,
            } => {
                let service = LedgerService::connect_with(&config).await?;
                let form = TransactionForm::new(kind, amount);
                let result = service.submit(&owner, &form).await?;
                print_apply_result(&owner, &result);
            }

            Commands::Balance { owner } => {
                let service = LedgerService::connect_with(&config).await?;
                let entry = service.get_balance(&owner).await?;
                println!(
                    "{}: {} ({} transactions)",
                    entry.account.owner,
                    format_cents(entry.balance),
                    entry.transaction_count
                );
            }

            Commands::History { owner, limit } => {
                let service = LedgerService::connect_with(&config).await?;
                run_history_command(&service, &owner, limit).await?;
            }

            Commands::Close { owner } => {
                let service = LedgerService::connect_with(&config).await?;
                let account = service.close_account(&owner).await?;
                println!("Closed account for {} ({})", account.owner, account.id);
            }
        }

        Ok(())
    }
}

async fn run_apply(
    service: &LedgerService,
    owner: &str,
    kind: TransactionKind,
    amount: &str,
) -> Result<ApplyResult> {
    let amount_cents = parse_amount(amount)?;
    let account = service.get_account_by_owner(owner).await?;
    Ok(service.apply(account.id, kind, amount_cents).await?)
}

fn print_apply_result(owner: &str, result: &ApplyResult) {
    println!(
        "Recorded {}: {} for {} (#{}), balance {}",
        result.transaction.kind,
        format_cents(result.transaction.amount_cents),
        owner,
        result.transaction.id,
        format_cents(result.balance)
    );
}

async fn run_history_command(
    service: &LedgerService,
    owner: &str,
    limit: Option<usize>,
) -> Result<()> {
    let transactions = service.owner_history(owner, limit).await?;

    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!("{:<8} {:<20} {:<10} {:>12}", "ID", "DATE", "TYPE", "AMOUNT");
    println!("{}", "-".repeat(53));
    for transaction in transactions {
        println!(
            "{:<8} {:<20} {:<10} {:>12}",
            transaction.id,
            transaction.created_at.format("%Y-%m-%d %H:%M:%S"),
            transaction.kind.as_str(),
            format_cents(transaction.amount_cents)
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transact_command() {
        let cli = Cli::try_parse_from([
            "teller", "-d", "ledger.db", "transact", "alice", "--type", "withdraw", "20.00",
        ])
        .unwrap();

        assert_eq!(cli.database, "ledger.db");
        match cli.command {
            Commands::Transact {
                owner,
                kind,
                amount,
            } => {
                assert_eq!(owner, "alice");
                assert_eq!(kind, "withdraw");
                assert_eq!(amount, "20.00");
            }
            _ => panic!("expected transact command"),
        }
    }

    #[test]
    fn test_log_filter() {
        let quiet = Cli::try_parse_from(["teller", "balance", "bob"]).unwrap();
        assert_eq!(quiet.log_filter(None), "teller=warn");

        let verbose = Cli::try_parse_from(["teller", "balance", "bob", "-v"]).unwrap();
        assert_eq!(verbose.log_filter(None), "teller=debug");
        assert_eq!(
            verbose.log_filter(Some("sqlx=info".to_string())),
            "sqlx=info"
        );
    }

    #[test]
    fn test_config_from_flags() {
        let cli = Cli::try_parse_from([
            "teller",
            "--database",
            "x.db",
            "--max-connections",
            "2",
            "--busy-timeout-ms",
            "250",
            "balance",
            "bob",
        ])
        .unwrap();

        let config = cli.config();
        assert_eq!(config.database_path, "x.db");
        assert_eq!(config.max_connections, 2);
        assert_eq!(config.busy_timeout, Duration::from_millis(250));
        assert!(!config.create_if_missing);
    }
}
