use anyhow::Context;

use crate::config::LedgerConfig;
use crate::domain::{
    format_cents, Account, AccountId, Cents, NewTransaction, Transaction, TransactionKind,
    MAX_CENTS,
};
use crate::storage::Repository;

use super::{validate_amount, validate_owner, AppError, TransactionForm};

/// Application service providing the ledger's operations.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
#[derive(Clone)]
pub struct LedgerService {
    repo: Repository,
}

/// Result of applying a deposit or withdrawal
#[derive(Debug, Clone)]
pub struct ApplyResult {
    pub transaction: Transaction,
    /// Balance after the operation
    pub balance: Cents,
}

/// Balance entry for an account
#[derive(Debug, Clone)]
pub struct BalanceEntry {
    pub account: Account,
    pub balance: Cents,
    pub transaction_count: i64,
}

impl LedgerService {
    /// Create a new ledger service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a database at the given path, creating it if needed.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let config = LedgerConfig::new(database_path).with_create_if_missing(true);
        Self::init_with(&config).await
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        Self::connect_with(&LedgerConfig::new(database_path)).await
    }

    /// Open and migrate the database described by `config`.
    pub async fn init_with(config: &LedgerConfig) -> Result<Self, AppError> {
        let repo = Repository::init(config).await?;
        Ok(Self::new(repo))
    }

    /// Open the database described by `config` without migrating.
    pub async fn connect_with(config: &LedgerConfig) -> Result<Self, AppError> {
        let repo = Repository::open(config).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Account operations
    // ========================

    /// Open the single account of a newly registered owner.
    pub async fn open_account(
        &self,
        owner: &str,
        account_type: Option<String>,
    ) -> Result<Account, AppError> {
        let owner = validate_owner(owner)?;

        if self.repo.get_account_by_owner(&owner).await?.is_some() {
            return Err(AppError::AccountAlreadyExists(owner));
        }

        let mut account = Account::new(owner);
        if let Some(account_type) = account_type {
            account = account.with_account_type(account_type);
        }

        // A concurrent registration for the same owner may win between the
        // check above and this insert
        if !self.repo.save_account(&account).await? {
            return Err(AppError::AccountAlreadyExists(account.owner));
        }
        log::info!("opened account {} for {}", account.id, account.owner);
        Ok(account)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, account_id: AccountId) -> Result<Account, AppError> {
        self.repo
            .get_account(account_id)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(account_id.to_string()))
    }

    /// Get the account belonging to `owner`.
    pub async fn get_account_by_owner(&self, owner: &str) -> Result<Account, AppError> {
        let owner = owner.trim();
        self.repo
            .get_account_by_owner(owner)
            .await?
            .ok_or_else(|| AppError::AccountNotFound(owner.to_string()))
    }

    /// Get the balance of the account belonging to `owner`.
    pub async fn get_balance(&self, owner: &str) -> Result<BalanceEntry, AppError> {
        let account = self.get_account_by_owner(owner).await?;
        let transaction_count = self.repo.count_transactions(account.id).await?;
        Ok(BalanceEntry {
            balance: account.balance_cents,
            account,
            transaction_count,
        })
    }

    // ========================
    // Ledger operations
    // ========================

    /// Apply a deposit or withdrawal to an account.
    ///
    /// On success the balance change and the new transaction record are
    /// committed together. On any error nothing is written.
    pub async fn apply(
        &self,
        account_id: AccountId,
        kind: TransactionKind,
        amount_cents: Cents,
    ) -> Result<ApplyResult, AppError> {
        validate_amount(amount_cents)?;

        let mut unit = self.repo.begin().await?;

        let updated =
            Repository::update_balance(&mut *unit, account_id, kind, amount_cents).await?;

        let balance = match updated {
            Some(balance) => balance,
            None => {
                let current = Repository::current_balance(&mut *unit, account_id).await?;
                unit.rollback().await.context("Failed to roll back")?;
                return Err(Self::rejection(account_id, kind, amount_cents, current));
            }
        };

        let transaction = Repository::insert_transaction(
            &mut *unit,
            NewTransaction::new(account_id, kind, amount_cents),
        )
        .await?;

        unit.commit().await.context("Failed to commit")?;

        log::info!(
            "{} {} on account {} (balance {})",
            kind,
            format_cents(amount_cents),
            account_id,
            format_cents(balance)
        );

        Ok(ApplyResult {
            transaction,
            balance,
        })
    }

    /// Work out why the guarded balance update matched no row.
    fn rejection(
        account_id: AccountId,
        kind: TransactionKind,
        amount_cents: Cents,
        current: Option<Cents>,
    ) -> AppError {
        let Some(balance) = current else {
            return AppError::AccountNotFound(account_id.to_string());
        };

        match kind {
            TransactionKind::Withdraw => {
                log::warn!(
                    "rejected withdrawal of {} from account {}: balance {}",
                    format_cents(amount_cents),
                    account_id,
                    format_cents(balance)
                );
                AppError::InsufficientFunds {
                    account: account_id.to_string(),
                    balance,
                    required: amount_cents,
                }
            }
            TransactionKind::Deposit => AppError::InvalidAmount(format!(
                "Deposit of {} would take the balance over {}",
                format_cents(amount_cents),
                format_cents(MAX_CENTS)
            )),
        }
    }

    /// Validate a raw form and apply it to the account of `owner`.
    pub async fn submit(
        &self,
        owner: &str,
        form: &TransactionForm,
    ) -> Result<ApplyResult, AppError> {
        let (kind, amount_cents) = form.validate()?;
        let account = self.get_account_by_owner(owner).await?;
        self.apply(account.id, kind, amount_cents).await
    }

    /// Deposit into an account.
    pub async fn deposit(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<ApplyResult, AppError> {
        self.apply(account_id, TransactionKind::Deposit, amount_cents)
            .await
    }

    /// Withdraw from an account.
    pub async fn withdraw(
        &self,
        account_id: AccountId,
        amount_cents: Cents,
    ) -> Result<ApplyResult, AppError> {
        self.apply(account_id, TransactionKind::Withdraw, amount_cents)
            .await
    }

    /// Transaction history of an account, newest first.
    pub async fn history(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, AppError> {
        // Surface unknown accounts instead of an empty list
        self.get_account(account_id).await?;
        Ok(self.repo.list_transactions(account_id, limit).await?)
    }

    /// Transaction history of the account belonging to `owner`, newest first.
    pub async fn owner_history(
        &self,
        owner: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>, AppError> {
        let account = self.get_account_by_owner(owner).await?;
        Ok(self.repo.list_transactions(account.id, limit).await?)
    }

    /// Remove an account together with its history.
    pub async fn close_account(&self, owner: &str) -> Result<Account, AppError> {
        let account = self.get_account_by_owner(owner).await?;
        self.repo.delete_account(account.id).await?;
        log::info!("closed account {} for {}", account.id, account.owner);
        Ok(account)
    }
}
