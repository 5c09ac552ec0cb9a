use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{Row, Sqlite, SqliteConnection, SqlitePool};
use uuid::Uuid;

use crate::config::LedgerConfig;
use crate::domain::{
    Account, AccountId, Cents, NewTransaction, Transaction, TransactionKind, MAX_CENTS,
};

use super::MIGRATION_001_INITIAL;

/// A write unit against the ledger. Dropping it without `commit` rolls back.
pub type WriteUnit = sqlx::Transaction<'static, Sqlite>;

/// Repository for persisting and querying accounts and transactions.
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open the database described by `config`.
    /// WAL journaling lets readers proceed while a writer holds the lock;
    /// writers queue on the busy timeout.
    pub async fn open(config: &LedgerConfig) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(&config.database_url())
            .context("Invalid database path")?
            .create_if_missing(config.create_if_missing)
            .journal_mode(SqliteJournalMode::Wal)
            .busy_timeout(config.busy_timeout)
            .foreign_keys(true);

        log::debug!(
            "opening {} (max_connections={}, busy_timeout={:?})",
            config.database_path,
            config.max_connections,
            config.busy_timeout
        );

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .with_context(|| format!("Failed to open database {}", config.database_path))?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;
        log::debug!("migrations applied");
        Ok(())
    }

    /// Initialize a database (open + migrate).
    pub async fn init(config: &LedgerConfig) -> Result<Self> {
        let repo = Self::open(config).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // Account operations
    // ========================

    /// Save a new account to the database.
    /// Returns false, writing nothing, when the owner already has an account.
    pub async fn save_account(&self, account: &Account) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO accounts (id, owner, account_type, balance_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(owner) DO NOTHING
            "#,
        )
        .bind(account.id.to_string())
        .bind(&account.owner)
        .bind(&account.account_type)
        .bind(account.balance_cents)
        .bind(account.created_at.to_rfc3339())
        .execute(&self.pool)
        .await
        .context("Failed to save account")?;
        Ok(result.rows_affected() > 0)
    }

    /// Get an account by ID.
    pub async fn get_account(&self, id: AccountId) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, account_type, balance_cents, created_at
            FROM accounts
            WHERE id = ?
            "#,
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Get an account by its owner.
    pub async fn get_account_by_owner(&self, owner: &str) -> Result<Option<Account>> {
        let row = sqlx::query(
            r#"
            SELECT id, owner, account_type, balance_cents, created_at
            FROM accounts
            WHERE owner = ?
            "#,
        )
        .bind(owner)
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch account by owner")?;

        match row {
            Some(row) => Ok(Some(Self::row_to_account(&row)?)),
            None => Ok(None),
        }
    }

    /// Remove an account. Its transactions go with it (`ON DELETE CASCADE`).
    /// Returns false if no such account existed.
    pub async fn delete_account(&self, id: AccountId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete account")?;
        Ok(result.rows_affected() > 0)
    }

    fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> Result<Account> {
        let id_str: String = row.get("id");
        let created_at_str: String = row.get("created_at");

        Ok(Account {
            id: Uuid::parse_str(&id_str).context("Invalid account ID")?,
            owner: row.get("owner"),
            account_type: row.get("account_type"),
            balance_cents: row.get("balance_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }

    // ========================
    // Write unit
    // ========================

    /// Start a write unit. Everything done through it commits or rolls back together.
    pub async fn begin(&self) -> Result<WriteUnit> {
        self.pool
            .begin()
            .await
            .context("Failed to begin database transaction")
    }

    /// Apply `kind` of `amount_cents` to the balance in a single guarded statement.
    ///
    /// The row only changes when the resulting balance stays within
    /// `0..=MAX_CENTS`; returns the new balance, or `None` when the account is
    /// missing or the guard rejected the change. Issued as the first statement
    /// of a write unit, it takes the database write lock before anything is
    /// read, which serializes concurrent updates of the same account.
    pub async fn update_balance(
        conn: &mut SqliteConnection,
        account_id: AccountId,
        kind: TransactionKind,
        amount_cents: Cents,
    ) -> Result<Option<Cents>> {
        let delta = kind.signed(amount_cents);

        let row = sqlx::query(
            r#"
            UPDATE accounts
            SET balance_cents = balance_cents + ?
            WHERE id = ?
              AND balance_cents + ? >= 0
              AND balance_cents + ? <= ?
            RETURNING balance_cents
            "#,
        )
        .bind(delta)
        .bind(account_id.to_string())
        .bind(delta)
        .bind(delta)
        .bind(MAX_CENTS)
        .fetch_optional(&mut *conn)
        .await
        .context("Failed to update balance")?;

        Ok(row.map(|row| row.get("balance_cents")))
    }

    /// Read the current balance inside a write unit.
    pub async fn current_balance(
        conn: &mut SqliteConnection,
        account_id: AccountId,
    ) -> Result<Option<Cents>> {
        let row = sqlx::query("SELECT balance_cents FROM accounts WHERE id = ?")
            .bind(account_id.to_string())
            .fetch_optional(&mut *conn)
            .await
            .context("Failed to read balance")?;

        Ok(row.map(|row| row.get("balance_cents")))
    }

    /// Append a transaction record and return it with its assigned id.
    pub async fn insert_transaction(
        conn: &mut SqliteConnection,
        transaction: NewTransaction,
    ) -> Result<Transaction> {
        let row = sqlx::query(
            r#"
            INSERT INTO transactions (account_id, kind, amount_cents, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(transaction.account_id.to_string())
        .bind(transaction.kind.as_str())
        .bind(transaction.amount_cents)
        .bind(transaction.created_at.to_rfc3339())
        .fetch_one(&mut *conn)
        .await
        .context("Failed to save transaction")?;

        Ok(transaction.stored(row.get("id")))
    }

    // ========================
    // Transaction queries
    // ========================

    /// List transactions of an account, newest first.
    pub async fn list_transactions(
        &self,
        account_id: AccountId,
        limit: Option<usize>,
    ) -> Result<Vec<Transaction>> {
        // SQLite treats a negative LIMIT as "no limit"
        let limit = limit.map(|l| l as i64).unwrap_or(-1);

        let rows = sqlx::query(
            r#"
            SELECT id, account_id, kind, amount_cents, created_at
            FROM transactions
            WHERE account_id = ?
            ORDER BY id DESC
            LIMIT ?
            "#,
        )
        .bind(account_id.to_string())
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .context("Failed to list transactions")?;

        rows.iter().map(Self::row_to_transaction).collect()
    }

    /// Count transactions recorded for an account.
    pub async fn count_transactions(&self, account_id: AccountId) -> Result<i64> {
        let row = sqlx::query("SELECT COUNT(*) as count FROM transactions WHERE account_id = ?")
            .bind(account_id.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count transactions")?;

        Ok(row.get("count"))
    }

    fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> Result<Transaction> {
        let account_id_str: String = row.get("account_id");
        let kind_str: String = row.get("kind");
        let created_at_str: String = row.get("created_at");

        Ok(Transaction {
            id: row.get("id"),
            account_id: Uuid::parse_str(&account_id_str).context("Invalid account ID")?,
            kind: TransactionKind::from_str(&kind_str)
                .ok_or_else(|| anyhow::anyhow!("Invalid transaction kind: {}", kind_str))?,
            amount_cents: row.get("amount_cents"),
            created_at: DateTime::parse_from_rfc3339(&created_at_str)
                .context("Invalid created_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
