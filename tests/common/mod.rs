// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use teller::application::LedgerService;
use teller::domain::{Account, Cents};
use teller::{LedgerConfig, Repository};
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(LedgerService, TempDir)> {
    let (service, _repo, temp_dir) = test_service_with_repo().await?;
    Ok((service, temp_dir))
}

/// Same as `test_service`, also handing out the repository for seeding
pub async fn test_service_with_repo() -> Result<(LedgerService, Repository, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let config = LedgerConfig::new(db_path.to_str().unwrap()).with_create_if_missing(true);
    let repo = Repository::init(&config).await?;
    let service = LedgerService::new(repo.clone());
    Ok((service, repo, temp_dir))
}

/// Store an account that already holds `balance` without any history.
pub async fn seed_account(repo: &Repository, owner: &str, balance: Cents) -> Result<Account> {
    let account = Account::new(owner).with_balance(balance);
    repo.save_account(&account).await?;
    Ok(account)
}
