use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::Cents;

pub type AccountId = Uuid;

/// Label used when an account is opened without an explicit type.
pub const DEFAULT_ACCOUNT_TYPE: &str = "checking";

/// The single balance-holding account of an owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub id: AccountId,
    /// Identity of the owner, unique across accounts
    pub owner: String,
    /// Free-form label such as "checking" or "savings"
    pub account_type: String,
    /// Current balance in cents (never negative)
    pub balance_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl Account {
    pub fn new(owner: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            owner: owner.into(),
            account_type: DEFAULT_ACCOUNT_TYPE.to_string(),
            balance_cents: 0,
            created_at: Utc::now(),
        }
    }

    pub fn with_account_type(mut self, account_type: impl Into<String>) -> Self {
        self.account_type = account_type.into();
        self
    }

    pub fn with_balance(mut self, balance_cents: Cents) -> Self {
        assert!(balance_cents >= 0, "Account balance cannot be negative");
        self.balance_cents = balance_cents;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_account_starts_empty() {
        let account = Account::new("alice");
        assert_eq!(account.owner, "alice");
        assert_eq!(account.balance_cents, 0);
        assert_eq!(account.account_type, DEFAULT_ACCOUNT_TYPE);
    }

    #[test]
    fn test_builders() {
        let account = Account::new("bob")
            .with_account_type("savings")
            .with_balance(10000);
        assert_eq!(account.account_type, "savings");
        assert_eq!(account.balance_cents, 10000);
    }

    #[test]
    #[should_panic(expected = "Account balance cannot be negative")]
    fn test_negative_opening_balance_panics() {
        Account::new("carol").with_balance(-1);
    }
}
