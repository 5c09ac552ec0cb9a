use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AccountId, Cents};

/// Auto-incrementing id assigned by the database.
pub type TransactionId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    /// Money paid into the account
    Deposit,
    /// Money taken out of the account
    Withdraw,
}

impl TransactionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::Deposit => "deposit",
            TransactionKind::Withdraw => "withdraw",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "deposit" => Some(TransactionKind::Deposit),
            "withdraw" => Some(TransactionKind::Withdraw),
            _ => None,
        }
    }

    /// Signed effect of this kind on the balance.
    pub fn signed(&self, amount_cents: Cents) -> Cents {
        match self {
            TransactionKind::Deposit => amount_cents,
            TransactionKind::Withdraw => -amount_cents,
        }
    }
}

impl std::fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An immutable record of a single deposit or withdrawal.
/// Transactions are append-only; they are never updated or deleted on their own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,
    pub account_id: AccountId,
    pub kind: TransactionKind,
    /// Amount in cents (always positive)
    pub amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

/// A transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTransaction {
    pub account_id: AccountId,
    pub kind: TransactionKind,
    pub amount_cents: Cents,
    pub created_at: DateTime<Utc>,
}

impl NewTransaction {
    pub fn new(account_id: AccountId, kind: TransactionKind, amount_cents: Cents) -> Self {
        assert!(amount_cents > 0, "Transaction amount must be positive");
        Self {
            account_id,
            kind,
            amount_cents,
            created_at: Utc::now(),
        }
    }

    /// Attach the id the database assigned.
    pub fn stored(self, id: TransactionId) -> Transaction {
        Transaction {
            id,
            account_id: self.account_id,
            kind: self.kind,
            amount_cents: self.amount_cents,
            created_at: self.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(
            TransactionKind::from_str("deposit"),
            Some(TransactionKind::Deposit)
        );
        assert_eq!(
            TransactionKind::from_str(" Withdraw "),
            Some(TransactionKind::Withdraw)
        );
        assert_eq!(TransactionKind::from_str("transfer"), None);
        assert_eq!(TransactionKind::from_str(""), None);
    }

    #[test]
    fn test_signed_amount() {
        assert_eq!(TransactionKind::Deposit.signed(500), 500);
        assert_eq!(TransactionKind::Withdraw.signed(500), -500);
    }

    #[test]
    fn test_stored_keeps_fields() {
        let account_id = Uuid::new_v4();
        let pending = NewTransaction::new(account_id, TransactionKind::Deposit, 2500);
        let created_at = pending.created_at;

        let stored = pending.stored(7);

        assert_eq!(stored.id, 7);
        assert_eq!(stored.account_id, account_id);
        assert_eq!(stored.kind, TransactionKind::Deposit);
        assert_eq!(stored.amount_cents, 2500);
        assert_eq!(stored.created_at, created_at);
    }

    #[test]
    #[should_panic(expected = "Transaction amount must be positive")]
    fn test_transaction_requires_positive_amount() {
        NewTransaction::new(Uuid::new_v4(), TransactionKind::Withdraw, 0);
    }
}
