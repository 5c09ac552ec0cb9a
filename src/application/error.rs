use thiserror::Error;

use crate::domain::{format_cents, Cents};

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    #[error("Invalid transaction type: {0} (expected deposit or withdraw)")]
    InvalidTransactionKind(String),

    #[error("Invalid owner: {0}")]
    InvalidOwner(String),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Account already exists for owner: {0}")]
    AccountAlreadyExists(String),

    #[error(
        "Insufficient funds in account {account}: balance {}, required {}",
        money(.balance),
        money(.required)
    )]
    InsufficientFunds {
        account: String,
        balance: Cents,
        required: Cents,
    },

    #[error("Database error: {0}")]
    Database(#[from] anyhow::Error),
}

fn money(cents: &Cents) -> String {
    format_cents(*cents)
}
