use crate::domain::{parse_cents, Cents, TransactionKind, MAX_CENTS};

use super::AppError;

/// Raw deposit/withdraw input as a front end receives it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionForm {
    pub kind: String,
    pub amount: String,
}

impl TransactionForm {
    pub fn new(kind: impl Into<String>, amount: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            amount: amount.into(),
        }
    }

    /// Check both fields and return them typed.
    pub fn validate(&self) -> Result<(TransactionKind, Cents), AppError> {
        let kind = parse_kind(&self.kind)?;
        let amount_cents = parse_amount(&self.amount)?;
        Ok((kind, amount_cents))
    }
}

pub fn parse_kind(input: &str) -> Result<TransactionKind, AppError> {
    TransactionKind::from_str(input)
        .ok_or_else(|| AppError::InvalidTransactionKind(input.trim().to_string()))
}

/// Parse a user-supplied amount ("50", "50.00") into positive cents.
pub fn parse_amount(input: &str) -> Result<Cents, AppError> {
    let cents = parse_cents(input)
        .map_err(|e| AppError::InvalidAmount(format!("'{}': {}", input.trim(), e)))?;
    validate_amount(cents)?;
    Ok(cents)
}

/// An amount must be strictly positive and fit a `DECIMAL(10, 2)`.
pub fn validate_amount(amount_cents: Cents) -> Result<(), AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidAmount(
            "Amount must be positive".to_string(),
        ));
    }
    if amount_cents > MAX_CENTS {
        return Err(AppError::InvalidAmount(
            "Amount exceeds the maximum of 99999999.99".to_string(),
        ));
    }
    Ok(())
}

/// Owners are identities handed over by the caller; only emptiness is checked.
pub fn validate_owner(owner: &str) -> Result<String, AppError> {
    let owner = owner.trim();
    if owner.is_empty() {
        return Err(AppError::InvalidOwner("owner cannot be empty".to_string()));
    }
    Ok(owner.to_string())
}
