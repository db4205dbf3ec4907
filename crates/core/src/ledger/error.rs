//! Ledger error types for balance and account-state violations.

use meridian_shared::types::AccountId;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::reference::ReferenceError;
use crate::store::StoreError;

/// Errors that can occur during ledger operations.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// Amount is zero or negative.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Debit would push the balance below the overdraft floor.
    #[error("Insufficient funds: balance {balance}, requested {requested}")]
    InsufficientFunds {
        /// Balance before the debit.
        balance: Decimal,
        /// Requested debit amount.
        requested: Decimal,
    },

    /// Account is frozen.
    #[error("Account {0} is frozen")]
    AccountFrozen(AccountId),

    /// Account has been closed or deactivated.
    #[error("Account {0} is inactive")]
    AccountInactive(AccountId),

    /// Account cannot be closed while it holds a balance.
    #[error("Cannot close account with non-zero balance: {balance}")]
    NonZeroBalance {
        /// Current balance.
        balance: Decimal,
    },

    /// Reference generation exhausted its retries.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LedgerError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::AccountFrozen(_) => "ACCOUNT_FROZEN",
            Self::AccountInactive(_) => "ACCOUNT_INACTIVE",
            Self::NonZeroBalance { .. } => "NON_ZERO_BALANCE",
            Self::Reference(_) => "DUPLICATE_REFERENCE",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Reference(_))
    }
}

impl From<LedgerError> for meridian_shared::AppError {
    fn from(err: LedgerError) -> Self {
        match &err {
            LedgerError::InvalidAmount => Self::Validation(err.to_string()),
            LedgerError::InsufficientFunds { .. }
            | LedgerError::AccountFrozen(_)
            | LedgerError::AccountInactive(_)
            | LedgerError::NonZeroBalance { .. } => Self::BusinessRule(err.to_string()),
            LedgerError::Reference(_) => Self::Conflict(err.to_string()),
            LedgerError::Store(StoreError::NotFound { .. }) => Self::NotFound(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(LedgerError::InvalidAmount.error_code(), "INVALID_AMOUNT");
        assert_eq!(
            LedgerError::InsufficientFunds {
                balance: dec!(50),
                requested: dec!(100),
            }
            .error_code(),
            "INSUFFICIENT_FUNDS"
        );
        assert_eq!(
            LedgerError::AccountFrozen(AccountId::new()).error_code(),
            "ACCOUNT_FROZEN"
        );
    }

    #[test]
    fn test_only_reference_collisions_are_retryable() {
        assert!(
            LedgerError::Reference(ReferenceError::Exhausted { attempts: 5 }).is_retryable()
        );
        assert!(!LedgerError::InvalidAmount.is_retryable());
        assert!(
            !LedgerError::InsufficientFunds {
                balance: dec!(0),
                requested: dec!(1),
            }
            .is_retryable()
        );
    }

    #[test]
    fn test_error_display() {
        let err = LedgerError::InsufficientFunds {
            balance: dec!(50.00),
            requested: dec!(100.00),
        };
        assert_eq!(
            err.to_string(),
            "Insufficient funds: balance 50.00, requested 100.00"
        );
    }
}
