//! Loan engine error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::reference::ReferenceError;
use crate::store::StoreError;

use super::types::LoanStatus;

/// Errors that can occur during loan operations.
#[derive(Debug, Error)]
pub enum LoanError {
    /// Amount is zero or negative.
    #[error("Amount must be greater than zero")]
    InvalidAmount,

    /// Term must be at least one month.
    #[error("Loan term must be at least one month")]
    InvalidTerm,

    /// Loan is not in a state permitting the operation.
    #[error("Loan cannot be modified in status {status}")]
    InvalidState {
        /// The loan's current status.
        status: LoanStatus,
    },

    /// Paying account cannot cover the payment.
    #[error("Insufficient funds for loan payment: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Available balance of the paying account.
        available: Decimal,
        /// Requested payment amount.
        requested: Decimal,
    },

    /// Balance invariant or account-state violation on the linked account.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reference generation exhausted its retries.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl LoanError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidAmount => "INVALID_AMOUNT",
            Self::InvalidTerm => "INVALID_TERM",
            Self::InvalidState { .. } => "INVALID_LOAN_STATE",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::Ledger(err) => err.error_code(),
            Self::Reference(_) => "DUPLICATE_REFERENCE",
            Self::Store(_) => "STORE_ERROR",
        }
    }

    /// Returns true if retrying the same call may succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Reference(_)) || matches!(self, Self::Ledger(e) if e.is_retryable())
    }
}

impl From<LoanError> for meridian_shared::AppError {
    fn from(err: LoanError) -> Self {
        match err {
            LoanError::InvalidAmount | LoanError::InvalidTerm => Self::Validation(err.to_string()),
            LoanError::InvalidState { .. } | LoanError::InsufficientFunds { .. } => {
                Self::BusinessRule(err.to_string())
            }
            LoanError::Ledger(inner) => inner.into(),
            LoanError::Reference(_) => Self::Conflict(err.to_string()),
            LoanError::Store(StoreError::NotFound { .. }) => Self::NotFound(err.to_string()),
        }
    }
}
