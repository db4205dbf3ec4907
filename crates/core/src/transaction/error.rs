//! Transaction processor error types.

use thiserror::Error;

use crate::ledger::LedgerError;
use crate::reference::ReferenceError;
use crate::store::StoreError;

/// Errors that can occur while processing deposits, withdrawals, and
/// transfers.
#[derive(Debug, Error)]
pub enum TransactionError {
    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Balance invariant or account-state violation.
    #[error(transparent)]
    Ledger(#[from] LedgerError),

    /// Reference generation exhausted its retries.
    #[error(transparent)]
    Reference(#[from] ReferenceError),

    /// Backing store failure.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TransactionError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::SameAccount => "SAME_ACCOUNT",
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

impl From<TransactionError> for meridian_shared::AppError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::SameAccount => Self::Validation(err.to_string()),
            TransactionError::Ledger(inner) => inner.into(),
            TransactionError::Reference(_) => Self::Conflict(err.to_string()),
            TransactionError::Store(StoreError::NotFound { .. }) => {
                Self::NotFound(err.to_string())
            }
        }
    }
}
