//! Payment processor error types.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::ledger::LedgerError;
use crate::reference::ReferenceError;
use crate::store::StoreError;

/// Errors that can occur while processing payments.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The idempotency key was already used by an earlier submission.
    #[error("Duplicate submission: key '{key}' was already processed")]
    DuplicateSubmission {
        /// The caller-generated key that collided.
        key: String,
    },

    /// Actor does not own the debited account.
    #[error("Actor does not own the source account")]
    NotOwner,

    /// Source and destination are the same account.
    #[error("Cannot transfer to the same account")]
    SameAccount,

    /// Amount exceeds the single-transfer ceiling.
    #[error("Amount {amount} exceeds the single-transfer limit of {limit}")]
    SingleTransferLimitExceeded {
        /// Requested amount.
        amount: Decimal,
        /// Configured ceiling.
        limit: Decimal,
    },

    /// The rolling 24-hour debit ceiling would be breached.
    #[error("Daily transfer limit exceeded: {attempted} over a limit of {limit}")]
    DailyTransferLimitExceeded {
        /// Window total including this payment.
        attempted: Decimal,
        /// Configured ceiling.
        limit: Decimal,
    },

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

impl PaymentError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::DuplicateSubmission { .. } => "DUPLICATE_SUBMISSION",
            Self::NotOwner => "NOT_OWNER",
            Self::SameAccount => "SAME_ACCOUNT",
            Self::SingleTransferLimitExceeded { .. } => "SINGLE_TRANSFER_LIMIT_EXCEEDED",
            Self::DailyTransferLimitExceeded { .. } => "DAILY_TRANSFER_LIMIT_EXCEEDED",
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

impl From<PaymentError> for meridian_shared::AppError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::DuplicateSubmission { .. } => Self::Conflict(err.to_string()),
            PaymentError::NotOwner => Self::Forbidden(err.to_string()),
            PaymentError::SameAccount => Self::Validation(err.to_string()),
            PaymentError::SingleTransferLimitExceeded { .. }
            | PaymentError::DailyTransferLimitExceeded { .. } => {
                Self::LimitExceeded(err.to_string())
            }
            PaymentError::Ledger(inner) => inner.into(),
            PaymentError::Reference(_) => Self::Conflict(err.to_string()),
            PaymentError::Store(StoreError::NotFound { .. }) => Self::NotFound(err.to_string()),
        }
    }
}
