//! Card engine error types.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::auth::PinError;
use crate::ledger::LedgerError;
use crate::reference::ReferenceError;
use crate::store::StoreError;

use super::types::CardStatus;

/// Errors that can occur during card operations.
#[derive(Debug, Error)]
pub enum CardError {
    /// Card is not in a state permitting the operation.
    #[error("Card is not usable in status {status}")]
    InvalidState {
        /// The card's current status.
        status: CardStatus,
    },

    /// Card has passed its expiry date.
    #[error("Card expired on {expired_on}")]
    Expired {
        /// The expiry date.
        expired_on: NaiveDate,
    },

    /// PIN mismatch.
    #[error("Invalid PIN")]
    InvalidCredential,

    /// Amount exceeds the card's daily limit.
    #[error("Amount {amount} exceeds the daily limit of {limit}")]
    LimitExceeded {
        /// Requested amount.
        amount: Decimal,
        /// The card's daily limit.
        limit: Decimal,
    },

    /// Linked account's available balance cannot cover the amount.
    #[error("Insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        /// Available balance.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    /// Credit line cannot cover the amount.
    #[error("Insufficient credit: available {available}, requested {requested}")]
    InsufficientCredit {
        /// Remaining credit.
        available: Decimal,
        /// Requested amount.
        requested: Decimal,
    },

    /// A credit card was requested without a credit limit.
    #[error("Credit cards require a credit limit")]
    CreditLimitRequired,

    /// Actor does not own the linked account.
    #[error("Actor does not own the linked account")]
    NotOwner,

    /// PIN hashing failure.
    #[error(transparent)]
    Pin(#[from] PinError),

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

impl CardError {
    /// Returns the error code for API responses.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidState { .. } => "INVALID_CARD_STATE",
            Self::Expired { .. } => "CARD_EXPIRED",
            Self::InvalidCredential => "INVALID_CREDENTIAL",
            Self::LimitExceeded { .. } => "DAILY_LIMIT_EXCEEDED",
            Self::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            Self::InsufficientCredit { .. } => "INSUFFICIENT_CREDIT",
            Self::CreditLimitRequired => "CREDIT_LIMIT_REQUIRED",
            Self::NotOwner => "NOT_OWNER",
            Self::Pin(_) => "PIN_ERROR",
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

impl From<CardError> for meridian_shared::AppError {
    fn from(err: CardError) -> Self {
        match err {
            CardError::InvalidState { .. }
            | CardError::Expired { .. }
            | CardError::InsufficientFunds { .. }
            | CardError::InsufficientCredit { .. } => Self::BusinessRule(err.to_string()),
            CardError::InvalidCredential => Self::Unauthorized(err.to_string()),
            CardError::LimitExceeded { .. } => Self::LimitExceeded(err.to_string()),
            CardError::CreditLimitRequired => Self::Validation(err.to_string()),
            CardError::NotOwner => Self::Forbidden(err.to_string()),
            CardError::Pin(_) => Self::Internal(err.to_string()),
            CardError::Ledger(inner) => inner.into(),
            CardError::Reference(_) => Self::Conflict(err.to_string()),
            CardError::Store(StoreError::NotFound { .. }) => Self::NotFound(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CardError::InvalidState {
                status: CardStatus::Blocked,
            }
            .error_code(),
            "INVALID_CARD_STATE"
        );
        assert_eq!(
            CardError::InsufficientCredit {
                available: dec!(100),
                requested: dec!(150),
            }
            .error_code(),
            "INSUFFICIENT_CREDIT"
        );
        assert_eq!(CardError::InvalidCredential.error_code(), "INVALID_CREDENTIAL");
    }

    #[test]
    fn test_expired_message() {
        let err = CardError::Expired {
            expired_on: NaiveDate::from_ymd_opt(2025, 12, 31).unwrap(),
        };
        assert_eq!(err.to_string(), "Card expired on 2025-12-31");
    }
}
