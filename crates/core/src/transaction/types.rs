//! Ledger transaction records.

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, TransactionId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of ledger movement a transaction records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    /// Funds deposited into an account.
    Deposit,
    /// Funds withdrawn from an account.
    Withdrawal,
    /// One leg of an account-to-account transfer.
    Transfer,
    /// Bill payment debit.
    BillPayment,
    /// Loan repayment debit.
    LoanPayment,
    /// Loan principal disbursement credit.
    LoanDisbursement,
    /// Card purchase debit.
    CardPayment,
    /// Fee charge.
    Fee,
    /// Interest credit.
    Interest,
}

/// Lifecycle of a transaction record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    /// Created but not yet settled.
    Pending,
    /// Settled; the record is immutable from here.
    Completed,
    /// Aborted; the record is immutable from here.
    Failed,
}

impl TransactionStatus {
    /// Returns true if the status permits transitioning to `next`.
    ///
    /// A completed or failed transaction never changes again; a pending one
    /// may settle either way.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Completed | Self::Failed)
        )
    }
}

/// Immutable record of one ledger movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Transaction ID.
    pub id: TransactionId,
    /// Unique transaction reference.
    pub reference: String,
    /// Movement kind.
    pub transaction_type: TransactionType,
    /// Amount moved (always positive).
    pub amount: Decimal,
    /// Record status.
    pub status: TransactionStatus,
    /// Debited account, when one exists.
    pub from_account: Option<AccountId>,
    /// Credited account, when one exists.
    pub to_account: Option<AccountId>,
    /// Snapshot of the mutated account's balance after this movement.
    pub running_balance: Decimal,
    /// Human-readable description.
    pub description: String,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record settled.
    pub processed_at: Option<DateTime<Utc>>,
}
