//! Payment intents: transfers and bill payments.
//!
//! A `Payment` is the customer-facing intent, distinct from the raw ledger
//! `Transaction`s it causes. One payment may cause one or more transactions.

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, PaymentId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Kind of payment intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentType {
    /// Transfer between two accounts held at this bank.
    InternalTransfer,
    /// Transfer to an account at another bank.
    ExternalTransfer,
    /// Bill payment to a registered biller.
    BillPayment,
    /// Loan repayment.
    LoanPayment,
    /// Card settlement.
    CardPayment,
}

/// Lifecycle of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Accepted but not yet debited.
    Pending,
    /// Debited locally; awaiting the counterpart bank.
    Processing,
    /// Fully settled.
    Completed,
    /// Aborted.
    Failed,
}

/// Counterpart details for an external transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalBankDetails {
    /// Receiving bank code.
    pub bank_code: String,
    /// Receiving account number at the external bank.
    pub account_number: String,
    /// Name of the beneficiary.
    pub beneficiary_name: String,
}

/// Biller details for a bill payment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillDetails {
    /// Registered biller code.
    pub biller_code: String,
    /// Biller display name.
    pub biller_name: String,
    /// Customer reference at the biller.
    pub customer_reference: String,
}

/// A transfer or bill-payment intent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Payment ID.
    pub id: PaymentId,
    /// Unique payment reference.
    pub reference: String,
    /// Payment kind.
    pub payment_type: PaymentType,
    /// Principal amount (excludes the fee).
    pub amount: Decimal,
    /// Flat fee charged on top of the amount.
    pub fee: Decimal,
    /// Payment status.
    pub status: PaymentStatus,
    /// Debited account.
    pub from_account: AccountId,
    /// Credited account, for internal transfers.
    pub to_account: Option<AccountId>,
    /// External counterpart, for external transfers.
    pub external: Option<ExternalBankDetails>,
    /// Biller details, for bill payments.
    pub bill: Option<BillDetails>,
    /// Human-readable description.
    pub description: String,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
    /// When the payment was processed locally.
    pub processed_at: Option<DateTime<Utc>>,
}

impl Payment {
    /// Total debited from the source account: amount plus fee.
    #[must_use]
    pub fn total_debit(&self) -> Decimal {
        self.amount + self.fee
    }
}

/// Caller-generated key that makes a payment submission idempotent.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IdempotencyKey(String);

impl IdempotencyKey {
    /// Wraps a caller-generated key.
    #[must_use]
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the key as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IdempotencyKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
