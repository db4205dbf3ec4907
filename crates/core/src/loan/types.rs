//! Loan and loan-payment records.

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{AccountId, LoanId, LoanPaymentId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::TransactionStatus;

/// Loan products on offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanType {
    /// Unsecured personal loan.
    Personal,
    /// Home mortgage.
    Home,
    /// Vehicle loan.
    Auto,
    /// Business loan.
    Business,
    /// Education loan.
    Education,
    /// Revolving credit line.
    CreditLine,
}

/// Loan lifecycle.
///
/// `Applied → {UnderReview} → Approved → Active → {PaidOff | Defaulted}`;
/// `Applied`/`UnderReview` may instead terminate in `Rejected`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    /// Application received.
    Applied,
    /// Application being assessed.
    UnderReview,
    /// Approved, funds not yet disbursed.
    Approved,
    /// Disbursed and repaying.
    Active,
    /// Fully repaid. Terminal.
    PaidOff,
    /// Written off after missed payments. Terminal.
    Defaulted,
    /// Application declined. Terminal.
    Rejected,
}

impl LoanStatus {
    /// Returns true if no further transitions are possible.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::PaidOff | Self::Defaulted | Self::Rejected)
    }

    /// Returns true if the status permits transitioning to `next`.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Applied, Self::UnderReview | Self::Approved | Self::Rejected)
                | (Self::UnderReview, Self::Approved | Self::Rejected)
                | (Self::Approved, Self::Active)
                | (Self::Active, Self::PaidOff | Self::Defaulted)
        )
    }
}

impl std::fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Applied => "applied",
            Self::UnderReview => "under_review",
            Self::Approved => "approved",
            Self::Active => "active",
            Self::PaidOff => "paid_off",
            Self::Defaulted => "defaulted",
            Self::Rejected => "rejected",
        };
        write!(f, "{name}")
    }
}

/// An amortizing loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    /// Loan ID.
    pub id: LoanId,
    /// Unique loan number.
    pub loan_number: String,
    /// Borrowing user.
    pub owner: UserId,
    /// Loan product.
    pub loan_type: LoanType,
    /// Principal borrowed.
    pub principal: Decimal,
    /// Annual interest rate (percent, 4 dp).
    pub interest_rate: Decimal,
    /// Term in months.
    pub term_months: u32,
    /// Level monthly payment from the amortization formula.
    pub monthly_payment: Decimal,
    /// Remaining principal; never negative.
    pub outstanding_balance: Decimal,
    /// Total repaid over the full term (`monthly_payment * term`).
    pub total_amount: Decimal,
    /// Interest component of `total_amount`.
    pub total_interest: Decimal,
    /// Borrower credit score at application time.
    pub credit_score: u16,
    /// Stated purpose.
    pub purpose: Option<String>,
    /// Monthly payment over monthly income (4 dp), when income was given.
    pub debt_to_income_ratio: Option<Decimal>,
    /// Loan status.
    pub status: LoanStatus,
    /// Reason recorded when the application was rejected.
    pub rejection_reason: Option<String>,
    /// When the application was received.
    pub applied_at: DateTime<Utc>,
    /// When the loan was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// When the principal was disbursed.
    pub disbursed_at: Option<DateTime<Utc>>,
    /// Next scheduled payment date.
    pub next_payment_date: Option<NaiveDate>,
    /// Date the final payment falls due.
    pub maturity_date: Option<NaiveDate>,
    /// Account the principal was disbursed to.
    pub disbursement_account: Option<AccountId>,
}

/// One application of funds to a loan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPayment {
    /// Loan payment ID.
    pub id: LoanPaymentId,
    /// Unique payment reference.
    pub reference: String,
    /// Loan the payment applies to.
    pub loan: LoanId,
    /// Account the payment was drawn from.
    pub payment_account: AccountId,
    /// Total amount paid.
    pub amount: Decimal,
    /// Portion applied to principal.
    pub principal_portion: Decimal,
    /// Portion applied to interest.
    pub interest_portion: Decimal,
    /// Scheduled due date the payment covered.
    pub due_date: Option<NaiveDate>,
    /// When the payment was made.
    pub paid_at: DateTime<Utc>,
    /// Outstanding balance after application.
    pub remaining_balance: Decimal,
    /// Settlement status.
    pub status: TransactionStatus,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_transitions() {
        assert!(LoanStatus::Applied.can_transition_to(LoanStatus::UnderReview));
        assert!(LoanStatus::Applied.can_transition_to(LoanStatus::Approved));
        assert!(LoanStatus::Applied.can_transition_to(LoanStatus::Rejected));
        assert!(LoanStatus::UnderReview.can_transition_to(LoanStatus::Approved));
        assert!(LoanStatus::UnderReview.can_transition_to(LoanStatus::Rejected));
    }

    #[test]
    fn test_servicing_transitions() {
        assert!(LoanStatus::Approved.can_transition_to(LoanStatus::Active));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::PaidOff));
        assert!(LoanStatus::Active.can_transition_to(LoanStatus::Defaulted));
    }

    #[test]
    fn test_invalid_transitions() {
        assert!(!LoanStatus::Applied.can_transition_to(LoanStatus::Active));
        assert!(!LoanStatus::Rejected.can_transition_to(LoanStatus::Approved));
        assert!(!LoanStatus::PaidOff.can_transition_to(LoanStatus::Active));
        assert!(!LoanStatus::Active.can_transition_to(LoanStatus::Applied));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(LoanStatus::PaidOff.is_terminal());
        assert!(LoanStatus::Defaulted.is_terminal());
        assert!(LoanStatus::Rejected.is_terminal());
        assert!(!LoanStatus::Active.is_terminal());
        assert!(!LoanStatus::Applied.is_terminal());
    }
}
