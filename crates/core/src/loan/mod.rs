//! Loan amortization, disbursement, and payment application.
//!
//! This module implements the loan engine:
//! - Rate quoting by product and credit-score band
//! - The amortizing-loan payment formula and full schedules
//! - The loan state machine (application through payoff)
//! - Payment application with the interest/principal split

pub mod error;
pub mod schedule;
pub mod service;
pub mod types;

#[cfg(test)]
mod schedule_props;

pub use error::LoanError;
pub use schedule::{
    PaymentSplit, ScheduleEntry, amortization_schedule, monthly_payment, quote_rate,
    split_payment,
};
pub use service::{LoanApplication, LoanService};
pub use types::{Loan, LoanPayment, LoanStatus, LoanType};
