//! Loan lifecycle: application, approval, disbursement, and payment.
//!
//! Pricing and amortization math lives in [`super::schedule`]; this service
//! orchestrates it against the stores. Disbursement and payment application
//! drive the ledger engine's primitives inside one unit of work.

use std::sync::Arc;

use chrono::{Months, NaiveDate, Utc};
use meridian_shared::types::money::{MONEY_SCALE, round_money};
use meridian_shared::types::{AccountId, LoanId, LoanPaymentId, TransactionId, UserId};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::audit::{self, AuditEvent, AuditSeverity, AuditSink};
use crate::reference::{self, ReferenceGenerator};
use crate::store::{Accounts, LoanPayments, Loans, Store, Transactions};
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

use super::error::LoanError;
use super::schedule::{monthly_payment, quote_rate, split_payment};
use super::types::{Loan, LoanPayment, LoanStatus, LoanType};

/// A loan is considered paid off once the balance rounds down to this.
const PAYOFF_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, MONEY_SCALE);

/// Loan application input.
#[derive(Debug, Clone)]
pub struct LoanApplication {
    /// Requested product.
    pub loan_type: LoanType,
    /// Requested principal.
    pub principal: Decimal,
    /// Requested term in months.
    pub term_months: u32,
    /// Applicant's credit score.
    pub credit_score: u16,
    /// Applicant's stated annual income, if provided.
    pub annual_income: Option<Decimal>,
    /// Stated purpose.
    pub purpose: Option<String>,
}

/// Loan lifecycle service.
pub struct LoanService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    references: ReferenceGenerator,
}

impl<S: Store> LoanService<S> {
    /// Creates the service.
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            references: ReferenceGenerator::new(),
        }
    }

    /// Records a loan application with a quoted rate and computed payment.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` / `InvalidTerm` for degenerate input,
    /// `Reference` if no unique loan number could be generated.
    pub fn apply(&self, owner: UserId, application: LoanApplication) -> Result<Loan, LoanError> {
        let principal = round_money(application.principal);
        let rate = quote_rate(application.loan_type, application.credit_score);
        let payment = monthly_payment(principal, rate, application.term_months)?;
        let total_amount = round_money(payment * Decimal::from(application.term_months));

        let debt_to_income_ratio = application
            .annual_income
            .filter(|income| *income > Decimal::ZERO)
            .map(|income| {
                let monthly_income = round_money(income / Decimal::from(12));
                (payment / monthly_income)
                    .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero)
            });

        let loan = self.store.with_tx(|tx| {
            let loan_number = reference::unique(
                || self.references.loan_number(),
                |candidate| tx.loan_number_exists(candidate),
            )?;
            let loan = Loan {
                id: LoanId::new(),
                loan_number,
                owner,
                loan_type: application.loan_type,
                principal,
                interest_rate: rate,
                term_months: application.term_months,
                monthly_payment: payment,
                outstanding_balance: principal,
                total_amount,
                total_interest: total_amount - principal,
                credit_score: application.credit_score,
                purpose: application.purpose.clone(),
                debt_to_income_ratio,
                status: LoanStatus::Applied,
                rejection_reason: None,
                applied_at: Utc::now(),
                approved_at: None,
                disbursed_at: None,
                next_payment_date: None,
                maturity_date: None,
                disbursement_account: None,
            };
            tx.put_loan(loan.clone());
            Ok::<_, LoanError>(loan)
        })?;

        tracing::info!(loan = %loan.loan_number, %rate, "loan application recorded");
        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_APPLICATION", "Loan", loan.id, "LOAN")
                .actor(owner)
                .description(format!("Applied for loan: {}", loan.loan_number)),
        );
        Ok(loan)
    }

    /// Moves an application into review.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the loan is `Applied`.
    pub fn mark_under_review(&self, loan_id: LoanId) -> Result<Loan, LoanError> {
        let loan = self.store.with_tx(|tx| {
            let mut loan = tx.loan(loan_id)?;
            Self::transition(&mut loan, LoanStatus::UnderReview)?;
            tx.put_loan(loan.clone());
            Ok::<_, LoanError>(loan)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_UNDER_REVIEW", "Loan", loan.id, "LOAN")
                .description(format!("Loan under review: {}", loan.loan_number)),
        );
        Ok(loan)
    }

    /// Approves a loan and disburses the principal to an account.
    ///
    /// Credits the principal through the ledger engine, stamps the approval
    /// and disbursement dates, the maturity date, and the first payment
    /// date, and activates the loan, all in one unit of work.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the loan is `Applied` or `UnderReview`.
    pub fn approve(
        &self,
        loan_id: LoanId,
        disbursement_account: AccountId,
    ) -> Result<Loan, LoanError> {
        let loan = self.store.with_tx(|tx| {
            let mut loan = tx.loan(loan_id)?;
            Self::transition(&mut loan, LoanStatus::Approved)?;

            let mut account = tx.account(disbursement_account)?;
            account.ensure_operational()?;
            account.credit(loan.principal)?;

            let reference = reference::unique(
                || self.references.transaction_reference(),
                |candidate| tx.transaction_reference_exists(candidate),
            )?;
            let now = Utc::now();
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference,
                transaction_type: TransactionType::LoanDisbursement,
                amount: loan.principal,
                status: TransactionStatus::Completed,
                from_account: None,
                to_account: Some(account.id),
                running_balance: account.balance,
                description: format!("Disbursement of loan {}", loan.loan_number),
                created_at: now,
                processed_at: Some(now),
            });

            let today = now.date_naive();
            loan.approved_at = Some(now);
            loan.disbursed_at = Some(now);
            loan.disbursement_account = Some(account.id);
            loan.next_payment_date = Some(add_months(today, 1));
            loan.maturity_date = Some(add_months(today, loan.term_months));
            Self::transition(&mut loan, LoanStatus::Active)?;

            tx.put_account(account);
            tx.put_loan(loan.clone());
            Ok::<_, LoanError>(loan)
        })?;

        tracing::info!(loan = %loan.loan_number, "loan approved and disbursed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_APPROVED", "Loan", loan.id, "LOAN")
                .actor(loan.owner)
                .description(format!("Loan approved and disbursed: {}", loan.loan_number)),
        );
        Ok(loan)
    }

    /// Rejects an application, recording the reason. Terminal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the loan is `Applied` or `UnderReview`.
    pub fn reject(&self, loan_id: LoanId, reason: impl Into<String>) -> Result<Loan, LoanError> {
        let reason = reason.into();
        let loan = self.store.with_tx(|tx| {
            let mut loan = tx.loan(loan_id)?;
            Self::transition(&mut loan, LoanStatus::Rejected)?;
            loan.rejection_reason = Some(reason.clone());
            tx.put_loan(loan.clone());
            Ok::<_, LoanError>(loan)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_REJECTED", "Loan", loan.id, "LOAN")
                .description(format!("Loan rejected: {} - {reason}", loan.loan_number)),
        );
        Ok(loan)
    }

    /// Writes off an active loan as defaulted. Terminal.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the loan is `Active`.
    pub fn mark_defaulted(&self, loan_id: LoanId) -> Result<Loan, LoanError> {
        let loan = self.store.with_tx(|tx| {
            let mut loan = tx.loan(loan_id)?;
            Self::transition(&mut loan, LoanStatus::Defaulted)?;
            tx.put_loan(loan.clone());
            Ok::<_, LoanError>(loan)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_DEFAULTED", "Loan", loan.id, "LOAN")
                .severity(AuditSeverity::High)
                .description(format!("Loan defaulted: {}", loan.loan_number)),
        );
        Ok(loan)
    }

    /// Applies a payment to an active loan from a deposit account.
    ///
    /// Splits the amount into interest and principal, debits the paying
    /// account, advances the next payment date one month, and transitions
    /// the loan to `PaidOff` (clamping the balance to zero) once the
    /// remaining balance is within a cent of zero.
    ///
    /// # Errors
    ///
    /// Returns `InvalidState` unless the loan is `Active`,
    /// `InsufficientFunds` unless the account's available balance covers the
    /// amount.
    pub fn make_payment(
        &self,
        loan_id: LoanId,
        payment_account: AccountId,
        amount: Decimal,
    ) -> Result<LoanPayment, LoanError> {
        let amount = round_money(amount);

        let (record, paid_off) = self.store.with_tx(|tx| {
            let mut loan = tx.loan(loan_id)?;
            if loan.status != LoanStatus::Active {
                return Err(LoanError::InvalidState {
                    status: loan.status,
                });
            }
            if amount <= Decimal::ZERO {
                return Err(LoanError::InvalidAmount);
            }

            let mut account = tx.account(payment_account)?;
            if !account.can_cover(amount) {
                return Err(LoanError::InsufficientFunds {
                    available: account.available_balance,
                    requested: amount,
                });
            }

            let split = split_payment(loan.outstanding_balance, loan.interest_rate, amount);
            account.debit(amount)?;

            let reference = reference::unique(
                || self.references.transaction_reference(),
                |candidate| tx.transaction_reference_exists(candidate),
            )?;
            let now = Utc::now();
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference: reference.clone(),
                transaction_type: TransactionType::LoanPayment,
                amount,
                status: TransactionStatus::Completed,
                from_account: Some(account.id),
                to_account: None,
                running_balance: account.balance,
                description: format!("Payment on loan {}", loan.loan_number),
                created_at: now,
                processed_at: Some(now),
            });

            let due_date = loan.next_payment_date;
            let mut remaining = round_money(loan.outstanding_balance - split.principal);
            let paid_off = remaining <= PAYOFF_TOLERANCE;
            if paid_off {
                remaining = Decimal::ZERO;
                Self::transition(&mut loan, LoanStatus::PaidOff)?;
            }
            loan.outstanding_balance = remaining;
            loan.next_payment_date = loan.next_payment_date.map(|date| add_months(date, 1));

            let record = LoanPayment {
                id: LoanPaymentId::new(),
                reference,
                loan: loan.id,
                payment_account: account.id,
                amount,
                principal_portion: split.principal,
                interest_portion: split.interest,
                due_date,
                paid_at: now,
                remaining_balance: remaining,
                status: TransactionStatus::Completed,
            };
            tx.put_account(account);
            tx.put_loan(loan.clone());
            tx.put_loan_payment(record.clone());
            Ok::<_, LoanError>((record, paid_off))
        })?;

        tracing::info!(reference = %record.reference, %amount, paid_off, "loan payment applied");
        audit::emit(
            &*self.audit,
            AuditEvent::new("LOAN_PAYMENT", "LoanPayment", record.id, "LOAN")
                .description(format!("Payment of {amount} on loan")),
        );
        Ok(record)
    }

    /// Loads a loan by id.
    pub fn loan(&self, id: LoanId) -> Result<Loan, LoanError> {
        self.store.with_tx(|tx| tx.loan(id).map_err(Into::into))
    }

    /// Payments applied to a loan, oldest first.
    pub fn payments(&self, id: LoanId) -> Result<Vec<LoanPayment>, LoanError> {
        self.store.with_tx(|tx| Ok(tx.loan_payments_for(id)))
    }

    fn transition(loan: &mut Loan, next: LoanStatus) -> Result<(), LoanError> {
        if !loan.status.can_transition_to(next) {
            return Err(LoanError::InvalidState {
                status: loan.status,
            });
        }
        loan.status = next;
        Ok(())
    }
}

/// Calendar-month addition; saturates at chrono's date range limit, which no
/// real loan term reaches.
fn add_months(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}
