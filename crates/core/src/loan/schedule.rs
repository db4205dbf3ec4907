//! Loan pricing and amortization math.
//!
//! Pure calculations with no store access: rate quoting, the level monthly
//! payment, the interest/principal split, and the full schedule.

use meridian_shared::types::money::{monthly_rate, round_money, round_rate};
use rust_decimal::Decimal;

use super::error::LoanError;
use super::types::LoanType;

/// Interest and principal portions of one payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentSplit {
    /// Portion covering this period's interest.
    pub interest: Decimal,
    /// Portion retiring principal.
    pub principal: Decimal,
}

/// One row of an amortization schedule.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduleEntry {
    /// Period number, 1-based.
    pub period: u32,
    /// Payment due this period. The final period is adjusted to clear the
    /// balance exactly.
    pub payment: Decimal,
    /// Interest portion.
    pub interest: Decimal,
    /// Principal portion.
    pub principal: Decimal,
    /// Outstanding balance after this payment.
    pub remaining: Decimal,
}

/// Quotes the annual rate (percent) for a loan type and credit score.
///
/// Base rates per product, adjusted by credit-score band, evaluated
/// high-to-low: `>= 750` takes 1.00 point off, `>= 700` takes 0.50 off,
/// `< 600` adds 2.00, `< 650` adds 1.00.
#[must_use]
pub fn quote_rate(loan_type: LoanType, credit_score: u16) -> Decimal {
    let base = match loan_type {
        LoanType::Personal => Decimal::new(850, 2),
        LoanType::Home => Decimal::new(350, 2),
        LoanType::Auto => Decimal::new(500, 2),
        LoanType::Business => Decimal::new(700, 2),
        LoanType::Education => Decimal::new(450, 2),
        LoanType::CreditLine => Decimal::new(900, 2),
    };

    let adjusted = if credit_score >= 750 {
        base - Decimal::ONE
    } else if credit_score >= 700 {
        base - Decimal::new(50, 2)
    } else if credit_score < 600 {
        base + Decimal::TWO
    } else if credit_score < 650 {
        base + Decimal::ONE
    } else {
        base
    };

    round_rate(adjusted)
}

/// Computes the level monthly payment for an amortizing loan.
///
/// `P = L * r * (1+r)^n / ((1+r)^n - 1)` with `r` the monthly rate from the
/// annual percent (`rate / 1200`, 6 dp). A zero rate degrades to straight
/// division. Half-up to 2 dp.
///
/// # Errors
///
/// Returns `InvalidAmount` for a non-positive principal, `InvalidTerm` for a
/// zero term.
pub fn monthly_payment(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Decimal, LoanError> {
    if principal <= Decimal::ZERO {
        return Err(LoanError::InvalidAmount);
    }
    if term_months == 0 {
        return Err(LoanError::InvalidTerm);
    }

    let rate = monthly_rate(annual_rate_percent);
    if rate == Decimal::ZERO {
        return Ok(round_money(principal / Decimal::from(term_months)));
    }

    let factor = compound_factor(rate, term_months);
    let payment = principal * rate * factor / (factor - Decimal::ONE);
    Ok(round_money(payment))
}

/// Splits a payment into this period's interest and the principal remainder.
///
/// Interest is `outstanding * monthly rate`, half-up to 2 dp. If the payment
/// does not cover the interest, the whole payment is reclassified as
/// interest and no principal retires.
#[must_use]
pub fn split_payment(
    outstanding: Decimal,
    annual_rate_percent: Decimal,
    amount: Decimal,
) -> PaymentSplit {
    let interest = round_money(outstanding * monthly_rate(annual_rate_percent));
    let principal = amount - interest;
    if principal < Decimal::ZERO {
        return PaymentSplit {
            interest: amount,
            principal: Decimal::ZERO,
        };
    }
    PaymentSplit {
        interest,
        principal,
    }
}

/// Builds the full amortization schedule.
///
/// Every period pays the level payment except the last, which is adjusted so
/// the remaining balance lands exactly on zero.
///
/// # Errors
///
/// Same as [`monthly_payment`].
pub fn amortization_schedule(
    principal: Decimal,
    annual_rate_percent: Decimal,
    term_months: u32,
) -> Result<Vec<ScheduleEntry>, LoanError> {
    let payment = monthly_payment(principal, annual_rate_percent, term_months)?;
    let mut remaining = round_money(principal);
    let mut entries = Vec::with_capacity(term_months as usize);

    for period in 1..=term_months {
        let split = split_payment(remaining, annual_rate_percent, payment);
        let (paid, principal_portion) = if period == term_months || split.principal >= remaining {
            (round_money(remaining + split.interest), remaining)
        } else {
            (payment, split.principal)
        };
        remaining = round_money(remaining - principal_portion);
        entries.push(ScheduleEntry {
            period,
            payment: paid,
            interest: split.interest,
            principal: principal_portion,
            remaining,
        });
        if remaining == Decimal::ZERO && period < term_months {
            break;
        }
    }

    Ok(entries)
}

/// `(1 + rate)^periods` by iterated multiplication, bounded at 12 dp per
/// step to keep the scale in range.
fn compound_factor(rate: Decimal, periods: u32) -> Decimal {
    let base = Decimal::ONE + rate;
    let mut factor = Decimal::ONE;
    for _ in 0..periods {
        factor = (factor * base).round_dp(12);
    }
    factor
}
