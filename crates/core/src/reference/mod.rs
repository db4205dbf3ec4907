//! Collision-checked unique reference generation.
//!
//! Produces account numbers, transaction/payment/loan references, card
//! numbers, CVVs, and authorization codes. The format is a short prefix plus
//! a timestamp and random suffix; uniqueness is the contract, so every
//! generated candidate is probed against the backing store and regenerated
//! on collision, a bounded number of times.

use chrono::Utc;
use thiserror::Error;
use uuid::Uuid;

/// Maximum candidates tried before giving up.
const MAX_ATTEMPTS: u32 = 5;

const ALPHANUMERIC: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Errors from reference generation.
#[derive(Debug, Error)]
pub enum ReferenceError {
    /// Every generated candidate collided with an existing reference.
    #[error("could not generate a unique reference after {attempts} attempts")]
    Exhausted {
        /// Number of candidates tried.
        attempts: u32,
    },
}

/// Generates a candidate until `exists` reports it free.
///
/// # Errors
///
/// Returns [`ReferenceError::Exhausted`] after [`MAX_ATTEMPTS`] collisions.
pub fn unique<G, E>(mut generate: G, exists: E) -> Result<String, ReferenceError>
where
    G: FnMut() -> String,
    E: Fn(&str) -> bool,
{
    for _ in 0..MAX_ATTEMPTS {
        let candidate = generate();
        if !exists(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ReferenceError::Exhausted {
        attempts: MAX_ATTEMPTS,
    })
}

/// Stateless generator for every reference format the bank issues.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReferenceGenerator;

impl ReferenceGenerator {
    /// Creates a generator.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Account number: `ACC` + date + 6 random digits.
    #[must_use]
    pub fn account_number(&self) -> String {
        format!(
            "ACC{}{}",
            Utc::now().format("%Y%m%d"),
            random_digits(6)
        )
    }

    /// Transaction reference: `TXN` + timestamp + 6 random digits.
    #[must_use]
    pub fn transaction_reference(&self) -> String {
        format!(
            "TXN{}{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            random_digits(6)
        )
    }

    /// Payment reference: `PAY` + timestamp + 6 random digits.
    #[must_use]
    pub fn payment_reference(&self) -> String {
        format!(
            "PAY{}{}",
            Utc::now().format("%Y%m%d%H%M%S"),
            random_digits(6)
        )
    }

    /// Loan number: `LOAN` + year-month + 8 random digits.
    #[must_use]
    pub fn loan_number(&self) -> String {
        format!("LOAN{}{}", Utc::now().format("%Y%m"), random_digits(8))
    }

    /// 16-digit card number with a Visa-style leading `4`.
    #[must_use]
    pub fn card_number(&self) -> String {
        format!("4{}", random_digits(15))
    }

    /// 3-digit CVV.
    #[must_use]
    pub fn cvv(&self) -> String {
        random_digits(3)
    }

    /// 6-character alphanumeric authorization code.
    #[must_use]
    pub fn authorization_code(&self) -> String {
        random_alphanumeric(6)
    }
}

/// Returns `count` random decimal digits, zero-padded.
fn random_digits(count: u32) -> String {
    let entropy = Uuid::new_v4().as_u128();
    let modulus = 10u128.pow(count);
    format!(
        "{:0width$}",
        entropy % modulus,
        width = count as usize
    )
}

/// Returns `count` random characters from `A-Z0-9`.
fn random_alphanumeric(count: usize) -> String {
    Uuid::new_v4()
        .as_bytes()
        .iter()
        .take(count)
        .map(|b| char::from(ALPHANUMERIC[usize::from(*b) % ALPHANUMERIC.len()]))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_account_number_format() {
        let number = ReferenceGenerator::new().account_number();
        assert!(number.starts_with("ACC"));
        assert_eq!(number.len(), 3 + 8 + 6);
        assert!(number[3..].chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_transaction_reference_format() {
        let reference = ReferenceGenerator::new().transaction_reference();
        assert!(reference.starts_with("TXN"));
        assert_eq!(reference.len(), 3 + 14 + 6);
    }

    #[test]
    fn test_loan_number_format() {
        let number = ReferenceGenerator::new().loan_number();
        assert!(number.starts_with("LOAN"));
        assert_eq!(number.len(), 4 + 6 + 8);
    }

    #[test]
    fn test_card_number_is_16_digits() {
        let number = ReferenceGenerator::new().card_number();
        assert_eq!(number.len(), 16);
        assert!(number.starts_with('4'));
        assert!(number.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_cvv_is_3_digits() {
        let cvv = ReferenceGenerator::new().cvv();
        assert_eq!(cvv.len(), 3);
        assert!(cvv.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn test_authorization_code_charset() {
        let code = ReferenceGenerator::new().authorization_code();
        assert_eq!(code.len(), 6);
        assert!(
            code.chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn test_unique_returns_first_free_candidate() {
        let result = unique(|| "REF-1".to_string(), |_| false).unwrap();
        assert_eq!(result, "REF-1");
    }

    #[test]
    fn test_unique_retries_on_collision() {
        let calls = Cell::new(0u32);
        let result = unique(
            || {
                calls.set(calls.get() + 1);
                format!("REF-{}", calls.get())
            },
            |candidate| candidate == "REF-1" || candidate == "REF-2",
        )
        .unwrap();
        assert_eq!(result, "REF-3");
    }

    #[test]
    fn test_unique_fails_loud_when_exhausted() {
        let result = unique(|| "REF".to_string(), |_| true);
        assert!(matches!(
            result,
            Err(ReferenceError::Exhausted { attempts: 5 })
        ));
    }
}
