//! Persistence contracts.
//!
//! Every entity is stored by id in its own store and referenced by typed id,
//! never embedded. The engines never talk to a database directly; they run
//! against these traits inside a single atomic unit of work obtained from
//! [`Store::with_tx`]. Real backends are supplied by embedders; the
//! in-memory [`MemoryStore`] backs the test suite.

pub mod memory;

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, CardId, LoanId};
use thiserror::Error;

use crate::card::{Card, CardTransaction};
use crate::ledger::Account;
use crate::loan::{Loan, LoanPayment};
use crate::payment::Payment;
use crate::transaction::Transaction;

pub use memory::MemoryStore;

/// Errors surfaced by a backing store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No entity with the given key.
    #[error("{entity} not found: {key}")]
    NotFound {
        /// Entity type name.
        entity: &'static str,
        /// The id or reference that missed.
        key: String,
    },
}

impl StoreError {
    /// Convenience constructor for a missing entity.
    #[must_use]
    pub fn not_found(entity: &'static str, key: impl ToString) -> Self {
        Self::NotFound {
            entity,
            key: key.to_string(),
        }
    }
}

/// Account storage.
pub trait Accounts {
    /// Loads an account by id.
    fn account(&self, id: AccountId) -> Result<Account, StoreError>;
    /// Loads an account by its unique account number.
    fn account_by_number(&self, number: &str) -> Result<Account, StoreError>;
    /// Returns true if an account number is already taken.
    fn account_number_exists(&self, number: &str) -> bool;
    /// Inserts or replaces an account.
    fn put_account(&mut self, account: Account);
}

/// Ledger transaction storage.
pub trait Transactions {
    /// Loads a transaction by its unique reference.
    fn transaction_by_reference(&self, reference: &str) -> Result<Transaction, StoreError>;
    /// Returns true if a transaction reference is already taken.
    fn transaction_reference_exists(&self, reference: &str) -> bool;
    /// All transactions touching an account, oldest first.
    fn transactions_for_account(&self, id: AccountId) -> Vec<Transaction>;
    /// Appends a transaction record.
    fn put_transaction(&mut self, transaction: Transaction);
}

/// Payment storage.
pub trait Payments {
    /// Loads a payment by its unique reference.
    fn payment_by_reference(&self, reference: &str) -> Result<Payment, StoreError>;
    /// Returns true if a payment reference is already taken.
    fn payment_reference_exists(&self, reference: &str) -> bool;
    /// Payments debited from an account at or after `since`, oldest first.
    fn payments_from_account_since(&self, id: AccountId, since: DateTime<Utc>) -> Vec<Payment>;
    /// Inserts or replaces a payment.
    fn put_payment(&mut self, payment: Payment);
}

/// Loan storage.
pub trait Loans {
    /// Loads a loan by id.
    fn loan(&self, id: LoanId) -> Result<Loan, StoreError>;
    /// Returns true if a loan number is already taken.
    fn loan_number_exists(&self, number: &str) -> bool;
    /// Inserts or replaces a loan.
    fn put_loan(&mut self, loan: Loan);
}

/// Loan payment storage.
pub trait LoanPayments {
    /// Payments applied to a loan, oldest first.
    fn loan_payments_for(&self, id: LoanId) -> Vec<LoanPayment>;
    /// Appends a loan payment record.
    fn put_loan_payment(&mut self, payment: LoanPayment);
}

/// Card storage.
pub trait Cards {
    /// Loads a card by id.
    fn card(&self, id: CardId) -> Result<Card, StoreError>;
    /// Loads a card by its card number.
    fn card_by_number(&self, number: &str) -> Result<Card, StoreError>;
    /// Returns true if a card number is already taken.
    fn card_number_exists(&self, number: &str) -> bool;
    /// Inserts or replaces a card.
    fn put_card(&mut self, card: Card);
}

/// Card transaction storage.
pub trait CardTransactions {
    /// Authorizations made with a card, oldest first.
    fn card_transactions_for(&self, id: CardId) -> Vec<CardTransaction>;
    /// Appends a card transaction record.
    fn put_card_transaction(&mut self, transaction: CardTransaction);
}

/// Idempotency key storage.
pub trait IdempotencyKeys {
    /// Claims a caller-generated key. Returns false if it was already
    /// claimed, in which case the submission is a duplicate.
    fn claim_idempotency_key(&mut self, key: &str) -> bool;
}

/// Everything a unit of work can touch.
pub trait StoreTx:
    Accounts
    + Transactions
    + Payments
    + Loans
    + LoanPayments
    + Cards
    + CardTransactions
    + IdempotencyKeys
{
}

/// Atomic unit-of-work entry point.
///
/// The closure sees a transactional view of every store. If it returns
/// `Ok`, every mutation it made becomes visible atomically; if it returns
/// `Err`, nothing it did is persisted. Concurrent units of work on the same
/// store are serialized, so two debits racing on one account cannot both
/// pass the sufficiency check.
pub trait Store {
    /// Transactional view type.
    type Tx: StoreTx;

    /// Runs `f` as one atomic unit of work.
    ///
    /// # Errors
    ///
    /// Propagates the closure's error; on error nothing is persisted.
    fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>;
}

impl<S: Store> Store for std::sync::Arc<S> {
    type Tx = S::Tx;

    fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
    {
        S::with_tx(self, f)
    }
}
