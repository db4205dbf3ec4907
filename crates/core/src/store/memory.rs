//! In-memory arena store.
//!
//! Backs the test suite and embedders that do not need durability. All
//! entity maps live behind one mutex; a unit of work runs against a snapshot
//! clone that is swapped in only when the closure succeeds, so a failed
//! operation leaves no trace and concurrent units of work are serialized.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use meridian_shared::types::{
    AccountId, CardId, CardTransactionId, LoanId, LoanPaymentId, PaymentId, TransactionId,
};

use crate::card::{Card, CardTransaction};
use crate::ledger::Account;
use crate::loan::{Loan, LoanPayment};
use crate::payment::Payment;
use crate::transaction::Transaction;

use super::{
    Accounts, CardTransactions, Cards, IdempotencyKeys, LoanPayments, Loans, Payments, Store,
    StoreError, StoreTx, Transactions,
};

/// The arena of records a unit of work operates on.
#[derive(Debug, Clone, Default)]
pub struct MemoryTx {
    accounts: HashMap<AccountId, Account>,
    account_numbers: HashMap<String, AccountId>,
    transactions: HashMap<TransactionId, Transaction>,
    transaction_references: HashMap<String, TransactionId>,
    payments: HashMap<PaymentId, Payment>,
    payment_references: HashMap<String, PaymentId>,
    loans: HashMap<LoanId, Loan>,
    loan_numbers: HashSet<String>,
    loan_payments: HashMap<LoanPaymentId, LoanPayment>,
    cards: HashMap<CardId, Card>,
    card_numbers: HashMap<String, CardId>,
    card_transactions: HashMap<CardTransactionId, CardTransaction>,
    idempotency_keys: HashSet<String>,
}

impl Accounts for MemoryTx {
    fn account(&self, id: AccountId) -> Result<Account, StoreError> {
        self.accounts
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Account", id))
    }

    fn account_by_number(&self, number: &str) -> Result<Account, StoreError> {
        self.account_numbers
            .get(number)
            .and_then(|id| self.accounts.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Account", number))
    }

    fn account_number_exists(&self, number: &str) -> bool {
        self.account_numbers.contains_key(number)
    }

    fn put_account(&mut self, account: Account) {
        self.account_numbers
            .insert(account.account_number.clone(), account.id);
        self.accounts.insert(account.id, account);
    }
}

impl Transactions for MemoryTx {
    fn transaction_by_reference(&self, reference: &str) -> Result<Transaction, StoreError> {
        self.transaction_references
            .get(reference)
            .and_then(|id| self.transactions.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Transaction", reference))
    }

    fn transaction_reference_exists(&self, reference: &str) -> bool {
        self.transaction_references.contains_key(reference)
    }

    fn transactions_for_account(&self, id: AccountId) -> Vec<Transaction> {
        let mut matching: Vec<Transaction> = self
            .transactions
            .values()
            .filter(|t| t.from_account == Some(id) || t.to_account == Some(id))
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.created_at);
        matching
    }

    fn put_transaction(&mut self, transaction: Transaction) {
        self.transaction_references
            .insert(transaction.reference.clone(), transaction.id);
        self.transactions.insert(transaction.id, transaction);
    }
}

impl Payments for MemoryTx {
    fn payment_by_reference(&self, reference: &str) -> Result<Payment, StoreError> {
        self.payment_references
            .get(reference)
            .and_then(|id| self.payments.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Payment", reference))
    }

    fn payment_reference_exists(&self, reference: &str) -> bool {
        self.payment_references.contains_key(reference)
    }

    fn payments_from_account_since(&self, id: AccountId, since: DateTime<Utc>) -> Vec<Payment> {
        let mut matching: Vec<Payment> = self
            .payments
            .values()
            .filter(|p| p.from_account == id && p.created_at >= since)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.created_at);
        matching
    }

    fn put_payment(&mut self, payment: Payment) {
        self.payment_references
            .insert(payment.reference.clone(), payment.id);
        self.payments.insert(payment.id, payment);
    }
}

impl Loans for MemoryTx {
    fn loan(&self, id: LoanId) -> Result<Loan, StoreError> {
        self.loans
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Loan", id))
    }

    fn loan_number_exists(&self, number: &str) -> bool {
        self.loan_numbers.contains(number)
    }

    fn put_loan(&mut self, loan: Loan) {
        self.loan_numbers.insert(loan.loan_number.clone());
        self.loans.insert(loan.id, loan);
    }
}

impl LoanPayments for MemoryTx {
    fn loan_payments_for(&self, id: LoanId) -> Vec<LoanPayment> {
        let mut matching: Vec<LoanPayment> = self
            .loan_payments
            .values()
            .filter(|p| p.loan == id)
            .cloned()
            .collect();
        matching.sort_by_key(|p| p.paid_at);
        matching
    }

    fn put_loan_payment(&mut self, payment: LoanPayment) {
        self.loan_payments.insert(payment.id, payment);
    }
}

impl Cards for MemoryTx {
    fn card(&self, id: CardId) -> Result<Card, StoreError> {
        self.cards
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::not_found("Card", id))
    }

    fn card_by_number(&self, number: &str) -> Result<Card, StoreError> {
        self.card_numbers
            .get(number)
            .and_then(|id| self.cards.get(id))
            .cloned()
            .ok_or_else(|| StoreError::not_found("Card", number))
    }

    fn card_number_exists(&self, number: &str) -> bool {
        self.card_numbers.contains_key(number)
    }

    fn put_card(&mut self, card: Card) {
        self.card_numbers.insert(card.card_number.clone(), card.id);
        self.cards.insert(card.id, card);
    }
}

impl CardTransactions for MemoryTx {
    fn card_transactions_for(&self, id: CardId) -> Vec<CardTransaction> {
        let mut matching: Vec<CardTransaction> = self
            .card_transactions
            .values()
            .filter(|t| t.card == id)
            .cloned()
            .collect();
        matching.sort_by_key(|t| t.created_at);
        matching
    }

    fn put_card_transaction(&mut self, transaction: CardTransaction) {
        self.card_transactions.insert(transaction.id, transaction);
    }
}

impl IdempotencyKeys for MemoryTx {
    fn claim_idempotency_key(&mut self, key: &str) -> bool {
        self.idempotency_keys.insert(key.to_string())
    }
}

impl StoreTx for MemoryTx {}

/// In-memory store with commit-on-success unit-of-work semantics.
#[derive(Debug, Default)]
pub struct MemoryStore {
    state: Mutex<MemoryTx>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    type Tx = MemoryTx;

    fn with_tx<T, E, F>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self::Tx) -> Result<T, E>,
    {
        let mut state = self.state.lock().expect("memory store poisoned");
        let mut working = state.clone();
        let result = f(&mut working);
        if result.is_ok() {
            *state = working;
        }
        result
    }
}
