//! Deposits, withdrawals, and atomic transfers.
//!
//! Each operation loads the account aggregates, drives the ledger engine's
//! mutation primitives (never mutating balances directly), and writes its
//! transaction records in the same unit of work. A transfer writes two legs
//! that either both persist or neither does.

use std::sync::Arc;

use chrono::Utc;
use meridian_shared::types::money::round_money;
use meridian_shared::types::{AccountId, TransactionId};
use rust_decimal::Decimal;

use crate::audit::{self, AuditEvent, AuditSink};
use crate::reference::{self, ReferenceGenerator};
use crate::store::{Accounts, Store, Transactions};

use super::error::TransactionError;
use super::types::{Transaction, TransactionStatus, TransactionType};

/// Suffix appended to the debit leg of a transfer reference.
const DEBIT_LEG_SUFFIX: &str = "-DEBIT";
/// Suffix appended to the credit leg of a transfer reference.
const CREDIT_LEG_SUFFIX: &str = "-CREDIT";

/// Deposit, withdrawal, and transfer processor.
pub struct TransactionService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    references: ReferenceGenerator,
}

impl<S: Store> TransactionService<S> {
    /// Creates the service.
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            references: ReferenceGenerator::new(),
        }
    }

    /// Deposits `amount` into an account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a non-positive amount, `AccountFrozen` /
    /// `AccountInactive` when the account cannot move money.
    pub fn deposit(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Transaction, TransactionError> {
        let description = description.into();
        let amount = round_money(amount);

        let record = self.store.with_tx(|tx| {
            let mut account = tx.account(account_id)?;
            account.ensure_operational()?;
            account.credit(amount)?;

            let reference = reference::unique(
                || self.references.transaction_reference(),
                |candidate| tx.transaction_reference_exists(candidate),
            )?;
            let record = Transaction {
                id: TransactionId::new(),
                reference,
                transaction_type: TransactionType::Deposit,
                amount,
                status: TransactionStatus::Completed,
                from_account: None,
                to_account: Some(account.id),
                running_balance: account.balance,
                description: description.clone(),
                created_at: Utc::now(),
                processed_at: Some(Utc::now()),
            };
            tx.put_account(account);
            tx.put_transaction(record.clone());
            Ok::<_, TransactionError>(record)
        })?;

        tracing::info!(reference = %record.reference, %amount, "deposit completed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("DEPOSIT", "Transaction", record.id, "TRANSACTION")
                .description(format!("Deposit of {amount}")),
        );
        Ok(record)
    }

    /// Withdraws `amount` from an account, honoring the overdraft floor.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount`, `InsufficientFunds`, `AccountFrozen`, or
    /// `AccountInactive`.
    pub fn withdraw(
        &self,
        account_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Transaction, TransactionError> {
        let description = description.into();
        let amount = round_money(amount);

        let record = self.store.with_tx(|tx| {
            let mut account = tx.account(account_id)?;
            account.ensure_operational()?;
            account.debit(amount)?;

            let reference = reference::unique(
                || self.references.transaction_reference(),
                |candidate| tx.transaction_reference_exists(candidate),
            )?;
            let record = Transaction {
                id: TransactionId::new(),
                reference,
                transaction_type: TransactionType::Withdrawal,
                amount,
                status: TransactionStatus::Completed,
                from_account: Some(account.id),
                to_account: None,
                running_balance: account.balance,
                description: description.clone(),
                created_at: Utc::now(),
                processed_at: Some(Utc::now()),
            };
            tx.put_account(account);
            tx.put_transaction(record.clone());
            Ok::<_, TransactionError>(record)
        })?;

        tracing::info!(reference = %record.reference, %amount, "withdrawal completed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("WITHDRAWAL", "Transaction", record.id, "TRANSACTION")
                .description(format!("Withdrawal of {amount}")),
        );
        Ok(record)
    }

    /// Transfers `amount` between two accounts.
    ///
    /// Writes two transaction legs sharing a reference prefix. Both legs and
    /// both balance changes commit atomically; on any failure neither leg is
    /// persisted and neither balance moves.
    ///
    /// # Errors
    ///
    /// Returns `SameAccount` if the accounts are identical, plus every error
    /// `withdraw`/`deposit` can produce.
    pub fn transfer(
        &self,
        from_id: AccountId,
        to_id: AccountId,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<(Transaction, Transaction), TransactionError> {
        if from_id == to_id {
            return Err(TransactionError::SameAccount);
        }
        let description = description.into();
        let amount = round_money(amount);

        let (debit_leg, credit_leg) = self.store.with_tx(|tx| {
            let mut from = tx.account(from_id)?;
            let mut to = tx.account(to_id)?;
            from.ensure_operational()?;
            to.ensure_operational()?;

            from.debit(amount)?;
            to.credit(amount)?;

            let base = reference::unique(
                || self.references.transaction_reference(),
                |candidate| {
                    tx.transaction_reference_exists(&format!("{candidate}{DEBIT_LEG_SUFFIX}"))
                        || tx.transaction_reference_exists(&format!(
                            "{candidate}{CREDIT_LEG_SUFFIX}"
                        ))
                },
            )?;
            let now = Utc::now();

            let debit_leg = Transaction {
                id: TransactionId::new(),
                reference: format!("{base}{DEBIT_LEG_SUFFIX}"),
                transaction_type: TransactionType::Transfer,
                amount,
                status: TransactionStatus::Completed,
                from_account: Some(from.id),
                to_account: Some(to.id),
                running_balance: from.balance,
                description: format!("Transfer to {} - {description}", to.account_number),
                created_at: now,
                processed_at: Some(now),
            };
            let credit_leg = Transaction {
                id: TransactionId::new(),
                reference: format!("{base}{CREDIT_LEG_SUFFIX}"),
                transaction_type: TransactionType::Transfer,
                amount,
                status: TransactionStatus::Completed,
                from_account: Some(from.id),
                to_account: Some(to.id),
                running_balance: to.balance,
                description: format!("Transfer from {} - {description}", from.account_number),
                created_at: now,
                processed_at: Some(now),
            };

            tx.put_account(from);
            tx.put_account(to);
            tx.put_transaction(debit_leg.clone());
            tx.put_transaction(credit_leg.clone());
            Ok::<_, TransactionError>((debit_leg, credit_leg))
        })?;

        tracing::info!(reference = %debit_leg.reference, %amount, "transfer completed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("TRANSFER_OUT", "Transaction", debit_leg.id, "TRANSACTION")
                .description(format!("Transfer of {amount}")),
        );
        audit::emit(
            &*self.audit,
            AuditEvent::new("TRANSFER_IN", "Transaction", credit_leg.id, "TRANSACTION")
                .description(format!("Transfer of {amount}")),
        );
        Ok((debit_leg, credit_leg))
    }

    /// Transaction history for an account, oldest first.
    pub fn history(&self, account_id: AccountId) -> Result<Vec<Transaction>, TransactionError> {
        self.store
            .with_tx(|tx| Ok(tx.transactions_for_account(account_id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::ledger::{AccountType, LedgerError, LedgerService};
    use crate::store::MemoryStore;
    use meridian_shared::types::UserId;
    use rust_decimal_macros::dec;

    struct Fixture {
        transactions: TransactionService<Arc<MemoryStore>>,
        ledger: LedgerService<Arc<MemoryStore>>,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(MemorySink::new());
        Fixture {
            transactions: TransactionService::new(store.clone(), sink.clone()),
            ledger: LedgerService::new(store, sink),
        }
    }

    #[test]
    fn test_deposit_records_running_balance() {
        let fx = fixture();
        let account = fx
            .ledger
            .open_account(UserId::new(), AccountType::Checking, dec!(100), dec!(0))
            .unwrap();

        let record = fx
            .transactions
            .deposit(account.id, dec!(49.999), "salary")
            .unwrap();

        // Amount is rounded half-up to 2 dp before the ledger sees it.
        assert_eq!(record.amount, dec!(50.00));
        assert_eq!(record.running_balance, dec!(150.00));
        assert_eq!(record.status, TransactionStatus::Completed);
        assert_eq!(fx.ledger.account(account.id).unwrap().balance, dec!(150.00));
    }

    #[test]
    fn test_withdraw_honors_overdraft_floor() {
        let fx = fixture();
        // Checking: minimum balance 100, no overdraft -> floor is -100.
        let account = fx
            .ledger
            .open_account(UserId::new(), AccountType::Checking, dec!(1000), dec!(0))
            .unwrap();

        let record = fx
            .transactions
            .withdraw(account.id, dec!(950), "rent")
            .unwrap();
        assert_eq!(record.running_balance, dec!(50.00));

        // 50 - 151 = -101 breaches the -100 floor.
        let result = fx.transactions.withdraw(account.id, dec!(151), "too much");
        assert!(matches!(
            result,
            Err(TransactionError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
        assert_eq!(fx.ledger.account(account.id).unwrap().balance, dec!(50.00));
    }

    #[test]
    fn test_frozen_account_rejects_movement() {
        let fx = fixture();
        let account = fx
            .ledger
            .open_account(UserId::new(), AccountType::Checking, dec!(100), dec!(0))
            .unwrap();
        fx.ledger.freeze_account(account.id).unwrap();

        assert!(matches!(
            fx.transactions.deposit(account.id, dec!(10), ""),
            Err(TransactionError::Ledger(LedgerError::AccountFrozen(_)))
        ));
        assert!(matches!(
            fx.transactions.withdraw(account.id, dec!(10), ""),
            Err(TransactionError::Ledger(LedgerError::AccountFrozen(_)))
        ));
    }

    #[test]
    fn test_transfer_writes_correlated_legs() {
        let fx = fixture();
        let from = fx
            .ledger
            .open_account(UserId::new(), AccountType::Checking, dec!(500), dec!(0))
            .unwrap();
        let to = fx
            .ledger
            .open_account(UserId::new(), AccountType::Savings, dec!(500), dec!(0))
            .unwrap();

        let (debit_leg, credit_leg) = fx
            .transactions
            .transfer(from.id, to.id, dec!(200), "rent share")
            .unwrap();

        assert!(debit_leg.reference.ends_with("-DEBIT"));
        assert!(credit_leg.reference.ends_with("-CREDIT"));
        let debit_prefix = debit_leg.reference.trim_end_matches("-DEBIT");
        let credit_prefix = credit_leg.reference.trim_end_matches("-CREDIT");
        assert_eq!(debit_prefix, credit_prefix);

        assert_eq!(debit_leg.running_balance, dec!(300.00));
        assert_eq!(credit_leg.running_balance, dec!(700.00));
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(300.00));
        assert_eq!(fx.ledger.account(to.id).unwrap().balance, dec!(700.00));
    }

    #[test]
    fn test_transfer_to_same_account_rejected() {
        let fx = fixture();
        let account = fx
            .ledger
            .open_account(UserId::new(), AccountType::Checking, dec!(500), dec!(0))
            .unwrap();

        assert!(matches!(
            fx.transactions.transfer(account.id, account.id, dec!(10), ""),
            Err(TransactionError::SameAccount)
        ));
    }

    #[test]
    fn test_failed_transfer_is_all_or_nothing() {
        let fx = fixture();
        let from = fx
            .ledger
            .open_account(UserId::new(), AccountType::Investment, dec!(500), dec!(0))
            .unwrap();
        let to = fx
            .ledger
            .open_account(UserId::new(), AccountType::Investment, dec!(0), dec!(0))
            .unwrap();

        // Investment accounts have a zero minimum balance and no overdraft,
        // so 600 cannot leave an account holding 500.
        let result = fx.transactions.transfer(from.id, to.id, dec!(600), "");
        assert!(matches!(
            result,
            Err(TransactionError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));

        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(500.00));
        assert_eq!(fx.ledger.account(to.id).unwrap().balance, dec!(0.00));
        assert!(fx.transactions.history(from.id).unwrap().is_empty());
        assert!(fx.transactions.history(to.id).unwrap().is_empty());
    }
}
