//! Fee-bearing transfers and bill payments.
//!
//! Wraps the ledger engine's movement primitives with the checks the raw
//! transaction processor does not make: actor ownership, active/not-frozen
//! state, flat fees, the single-transfer ceiling, the rolling 24-hour debit
//! ceiling, and idempotency. Every check runs before any balance moves, and
//! the idempotency key is claimed inside the same unit of work so a failed
//! attempt releases it.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use meridian_shared::config::{BankConfig, FeeConfig, LimitConfig};
use meridian_shared::types::money::round_money;
use meridian_shared::types::{PaymentId, TransactionId, UserId};
use rust_decimal::Decimal;

use crate::audit::{self, AuditEvent, AuditSink};
use crate::auth::Ownership;
use crate::ledger::LedgerError;
use crate::reference::{self, ReferenceGenerator};
use crate::store::{Accounts, IdempotencyKeys, Payments, Store, Transactions};
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

use super::error::PaymentError;
use super::types::{
    BillDetails, ExternalBankDetails, IdempotencyKey, Payment, PaymentStatus, PaymentType,
};

/// Transfer and bill-payment processor.
pub struct PaymentService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    ownership: Arc<dyn Ownership>,
    references: ReferenceGenerator,
    fees: FeeConfig,
    limits: LimitConfig,
}

impl<S: Store> PaymentService<S> {
    /// Creates the service with the bank's fee and limit configuration.
    pub fn new(
        store: S,
        audit: Arc<dyn AuditSink>,
        ownership: Arc<dyn Ownership>,
        config: &BankConfig,
    ) -> Self {
        Self {
            store,
            audit,
            ownership,
            references: ReferenceGenerator::new(),
            fees: config.fees.clone(),
            limits: config.limits.clone(),
        }
    }

    /// Transfers between two accounts held at this bank.
    ///
    /// Settles synchronously as `Completed` and writes two correlated ledger
    /// legs plus the payment record, all in one unit of work.
    ///
    /// # Errors
    ///
    /// `DuplicateSubmission`, `NotOwner`, `SameAccount`, limit errors, and
    /// every ledger error.
    pub fn internal_transfer(
        &self,
        actor: UserId,
        key: &IdempotencyKey,
        from_number: &str,
        to_number: &str,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Payment, PaymentError> {
        let description = description.into();
        let amount = round_money(amount);
        let fee = self.fees.internal_transfer;

        let payment = self.store.with_tx(|tx| {
            Self::claim_key(tx, key)?;
            let mut from = tx.account_by_number(from_number)?;
            let mut to = tx.account_by_number(to_number)?;
            if from.id == to.id {
                return Err(PaymentError::SameAccount);
            }
            self.check_actor_and_state(actor, &from)?;
            self.check_amount(amount)?;
            self.check_daily_window(tx, &from, amount, Utc::now())?;

            from.debit(amount + fee)?;
            to.credit(amount)?;

            let base = self.unique_transaction_base(tx)?;
            let now = Utc::now();
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference: format!("{base}-DEBIT"),
                transaction_type: TransactionType::Transfer,
                amount: amount + fee,
                status: TransactionStatus::Completed,
                from_account: Some(from.id),
                to_account: Some(to.id),
                running_balance: from.balance,
                description: format!("Transfer to {} - {description}", to.account_number),
                created_at: now,
                processed_at: Some(now),
            });
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference: format!("{base}-CREDIT"),
                transaction_type: TransactionType::Transfer,
                amount,
                status: TransactionStatus::Completed,
                from_account: Some(from.id),
                to_account: Some(to.id),
                running_balance: to.balance,
                description: format!("Transfer from {} - {description}", from.account_number),
                created_at: now,
                processed_at: Some(now),
            });

            let reference = reference::unique(
                || self.references.payment_reference(),
                |candidate| tx.payment_reference_exists(candidate),
            )?;
            let payment = Payment {
                id: PaymentId::new(),
                reference,
                payment_type: PaymentType::InternalTransfer,
                amount,
                fee,
                status: PaymentStatus::Completed,
                from_account: from.id,
                to_account: Some(to.id),
                external: None,
                bill: None,
                description: description.clone(),
                created_at: now,
                processed_at: Some(now),
            };
            tx.put_account(from);
            tx.put_account(to);
            tx.put_payment(payment.clone());
            Ok::<_, PaymentError>(payment)
        })?;

        tracing::info!(reference = %payment.reference, %amount, "internal transfer completed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("INTERNAL_TRANSFER", "Payment", payment.id, "PAYMENT")
                .actor(actor)
                .description(format!(
                    "Transfer of {amount} from {from_number} to {to_number}"
                )),
        );
        Ok(payment)
    }

    /// Transfers to an account at another bank.
    ///
    /// The local debit is final, but the payment settles as `Processing`
    /// because the counterpart bank confirms asynchronously.
    ///
    /// # Errors
    ///
    /// Same as [`Self::internal_transfer`], minus `SameAccount`.
    pub fn external_transfer(
        &self,
        actor: UserId,
        key: &IdempotencyKey,
        from_number: &str,
        external: ExternalBankDetails,
        amount: Decimal,
        description: impl Into<String>,
    ) -> Result<Payment, PaymentError> {
        let description = description.into();
        let amount = round_money(amount);
        let fee = self.fees.external_transfer;

        let payment = self.store.with_tx(|tx| {
            Self::claim_key(tx, key)?;
            let mut from = tx.account_by_number(from_number)?;
            self.check_actor_and_state(actor, &from)?;
            self.check_amount(amount)?;
            self.check_daily_window(tx, &from, amount, Utc::now())?;

            from.debit(amount + fee)?;

            let base = self.unique_transaction_base(tx)?;
            let now = Utc::now();
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference: format!("{base}-DEBIT"),
                transaction_type: TransactionType::Transfer,
                amount: amount + fee,
                status: TransactionStatus::Completed,
                from_account: Some(from.id),
                to_account: None,
                running_balance: from.balance,
                description: format!(
                    "External transfer to {}:{} - {description}",
                    external.bank_code, external.account_number
                ),
                created_at: now,
                processed_at: Some(now),
            });

            let reference = reference::unique(
                || self.references.payment_reference(),
                |candidate| tx.payment_reference_exists(candidate),
            )?;
            let payment = Payment {
                id: PaymentId::new(),
                reference,
                payment_type: PaymentType::ExternalTransfer,
                amount,
                fee,
                status: PaymentStatus::Processing,
                from_account: from.id,
                to_account: None,
                external: Some(external.clone()),
                bill: None,
                description: description.clone(),
                created_at: now,
                processed_at: None,
            };
            tx.put_account(from);
            tx.put_payment(payment.clone());
            Ok::<_, PaymentError>(payment)
        })?;

        tracing::info!(reference = %payment.reference, %amount, "external transfer initiated");
        audit::emit(
            &*self.audit,
            AuditEvent::new("EXTERNAL_TRANSFER", "Payment", payment.id, "PAYMENT")
                .actor(actor)
                .description(format!("External transfer of {amount} from {from_number}")),
        );
        Ok(payment)
    }

    /// Pays a registered biller from an account.
    ///
    /// # Errors
    ///
    /// Same as [`Self::external_transfer`].
    pub fn bill_payment(
        &self,
        actor: UserId,
        key: &IdempotencyKey,
        account_number: &str,
        bill: BillDetails,
        amount: Decimal,
    ) -> Result<Payment, PaymentError> {
        let amount = round_money(amount);
        let fee = self.fees.bill_payment;

        let payment = self.store.with_tx(|tx| {
            Self::claim_key(tx, key)?;
            let mut account = tx.account_by_number(account_number)?;
            self.check_actor_and_state(actor, &account)?;
            self.check_amount(amount)?;
            self.check_daily_window(tx, &account, amount, Utc::now())?;

            account.debit(amount + fee)?;

            let base = self.unique_transaction_base(tx)?;
            let now = Utc::now();
            tx.put_transaction(Transaction {
                id: TransactionId::new(),
                reference: format!("{base}-DEBIT"),
                transaction_type: TransactionType::BillPayment,
                amount: amount + fee,
                status: TransactionStatus::Completed,
                from_account: Some(account.id),
                to_account: None,
                running_balance: account.balance,
                description: format!("Bill payment to {}", bill.biller_name),
                created_at: now,
                processed_at: Some(now),
            });

            let reference = reference::unique(
                || self.references.payment_reference(),
                |candidate| tx.payment_reference_exists(candidate),
            )?;
            let payment = Payment {
                id: PaymentId::new(),
                reference,
                payment_type: PaymentType::BillPayment,
                amount,
                fee,
                status: PaymentStatus::Completed,
                from_account: account.id,
                to_account: None,
                external: None,
                bill: Some(bill.clone()),
                description: format!("Bill payment to {}", bill.biller_name),
                created_at: now,
                processed_at: Some(now),
            };
            tx.put_account(account);
            tx.put_payment(payment.clone());
            Ok::<_, PaymentError>(payment)
        })?;

        tracing::info!(reference = %payment.reference, %amount, "bill payment completed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("BILL_PAYMENT", "Payment", payment.id, "PAYMENT")
                .actor(actor)
                .description(format!("Bill payment of {amount} from {account_number}")),
        );
        Ok(payment)
    }

    /// Payment history for an account the actor owns, oldest first.
    ///
    /// # Errors
    ///
    /// `NotOwner` if the actor does not own the account.
    pub fn payment_history(
        &self,
        actor: UserId,
        account_number: &str,
    ) -> Result<Vec<Payment>, PaymentError> {
        self.store.with_tx(|tx| {
            let account = tx.account_by_number(account_number)?;
            if !self.ownership.owns(actor, account.owner) {
                return Err(PaymentError::NotOwner);
            }
            Ok(tx.payments_from_account_since(account.id, DateTime::<Utc>::MIN_UTC))
        })
    }

    fn claim_key(tx: &mut S::Tx, key: &IdempotencyKey) -> Result<(), PaymentError> {
        if !tx.claim_idempotency_key(key.as_str()) {
            return Err(PaymentError::DuplicateSubmission {
                key: key.as_str().to_string(),
            });
        }
        Ok(())
    }

    fn check_actor_and_state(
        &self,
        actor: UserId,
        account: &crate::ledger::Account,
    ) -> Result<(), PaymentError> {
        if !self.ownership.owns(actor, account.owner) {
            return Err(PaymentError::NotOwner);
        }
        account.ensure_operational()?;
        Ok(())
    }

    fn check_amount(&self, amount: Decimal) -> Result<(), PaymentError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount.into());
        }
        if amount > self.limits.single_transfer {
            return Err(PaymentError::SingleTransferLimitExceeded {
                amount,
                limit: self.limits.single_transfer,
            });
        }
        Ok(())
    }

    /// Sums the account's payments in the trailing 24 hours and rejects the
    /// new amount if the aggregate would breach the daily ceiling.
    fn check_daily_window(
        &self,
        tx: &S::Tx,
        account: &crate::ledger::Account,
        amount: Decimal,
        now: DateTime<Utc>,
    ) -> Result<(), PaymentError> {
        let since = now - Duration::hours(24);
        let window_total: Decimal = tx
            .payments_from_account_since(account.id, since)
            .iter()
            .map(|p| p.amount)
            .sum();
        let attempted = window_total + amount;
        if attempted > self.limits.daily_transfer {
            return Err(PaymentError::DailyTransferLimitExceeded {
                attempted,
                limit: self.limits.daily_transfer,
            });
        }
        Ok(())
    }

    fn unique_transaction_base(&self, tx: &S::Tx) -> Result<String, PaymentError> {
        Ok(reference::unique(
            || self.references.transaction_reference(),
            |candidate| {
                tx.transaction_reference_exists(&format!("{candidate}-DEBIT"))
                    || tx.transaction_reference_exists(&format!("{candidate}-CREDIT"))
            },
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::MemorySink;
    use crate::auth::DirectOwnership;
    use crate::auth::ownership::MockOwnership;
    use crate::ledger::{Account, AccountType, LedgerService};
    use crate::store::MemoryStore;
    use rust_decimal_macros::dec;

    struct Fixture {
        store: Arc<MemoryStore>,
        sink: Arc<MemorySink>,
        payments: PaymentService<Arc<MemoryStore>>,
        ledger: LedgerService<Arc<MemoryStore>>,
    }

    fn fixture() -> Fixture {
        fixture_with(BankConfig::default(), Arc::new(DirectOwnership))
    }

    fn fixture_with(config: BankConfig, ownership: Arc<dyn Ownership>) -> Fixture {
        let store = Arc::new(MemoryStore::new());
        let sink = Arc::new(MemorySink::new());
        Fixture {
            store: store.clone(),
            sink: sink.clone(),
            payments: PaymentService::new(store.clone(), sink.clone(), ownership, &config),
            ledger: LedgerService::new(store, sink),
        }
    }

    fn open(fx: &Fixture, owner: UserId, balance: Decimal) -> Account {
        fx.ledger
            .open_account(owner, AccountType::Investment, balance, dec!(0))
            .unwrap()
    }

    fn key(name: &str) -> IdempotencyKey {
        IdempotencyKey::new(name)
    }

    #[test]
    fn test_internal_transfer_charges_fee_and_settles() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(1000));
        let to = open(&fx, UserId::new(), dec!(0));

        let payment = fx
            .payments
            .internal_transfer(
                owner,
                &key("op-1"),
                &from.account_number,
                &to.account_number,
                dec!(100),
                "rent",
            )
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.fee, dec!(2.50));
        assert_eq!(payment.total_debit(), dec!(102.50));
        // Source pays amount + fee; destination receives the amount only.
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(897.50));
        assert_eq!(fx.ledger.account(to.id).unwrap().balance, dec!(100.00));

        let events = fx.sink.events();
        assert!(events.iter().any(|e| e.action == "INTERNAL_TRANSFER"));
    }

    #[test]
    fn test_duplicate_submission_applies_nothing() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(1000));
        let to = open(&fx, UserId::new(), dec!(0));

        fx.payments
            .internal_transfer(
                owner,
                &key("op-dup"),
                &from.account_number,
                &to.account_number,
                dec!(100),
                "",
            )
            .unwrap();
        let second = fx.payments.internal_transfer(
            owner,
            &key("op-dup"),
            &from.account_number,
            &to.account_number,
            dec!(100),
            "",
        );

        assert!(matches!(
            second,
            Err(PaymentError::DuplicateSubmission { .. })
        ));
        // Exactly one application.
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(897.50));
        assert_eq!(fx.ledger.account(to.id).unwrap().balance, dec!(100.00));
    }

    #[test]
    fn test_failed_attempt_releases_idempotency_key() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(50));
        let to = open(&fx, UserId::new(), dec!(0));

        // Not enough to cover amount + fee.
        let first = fx.payments.internal_transfer(
            owner,
            &key("op-retry"),
            &from.account_number,
            &to.account_number,
            dec!(49),
            "",
        );
        assert!(matches!(
            first,
            Err(PaymentError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));

        fx.store
            .with_tx(|tx| {
                let mut account = tx.account(from.id)?;
                account.credit(dec!(10))?;
                tx.put_account(account);
                Ok::<_, LedgerError>(())
            })
            .unwrap();

        // The rolled-back key is free for the retry.
        let second = fx.payments.internal_transfer(
            owner,
            &key("op-retry"),
            &from.account_number,
            &to.account_number,
            dec!(49),
            "",
        );
        assert!(second.is_ok());
    }

    #[test]
    fn test_ownership_is_consulted() {
        let mut ownership = MockOwnership::new();
        ownership.expect_owns().return_const(false);
        let fx = fixture_with(BankConfig::default(), Arc::new(ownership));

        let owner = UserId::new();
        let from = open(&fx, owner, dec!(1000));
        let to = open(&fx, UserId::new(), dec!(0));

        let result = fx.payments.internal_transfer(
            owner,
            &key("op-2"),
            &from.account_number,
            &to.account_number,
            dec!(100),
            "",
        );
        assert!(matches!(result, Err(PaymentError::NotOwner)));
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(1000.00));
    }

    #[test]
    fn test_frozen_account_cannot_pay() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(1000));
        let to = open(&fx, UserId::new(), dec!(0));
        fx.ledger.freeze_account(from.id).unwrap();

        let result = fx.payments.internal_transfer(
            owner,
            &key("op-3"),
            &from.account_number,
            &to.account_number,
            dec!(100),
            "",
        );
        assert!(matches!(
            result,
            Err(PaymentError::Ledger(LedgerError::AccountFrozen(_)))
        ));
    }

    #[test]
    fn test_single_transfer_limit() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(50000));
        let to = open(&fx, UserId::new(), dec!(0));

        let result = fx.payments.internal_transfer(
            owner,
            &key("op-4"),
            &from.account_number,
            &to.account_number,
            dec!(10000.01),
            "",
        );
        assert!(matches!(
            result,
            Err(PaymentError::SingleTransferLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_daily_window_limit() {
        let mut config = BankConfig::default();
        config.limits.single_transfer = dec!(1000);
        config.limits.daily_transfer = dec!(1500);
        let fx = fixture_with(config, Arc::new(DirectOwnership));

        let owner = UserId::new();
        let from = open(&fx, owner, dec!(10000));
        let to = open(&fx, UserId::new(), dec!(0));

        fx.payments
            .internal_transfer(
                owner,
                &key("op-5a"),
                &from.account_number,
                &to.account_number,
                dec!(900),
                "",
            )
            .unwrap();

        let second = fx.payments.internal_transfer(
            owner,
            &key("op-5b"),
            &from.account_number,
            &to.account_number,
            dec!(700),
            "",
        );
        assert!(matches!(
            second,
            Err(PaymentError::DailyTransferLimitExceeded { .. })
        ));

        // A smaller payment still fits under the window.
        let third = fx.payments.internal_transfer(
            owner,
            &key("op-5c"),
            &from.account_number,
            &to.account_number,
            dec!(600),
            "",
        );
        assert!(third.is_ok());
    }

    #[test]
    fn test_external_transfer_settles_as_processing() {
        let fx = fixture();
        let owner = UserId::new();
        let from = open(&fx, owner, dec!(1000));

        let payment = fx
            .payments
            .external_transfer(
                owner,
                &key("op-6"),
                &from.account_number,
                ExternalBankDetails {
                    bank_code: "EXTBK01".to_string(),
                    account_number: "99001122".to_string(),
                    beneficiary_name: "J. Vendor".to_string(),
                },
                dec!(200),
                "invoice 42",
            )
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Processing);
        assert_eq!(payment.fee, dec!(5.00));
        assert!(payment.processed_at.is_none());
        // The local debit is final: amount + the doubled external fee.
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(795.00));
    }

    #[test]
    fn test_bill_payment_completes_synchronously() {
        let fx = fixture();
        let owner = UserId::new();
        let account = open(&fx, owner, dec!(500));

        let payment = fx
            .payments
            .bill_payment(
                owner,
                &key("op-7"),
                &account.account_number,
                BillDetails {
                    biller_code: "PWR001".to_string(),
                    biller_name: "City Power".to_string(),
                    customer_reference: "CUST-88".to_string(),
                },
                dec!(120),
            )
            .unwrap();

        assert_eq!(payment.status, PaymentStatus::Completed);
        assert_eq!(payment.fee, dec!(1.00));
        assert_eq!(fx.ledger.account(account.id).unwrap().balance, dec!(379.00));
    }

    #[test]
    fn test_insufficient_funds_with_fee_leaves_no_trace() {
        let fx = fixture();
        let owner = UserId::new();
        // Covers the amount but not amount + fee.
        let from = open(&fx, owner, dec!(100));
        let to = open(&fx, UserId::new(), dec!(0));

        let result = fx.payments.internal_transfer(
            owner,
            &key("op-8"),
            &from.account_number,
            &to.account_number,
            dec!(100),
            "",
        );
        assert!(matches!(
            result,
            Err(PaymentError::Ledger(LedgerError::InsufficientFunds { .. }))
        ));
        assert_eq!(fx.ledger.account(from.id).unwrap().balance, dec!(100.00));
        assert_eq!(fx.ledger.account(to.id).unwrap().balance, dec!(0.00));
        assert!(
            fx.payments
                .payment_history(owner, &from.account_number)
                .unwrap()
                .is_empty()
        );
    }
}
