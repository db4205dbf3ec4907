//! Account lifecycle operations.
//!
//! Opening, closing, freezing, and unfreezing accounts. Balance movement
//! lives on the [`Account`] aggregate; the services in `transaction` and
//! `payment` drive it. Every operation here runs as one unit of work and
//! emits one audit event after the commit.

use std::sync::Arc;

use meridian_shared::types::{AccountId, UserId};
use meridian_shared::types::money::round_money;
use rust_decimal::Decimal;

use crate::audit::{self, AuditEvent, AuditSeverity, AuditSink};
use crate::reference::{self, ReferenceGenerator};
use crate::store::{Accounts, Store};

use super::account::Account;
use super::error::LedgerError;
use super::policy::AccountType;

/// Account lifecycle service.
pub struct LedgerService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    references: ReferenceGenerator,
}

impl<S: Store> LedgerService<S> {
    /// Creates the service.
    pub fn new(store: S, audit: Arc<dyn AuditSink>) -> Self {
        Self {
            store,
            audit,
            references: ReferenceGenerator::new(),
        }
    }

    /// Opens an account with a collision-checked account number and the
    /// type-keyed policy defaults.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` for a negative initial balance or overdraft
    /// limit, `Reference` if no unique number could be generated.
    pub fn open_account(
        &self,
        owner: UserId,
        account_type: AccountType,
        initial_balance: Decimal,
        overdraft_limit: Decimal,
    ) -> Result<Account, LedgerError> {
        if initial_balance < Decimal::ZERO || overdraft_limit < Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }

        let account = self.store.with_tx(|tx| {
            let number = reference::unique(
                || self.references.account_number(),
                |candidate| tx.account_number_exists(candidate),
            )?;
            let account = Account::open(
                owner,
                number,
                account_type,
                round_money(initial_balance),
                round_money(overdraft_limit),
            );
            tx.put_account(account.clone());
            Ok::<_, LedgerError>(account)
        })?;

        tracing::info!(account = %account.account_number, %account_type, "account opened");
        audit::emit(
            &*self.audit,
            AuditEvent::new("ACCOUNT_CREATED", "Account", account.id, "LEDGER")
                .actor(owner)
                .description(format!("Account created: {}", account.account_number)),
        );
        Ok(account)
    }

    /// Closes an account.
    ///
    /// # Errors
    ///
    /// Returns `NonZeroBalance` unless the balance is exactly zero.
    pub fn close_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.store.with_tx(|tx| {
            let mut account = tx.account(id)?;
            account.close()?;
            tx.put_account(account.clone());
            Ok::<_, LedgerError>(account)
        })?;

        tracing::info!(account = %account.account_number, "account closed");
        audit::emit(
            &*self.audit,
            AuditEvent::new("ACCOUNT_CLOSED", "Account", account.id, "LEDGER")
                .actor(account.owner)
                .description(format!("Account closed: {}", account.account_number)),
        );
        Ok(account)
    }

    /// Freezes an account. Pending transactions are not reversed.
    pub fn freeze_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.store.with_tx(|tx| {
            let mut account = tx.account(id)?;
            account.freeze();
            tx.put_account(account.clone());
            Ok::<_, LedgerError>(account)
        })?;

        tracing::warn!(account = %account.account_number, "account frozen");
        audit::emit(
            &*self.audit,
            AuditEvent::new("ACCOUNT_FROZEN", "Account", account.id, "SECURITY")
                .actor(account.owner)
                .severity(AuditSeverity::High)
                .description(format!("Account frozen: {}", account.account_number)),
        );
        Ok(account)
    }

    /// Unfreezes an account.
    pub fn unfreeze_account(&self, id: AccountId) -> Result<Account, LedgerError> {
        let account = self.store.with_tx(|tx| {
            let mut account = tx.account(id)?;
            account.unfreeze();
            tx.put_account(account.clone());
            Ok::<_, LedgerError>(account)
        })?;

        tracing::info!(account = %account.account_number, "account unfrozen");
        audit::emit(
            &*self.audit,
            AuditEvent::new("ACCOUNT_UNFROZEN", "Account", account.id, "SECURITY")
                .actor(account.owner)
                .severity(AuditSeverity::Medium)
                .description(format!("Account unfrozen: {}", account.account_number)),
        );
        Ok(account)
    }

    /// Loads an account by id.
    pub fn account(&self, id: AccountId) -> Result<Account, LedgerError> {
        self.store.with_tx(|tx| tx.account(id).map_err(Into::into))
    }

    /// Loads an account by its unique account number.
    pub fn account_by_number(&self, number: &str) -> Result<Account, LedgerError> {
        self.store
            .with_tx(|tx| tx.account_by_number(number).map_err(Into::into))
    }
}
