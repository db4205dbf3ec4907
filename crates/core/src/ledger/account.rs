//! Deposit account aggregate.
//!
//! `Account` owns its balance transitions: every debit and credit goes
//! through the methods here so the overdraft floor is enforced in exactly
//! one place. `balance` and `available_balance` always move together;
//! holds (which would separate them) are applied by callers that place them.

use chrono::{DateTime, Utc};
use meridian_shared::types::{AccountId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::LedgerError;
use super::policy::{AccountPolicy, AccountType};

/// A deposit account and its balance state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    /// Account ID.
    pub id: AccountId,
    /// Unique account number.
    pub account_number: String,
    /// Account type.
    pub account_type: AccountType,
    /// Posted balance.
    pub balance: Decimal,
    /// Balance available for spend decisions (posted balance absent holds).
    pub available_balance: Decimal,
    /// Balance the account should stay above; feeds the overdraft floor.
    pub minimum_balance: Decimal,
    /// How far past the minimum the balance may be overdrawn.
    pub overdraft_limit: Decimal,
    /// Annual interest rate (fraction, 4 dp).
    pub interest_rate: Decimal,
    /// Monthly maintenance fee.
    pub monthly_maintenance_fee: Decimal,
    /// False once the account is closed.
    pub is_active: bool,
    /// True while the account is frozen.
    pub is_frozen: bool,
    /// Owning user.
    pub owner: UserId,
    /// When the account was opened.
    pub opened_at: DateTime<Utc>,
    /// When the account was closed, if it has been.
    pub closed_at: Option<DateTime<Utc>>,
}

impl Account {
    /// Opens a new account, applying the type-keyed policy defaults.
    #[must_use]
    pub fn open(
        owner: UserId,
        account_number: String,
        account_type: AccountType,
        initial_balance: Decimal,
        overdraft_limit: Decimal,
    ) -> Self {
        let policy = AccountPolicy::for_type(account_type);
        Self {
            id: AccountId::new(),
            account_number,
            account_type,
            balance: initial_balance,
            available_balance: initial_balance,
            minimum_balance: policy.minimum_balance,
            overdraft_limit,
            interest_rate: policy.interest_rate,
            monthly_maintenance_fee: policy.monthly_maintenance_fee,
            is_active: true,
            is_frozen: false,
            owner,
            opened_at: Utc::now(),
            closed_at: None,
        }
    }

    /// The lowest balance any debit may leave behind:
    /// `-(minimum_balance + overdraft_limit)`.
    #[must_use]
    pub fn overdraft_floor(&self) -> Decimal {
        -(self.minimum_balance + self.overdraft_limit)
    }

    /// Debits the account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount <= 0`, `InsufficientFunds` if the
    /// post-debit balance would fall below the overdraft floor.
    pub fn debit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        if self.balance - amount < self.overdraft_floor() {
            return Err(LedgerError::InsufficientFunds {
                balance: self.balance,
                requested: amount,
            });
        }
        self.balance -= amount;
        self.available_balance -= amount;
        Ok(())
    }

    /// Credits the account.
    ///
    /// # Errors
    ///
    /// Returns `InvalidAmount` if `amount <= 0`.
    pub fn credit(&mut self, amount: Decimal) -> Result<(), LedgerError> {
        if amount <= Decimal::ZERO {
            return Err(LedgerError::InvalidAmount);
        }
        self.balance += amount;
        self.available_balance += amount;
        Ok(())
    }

    /// Freezes the account. Pending transactions are not reversed.
    pub fn freeze(&mut self) {
        self.is_frozen = true;
    }

    /// Unfreezes the account.
    pub fn unfreeze(&mut self) {
        self.is_frozen = false;
    }

    /// Closes the account.
    ///
    /// # Errors
    ///
    /// Returns `NonZeroBalance` unless the balance is exactly zero.
    pub fn close(&mut self) -> Result<(), LedgerError> {
        if self.balance != Decimal::ZERO {
            return Err(LedgerError::NonZeroBalance {
                balance: self.balance,
            });
        }
        self.is_active = false;
        self.closed_at = Some(Utc::now());
        Ok(())
    }

    /// Verifies the account can take part in money movement.
    ///
    /// # Errors
    ///
    /// Returns `AccountInactive` or `AccountFrozen`.
    pub fn ensure_operational(&self) -> Result<(), LedgerError> {
        if !self.is_active {
            return Err(LedgerError::AccountInactive(self.id));
        }
        if self.is_frozen {
            return Err(LedgerError::AccountFrozen(self.id));
        }
        Ok(())
    }

    /// Returns true if the available balance covers `amount`.
    #[must_use]
    pub fn can_cover(&self, amount: Decimal) -> bool {
        self.available_balance >= amount
    }
}
