//! Account aggregates, balance invariants, and account lifecycle.
//!
//! This module implements the ledger engine:
//! - The `Account` aggregate and its debit/credit/freeze/close transitions
//! - The overdraft floor invariant enforced on every debit
//! - The type-keyed account policy table
//! - The account lifecycle service (open, close, freeze, unfreeze)

pub mod account;
pub mod error;
pub mod policy;
pub mod service;

#[cfg(test)]
mod account_props;

pub use account::Account;
pub use error::LedgerError;
pub use policy::{AccountPolicy, AccountType};
pub use service::LedgerService;
