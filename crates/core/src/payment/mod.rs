//! Fee-bearing transfers and bill payments with limit checks.
//!
//! - `Payment` intents distinct from raw ledger `Transaction`s
//! - Internal transfers (synchronous), external transfers (asynchronous
//!   settlement), and bill payments
//! - Flat fees, single-transfer and rolling 24-hour ceilings
//! - Idempotent submission via caller-generated keys

pub mod error;
pub mod service;
pub mod types;

pub use error::PaymentError;
pub use service::PaymentService;
pub use types::{
    BillDetails, ExternalBankDetails, IdempotencyKey, Payment, PaymentStatus, PaymentType,
};
