//! Card lifecycle and authorization.
//!
//! This module implements the card engine:
//! - Issuance with hashed PINs and collision-checked card numbers
//! - The card state machine (activation, block/unblock, cancellation)
//! - Purchase authorization against the linked account or credit line

pub mod error;
pub mod service;
pub mod types;

pub use error::CardError;
pub use service::CardService;
pub use types::{
    AuthorizationFlags, Card, CardStatus, CardTransaction, CardType, MerchantInfo,
};
