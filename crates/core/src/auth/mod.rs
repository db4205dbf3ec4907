//! PIN hashing and ownership checks.

pub mod ownership;
pub mod pin;

pub use ownership::{DirectOwnership, Ownership};
pub use pin::{PinError, hash_pin, verify_pin};
