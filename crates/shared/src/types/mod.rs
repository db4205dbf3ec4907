//! Common types used across the application.

pub mod id;
pub mod money;

pub use id::*;
pub use money::{MONEY_SCALE, RATE_SCALE, monthly_rate, round_money, round_rate};
