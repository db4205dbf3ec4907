//! Application configuration management.

use rust_decimal::Decimal;
use serde::Deserialize;

/// Bank-wide configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct BankConfig {
    /// Flat fees charged per payment type.
    #[serde(default)]
    pub fees: FeeConfig,
    /// Transfer ceilings.
    #[serde(default)]
    pub limits: LimitConfig,
}

/// Flat fees charged per payment type.
#[derive(Debug, Clone, Deserialize)]
pub struct FeeConfig {
    /// Fee for an internal (same-bank) transfer.
    #[serde(default = "default_internal_transfer_fee")]
    pub internal_transfer: Decimal,
    /// Fee for an external (other-bank) transfer.
    #[serde(default = "default_external_transfer_fee")]
    pub external_transfer: Decimal,
    /// Fee for a bill payment.
    #[serde(default = "default_bill_payment_fee")]
    pub bill_payment: Decimal,
}

fn default_internal_transfer_fee() -> Decimal {
    Decimal::new(250, 2) // 2.50
}

fn default_external_transfer_fee() -> Decimal {
    Decimal::new(500, 2) // 5.00 (2x internal)
}

fn default_bill_payment_fee() -> Decimal {
    Decimal::new(100, 2) // 1.00
}

impl Default for FeeConfig {
    fn default() -> Self {
        Self {
            internal_transfer: default_internal_transfer_fee(),
            external_transfer: default_external_transfer_fee(),
            bill_payment: default_bill_payment_fee(),
        }
    }
}

/// Transfer ceilings applied by the payment processor.
#[derive(Debug, Clone, Deserialize)]
pub struct LimitConfig {
    /// Maximum amount for a single transfer or bill payment.
    #[serde(default = "default_single_transfer_limit")]
    pub single_transfer: Decimal,
    /// Maximum aggregate debit over a rolling 24-hour window.
    #[serde(default = "default_daily_transfer_limit")]
    pub daily_transfer: Decimal,
}

fn default_single_transfer_limit() -> Decimal {
    Decimal::new(10_000_00, 2) // 10,000.00
}

fn default_daily_transfer_limit() -> Decimal {
    Decimal::new(50_000_00, 2) // 50,000.00
}

impl Default for LimitConfig {
    fn default() -> Self {
        Self {
            single_transfer: default_single_transfer_limit(),
            daily_transfer: default_daily_transfer_limit(),
        }
    }
}

impl Default for BankConfig {
    fn default() -> Self {
        Self {
            fees: FeeConfig::default(),
            limits: LimitConfig::default(),
        }
    }
}

impl BankConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(config::Environment::with_prefix("MERIDIAN").separator("__"))
            .build()?;

        config.try_deserialize()
    }
}
