//! Money scale and rounding helpers.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! All amounts are `rust_decimal::Decimal`; these helpers pin the scales
//! every persisted value carries.

use rust_decimal::{Decimal, RoundingStrategy};

/// Decimal places carried by every persisted monetary amount.
pub const MONEY_SCALE: u32 = 2;

/// Decimal places carried by every persisted interest rate (annual percent).
pub const RATE_SCALE: u32 = 4;

/// Decimal places used for intermediate monthly-rate arithmetic.
pub const MONTHLY_RATE_SCALE: u32 = 6;

/// Rounds a monetary amount half-up to [`MONEY_SCALE`] decimal places.
#[must_use]
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(MONEY_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Rounds an annual-percent rate half-up to [`RATE_SCALE`] decimal places.
#[must_use]
pub fn round_rate(rate: Decimal) -> Decimal {
    rate.round_dp_with_strategy(RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

/// Converts an annual-percent rate to a monthly fraction (`rate / 1200`),
/// half-up at [`MONTHLY_RATE_SCALE`] decimal places.
#[must_use]
pub fn monthly_rate(annual_percent: Decimal) -> Decimal {
    (annual_percent / Decimal::from(1200))
        .round_dp_with_strategy(MONTHLY_RATE_SCALE, RoundingStrategy::MidpointAwayFromZero)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(dec!(10.005), dec!(10.01))]
    #[case(dec!(10.004), dec!(10.00))]
    #[case(dec!(-10.005), dec!(-10.01))]
    #[case(dec!(2.5), dec!(2.50))]
    fn test_round_money_half_up(#[case] input: Decimal, #[case] expected: Decimal) {
        assert_eq!(round_money(input), expected);
    }

    #[test]
    fn test_round_rate() {
        assert_eq!(round_rate(dec!(8.50005)), dec!(8.5001));
        assert_eq!(round_rate(dec!(8.5)), dec!(8.5000));
    }

    #[test]
    fn test_monthly_rate() {
        // 6.00% annual -> 0.005 monthly
        assert_eq!(monthly_rate(dec!(6.00)), dec!(0.005000));
        // 8.50% annual -> 0.007083 monthly (half-up at 6 dp)
        assert_eq!(monthly_rate(dec!(8.50)), dec!(0.007083));
    }

}
