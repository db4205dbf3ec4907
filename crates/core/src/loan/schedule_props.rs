//! Property-based tests for amortization math.

use meridian_shared::types::money::round_money;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::schedule::{amortization_schedule, monthly_payment, split_payment};

/// Principals from 500.00 to 100,000.00.
fn principal_strategy() -> impl Strategy<Value = Decimal> {
    (500_00i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// Annual rates from 0.00% to 15.00%.
fn rate_strategy() -> impl Strategy<Value = Decimal> {
    (0i64..1500i64).prop_map(|basis| Decimal::new(basis, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// The schedule retires the whole principal: the final balance is
    /// exactly zero and the principal portions sum to the principal.
    #[test]
    fn prop_schedule_retires_principal(
        principal in principal_strategy(),
        rate in rate_strategy(),
        term in 3u32..=60,
    ) {
        let schedule = amortization_schedule(principal, rate, term).unwrap();
        let last = schedule.last().unwrap();
        prop_assert_eq!(last.remaining, Decimal::ZERO);

        let retired: Decimal = schedule.iter().map(|e| e.principal).sum();
        prop_assert_eq!(retired, round_money(principal));
    }

    /// Following the schedule period by period with the split logic used
    /// for real payments reproduces the schedule's balances exactly.
    #[test]
    fn prop_schedule_matches_payment_application(
        principal in principal_strategy(),
        rate in rate_strategy(),
        term in 3u32..=36,
    ) {
        let schedule = amortization_schedule(principal, rate, term).unwrap();
        let mut outstanding = round_money(principal);

        for entry in &schedule {
            let split = split_payment(outstanding, rate, entry.payment);
            prop_assert_eq!(split.interest, entry.interest);
            outstanding = round_money(outstanding - split.principal.min(outstanding));
            prop_assert_eq!(outstanding, entry.remaining);
        }
        prop_assert_eq!(outstanding, Decimal::ZERO);
    }

    /// The level payment always covers the first period's interest, so every
    /// payment retires some principal.
    #[test]
    fn prop_payment_exceeds_first_interest(
        principal in principal_strategy(),
        rate in rate_strategy(),
        term in 1u32..=60,
    ) {
        let payment = monthly_payment(principal, rate, term).unwrap();
        let split = split_payment(principal, rate, payment);
        prop_assert!(split.principal > Decimal::ZERO);
    }

    /// Zero-rate loans divide the principal evenly with no interest.
    #[test]
    fn prop_zero_rate_is_straight_line(
        principal in principal_strategy(),
        term in 1u32..=60,
    ) {
        let payment = monthly_payment(principal, Decimal::ZERO, term).unwrap();
        let split = split_payment(principal, Decimal::ZERO, payment);
        prop_assert_eq!(split.interest, Decimal::ZERO);
        prop_assert_eq!(split.principal, payment);
    }
}
