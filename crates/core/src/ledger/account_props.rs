//! Property-based tests for the account aggregate.

use meridian_shared::types::UserId;
use proptest::prelude::*;
use rust_decimal::Decimal;

use super::account::Account;
use super::policy::AccountType;

/// Strategy for positive amounts (0.01 to 10,000.00).
fn positive_amount() -> impl Strategy<Value = Decimal> {
    (1i64..1_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

/// A debit-or-credit step.
#[derive(Debug, Clone)]
enum Step {
    Debit(Decimal),
    Credit(Decimal),
}

fn step_strategy() -> impl Strategy<Value = Step> {
    prop_oneof![
        positive_amount().prop_map(Step::Debit),
        positive_amount().prop_map(Step::Credit),
    ]
}

fn fresh_account() -> Account {
    Account::open(
        UserId::new(),
        "ACC20260101000001".to_string(),
        AccountType::Checking,
        Decimal::ZERO,
        Decimal::new(500_00, 2),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// After any sequence of debits and credits, the balance equals the sum
    /// of accepted credits minus the sum of accepted debits.
    #[test]
    fn prop_balance_equals_credits_minus_debits(
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut account = fresh_account();
        let mut credits = Decimal::ZERO;
        let mut debits = Decimal::ZERO;

        for step in steps {
            match step {
                Step::Credit(amount) => {
                    if account.credit(amount).is_ok() {
                        credits += amount;
                    }
                }
                Step::Debit(amount) => {
                    if account.debit(amount).is_ok() {
                        debits += amount;
                    }
                }
            }
        }

        prop_assert_eq!(account.balance, credits - debits);
        prop_assert_eq!(account.available_balance, account.balance);
    }

    /// The balance never falls below the overdraft floor, whatever the
    /// caller tries.
    #[test]
    fn prop_balance_never_breaches_floor(
        steps in prop::collection::vec(step_strategy(), 1..40),
    ) {
        let mut account = fresh_account();
        let floor = account.overdraft_floor();

        for step in steps {
            match step {
                Step::Credit(amount) => {
                    let _ = account.credit(amount);
                }
                Step::Debit(amount) => {
                    let _ = account.debit(amount);
                }
            }
            prop_assert!(account.balance >= floor);
        }
    }

    /// A rejected debit leaves both balances untouched.
    #[test]
    fn prop_rejected_debit_changes_nothing(
        opening in positive_amount(),
        excess in positive_amount(),
    ) {
        let mut account = fresh_account();
        account.credit(opening).unwrap();

        // Request more than the balance plus the full overdraft allowance.
        let over = opening - account.overdraft_floor() + excess;
        prop_assert!(account.debit(over).is_err());
        prop_assert_eq!(account.balance, opening);
        prop_assert_eq!(account.available_balance, opening);
    }
}
