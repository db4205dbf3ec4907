//! Type-keyed account policy table.
//!
//! Minimum balance, default interest rate, and maintenance fee are keyed by
//! account type in one lookup table instead of per-type branching scattered
//! across methods.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Deposit account types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountType {
    /// Everyday checking account.
    Checking,
    /// Interest-bearing savings account.
    Savings,
    /// Business operating account.
    Business,
    /// Money-market account.
    MoneyMarket,
    /// Investment account.
    Investment,
}

impl std::fmt::Display for AccountType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Checking => write!(f, "checking"),
            Self::Savings => write!(f, "savings"),
            Self::Business => write!(f, "business"),
            Self::MoneyMarket => write!(f, "money_market"),
            Self::Investment => write!(f, "investment"),
        }
    }
}

/// Per-type account defaults applied at opening.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountPolicy {
    /// Balance the account should stay above; feeds the overdraft floor.
    pub minimum_balance: Decimal,
    /// Default annual interest rate (fraction, 4 dp).
    pub interest_rate: Decimal,
    /// Monthly maintenance fee.
    pub monthly_maintenance_fee: Decimal,
}

impl AccountPolicy {
    /// Returns the policy for an account type.
    #[must_use]
    pub fn for_type(account_type: AccountType) -> Self {
        match account_type {
            AccountType::Checking => Self {
                minimum_balance: Decimal::new(100_00, 2),
                interest_rate: Decimal::new(50, 4), // 0.5% annual
                monthly_maintenance_fee: Decimal::new(10_00, 2),
            },
            AccountType::Savings => Self {
                minimum_balance: Decimal::new(500_00, 2),
                interest_rate: Decimal::new(200, 4), // 2.0% annual
                monthly_maintenance_fee: Decimal::ZERO,
            },
            AccountType::Business => Self {
                minimum_balance: Decimal::new(1000_00, 2),
                interest_rate: Decimal::new(100, 4), // 1.0% annual
                monthly_maintenance_fee: Decimal::new(25_00, 2),
            },
            AccountType::MoneyMarket => Self {
                minimum_balance: Decimal::new(500_00, 2),
                interest_rate: Decimal::new(150, 4), // 1.5% annual
                monthly_maintenance_fee: Decimal::new(15_00, 2),
            },
            AccountType::Investment => Self {
                minimum_balance: Decimal::ZERO,
                interest_rate: Decimal::ZERO,
                monthly_maintenance_fee: Decimal::new(5_00, 2),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[rstest]
    #[case(AccountType::Checking, dec!(100.00), dec!(0.0050), dec!(10.00))]
    #[case(AccountType::Savings, dec!(500.00), dec!(0.0200), dec!(0))]
    #[case(AccountType::Business, dec!(1000.00), dec!(0.0100), dec!(25.00))]
    #[case(AccountType::MoneyMarket, dec!(500.00), dec!(0.0150), dec!(15.00))]
    #[case(AccountType::Investment, dec!(0), dec!(0), dec!(5.00))]
    fn test_policy_table(
        #[case] account_type: AccountType,
        #[case] minimum_balance: Decimal,
        #[case] interest_rate: Decimal,
        #[case] fee: Decimal,
    ) {
        let policy = AccountPolicy::for_type(account_type);
        assert_eq!(policy.minimum_balance, minimum_balance);
        assert_eq!(policy.interest_rate, interest_rate);
        assert_eq!(policy.monthly_maintenance_fee, fee);
    }
}
