//! Card and card-transaction records.

use chrono::{DateTime, NaiveDate, Utc};
use meridian_shared::types::{AccountId, CardId, CardTransactionId, UserId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::transaction::TransactionStatus;

/// Card products.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    /// Spends against the linked account's available balance.
    Debit,
    /// Spends against a revolving credit line.
    Credit,
    /// Spends against a preloaded balance on the linked account.
    Prepaid,
}

/// Card lifecycle.
///
/// `PendingActivation → Active` (via correct PIN); `Active ↔ Blocked` by
/// operator; `Cancelled` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStatus {
    /// Issued, awaiting PIN activation.
    PendingActivation,
    /// Usable for authorization.
    Active,
    /// Blocked by an operator.
    Blocked,
    /// Past its expiry date.
    Expired,
    /// Cancelled. Terminal.
    Cancelled,
}

impl std::fmt::Display for CardStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::PendingActivation => "pending_activation",
            Self::Active => "active",
            Self::Blocked => "blocked",
            Self::Expired => "expired",
            Self::Cancelled => "cancelled",
        };
        write!(f, "{name}")
    }
}

/// A payment card linked to a deposit account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Card {
    /// Card ID.
    pub id: CardId,
    /// 16-digit card number.
    pub card_number: String,
    /// Card product.
    pub card_type: CardType,
    /// Card status.
    pub status: CardStatus,
    /// Embossed cardholder name.
    pub cardholder_name: String,
    /// Card verification value.
    pub cvv: String,
    /// Argon2id hash of the PIN.
    pub pin_hash: String,
    /// Expiry date.
    pub expiry_date: NaiveDate,
    /// Credit line size (credit cards only).
    pub credit_limit: Option<Decimal>,
    /// Remaining credit (credit cards only).
    pub available_credit: Option<Decimal>,
    /// Annual percentage rate on carried balances (credit cards only).
    pub interest_rate: Option<Decimal>,
    /// Maximum single-authorization amount per day.
    pub daily_limit: Decimal,
    /// Maximum aggregate per month.
    pub monthly_limit: Decimal,
    /// Whether contactless payments are enabled.
    pub contactless_enabled: bool,
    /// Whether online payments are enabled.
    pub online_enabled: bool,
    /// Whether international payments are enabled.
    pub international_enabled: bool,
    /// Linked deposit account.
    pub account: AccountId,
    /// Owning user.
    pub owner: UserId,
    /// When the card was issued.
    pub issued_at: DateTime<Utc>,
    /// When the card was activated.
    pub activated_at: Option<DateTime<Utc>>,
    /// When the card was blocked, while blocked.
    pub blocked_at: Option<DateTime<Utc>>,
}

impl Card {
    /// Returns true if the card has passed its expiry date.
    #[must_use]
    pub fn is_expired(&self, today: NaiveDate) -> bool {
        self.expiry_date < today
    }

    /// Masked card number for display: `**** **** **** 1234`.
    #[must_use]
    pub fn masked_number(&self) -> String {
        let tail = &self.card_number[self.card_number.len().saturating_sub(4)..];
        format!("**** **** **** {tail}")
    }
}

/// Merchant details attached to an authorization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MerchantInfo {
    /// Merchant display name.
    pub name: String,
    /// Merchant category.
    pub category: String,
    /// Point-of-sale location.
    pub location: String,
}

/// Flags describing how an authorization was made.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationFlags {
    /// Contactless tap.
    pub contactless: bool,
    /// Card-not-present online purchase.
    pub online: bool,
    /// Cross-border purchase.
    pub international: bool,
}

/// One authorized card movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardTransaction {
    /// Card transaction ID.
    pub id: CardTransactionId,
    /// Unique transaction reference.
    pub reference: String,
    /// Card that made the purchase.
    pub card: CardId,
    /// Authorized amount.
    pub amount: Decimal,
    /// Merchant details.
    pub merchant: MerchantInfo,
    /// Settlement status.
    pub status: TransactionStatus,
    /// Generated authorization code.
    pub authorization_code: String,
    /// How the authorization was made.
    pub flags: AuthorizationFlags,
    /// When the authorization happened.
    pub created_at: DateTime<Utc>,
    /// When the movement settled.
    pub processed_at: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(expiry: NaiveDate) -> Card {
        Card {
            id: CardId::new(),
            card_number: "4111222233334444".to_string(),
            card_type: CardType::Debit,
            status: CardStatus::Active,
            cardholder_name: "A Cardholder".to_string(),
            cvv: "123".to_string(),
            pin_hash: String::new(),
            expiry_date: expiry,
            credit_limit: None,
            available_credit: None,
            interest_rate: None,
            daily_limit: Decimal::new(5000_00, 2),
            monthly_limit: Decimal::new(50_000_00, 2),
            contactless_enabled: true,
            online_enabled: true,
            international_enabled: false,
            account: AccountId::new(),
            owner: UserId::new(),
            issued_at: Utc::now(),
            activated_at: None,
            blocked_at: None,
        }
    }

    #[test]
    fn test_expiry_check() {
        let expiry = NaiveDate::from_ymd_opt(2026, 6, 30).unwrap();
        let card = card(expiry);
        assert!(!card.is_expired(NaiveDate::from_ymd_opt(2026, 6, 30).unwrap()));
        assert!(card.is_expired(NaiveDate::from_ymd_opt(2026, 7, 1).unwrap()));
    }

    #[test]
    fn test_masked_number_shows_last_four() {
        let card = card(NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(card.masked_number(), "**** **** **** 4444");
    }
}
