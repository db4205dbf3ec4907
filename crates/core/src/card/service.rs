//! Card lifecycle and authorization.
//!
//! Issuance, PIN activation, operator block/unblock, cancellation, and
//! purchase authorization. Debit and prepaid cards authorize against the
//! linked account through the ledger engine; credit cards authorize against
//! their own credit line. Every authorization writes one completed
//! `CardTransaction` in the same unit of work as the balance movement.

use std::sync::Arc;

use chrono::{Months, Utc};
use meridian_shared::types::money::round_money;
use meridian_shared::types::{AccountId, CardId, CardTransactionId, TransactionId, UserId};
use rust_decimal::Decimal;

use crate::audit::{self, AuditEvent, AuditSeverity, AuditSink};
use crate::auth::{self, Ownership};
use crate::ledger::LedgerError;
use crate::reference::{self, ReferenceGenerator};
use crate::store::{Accounts, Cards, CardTransactions, Store, Transactions};
use crate::transaction::{Transaction, TransactionStatus, TransactionType};

use super::error::CardError;
use super::types::{
    AuthorizationFlags, Card, CardStatus, CardTransaction, CardType, MerchantInfo,
};

/// Default single-day authorization ceiling.
const DEFAULT_DAILY_LIMIT: Decimal = Decimal::from_parts(500_000, 0, 0, false, 2);
/// Default monthly aggregate ceiling.
const DEFAULT_MONTHLY_LIMIT: Decimal = Decimal::from_parts(5_000_000, 0, 0, false, 2);
/// Default APR carried by credit cards.
const DEFAULT_CREDIT_APR: Decimal = Decimal::from_parts(18_99, 0, 0, false, 2);
/// Cards expire this many months after issue.
const EXPIRY_MONTHS: u32 = 48;

/// Card lifecycle and authorization service.
pub struct CardService<S> {
    store: S,
    audit: Arc<dyn AuditSink>,
    ownership: Arc<dyn Ownership>,
    references: ReferenceGenerator,
}

impl<S: Store> CardService<S> {
    /// Creates the service.
    pub fn new(store: S, audit: Arc<dyn AuditSink>, ownership: Arc<dyn Ownership>) -> Self {
        Self {
            store,
            audit,
            ownership,
            references: ReferenceGenerator::new(),
        }
    }

    /// Issues a card against an account the actor owns.
    ///
    /// The card starts in `PendingActivation` with a collision-checked
    /// number, a hashed PIN, and a four-year expiry. Credit cards must carry
    /// a positive credit limit and get the default APR.
    ///
    /// # Errors
    ///
    /// `NotOwner`, `CreditLimitRequired`, plus account-state and store
    /// errors.
    pub fn issue(
        &self,
        actor: UserId,
        account_id: AccountId,
        card_type: CardType,
        cardholder_name: impl Into<String>,
        pin: &str,
        credit_limit: Option<Decimal>,
    ) -> Result<Card, CardError> {
        let cardholder_name = cardholder_name.into();
        let credit_limit = credit_limit.map(round_money);
        if card_type == CardType::Credit
            && !credit_limit.is_some_and(|limit| limit > Decimal::ZERO)
        {
            return Err(CardError::CreditLimitRequired);
        }
        let pin_hash = auth::hash_pin(pin)?;

        let card = self.store.with_tx(|tx| {
            let account = tx.account(account_id)?;
            if !self.ownership.owns(actor, account.owner) {
                return Err(CardError::NotOwner);
            }
            account.ensure_operational()?;

            let card_number = reference::unique(
                || self.references.card_number(),
                |candidate| tx.card_number_exists(candidate),
            )?;
            let now = Utc::now();
            let is_credit = card_type == CardType::Credit;
            let card = Card {
                id: CardId::new(),
                card_number,
                card_type,
                status: CardStatus::PendingActivation,
                cardholder_name: cardholder_name.clone(),
                cvv: self.references.cvv(),
                pin_hash: pin_hash.clone(),
                expiry_date: now
                    .date_naive()
                    .checked_add_months(Months::new(EXPIRY_MONTHS))
                    .unwrap_or(now.date_naive()),
                credit_limit: is_credit.then_some(credit_limit.unwrap_or_default()),
                available_credit: is_credit.then_some(credit_limit.unwrap_or_default()),
                interest_rate: is_credit.then_some(DEFAULT_CREDIT_APR),
                daily_limit: DEFAULT_DAILY_LIMIT,
                monthly_limit: DEFAULT_MONTHLY_LIMIT,
                contactless_enabled: true,
                online_enabled: true,
                international_enabled: false,
                account: account.id,
                owner: account.owner,
                issued_at: now,
                activated_at: None,
                blocked_at: None,
            };
            tx.put_card(card.clone());
            Ok::<_, CardError>(card)
        })?;

        tracing::info!(card = %card.masked_number(), ?card_type, "card issued");
        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_CREATED", "Card", card.id, "CARD")
                .actor(actor)
                .description(format!("Card created: {}", card.masked_number())),
        );
        Ok(card)
    }

    /// Activates a pending card with its PIN.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless `PendingActivation`, `InvalidCredential` on PIN
    /// mismatch.
    pub fn activate(&self, card_id: CardId, pin: &str) -> Result<Card, CardError> {
        let card = self.store.with_tx(|tx| {
            let mut card = tx.card(card_id)?;
            if card.status != CardStatus::PendingActivation {
                return Err(CardError::InvalidState {
                    status: card.status,
                });
            }
            if !auth::verify_pin(pin, &card.pin_hash)? {
                return Err(CardError::InvalidCredential);
            }
            card.status = CardStatus::Active;
            card.activated_at = Some(Utc::now());
            tx.put_card(card.clone());
            Ok::<_, CardError>(card)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_ACTIVATED", "Card", card.id, "SECURITY")
                .actor(card.owner)
                .severity(AuditSeverity::Medium)
                .description(format!("Card activated: {}", card.masked_number())),
        );
        Ok(card)
    }

    /// Blocks a card.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the card is already blocked or cancelled.
    pub fn block(&self, card_id: CardId, reason: impl Into<String>) -> Result<Card, CardError> {
        let reason = reason.into();
        let card = self.store.with_tx(|tx| {
            let mut card = tx.card(card_id)?;
            if matches!(card.status, CardStatus::Blocked | CardStatus::Cancelled) {
                return Err(CardError::InvalidState {
                    status: card.status,
                });
            }
            card.status = CardStatus::Blocked;
            card.blocked_at = Some(Utc::now());
            tx.put_card(card.clone());
            Ok::<_, CardError>(card)
        })?;

        tracing::warn!(card = %card.masked_number(), %reason, "card blocked");
        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_BLOCKED", "Card", card.id, "SECURITY")
                .actor(card.owner)
                .severity(AuditSeverity::High)
                .description(format!(
                    "Card blocked: {} - Reason: {reason}",
                    card.masked_number()
                )),
        );
        Ok(card)
    }

    /// Unblocks a blocked card.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the card is `Blocked`.
    pub fn unblock(&self, card_id: CardId) -> Result<Card, CardError> {
        let card = self.store.with_tx(|tx| {
            let mut card = tx.card(card_id)?;
            if card.status != CardStatus::Blocked {
                return Err(CardError::InvalidState {
                    status: card.status,
                });
            }
            card.status = CardStatus::Active;
            card.blocked_at = None;
            tx.put_card(card.clone());
            Ok::<_, CardError>(card)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_UNBLOCKED", "Card", card.id, "SECURITY")
                .actor(card.owner)
                .severity(AuditSeverity::Medium)
                .description(format!("Card unblocked: {}", card.masked_number())),
        );
        Ok(card)
    }

    /// Cancels a card. Terminal.
    ///
    /// # Errors
    ///
    /// `InvalidState` if the card is already cancelled.
    pub fn cancel(&self, card_id: CardId) -> Result<Card, CardError> {
        let card = self.store.with_tx(|tx| {
            let mut card = tx.card(card_id)?;
            if card.status == CardStatus::Cancelled {
                return Err(CardError::InvalidState {
                    status: card.status,
                });
            }
            card.status = CardStatus::Cancelled;
            tx.put_card(card.clone());
            Ok::<_, CardError>(card)
        })?;

        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_CANCELLED", "Card", card.id, "SECURITY")
                .actor(card.owner)
                .severity(AuditSeverity::Medium)
                .description(format!("Card cancelled: {}", card.masked_number())),
        );
        Ok(card)
    }

    /// Authorizes a purchase on a card.
    ///
    /// Debit and prepaid cards debit the linked account through the ledger
    /// engine and write a ledger transaction; credit cards draw down the
    /// credit line. Either way one completed `CardTransaction` with a
    /// generated authorization code is written in the same unit of work.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the card is `Active`; `Expired` past the expiry
    /// date; `InvalidAmount` for a non-positive amount; `LimitExceeded` over
    /// the daily limit; `InsufficientFunds` (debit/prepaid) or
    /// `InsufficientCredit` (credit) when cover is missing.
    pub fn authorize(
        &self,
        card_number: &str,
        amount: Decimal,
        merchant: MerchantInfo,
        flags: AuthorizationFlags,
    ) -> Result<CardTransaction, CardError> {
        let amount = round_money(amount);

        let (record, card) = self.store.with_tx(|tx| {
            let mut card = tx.card_by_number(card_number)?;
            if card.status != CardStatus::Active {
                return Err(CardError::InvalidState {
                    status: card.status,
                });
            }
            let today = Utc::now().date_naive();
            if card.is_expired(today) {
                return Err(CardError::Expired {
                    expired_on: card.expiry_date,
                });
            }
            if amount <= Decimal::ZERO {
                return Err(CardError::Ledger(LedgerError::InvalidAmount));
            }
            if amount > card.daily_limit {
                return Err(CardError::LimitExceeded {
                    amount,
                    limit: card.daily_limit,
                });
            }

            let reference = reference::unique(
                || self.references.transaction_reference(),
                |candidate| tx.transaction_reference_exists(candidate),
            )?;
            let now = Utc::now();

            match card.card_type {
                CardType::Debit | CardType::Prepaid => {
                    let mut account = tx.account(card.account)?;
                    if !account.can_cover(amount) {
                        return Err(CardError::InsufficientFunds {
                            available: account.available_balance,
                            requested: amount,
                        });
                    }
                    account.debit(amount)?;
                    tx.put_transaction(Transaction {
                        id: TransactionId::new(),
                        reference: reference.clone(),
                        transaction_type: TransactionType::CardPayment,
                        amount,
                        status: TransactionStatus::Completed,
                        from_account: Some(account.id),
                        to_account: None,
                        running_balance: account.balance,
                        description: format!("Card purchase at {}", merchant.name),
                        created_at: now,
                        processed_at: Some(now),
                    });
                    tx.put_account(account);
                }
                CardType::Credit => {
                    let available = card.available_credit.unwrap_or_default();
                    if available < amount {
                        return Err(CardError::InsufficientCredit {
                            available,
                            requested: amount,
                        });
                    }
                    card.available_credit = Some(available - amount);
                }
            }

            let record = CardTransaction {
                id: CardTransactionId::new(),
                reference,
                card: card.id,
                amount,
                merchant: merchant.clone(),
                status: TransactionStatus::Completed,
                authorization_code: self.references.authorization_code(),
                flags,
                created_at: now,
                processed_at: Some(now),
            };
            tx.put_card(card.clone());
            tx.put_card_transaction(record.clone());
            Ok::<_, CardError>((record, card))
        })?;

        tracing::info!(
            card = %card.masked_number(),
            %amount,
            authorization = %record.authorization_code,
            "card transaction authorized"
        );
        audit::emit(
            &*self.audit,
            AuditEvent::new("CARD_TRANSACTION", "CardTransaction", record.id, "CARD")
                .actor(card.owner)
                .description(format!(
                    "Card transaction: {amount} at {}",
                    record.merchant.name
                )),
        );
        Ok(record)
    }

    /// Loads a card by id.
    pub fn card(&self, id: CardId) -> Result<Card, CardError> {
        self.store.with_tx(|tx| tx.card(id).map_err(Into::into))
    }

    /// Authorizations made with a card, oldest first.
    pub fn transactions(&self, id: CardId) -> Result<Vec<CardTransaction>, CardError> {
        self.store
            .with_tx(|tx| Ok(tx.card_transactions_for(id)))
    }
}
