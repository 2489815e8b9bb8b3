//! Card data models, API request/response types and transfer rules.
//!
//! This module defines:
//! - `CardStatus`: lifecycle state of a card
//! - `Card`: database entity joined with its owner's identity
//! - Request/response bodies for the card endpoints
//! - `check_transfer` / `apply_transfer`: the pure part of a funds transfer
//!
//! # Balance Storage
//!
//! Balances are `NUMERIC(19, 2)` in PostgreSQL and [`Decimal`] in Rust, so no
//! floating-point rounding ever touches money.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::UnknownVariant;

/// Lifecycle state of a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CardStatus {
    Active,
    Blocked,
    Expired,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "ACTIVE",
            CardStatus::Blocked => "BLOCKED",
            CardStatus::Expired => "EXPIRED",
        }
    }
}

impl fmt::Display for CardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CardStatus {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ACTIVE" => Ok(CardStatus::Active),
            "BLOCKED" => Ok(CardStatus::Blocked),
            "EXPIRED" => Ok(CardStatus::Expired),
            other => Err(UnknownVariant {
                kind: "card status",
                value: other.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for CardStatus {
    type Error = UnknownVariant;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// Columns selected for every card read, joined with the owning user.
///
/// Kept in one place so all queries decode into [`Card`] the same way.
pub const CARD_COLUMNS: &str = r#"
    c.id, c.card_number, c.expiration_date, c.balance, c.status, c.user_id,
    u.email AS owner_email,
    u.first_name || ' ' || u.last_name AS card_holder,
    c.created_at, c.updated_at
"#;

/// Represents a card record from the database.
///
/// Maps to the `cards` table joined with `users`, so the owner's email
/// (used for ownership checks) and full name (shown as the holder) come
/// along with every read.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Card {
    pub id: Uuid,

    /// Full 16-digit number. Never serialized; see [`Card::masked_number`].
    pub card_number: String,

    pub expiration_date: NaiveDate,

    /// Current balance. Must be >= 0 (also enforced by a CHECK constraint).
    pub balance: Decimal,

    #[sqlx(try_from = "String")]
    pub status: CardStatus,

    pub user_id: Uuid,
    pub owner_email: String,
    pub card_holder: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Card {
    /// Display form showing only the last four digits.
    pub fn masked_number(&self) -> String {
        mask_card_number(&self.card_number)
    }

    pub fn is_blocked(&self) -> bool {
        self.status == CardStatus::Blocked
    }
}

/// Masks a card number as `**** **** **** 1234`.
///
/// Anything shorter than four characters is masked completely.
pub fn mask_card_number(card_number: &str) -> String {
    let digits = card_number.trim();
    let tail = match digits.char_indices().rev().nth(3) {
        Some((idx, _)) => &digits[idx..],
        None => "****",
    };
    format!("**** **** **** {}", tail)
}

/// Returns true for exactly sixteen ASCII digits.
pub fn is_valid_card_number(card_number: &str) -> bool {
    card_number.len() == 16 && card_number.bytes().all(|b| b.is_ascii_digit())
}

/// Validates a transfer against the loaded source and destination cards.
///
/// Checks run in a fixed order and the first failure wins:
///
/// 1. source card exists
/// 2. source card belongs to the initiator
/// 3. destination card exists
/// 4. source card is not blocked
/// 5. destination card is not blocked
/// 6. source balance covers the amount
///
/// On success both cards are returned so the caller can apply the transfer.
pub fn check_transfer<'a>(
    initiator_email: &str,
    from: Option<&'a Card>,
    to: Option<&'a Card>,
    amount: Decimal,
) -> Result<(&'a Card, &'a Card), AppError> {
    let from = from.ok_or_else(|| AppError::not_found("Source card not found"))?;

    if from.owner_email != initiator_email {
        return Err(AppError::bad_request(
            "Source card does not belong to this user",
        ));
    }

    let to = to.ok_or_else(|| AppError::not_found("Destination card not found"))?;

    if from.is_blocked() {
        return Err(AppError::bad_request("Source card is blocked"));
    }
    if to.is_blocked() {
        return Err(AppError::bad_request("Destination card is blocked"));
    }
    if from.balance < amount {
        return Err(AppError::bad_request("Insufficient funds on the card"));
    }

    Ok((from, to))
}

/// Digits after the decimal point in a stored balance.
pub const MONEY_SCALE: u32 = 2;

/// Largest value a `NUMERIC(19, 2)` balance column holds.
pub fn max_balance() -> Decimal {
    Decimal::from_i128_with_scale(9_999_999_999_999_999_999, MONEY_SCALE)
}

/// Whether `value` is representable in a balance column without rounding.
pub fn fits_balance_column(value: Decimal) -> bool {
    value == value.round_dp(MONEY_SCALE) && value.abs() <= max_balance()
}

/// Boundary check on a transfer amount, run before any card is loaded.
///
/// The amount must be positive and whole cents, so debit and credit are
/// stored exactly as computed.
pub fn validate_transfer_amount(amount: Decimal) -> Result<(), AppError> {
    if amount <= Decimal::ZERO {
        return Err(AppError::bad_request("Transfer amount must be positive"));
    }
    if !fits_balance_column(amount) {
        return Err(AppError::bad_request(
            "Transfer amount must have at most 2 decimal places",
        ));
    }
    Ok(())
}

/// New balances after moving `amount` from one card to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub from_balance: Decimal,
    pub to_balance: Decimal,
}

/// Computes the post-transfer balances.
///
/// Only call after [`check_transfer`] succeeded; a debit that would take the
/// source below zero is reported as insufficient funds rather than applied.
pub fn apply_transfer(
    from_balance: Decimal,
    to_balance: Decimal,
    amount: Decimal,
) -> Result<TransferOutcome, AppError> {
    let from_balance = from_balance
        .checked_sub(amount)
        .filter(|b| !b.is_sign_negative())
        .ok_or_else(|| AppError::bad_request("Insufficient funds on the card"))?;
    let to_balance = to_balance
        .checked_add(amount)
        .filter(|b| *b <= max_balance())
        .ok_or_else(|| AppError::bad_request("Resulting balance is out of range"))?;

    Ok(TransferOutcome {
        from_balance,
        to_balance,
    })
}

/// Request body for `POST /cards`.
///
/// ```json
/// {
///   "cardNumber": "1234567812345678",
///   "expirationDate": "2030-12-31",
///   "balance": "1000.00",
///   "userId": "123e4567-e89b-12d3-a456-426614174000"
/// }
/// ```
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCardRequest {
    pub card_number: String,
    pub expiration_date: NaiveDate,
    pub balance: Decimal,
    pub user_id: Uuid,
}

/// Query string of `PATCH /cards/{id}/status?status=BLOCKED`.
#[derive(Debug, Deserialize)]
pub struct StatusQuery {
    pub status: CardStatus,
}

/// Request body for `POST /cards/transfer`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub from_card_id: Uuid,
    pub to_card_id: Uuid,
    pub amount: Decimal,
}

/// Request body for `POST /cards/{id}/block-request`.
#[derive(Debug, Deserialize)]
pub struct BlockCardRequest {
    pub reason: String,
    pub comment: Option<String>,
}

/// Response of a block request. The block itself is applied later by an admin.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BlockCardResponse {
    pub status: String,
    pub message: String,
    pub request_id: String,
    pub card_id: Uuid,
    pub user_id: Uuid,
}

/// Page selector for `GET /cards/user`.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PageParams {
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}

fn default_page_size() -> u32 {
    10
}

impl Default for PageParams {
    fn default() -> Self {
        Self {
            page: 0,
            size: default_page_size(),
        }
    }
}

impl PageParams {
    pub const MAX_SIZE: u32 = 100;

    /// Page size clamped to `1..=MAX_SIZE`.
    pub fn limit(&self) -> u32 {
        self.size.clamp(1, Self::MAX_SIZE)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page) * i64::from(self.limit())
    }
}

/// One page of results.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub content: Vec<T>,
    pub page: u32,
    pub size: u32,
    pub total_elements: i64,
    pub total_pages: i64,
}

impl<T> Page<T> {
    pub fn new(content: Vec<T>, params: PageParams, total_elements: i64) -> Self {
        let size = params.limit();
        let total_pages = (total_elements + i64::from(size) - 1) / i64::from(size);
        Self {
            content,
            page: params.page,
            size,
            total_elements,
            total_pages,
        }
    }
}

/// Total balance of the caller's cards.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceResponse {
    pub total_balance: Decimal,
}

/// Response body for card endpoints.
///
/// ```json
/// {
///   "id": "123e4567-e89b-12d3-a456-426614174000",
///   "maskedCardNumber": "**** **** **** 5678",
///   "cardHolder": "Ivan Petrov",
///   "expirationDate": "2030-12-31",
///   "balance": "1500.75",
///   "status": "ACTIVE"
/// }
/// ```
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardResponse {
    pub id: Uuid,
    pub masked_card_number: String,
    pub card_holder: String,
    pub expiration_date: NaiveDate,
    pub balance: Decimal,
    pub status: CardStatus,
}

/// Convert database Card to API CardResponse (hides the full number).
impl From<Card> for CardResponse {
    fn from(card: Card) -> Self {
        Self {
            masked_card_number: card.masked_number(),
            id: card.id,
            card_holder: card.card_holder,
            expiration_date: card.expiration_date,
            balance: card.balance,
            status: card.status,
        }
    }
}
