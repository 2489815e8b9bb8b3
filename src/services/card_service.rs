//! Card service - card lifecycle and funds transfers.
//!
//! This service handles:
//! - Card issuance, status changes and hard deletes (admin)
//! - Paged card listings and total balance (card holder)
//! - Block requests
//! - Atomic transfers between two cards
//!
//! # Atomicity Guarantees
//!
//! A transfer runs inside one PostgreSQL transaction. Both card rows are
//! locked with `FOR UPDATE` before any check is made, always in ascending id
//! order, so concurrent transfers touching the same card are serialized and
//! two opposite transfers cannot deadlock.

use chrono::Utc;
use rust_decimal::Decimal;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    db::DbPool,
    error::AppError,
    models::card::{
        BlockCardRequest, BlockCardResponse, CARD_COLUMNS, Card, CardStatus, CreateCardRequest,
        PageParams, apply_transfer, check_transfer, fits_balance_column, is_valid_card_number,
        validate_transfer_amount,
    },
    services::user_service,
};

const MAX_REASON_LEN: usize = 255;
const MAX_COMMENT_LEN: usize = 500;

/// Issue a new card to an existing user. New cards start ACTIVE.
///
/// # Errors
///
/// - `BadRequest`: malformed or duplicate number, past expiry, negative balance
/// - `NotFound`: owning user does not exist
pub async fn create_card(pool: &DbPool, request: CreateCardRequest) -> Result<Card, AppError> {
    let card_number = request.card_number.trim();
    if !is_valid_card_number(card_number) {
        return Err(AppError::bad_request("Card number must be exactly 16 digits"));
    }
    if request.expiration_date <= Utc::now().date_naive() {
        return Err(AppError::bad_request("Expiration date must be in the future"));
    }
    if request.balance.is_sign_negative() {
        return Err(AppError::bad_request("Balance must be positive or zero"));
    }
    if !fits_balance_column(request.balance) {
        return Err(AppError::bad_request(
            "Balance must have at most 2 decimal places and fit the balance range",
        ));
    }

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)")
        .bind(request.user_id)
        .fetch_one(pool)
        .await?;
    if !user_exists {
        return Err(AppError::not_found(format!(
            "User with id {} not found",
            request.user_id
        )));
    }

    let number_taken: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cards WHERE card_number = $1)")
            .bind(card_number)
            .fetch_one(pool)
            .await?;
    if number_taken {
        return Err(AppError::bad_request("Card number is already in use"));
    }

    let card_id: Uuid = sqlx::query_scalar(
        r#"
        INSERT INTO cards (card_number, expiration_date, balance, status, user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING id
        "#,
    )
    .bind(card_number)
    .bind(request.expiration_date)
    .bind(request.balance)
    .bind(CardStatus::Active.as_str())
    .bind(request.user_id)
    .fetch_one(pool)
    .await
    .map_err(|err| match err {
        sqlx::Error::Database(ref db) if db.is_unique_violation() => {
            AppError::bad_request("Card number is already in use")
        }
        other => AppError::Database(other),
    })?;

    tracing::info!(%card_id, user_id = %request.user_id, "card created");
    get_card(pool, card_id).await
}

/// Get card by ID, or `NotFound`.
pub async fn get_card(pool: &DbPool, card_id: Uuid) -> Result<Card, AppError> {
    find_card(pool, card_id)
        .await?
        .ok_or_else(|| AppError::not_found(format!("Card {} not found", card_id)))
}

async fn find_card(pool: &DbPool, card_id: Uuid) -> Result<Option<Card>, AppError> {
    let card = sqlx::query_as::<_, Card>(&format!(
        "SELECT {CARD_COLUMNS} FROM cards c JOIN users u ON u.id = c.user_id WHERE c.id = $1"
    ))
    .bind(card_id)
    .fetch_optional(pool)
    .await?;

    Ok(card)
}

/// Every card in the system (admin view).
pub async fn list_all_cards(pool: &DbPool) -> Result<Vec<Card>, AppError> {
    let cards = sqlx::query_as::<_, Card>(&format!(
        "SELECT {CARD_COLUMNS} FROM cards c JOIN users u ON u.id = c.user_id ORDER BY c.created_at"
    ))
    .fetch_all(pool)
    .await?;

    Ok(cards)
}

/// One page of the caller's cards, newest id first, plus the total count.
pub async fn list_user_cards(
    pool: &DbPool,
    email: &str,
    params: PageParams,
) -> Result<(Vec<Card>, i64), AppError> {
    ensure_holder_exists(pool, email).await?;

    let cards = sqlx::query_as::<_, Card>(&format!(
        r#"
        SELECT {CARD_COLUMNS}
        FROM cards c JOIN users u ON u.id = c.user_id
        WHERE u.email = $1
        ORDER BY c.id DESC
        LIMIT $2 OFFSET $3
        "#
    ))
    .bind(email)
    .bind(i64::from(params.limit()))
    .bind(params.offset())
    .fetch_all(pool)
    .await?;

    let total: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM cards c JOIN users u ON u.id = c.user_id WHERE u.email = $1",
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok((cards, total))
}

/// Sum of the balances of all the caller's cards.
pub async fn total_balance(pool: &DbPool, email: &str) -> Result<Decimal, AppError> {
    ensure_holder_exists(pool, email).await?;

    let total: Decimal = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(c.balance), 0)
        FROM cards c JOIN users u ON u.id = c.user_id
        WHERE u.email = $1
        "#,
    )
    .bind(email)
    .fetch_one(pool)
    .await?;

    Ok(total)
}

/// A token can outlive its user; such callers get `NotFound`, not an empty view.
async fn ensure_holder_exists(pool: &DbPool, email: &str) -> Result<(), AppError> {
    match user_service::find_by_email(pool, email).await? {
        Some(_) => Ok(()),
        None => Err(AppError::not_found(format!("User with email {} not found", email))),
    }
}

/// Set a card's status (admin action).
pub async fn update_card_status(
    pool: &DbPool,
    card_id: Uuid,
    status: CardStatus,
) -> Result<Card, AppError> {
    let updated = sqlx::query("UPDATE cards SET status = $1, updated_at = NOW() WHERE id = $2")
        .bind(status.as_str())
        .bind(card_id)
        .execute(pool)
        .await?
        .rows_affected();

    if updated == 0 {
        return Err(AppError::not_found(format!("Card {} not found", card_id)));
    }

    tracing::info!(%card_id, %status, "card status updated");
    get_card(pool, card_id).await
}

/// Hard-delete a card after checking it exists.
pub async fn delete_card(pool: &DbPool, card_id: Uuid) -> Result<(), AppError> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cards WHERE id = $1)")
        .bind(card_id)
        .fetch_one(pool)
        .await?;

    if !exists {
        return Err(AppError::not_found(format!("Card with id {} not found", card_id)));
    }

    sqlx::query("DELETE FROM cards WHERE id = $1")
        .bind(card_id)
        .execute(pool)
        .await?;

    tracing::info!(%card_id, "card deleted");
    Ok(())
}

/// Accept a card holder's request to block one of their cards.
///
/// The status is left untouched; an administrator applies the block.
pub async fn request_block(
    pool: &DbPool,
    email: &str,
    card_id: Uuid,
    request: BlockCardRequest,
) -> Result<BlockCardResponse, AppError> {
    let reason_len = request.reason.trim().chars().count();
    if reason_len == 0 || reason_len > MAX_REASON_LEN {
        return Err(AppError::bad_request(format!(
            "Block reason must be between 1 and {} characters",
            MAX_REASON_LEN
        )));
    }
    if let Some(ref comment) = request.comment {
        if comment.chars().count() > MAX_COMMENT_LEN {
            return Err(AppError::bad_request(format!(
                "Comment must not exceed {} characters",
                MAX_COMMENT_LEN
            )));
        }
    }

    let card = get_card(pool, card_id).await?;
    if card.owner_email != email {
        return Err(AppError::bad_request("Card does not belong to this user"));
    }
    if card.is_blocked() {
        return Err(AppError::bad_request("Card is already blocked"));
    }

    let request_id = format!("{}-{}", Utc::now().timestamp_millis(), card_id);
    tracing::info!(
        %card_id,
        %request_id,
        reason = %request.reason.trim(),
        "card block requested"
    );

    Ok(BlockCardResponse {
        status: "pending".to_string(),
        message: "Card block request accepted for processing".to_string(),
        request_id,
        card_id,
        user_id: card.user_id,
    })
}

/// Transfer funds between two cards on behalf of `initiator_email`.
///
/// # Process
///
/// 1. Reject non-positive or sub-cent amounts and same-card transfers
/// 2. Start database transaction
/// 3. Lock both cards (ascending id order)
/// 4. Run the ordered precondition checks
/// 5. Write both new balances
/// 6. Commit (or rollback on error)
///
/// # Errors
///
/// - `NotFound`: either card does not exist
/// - `BadRequest`: ownership mismatch, blocked card, insufficient funds,
///   non-positive or sub-cent amount, same card on both sides
pub async fn transfer(
    pool: &DbPool,
    initiator_email: &str,
    from_card_id: Uuid,
    to_card_id: Uuid,
    amount: Decimal,
) -> Result<String, AppError> {
    validate_transfer_amount(amount)?;
    if from_card_id == to_card_id {
        return Err(AppError::bad_request("Cannot transfer to the same card"));
    }

    let mut tx = pool.begin().await?;

    // Lock order is by id, not by role in the transfer.
    let (first, second) = if from_card_id < to_card_id {
        (from_card_id, to_card_id)
    } else {
        (to_card_id, from_card_id)
    };
    let first_card = lock_card(&mut tx, first).await?;
    let second_card = lock_card(&mut tx, second).await?;
    let (from, to) = if first == from_card_id {
        (first_card, second_card)
    } else {
        (second_card, first_card)
    };

    let (from, to) = match check_transfer(initiator_email, from.as_ref(), to.as_ref(), amount) {
        Ok(cards) => cards,
        Err(err) => {
            tx.rollback().await?;
            tracing::info!(
                %from_card_id,
                %to_card_id,
                reason = %err,
                "transfer rejected"
            );
            return Err(err);
        }
    };

    let outcome = apply_transfer(from.balance, to.balance, amount)?;

    for (card_id, balance) in [
        (from.id, outcome.from_balance),
        (to.id, outcome.to_balance),
    ] {
        sqlx::query("UPDATE cards SET balance = $1, updated_at = NOW() WHERE id = $2")
            .bind(balance)
            .bind(card_id)
            .execute(&mut *tx)
            .await?;
    }

    // Commit both balance updates atomically
    tx.commit().await?;

    tracing::info!(%from_card_id, %to_card_id, %amount, "transfer completed");
    Ok(format!("Transfer of {} completed", amount))
}

async fn lock_card(
    tx: &mut Transaction<'_, Postgres>,
    card_id: Uuid,
) -> Result<Option<Card>, AppError> {
    let card = sqlx::query_as::<_, Card>(&format!(
        r#"
        SELECT {CARD_COLUMNS}
        FROM cards c JOIN users u ON u.id = c.user_id
        WHERE c.id = $1
        FOR UPDATE OF c
        "#
    ))
    .bind(card_id)
    .fetch_optional(&mut **tx)
    .await?;

    Ok(card)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::str::FromStr;
    use tokio::task::JoinSet;

    const ALICE: &str = "alice@example.com";
    const BOB: &str = "bob@example.com";

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    async fn insert_user(pool: &DbPool, email: &str) -> Uuid {
        sqlx::query_scalar(
            r#"
            INSERT INTO users (email, phone_number, password_hash, first_name, last_name, role, birth_date)
            VALUES ($1, '+70000000000', 'unused', 'Test', 'Holder', 'USER', '1990-01-15')
            RETURNING id
            "#,
        )
        .bind(email)
        .fetch_one(pool)
        .await
        .unwrap()
    }

    async fn issue_card(pool: &DbPool, user_id: Uuid, number: &str, balance: &str) -> Uuid {
        let request = CreateCardRequest {
            card_number: number.to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
            balance: dec(balance),
            user_id,
        };
        create_card(pool, request).await.unwrap().id
    }

    async fn balance_of(pool: &DbPool, card_id: Uuid) -> Decimal {
        sqlx::query_scalar("SELECT balance FROM cards WHERE id = $1")
            .bind(card_id)
            .fetch_one(pool)
            .await
            .unwrap()
    }

    /// Alice holds 1000.00, Bob holds 500.00.
    async fn two_holders(pool: &DbPool) -> (Uuid, Uuid) {
        let alice = insert_user(pool, ALICE).await;
        let bob = insert_user(pool, BOB).await;
        let from = issue_card(pool, alice, "1111222233334444", "1000.00").await;
        let to = issue_card(pool, bob, "5555666677778888", "500.00").await;
        (from, to)
    }

    #[sqlx::test]
    async fn transfer_is_persisted(pool: DbPool) {
        let (from, to) = two_holders(&pool).await;

        let message = transfer(&pool, ALICE, from, to, dec("200.00")).await.unwrap();

        assert_eq!(message, "Transfer of 200.00 completed");
        assert_eq!(balance_of(&pool, from).await, dec("800.00"));
        assert_eq!(balance_of(&pool, to).await, dec("700.00"));
    }

    #[sqlx::test]
    async fn rejected_transfers_leave_balances_unchanged(pool: DbPool) {
        let (from, to) = two_holders(&pool).await;

        for amount in ["1000.01", "0.005"] {
            let err = transfer(&pool, ALICE, from, to, dec(amount)).await.unwrap_err();
            assert!(matches!(err, AppError::BadRequest(_)), "{amount}: {err:?}");
        }
        let err = transfer(&pool, BOB, from, to, dec("1.00")).await.unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));

        assert_eq!(balance_of(&pool, from).await, dec("1000.00"));
        assert_eq!(balance_of(&pool, to).await, dec("500.00"));
    }

    #[sqlx::test]
    async fn missing_card_is_not_found(pool: DbPool) {
        let (from, _) = two_holders(&pool).await;

        let err = transfer(&pool, ALICE, from, Uuid::new_v4(), dec("1.00"))
            .await
            .unwrap_err();

        assert!(matches!(err, AppError::NotFound(_)));
        assert_eq!(balance_of(&pool, from).await, dec("1000.00"));
    }

    #[sqlx::test]
    async fn opposite_transfers_run_concurrently_and_conserve_funds(pool: DbPool) {
        let (alice_card, bob_card) = two_holders(&pool).await;

        let mut tasks = JoinSet::new();
        for _ in 0..10 {
            let pool_a = pool.clone();
            tasks.spawn(async move {
                transfer(&pool_a, ALICE, alice_card, bob_card, dec("10.00")).await
            });
            let pool_b = pool.clone();
            tasks.spawn(async move {
                transfer(&pool_b, BOB, bob_card, alice_card, dec("5.00")).await
            });
        }
        while let Some(joined) = tasks.join_next().await {
            joined.unwrap().unwrap();
        }

        let alice_balance = balance_of(&pool, alice_card).await;
        let bob_balance = balance_of(&pool, bob_card).await;
        assert_eq!(alice_balance, dec("950.00"));
        assert_eq!(bob_balance, dec("550.00"));
        assert_eq!(alice_balance + bob_balance, dec("1500.00"));
    }

    #[sqlx::test]
    async fn create_card_rejects_sub_cent_balance(pool: DbPool) {
        let alice = insert_user(&pool, ALICE).await;
        let request = CreateCardRequest {
            card_number: "1111222233334444".to_string(),
            expiration_date: NaiveDate::from_ymd_opt(2099, 12, 31).unwrap(),
            balance: dec("10.005"),
            user_id: alice,
        };

        let err = create_card(&pool, request).await.unwrap_err();

        assert!(matches!(err, AppError::BadRequest(_)));
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM cards")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(count, 0);
    }

    #[sqlx::test]
    async fn deleted_holder_gets_not_found(pool: DbPool) {
        two_holders(&pool).await;
        sqlx::query("DELETE FROM users WHERE email = $1")
            .bind(ALICE)
            .execute(&pool)
            .await
            .unwrap();

        let listed = list_user_cards(&pool, ALICE, PageParams::default()).await;
        let balance = total_balance(&pool, ALICE).await;

        assert!(matches!(listed, Err(AppError::NotFound(_))));
        assert!(matches!(balance, Err(AppError::NotFound(_))));

        let (cards, total) = list_user_cards(&pool, BOB, PageParams::default()).await.unwrap();
        assert_eq!(total, 1);
        assert_eq!(cards.len(), 1);
        assert_eq!(total_balance(&pool, BOB).await.unwrap(), dec("500.00"));
    }
}
