//! Card HTTP handlers.
//!
//! Admin endpoints:
//! - GET /cards/admin - List every card
//! - POST /cards - Issue a card
//! - PATCH /cards/{id}/status?status=BLOCKED - Change card status
//! - DELETE /cards/{id} - Delete a card
//!
//! Card holder endpoints:
//! - GET /cards/user?page=0&size=10 - Own cards, paginated
//! - GET /cards/balance - Total balance of own cards
//! - POST /cards/{id}/block-request - Ask for a card to be blocked
//! - POST /cards/transfer - Move funds between cards

use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use uuid::Uuid;

use crate::{
    app::AppState,
    error::AppError,
    middleware::auth::Principal,
    models::{
        auth::MessageResponse,
        card::{
            BalanceResponse, BlockCardRequest, BlockCardResponse, CardResponse, CreateCardRequest,
            Page, PageParams, StatusQuery, TransferRequest,
        },
    },
    services::card_service,
};

pub async fn list_all_cards(
    State(state): State<AppState>,
) -> Result<Json<Vec<CardResponse>>, AppError> {
    let cards = card_service::list_all_cards(&state.pool).await?;
    Ok(Json(cards.into_iter().map(Into::into).collect()))
}

/// Issue a new card.
///
/// # Request Body
///
/// ```json
/// {
///   "cardNumber": "1234567812345678",
///   "expirationDate": "2030-12-31",
///   "balance": "1000.00",
///   "userId": "123e4567-e89b-12d3-a456-426614174000"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the card with its number masked
/// - **Error (400)**: Invalid number, past expiry, negative balance
/// - **Error (404)**: Owner does not exist
pub async fn create_card(
    State(state): State<AppState>,
    Json(request): Json<CreateCardRequest>,
) -> Result<(StatusCode, Json<CardResponse>), AppError> {
    let card = card_service::create_card(&state.pool, request).await?;
    Ok((StatusCode::CREATED, Json(card.into())))
}

pub async fn update_card_status(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
    Query(query): Query<StatusQuery>,
) -> Result<Json<CardResponse>, AppError> {
    let card = card_service::update_card_status(&state.pool, card_id, query.status).await?;
    Ok(Json(card.into()))
}

pub async fn delete_card(
    State(state): State<AppState>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    card_service::delete_card(&state.pool, card_id).await?;
    Ok(Json(MessageResponse::new("Card deleted")))
}

/// List the caller's own cards, newest first.
pub async fn list_my_cards(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Query(params): Query<PageParams>,
) -> Result<Json<Page<CardResponse>>, AppError> {
    let (cards, total) = card_service::list_user_cards(&state.pool, &principal.email, params).await?;
    let content = cards.into_iter().map(Into::into).collect();
    Ok(Json(Page::new(content, params, total)))
}

pub async fn get_balance(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<BalanceResponse>, AppError> {
    let total_balance = card_service::total_balance(&state.pool, &principal.email).await?;
    Ok(Json(BalanceResponse { total_balance }))
}

pub async fn request_block(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Path(card_id): Path<Uuid>,
    Json(request): Json<BlockCardRequest>,
) -> Result<Json<BlockCardResponse>, AppError> {
    let response =
        card_service::request_block(&state.pool, &principal.email, card_id, request).await?;
    Ok(Json(response))
}

/// Transfer money between cards.
///
/// # Request Body
///
/// ```json
/// {
///   "fromCardId": "123e4567-e89b-12d3-a456-426614174000",
///   "toCardId": "123e4567-e89b-12d3-a456-426614174001",
///   "amount": "200.00"
/// }
/// ```
///
/// # Atomicity
///
/// Both cards are updated in a single database transaction.
/// Either both succeed or both fail.
pub async fn transfer(
    State(state): State<AppState>,
    Extension(principal): Extension<Principal>,
    Json(request): Json<TransferRequest>,
) -> Result<Json<MessageResponse>, AppError> {
    let message = card_service::transfer(
        &state.pool,
        &principal.email,
        request.from_card_id,
        request.to_card_id,
        request.amount,
    )
    .await?;

    Ok(Json(MessageResponse::new(message)))
}
