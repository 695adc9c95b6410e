use crate::{
    api::models::escrow::{RefundRequest, ReservationCreate, ReservationResponse, SweepResponse},
    db::{handlers::Escrow, models::escrow::ReservationCreateDBRequest},
    errors::{Error, Result},
    types::TransactionId,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

/// Reserve credits for a generation attempt
#[utoipa::path(
    post,
    path = "/reservations",
    tag = "reservations",
    summary = "Reserve credits",
    description = "Move credits from the user's spendable balance into escrow before a paid AI-generation operation starts. At most one live reservation per (user, item) is allowed.",
    request_body = ReservationCreate,
    responses(
        (status = 201, description = "Reservation created", body = ReservationResponse),
        (status = 400, description = "Bad request - amount must be a positive integer"),
        (status = 402, description = "Insufficient credits"),
        (status = 404, description = "User not found"),
        (status = 409, description = "A pending reservation already exists for this item"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_reservation(
    State(state): State<AppState>,
    Json(data): Json<ReservationCreate>,
) -> Result<(StatusCode, Json<ReservationResponse>)> {
    // Validate amount is positive (the escrow handler re-checks before any query)
    if data.amount <= 0 {
        return Err(Error::BadRequest {
            message: "Amount must be greater than zero".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut escrow = Escrow::new(&mut conn).with_grace_period(state.config.escrow.grace_period);

    let db_request = ReservationCreateDBRequest {
        user_id: data.user_id,
        amount: data.amount,
        reason: data.reason,
        item_id: data.item_id,
        item_type: data.item_type,
    };

    let transaction = escrow.reserve(&db_request).await?;

    Ok((StatusCode::CREATED, Json(ReservationResponse::from(transaction))))
}

/// Commit a reservation
#[utoipa::path(
    post,
    path = "/reservations/{transaction_id}/commit",
    tag = "reservations",
    summary = "Commit a reservation",
    description = "Settle a reservation as spent after the generation succeeded. Committing a transaction that is no longer pending is a safe no-op.",
    params(
        ("transaction_id" = String, Path, description = "Transaction ID returned by the reservation"),
    ),
    responses(
        (status = 204, description = "Reservation settled (or already settled)"),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn commit_reservation(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut escrow = Escrow::new(&mut conn);

    escrow.commit(transaction_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Refund a reservation
#[utoipa::path(
    post,
    path = "/reservations/{transaction_id}/refund",
    tag = "reservations",
    summary = "Refund a reservation",
    description = "Return a reservation's escrowed credits after the generation failed. Refunding a transaction that is no longer pending is a safe no-op and never double-returns credits.",
    params(
        ("transaction_id" = String, Path, description = "Transaction ID returned by the reservation"),
    ),
    request_body = RefundRequest,
    responses(
        (status = 204, description = "Reservation refunded (or already settled)"),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn refund_reservation(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
    Json(data): Json<RefundRequest>,
) -> Result<StatusCode> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut escrow = Escrow::new(&mut conn);

    escrow.refund(transaction_id, &data.reason).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Get a reservation
#[utoipa::path(
    get,
    path = "/reservations/{transaction_id}",
    tag = "reservations",
    summary = "Get a reservation",
    description = "Diagnostic lookup of a credit transaction by its ID.",
    params(
        ("transaction_id" = String, Path, description = "Transaction ID"),
    ),
    responses(
        (status = 200, description = "Transaction details", body = ReservationResponse),
        (status = 404, description = "Transaction not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_reservation(
    State(state): State<AppState>,
    Path(transaction_id): Path<TransactionId>,
) -> Result<Json<ReservationResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut escrow = Escrow::new(&mut conn);

    let transaction = escrow.get(transaction_id).await?.ok_or_else(|| Error::NotFound {
        resource: "Transaction".to_string(),
        id: transaction_id.to_string(),
    })?;

    Ok(Json(ReservationResponse::from(transaction)))
}

/// Sweep expired reservations
#[utoipa::path(
    post,
    path = "/maintenance/sweep",
    tag = "maintenance",
    summary = "Sweep expired reservations",
    description = "Force-refund reservations left pending past their grace window. Intended to be called by an external periodic scheduler; safe to invoke repeatedly and concurrently.",
    responses(
        (status = 200, description = "Sweep completed", body = SweepResponse),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn sweep_reservations(State(state): State<AppState>) -> Result<Json<SweepResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut escrow = Escrow::new(&mut conn);

    let refunded = escrow.sweep_expired(state.config.escrow.sweep_batch_size).await?;

    Ok(Json(SweepResponse { refunded }))
}
