use crate::{
    api::models::users::{UserCreate, UserResponse},
    db::{handlers::Users, models::users::UserCreateDBRequest},
    errors::{Error, Result},
    types::UserId,
    AppState,
};
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
};

/// Create a user
#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create a user",
    description = "Create a user account with an optional initial credit grant.",
    request_body = UserCreate,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Bad request - duplicate email or negative grant"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn create_user(
    State(state): State<AppState>,
    Json(data): Json<UserCreate>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users
        .create(&UserCreateDBRequest {
            email: data.email,
            initial_credits: data.initial_credits,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Get a user
#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    summary = "Get a user",
    description = "Get a user's credit ledger fields: spendable, escrowed and cumulative spent balances.",
    params(
        ("user_id" = String, Path, description = "User ID"),
    ),
    responses(
        (status = 200, description = "User information", body = UserResponse),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    )
)]
pub async fn get_user(State(state): State<AppState>, Path(user_id): Path<UserId>) -> Result<Json<UserResponse>> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut users = Users::new(&mut conn);

    let user = users.get_by_id(user_id).await?.ok_or_else(|| Error::NotFound {
        resource: "User".to_string(),
        id: user_id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}
