use crate::{db::models::users::User, types::UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub email: String,
    /// Starting spendable balance
    #[serde(default)]
    pub initial_credits: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub credits: i64,
    pub pending_credits: i64,
    pub credits_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            credits: user.credits,
            pending_credits: user.pending_credits,
            credits_spent: user.credits_spent,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}
