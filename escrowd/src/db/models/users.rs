use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Database entity model for a user and their credit ledger fields.
///
/// `credits + pending_credits` is conserved by every escrow operation except
/// commit, which moves value out of `pending_credits` into `credits_spent`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: UserId,
    pub email: String,
    pub credits: i64,
    pub pending_credits: i64,
    pub credits_spent: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub initial_credits: i64,
}
