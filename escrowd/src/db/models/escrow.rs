use crate::types::{TransactionId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Reservation lifecycle state, stored as TEXT. `Pending` is the only
/// non-terminal state; a row never transitions out of `Spent` or `Refunded`.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Pending,
    Spent,
    Refunded,
}

/// The kind of generated resource a reservation pays for.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(type_name = "text", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ItemType {
    BookContent,
    BookCover,
    PieceContent,
}

impl ItemType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemType::BookContent => "book-content",
            ItemType::BookCover => "book-cover",
            ItemType::PieceContent => "piece-content",
        }
    }
}

/// One reservation lifecycle instance from the append-only transaction log.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CreditTransaction {
    pub id: TransactionId,
    pub user_id: UserId,
    pub amount: i64,
    pub status: TransactionStatus,
    pub reason: String,
    pub item_id: String,
    pub item_type: ItemType,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Database request for creating a new reservation
#[derive(Debug, Clone)]
pub struct ReservationCreateDBRequest {
    pub user_id: UserId,
    pub amount: i64,
    pub reason: String,
    pub item_id: String,
    pub item_type: ItemType,
}
