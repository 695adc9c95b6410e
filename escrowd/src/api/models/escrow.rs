use crate::{
    db::models::escrow::{CreditTransaction, ItemType, TransactionStatus},
    types::{TransactionId, UserId},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

// Request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationCreate {
    /// User the credits are reserved from
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    /// Credits to reserve (positive integer)
    pub amount: i64,
    /// Why credits are being reserved, e.g. "Generating book cover"
    pub reason: String,
    /// The resource the reservation pays for
    pub item_id: String,
    pub item_type: ItemType,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RefundRequest {
    /// Recorded on the transaction as refund_reason
    pub reason: String,
}

// Response models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct ReservationResponse {
    /// Transaction ID, used for commit/refund settlement calls
    #[schema(value_type = String, format = "uuid")]
    pub id: TransactionId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub amount: i64,
    pub status: TransactionStatus,
    pub reason: String,
    pub item_id: String,
    pub item_type: ItemType,
    pub refund_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Settlement deadline; past this the sweep may force-refund
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SweepResponse {
    /// Number of expired reservations refunded by this invocation
    pub refunded: usize,
}

// Conversions
impl From<CreditTransaction> for ReservationResponse {
    fn from(tx: CreditTransaction) -> Self {
        Self {
            id: tx.id,
            user_id: tx.user_id,
            amount: tx.amount,
            status: tx.status,
            reason: tx.reason,
            item_id: tx.item_id,
            item_type: tx.item_type,
            refund_reason: tx.refund_reason,
            created_at: tx.created_at,
            updated_at: tx.updated_at,
            expires_at: tx.expires_at,
        }
    }
}
