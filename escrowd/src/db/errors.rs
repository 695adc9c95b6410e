use crate::types::{TransactionId, UserId};
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DbError>;

/// Errors surfaced by the database handlers. Reservation-time failures are
/// user-visible and abort the attempt without partial writes; everything the
/// escrow protocol needs to report lives here.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("Reservation amount must be a positive number of credits, got {amount}")]
    InvalidAmount { amount: i64 },

    #[error("User {user_id} not found")]
    UserNotFound { user_id: UserId },

    #[error("Insufficient credits: required {required}, available {available}")]
    InsufficientCredits { required: i64, available: i64 },

    #[error("A pending reservation already exists for {item_type} {item_id}")]
    DuplicateReservation { item_id: String, item_type: String },

    #[error("Transaction {transaction_id} not found")]
    TransactionNotFound { transaction_id: TransactionId },

    #[error("Check constraint violation: {constraint}")]
    CheckViolation { constraint: String },

    #[error("Unique constraint violation: {constraint}")]
    UniqueViolation { constraint: String },

    #[error("Database error: {0}")]
    Connection(sqlx::Error),
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        if let sqlx::Error::Database(ref db_err) = err {
            let constraint = db_err.constraint().unwrap_or("unknown").to_string();
            match db_err.code().as_deref() {
                // check_violation
                Some("23514") => return DbError::CheckViolation { constraint },
                // unique_violation
                Some("23505") => return DbError::UniqueViolation { constraint },
                _ => {}
            }
        }
        DbError::Connection(err)
    }
}
