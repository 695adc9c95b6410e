use crate::db::errors::DbError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

pub type Result<T> = std::result::Result<T, Error>;

/// API-level errors. Reservation-time escrow failures map to user-visible
/// status codes; unexpected database faults collapse to 500 without leaking
/// internals.
#[derive(Debug, Error)]
pub enum Error {
    #[error("{resource} {id} not found")]
    NotFound { resource: String, id: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error(transparent)]
    Database(#[from] DbError),
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Error::NotFound { .. } => (StatusCode::NOT_FOUND, self.to_string()),
            Error::BadRequest { .. } => (StatusCode::BAD_REQUEST, self.to_string()),
            Error::Database(db_err) => match db_err {
                DbError::InvalidAmount { .. } => (StatusCode::BAD_REQUEST, db_err.to_string()),
                DbError::UserNotFound { .. } | DbError::TransactionNotFound { .. } => {
                    (StatusCode::NOT_FOUND, db_err.to_string())
                }
                DbError::InsufficientCredits { .. } => (StatusCode::PAYMENT_REQUIRED, db_err.to_string()),
                DbError::DuplicateReservation { .. } => (StatusCode::CONFLICT, db_err.to_string()),
                DbError::CheckViolation { .. } | DbError::UniqueViolation { .. } => {
                    (StatusCode::BAD_REQUEST, db_err.to_string())
                }
                DbError::Connection(e) => {
                    error!("Database error: {e}");
                    (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error".to_string())
                }
            },
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: Error) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_escrow_error_status_codes() {
        assert_eq!(status_of(Error::Database(DbError::InvalidAmount { amount: 0 })), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_of(Error::Database(DbError::UserNotFound {
                user_id: uuid::Uuid::new_v4()
            })),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(Error::Database(DbError::InsufficientCredits {
                required: 5,
                available: 3
            })),
            StatusCode::PAYMENT_REQUIRED
        );
        assert_eq!(
            status_of(Error::Database(DbError::DuplicateReservation {
                item_id: "item1".to_string(),
                item_type: "book-cover".to_string()
            })),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(Error::Database(DbError::TransactionNotFound {
                transaction_id: uuid::Uuid::new_v4()
            })),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn test_insufficient_credits_message_includes_both_figures() {
        let err = DbError::InsufficientCredits {
            required: 5,
            available: 3,
        };
        let message = err.to_string();
        assert!(message.contains('5'));
        assert!(message.contains('3'));
    }
}
