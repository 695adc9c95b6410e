use crate::{
    db::{
        errors::{DbError, Result},
        models::escrow::{CreditTransaction, ReservationCreateDBRequest, TransactionStatus},
    },
    types::{TransactionId, UserId},
};
use sqlx::{Connection, PgConnection};
use std::time::Duration;
use tracing::{error, trace, warn};

/// Grace window a caller gets to settle a reservation before the sweep is
/// allowed to force-refund it.
pub const DEFAULT_GRACE_PERIOD: Duration = Duration::from_secs(15 * 60);

/// Maximum number of stale reservations one sweep invocation processes.
pub const DEFAULT_SWEEP_BATCH_SIZE: i64 = 50;

const EXPIRED_RESERVATION_REASON: &str = "Auto-refunded: Transaction expired";

const TRANSACTION_COLUMNS: &str =
    "id, user_id, amount, status, reason, item_id, item_type, refund_reason, created_at, updated_at, expires_at";

/// The escrow state machine: reserve -> commit | refund, plus the sweep for
/// abandoned reservations. Every mutating operation runs inside one database
/// transaction, and these handlers are the only code path that writes the
/// users' credits / pending_credits / credits_spent fields.
pub struct Escrow<'c> {
    db: &'c mut PgConnection,
    grace_period: Duration,
}

/// Advisory lock key for serializing ledger mutations per user.
/// We use the first 8 bytes of the user UUID as the lock key.
fn user_lock_key(user_id: UserId) -> i64 {
    let bytes = user_id.as_bytes();
    i64::from_be_bytes([
        bytes[0], bytes[1], bytes[2], bytes[3], bytes[4], bytes[5], bytes[6], bytes[7],
    ])
}

impl<'c> Escrow<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self {
            db,
            grace_period: DEFAULT_GRACE_PERIOD,
        }
    }

    pub fn with_grace_period(mut self, grace_period: Duration) -> Self {
        self.grace_period = grace_period;
        self
    }

    /// Reserve credits for a generation attempt: move `amount` from the
    /// user's spendable balance into escrow and record a pending transaction.
    ///
    /// The reads (balance, duplicate check) and the three writes (transaction
    /// insert, credits decrement, pending_credits increment) happen inside one
    /// database transaction - either all apply or none do.
    pub async fn reserve(&mut self, request: &ReservationCreateDBRequest) -> Result<CreditTransaction> {
        // Rejected before any store access
        if request.amount <= 0 {
            return Err(DbError::InvalidAmount { amount: request.amount });
        }

        let mut tx = self.db.begin().await?;

        // Use pg_advisory_xact_lock which is transaction-scoped (auto-releases
        // on commit/rollback). This will BLOCK until the lock is available, so
        // concurrent reservations for the same user serialize here.
        sqlx::query_scalar::<_, i32>("SELECT 1 FROM (SELECT pg_advisory_xact_lock($1)) AS _")
            .bind(user_lock_key(request.user_id))
            .fetch_one(&mut *tx)
            .await?;

        trace!("Acquired lock for user_id {}", request.user_id);

        let available: i64 = sqlx::query_scalar("SELECT credits FROM users WHERE id = $1")
            .bind(request.user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(DbError::UserNotFound {
                user_id: request.user_id,
            })?;

        if available < request.amount {
            return Err(DbError::InsufficientCredits {
                required: request.amount,
                available,
            });
        }

        // At most one live reservation per (user, item). The partial unique
        // index backstops this check against a racing insert; a unique
        // violation on the INSERT below maps to the same error.
        let duplicate: Option<TransactionId> = sqlx::query_scalar(
            "SELECT id FROM credit_transactions
             WHERE user_id = $1 AND item_id = $2 AND item_type = $3 AND status = 'pending'",
        )
        .bind(request.user_id)
        .bind(&request.item_id)
        .bind(request.item_type)
        .fetch_optional(&mut *tx)
        .await?;

        if duplicate.is_some() {
            return Err(DbError::DuplicateReservation {
                item_id: request.item_id.clone(),
                item_type: request.item_type.as_str().to_string(),
            });
        }

        let transaction = sqlx::query_as::<_, CreditTransaction>(&format!(
            "INSERT INTO credit_transactions (user_id, amount, reason, item_id, item_type, expires_at)
             VALUES ($1, $2, $3, $4, $5, now() + make_interval(secs => $6))
             RETURNING {TRANSACTION_COLUMNS}"
        ))
        .bind(request.user_id)
        .bind(request.amount)
        .bind(&request.reason)
        .bind(&request.item_id)
        .bind(request.item_type)
        .bind(self.grace_period.as_secs_f64())
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| match DbError::from(e) {
            DbError::UniqueViolation { .. } => DbError::DuplicateReservation {
                item_id: request.item_id.clone(),
                item_type: request.item_type.as_str().to_string(),
            },
            other => other,
        })?;

        sqlx::query(
            "UPDATE users
             SET credits = credits - $1, pending_credits = pending_credits + $1, updated_at = now()
             WHERE id = $2",
        )
        .bind(request.amount)
        .bind(request.user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(transaction)
    }

    /// Settle a reservation as spent: the escrowed amount leaves
    /// pending_credits permanently and is added to the user's cumulative
    /// credits_spent counter.
    ///
    /// Committing a transaction that is no longer pending is a logged no-op,
    /// so duplicate settlement calls from the caller cannot corrupt the
    /// ledger. Once spent, a reservation can never be refunded.
    pub async fn commit(&mut self, transaction_id: TransactionId) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let reservation = sqlx::query_as::<_, CreditTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM credit_transactions WHERE id = $1 FOR UPDATE"
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::TransactionNotFound { transaction_id })?;

        if reservation.status != TransactionStatus::Pending {
            warn!(
                %transaction_id,
                status = ?reservation.status,
                "Ignoring commit of non-pending transaction"
            );
            return Ok(());
        }

        sqlx::query(
            "UPDATE users
             SET pending_credits = pending_credits - $1, credits_spent = credits_spent + $1, updated_at = now()
             WHERE id = $2",
        )
        .bind(reservation.amount)
        .bind(reservation.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE credit_transactions SET status = 'spent', updated_at = now() WHERE id = $1")
            .bind(transaction_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Return a reservation's escrowed amount to the user's spendable
    /// balance. Symmetric to [`Escrow::commit`]: refunding a transaction that
    /// is no longer pending is a logged no-op, so a refund racing a commit
    /// (or a duplicate refund) cannot return credits twice.
    pub async fn refund(&mut self, transaction_id: TransactionId, reason: &str) -> Result<()> {
        let mut tx = self.db.begin().await?;

        let reservation = sqlx::query_as::<_, CreditTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM credit_transactions WHERE id = $1 FOR UPDATE"
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or(DbError::TransactionNotFound { transaction_id })?;

        if reservation.status != TransactionStatus::Pending {
            warn!(
                %transaction_id,
                status = ?reservation.status,
                "Ignoring refund of non-pending transaction"
            );
            return Ok(());
        }

        sqlx::query(
            "UPDATE users
             SET credits = credits + $1, pending_credits = pending_credits - $1, updated_at = now()
             WHERE id = $2",
        )
        .bind(reservation.amount)
        .bind(reservation.user_id)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE credit_transactions SET status = 'refunded', refund_reason = $1, updated_at = now() WHERE id = $2",
        )
        .bind(reason)
        .bind(transaction_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(())
    }

    /// Force-refund reservations that were neither committed nor refunded
    /// within the grace window. Processes up to `limit` rows; a failure on
    /// one row is logged and must not block refunding the others. Returns the
    /// number refunded.
    ///
    /// Designed to be invoked by an external periodic trigger, and safe to
    /// run repeatedly or concurrently since refund is idempotent.
    pub async fn sweep_expired(&mut self, limit: i64) -> Result<usize> {
        let stale: Vec<TransactionId> = sqlx::query_scalar(
            "SELECT id FROM credit_transactions
             WHERE status = 'pending' AND expires_at < now()
             ORDER BY expires_at
             LIMIT $1",
        )
        .bind(limit)
        .fetch_all(&mut *self.db)
        .await?;

        let mut refunded = 0;
        for transaction_id in stale {
            match self.refund(transaction_id, EXPIRED_RESERVATION_REASON).await {
                Ok(()) => refunded += 1,
                Err(e) => {
                    error!(%transaction_id, error = %e, "Failed to refund expired reservation");
                }
            }
        }

        Ok(refunded)
    }

    /// Read-only lookup of a transaction by its ID, used for diagnostics.
    pub async fn get(&mut self, transaction_id: TransactionId) -> Result<Option<CreditTransaction>> {
        let transaction = sqlx::query_as::<_, CreditTransaction>(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM credit_transactions WHERE id = $1"
        ))
        .bind(transaction_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(transaction)
    }
}
