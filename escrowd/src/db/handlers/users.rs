use crate::{
    db::{
        errors::{DbError, Result},
        models::users::{User, UserCreateDBRequest},
    },
    types::UserId,
};
use sqlx::PgConnection;

/// Read side of the user ledger plus account creation. Balance mutations are
/// the escrow handlers' job; nothing here writes credits or pending_credits
/// after the initial grant.
pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<User> {
        if request.initial_credits < 0 {
            return Err(DbError::InvalidAmount {
                amount: request.initial_credits,
            });
        }

        let user = sqlx::query_as::<_, User>(
            "INSERT INTO users (email, credits)
             VALUES ($1, $2)
             RETURNING id, email, credits, pending_credits, credits_spent, created_at, updated_at",
        )
        .bind(&request.email)
        .bind(request.initial_credits)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    pub async fn get_by_id(&mut self, user_id: UserId) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, credits, pending_credits, credits_spent, created_at, updated_at
             FROM users
             WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::PgPool;
    use uuid::Uuid;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_with_initial_grant(pool: PgPool) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut users = Users::new(&mut conn);

        let user = users
            .create(&UserCreateDBRequest {
                email: "reader@example.com".to_string(),
                initial_credits: 25,
            })
            .await
            .expect("Failed to create user");

        assert_eq!(user.email, "reader@example.com");
        assert_eq!(user.credits, 25);
        assert_eq!(user.pending_credits, 0);
        assert_eq!(user.credits_spent, 0);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_rejects_negative_grant(pool: PgPool) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut users = Users::new(&mut conn);

        let result = users
            .create(&UserCreateDBRequest {
                email: "broke@example.com".to_string(),
                initial_credits: -1,
            })
            .await;

        assert!(matches!(result, Err(DbError::InvalidAmount { amount: -1 })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_duplicate_email(pool: PgPool) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut users = Users::new(&mut conn);

        let request = UserCreateDBRequest {
            email: "dup@example.com".to_string(),
            initial_credits: 0,
        };
        users.create(&request).await.expect("First create should succeed");

        let result = users.create(&request).await;
        assert!(matches!(result, Err(DbError::UniqueViolation { .. })));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_get_by_id(pool: PgPool) {
        let mut conn = pool.acquire().await.expect("Failed to acquire connection");
        let mut users = Users::new(&mut conn);

        let created = users
            .create(&UserCreateDBRequest {
                email: "lookup@example.com".to_string(),
                initial_credits: 5,
            })
            .await
            .expect("Failed to create user");

        let fetched = users
            .get_by_id(created.id)
            .await
            .expect("Lookup should not error")
            .expect("User should exist");
        assert_eq!(fetched.id, created.id);
        assert_eq!(fetched.credits, 5);

        assert!(users
            .get_by_id(Uuid::new_v4())
            .await
            .expect("Lookup should not error")
            .is_none());
    }
}
