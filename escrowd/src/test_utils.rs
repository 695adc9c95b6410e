use crate::{
    api::models::users::UserResponse,
    db::{handlers::Users, models::users::UserCreateDBRequest},
    AppState,
};
use axum_test::TestServer;
use sqlx::PgPool;
use uuid::Uuid;

pub fn create_test_config() -> crate::config::Config {
    let database_url = std::env::var("TEST_DATABASE_URL").unwrap_or_else(|_| "postgres://postgres@localhost/test".to_string());

    crate::config::Config {
        host: "127.0.0.1".to_string(),
        port: 0,
        database_url,
        escrow: crate::config::EscrowConfig::default(),
    }
}

pub async fn create_test_app(pool: PgPool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    let router = crate::build_router(state);
    TestServer::new(router).expect("Failed to create test server")
}

pub async fn create_test_user(pool: &PgPool, credits: i64) -> UserResponse {
    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let mut users_repo = Users::new(&mut conn);

    let user = users_repo
        .create(&UserCreateDBRequest {
            email: format!("testuser_{}@example.com", Uuid::new_v4().simple()),
            initial_credits: credits,
        })
        .await
        .expect("Failed to create test user");

    UserResponse::from(user)
}
