mod api;
mod config;
mod db;
mod errors;
mod openapi;
mod types;

#[cfg(test)]
mod test_utils;

use crate::openapi::ApiDoc;
use axum::{
    http::{Request, Response},
    routing::{get, post},
    Router,
};
use bon::Builder;
use clap::Parser;
use config::{Args, Config};
use sqlx::PgPool;
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{debug, info, Span};
use utoipa::OpenApi;
use utoipa_rapidoc::RapiDoc;

pub use types::{TransactionId, UserId};

#[derive(Clone, Builder)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/users", post(api::handlers::users::create_user))
        .route("/users/{user_id}", get(api::handlers::users::get_user))
        // Credit escrow: reserve before costly work, settle exactly one of
        // commit/refund afterwards (both are idempotent)
        .route("/reservations", post(api::handlers::escrow::create_reservation))
        .route("/reservations/{transaction_id}", get(api::handlers::escrow::get_reservation))
        .route(
            "/reservations/{transaction_id}/commit",
            post(api::handlers::escrow::commit_reservation),
        )
        .route(
            "/reservations/{transaction_id}/refund",
            post(api::handlers::escrow::refund_reservation),
        )
        // Invoked by an external cron-like scheduler; no in-process timer, so
        // horizontally scaled replicas never race their own sweeps
        .route("/maintenance/sweep", post(api::handlers::escrow::sweep_reservations))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    tracing::info_span!(
                        "request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(|response: &Response<_>, latency: Duration, _span: &Span| {
                    tracing::info!(
                        status = %response.status(),
                        latency = ?latency,
                        "request completed"
                    );
                }),
        )
        .with_state(state);

    Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api/v1", api_routes)
        .merge(RapiDoc::with_openapi("/api-docs/openapi.json", ApiDoc::openapi()).path("/docs"))
        .layer(CorsLayer::permissive())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing with environment filter
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let args = Args::parse();
    debug!("{:?}", args);

    let config = Config::load(&args)?;
    debug!("Starting escrow service with configuration: {:#?}", config);

    let pool = PgPool::connect(&config.database_url).await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    let bind_addr = config.bind_address();
    let state = AppState::builder().db(pool).config(config).build();
    let router = build_router(state);

    let listener = TcpListener::bind(&bind_addr).await?;
    info!("Escrow service listening on http://{}", bind_addr);

    axum::serve(listener, router).with_graceful_shutdown(shutdown_signal()).await?;

    Ok(())
}

/// Wait for shutdown signal (SIGTERM or Ctrl+C)
async fn shutdown_signal() {
    use tokio::signal;

    let ctrl_c = async {
        signal::ctrl_c().await.expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}

#[cfg(test)]
mod test {
    use crate::test_utils::*;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: PgPool) {
        let app = create_test_app(pool).await;

        let response = app.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_openapi_document_is_served(pool: PgPool) {
        let app = create_test_app(pool).await;

        let response = app.get("/api-docs/openapi.json").await;
        response.assert_status_ok();

        let doc: serde_json::Value = response.json();
        assert!(doc["paths"]["/reservations"].is_object());
        assert!(doc["paths"]["/maintenance/sweep"].is_object());
    }
}
