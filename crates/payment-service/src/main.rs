//! Bazaar payment service - payment records and revenue totals.
//!
//! Serves `/api/payment` on port 8084. Payments reference an order and a
//! store; totals are computed with server-side aggregations.

#![cfg_attr(not(test), forbid(unsafe_code))]

use axum::extract::State;
use axum::http::StatusCode;
use axum::{Router, routing::get};

mod db;
mod models;
mod routes;
mod state;

use bazaar_gateway::{
    GatewayState, ServiceConfig, localhost_cors, security_headers_middleware, telemetry,
};
use state::AppState;

const DEFAULT_PORT: u16 = 8084;

#[tokio::main]
async fn main() {
    let config = ServiceConfig::from_env("PAYMENT_SERVICE", DEFAULT_PORT)
        .expect("Failed to load configuration");

    let _sentry_guard = telemetry::init_sentry(&config);
    telemetry::init_tracing("bazaar_payment_service=info,tower_http=debug");

    let db = bazaar_gateway::db::connect(&config.mongo_uri, &config.database)
        .await
        .expect("Failed to create database client");
    tracing::info!(database = %config.database, "Database client created");

    let state = AppState::new(GatewayState::from_config(&config), db);

    let app = Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .with_state(state.clone())
        .merge(routes::router(state))
        .layer(axum::middleware::from_fn(security_headers_middleware))
        .layer(localhost_cors())
        .layer(tower_http::trace::TraceLayer::new_for_http())
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction());

    let addr = config.socket_addr();
    tracing::info!("payment-service listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .with_graceful_shutdown(telemetry::shutdown_signal())
    .await
    .expect("Server error");
}

/// Liveness health check endpoint.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match bazaar_gateway::db::ping(state.db()).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}
