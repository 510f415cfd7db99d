//! `/api/payment` routes.

use axum::{
    Json, Router, middleware,
    extract::{Path, State},
    routing::{delete, get, patch, post},
};
use serde_json::json;

use bazaar_core::{OrderId, PaymentId, PaymentStatus, Price, StoreId};
use bazaar_gateway::{
    Identity, RateLimitConfig, Result, csrf_protection, disable_cache, fixed_window,
    issue_csrf_token, require_auth,
};

use crate::models::{
    AddPaymentRequest, DeletePaymentRequest, Payment, UpdatePaymentStatusRequest,
};
use crate::state::AppState;

const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later";

/// Build the `/api/payment` router; everything sits behind the session
/// guard, payment creation carries its own fixed-window budget.
pub fn router(state: AppState) -> Router {
    let gateway = state.gateway.clone();

    let create = Router::new()
        .route("/add", post(add_payment))
        .route_layer(middleware::from_fn_with_state(
            gateway.limiter(
                "payment:create",
                RateLimitConfig::per_minute(5, RATE_LIMIT_MESSAGE),
            ),
            fixed_window,
        ))
        .with_state(state.clone());

    let guarded = Router::new()
        .route("/", get(list_payments))
        .route("/getStoreTotal/{id}", get(store_total))
        .route("/getAdminTotal", get(admin_total))
        .route("/updatePaymentStatus", patch(update_status))
        .route("/delete", delete(delete_payment))
        .with_state(state)
        .merge(create)
        .merge(
            Router::new()
                .route("/csrf-token", get(issue_csrf_token))
                .with_state(gateway.clone()),
        )
        .layer(middleware::from_fn_with_state(
            gateway.clone(),
            csrf_protection,
        ))
        .layer(middleware::from_fn_with_state(gateway, require_auth));

    Router::new()
        .nest("/api/payment", guarded)
        .layer(middleware::from_fn(disable_cache))
}

async fn add_payment(
    State(state): State<AppState>,
    identity: Identity,
    Json(body): Json<AddPaymentRequest>,
) -> Result<Json<Payment>> {
    let order_id = OrderId::parse(&body.order_id)?;
    let store_id = StoreId::parse(&body.store_id)?;
    let amount = Price::parse(body.amount)?;

    let payment = Payment {
        id: None,
        order_id,
        store_id,
        amount: amount.get(),
        status: PaymentStatus::Pending,
    };

    let payment = state.payments.create(payment).await?;
    tracing::info!(
        user_id = %identity.user_id,
        order_id = %order_id,
        store_id = %store_id,
        "payment recorded"
    );
    Ok(Json(payment))
}

async fn list_payments(State(state): State<AppState>) -> Result<Json<Vec<Payment>>> {
    Ok(Json(state.payments.find_all().await?))
}

async fn store_total(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>> {
    let store_id = StoreId::parse(&id)?;
    let total = state.payments.store_total(store_id).await?;
    Ok(Json(json!({ "totalAmount": total })))
}

async fn admin_total(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    let total = state.payments.admin_total().await?;
    Ok(Json(json!({ "totalAmount": total })))
}

async fn update_status(
    State(state): State<AppState>,
    Json(body): Json<UpdatePaymentStatusRequest>,
) -> Result<Json<Payment>> {
    let id = PaymentId::parse(&body.payment_id)?;
    let status: PaymentStatus = body.status.parse()?;

    let payment = state.payments.update_status(id, status).await?;
    tracing::info!(payment_id = %id, status = %status, "payment status updated");
    Ok(Json(payment))
}

async fn delete_payment(
    State(state): State<AppState>,
    Json(body): Json<DeletePaymentRequest>,
) -> Result<Json<serde_json::Value>> {
    let id = PaymentId::parse(&body.payment_id)?;
    state.payments.delete(id).await?;
    tracing::info!(payment_id = %id, "payment deleted");
    Ok(Json(json!({ "status": "ok" })))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    //! Guard-chain tests over the real router; the lazy database client
    //! means nothing here performs I/O.

    use std::net::IpAddr;

    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use secrecy::SecretString;
    use tower::ServiceExt;

    use bazaar_core::{Role, UserId};
    use bazaar_gateway::{GatewayState, ServiceConfig, auth::AUTH_COOKIE, csrf::CSRF_HEADER};

    use super::*;

    fn test_config() -> ServiceConfig {
        ServiceConfig {
            host: "127.0.0.1".parse::<IpAddr>().unwrap(),
            port: 0,
            mongo_uri: SecretString::from("mongodb://localhost:27017"),
            database: "bazaar_test".to_owned(),
            jwt_secret: SecretString::from("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6q"),
            csrf_secret: SecretString::from("Qw3!rT8@yU2#iO6$pA1%sD5^fG9&hJ4*"),
            session_ttl_secs: 3600,
            csrf_ttl_secs: 3600,
            sentry_dsn: None,
        }
    }

    async fn test_app() -> (Router, GatewayState) {
        let config = test_config();
        let gateway = GatewayState::from_config(&config);
        let db = bazaar_gateway::db::connect(&config.mongo_uri, &config.database)
            .await
            .unwrap();
        let state = AppState::new(gateway.clone(), db);
        (router(state), gateway)
    }

    #[tokio::test]
    async fn test_payment_listing_requires_session() {
        let (app, _) = test_app().await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/payment/")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_payment_creation_requires_csrf() {
        let (app, gateway) = test_app().await;
        let token = gateway.auth.issue(UserId::new(), Role::Buyer).unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/payment/add")
                    .header(header::COOKIE, format!("{AUTH_COOKIE}={token}"))
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from("{}"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_unknown_payment_status_is_400() {
        let (app, gateway) = test_app().await;
        let user_id = UserId::new();
        let session = gateway.auth.issue(user_id, Role::Admin).unwrap();
        let csrf = gateway.csrf.generate(&user_id.to_string()).unwrap();

        let body = serde_json::json!({
            "paymentID": PaymentId::new().to_string(),
            "status": "Refunded",
        });

        let response = app
            .oneshot(
                Request::builder()
                    .method("PATCH")
                    .uri("/api/payment/updatePaymentStatus")
                    .header(header::COOKIE, format!("{AUTH_COOKIE}={session}"))
                    .header(CSRF_HEADER, csrf)
                    .header(header::CONTENT_TYPE, "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
