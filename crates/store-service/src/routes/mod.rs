//! `/api/store` and `/api/order` routes.

mod orders;
mod stores;

use axum::{Router, middleware, routing::get};

use bazaar_gateway::{csrf_protection, disable_cache, issue_csrf_token, require_auth};

use crate::state::AppState;

/// Build the combined router; every route on both prefixes sits behind
/// the session guard.
pub fn router(state: AppState) -> Router {
    let gateway = state.gateway.clone();

    let api = Router::new()
        .nest("/api/store", stores::router(state.clone()))
        .nest("/api/order", orders::router(state))
        .merge(
            Router::new()
                .route("/api/store/csrf-token", get(issue_csrf_token))
                .with_state(gateway.clone()),
        )
        .layer(middleware::from_fn_with_state(
            gateway.clone(),
            csrf_protection,
        ))
        .layer(middleware::from_fn_with_state(gateway, require_auth));

    api.layer(middleware::from_fn(disable_cache))
}
