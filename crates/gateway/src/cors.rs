//! Credentialed CORS restricted to localhost development origins.
//!
//! The frontend runs on localhost during development and sends the session
//! cookie cross-port, so the layer must allow credentials. Allowing
//! credentials forbids wildcard origins, hence the predicate.

use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, CorsLayer};

fn is_localhost(origin: &HeaderValue) -> bool {
    origin.to_str().is_ok_and(|s| {
        s.starts_with("http://localhost:")
            || s.starts_with("http://127.0.0.1:")
            || s == "http://localhost"
            || s == "http://127.0.0.1"
    })
}

/// CORS layer for every service: localhost origins only, with credentials.
#[must_use]
pub fn localhost_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(AllowOrigin::predicate(|origin, _| is_localhost(origin)))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::HeaderName::from_static("x-csrf-token"),
        ])
        .allow_credentials(true)
}
