//! Bazaar Gateway - Shared request-authorization and state-mutation gateway.
//!
//! Every Bazaar service composes the same middleware chain from this crate:
//!
//! ```text
//! CORS -> security headers -> trace -> require_auth -> csrf_protection
//!      -> rate_limit (throttled routes only) -> disable_cache -> controller
//! ```
//!
//! Ordering matters: `csrf_protection` assumes `require_auth` has already
//! attached an [`auth::Identity`] to the request extensions. Throttled
//! routes attach their fixed-window budget as a route layer, innermost of
//! the guards. Login/signup and the public catalog reads skip
//! `require_auth` by construction (they are wired outside the guarded
//! router).
//!
//! # Modules
//!
//! - [`auth`] - JWT cookie verification and the `Identity` extractor
//! - [`cache_control`] - `no-store` response headers on every route
//! - [`config`] - Environment-driven per-service configuration
//! - [`cors`] - Credentialed CORS restricted to localhost origins
//! - [`csrf`] - HMAC double-submit token validation for mutating verbs
//! - [`db`] - Document-store connection helper and repository errors
//! - [`error`] - The closed `ApiError` taxonomy with stable wire codes
//! - [`rate_limit`] - Fixed-window per-IP limiter over a pluggable store
//! - [`security_headers`] - Clickjacking/sniffing/referrer protections
//! - [`state`] - The shared [`state::GatewayState`] the middleware runs on
//! - [`telemetry`] - tracing + Sentry initialization

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod auth;
pub mod cache_control;
pub mod config;
pub mod cors;
pub mod csrf;
pub mod db;
pub mod error;
pub mod rate_limit;
pub mod security_headers;
pub mod state;
pub mod telemetry;

pub use auth::{Identity, clear_session_cookie, require_auth, session_cookie};
pub use cache_control::disable_cache;
pub use config::{ConfigError, ServiceConfig};
pub use cors::localhost_cors;
pub use csrf::{clear_csrf_cookie, csrf_cookie, csrf_protection, issue_csrf_token};
pub use error::{ApiError, Result};
pub use rate_limit::{
    CounterStore, InMemoryCounterStore, RateLimitConfig, RouteRateLimiter, fixed_window,
};
pub use security_headers::security_headers_middleware;
pub use state::GatewayState;
