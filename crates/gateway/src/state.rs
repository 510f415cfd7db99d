//! Shared middleware state.

use std::sync::Arc;

use crate::auth::AuthKeys;
use crate::config::ServiceConfig;
use crate::csrf::CsrfSigner;
use crate::rate_limit::{CounterStore, InMemoryCounterStore, RateLimitConfig, RouteRateLimiter};

/// State the auth and CSRF middleware run on.
///
/// Cheap to clone; every service builds one from its [`ServiceConfig`] at
/// startup and hands clones to `from_fn_with_state`.
#[derive(Clone)]
pub struct GatewayState {
    pub auth: AuthKeys,
    pub csrf: CsrfSigner,
    counters: Arc<dyn CounterStore>,
}

impl GatewayState {
    /// Build gateway state with the in-process counter store.
    #[must_use]
    pub fn from_config(config: &ServiceConfig) -> Self {
        Self::with_counter_store(config, Arc::new(InMemoryCounterStore::new()))
    }

    /// Build gateway state with an injected counter backend.
    #[must_use]
    pub fn with_counter_store(config: &ServiceConfig, counters: Arc<dyn CounterStore>) -> Self {
        Self {
            auth: AuthKeys::new(&config.jwt_secret, config.session_ttl_secs),
            csrf: CsrfSigner::new(config.csrf_secret.clone(), config.csrf_ttl_secs),
            counters,
        }
    }

    /// Limiter for one throttled route, sharing this state's counter store.
    #[must_use]
    pub fn limiter(&self, scope: &'static str, config: RateLimitConfig) -> RouteRateLimiter {
        RouteRateLimiter::new(scope, Arc::clone(&self.counters), config)
    }
}
