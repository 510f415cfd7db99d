//! Fixed-window per-IP rate limiting over a pluggable counter store.
//!
//! Each throttled route gets its own [`RouteRateLimiter`] with a scope
//! string and a [`RateLimitConfig`]; counters are keyed `scope:ip` so the
//! catalog listing and the store-creation endpoint never share a budget.
//! The counter backend is behind the [`CounterStore`] trait so a shared
//! store (e.g. Redis) can replace the in-process map without touching the
//! middleware.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use tokio::sync::Mutex;

use crate::error::ApiError;

/// Backend for fixed-window counters.
///
/// `increment` bumps the counter for `key`, starting a fresh window of
/// `window` duration if none is active, and returns the count including
/// this request.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn increment(&self, key: &str, window: Duration) -> u64;
}

/// How often the in-memory store drops expired windows.
const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

struct Window {
    started: Instant,
    duration: Duration,
    count: u64,
}

struct CounterState {
    windows: HashMap<String, Window>,
    last_sweep: Instant,
}

/// In-process counter store backed by a mutexed map.
///
/// An expired window is replaced on the next increment for its key; keys
/// that stop arriving (one-off client IPs) are dropped by an opportunistic
/// sweep that runs at most once per sweep interval, so the map stays
/// bounded by recent traffic.
pub struct InMemoryCounterStore {
    state: Mutex<CounterState>,
    sweep_interval: Duration,
}

impl InMemoryCounterStore {
    #[must_use]
    pub fn new() -> Self {
        Self::with_sweep_interval(SWEEP_INTERVAL)
    }

    /// Store that sweeps expired windows at most once per `interval`.
    #[must_use]
    pub fn with_sweep_interval(interval: Duration) -> Self {
        Self {
            state: Mutex::new(CounterState {
                windows: HashMap::new(),
                last_sweep: Instant::now(),
            }),
            sweep_interval: interval,
        }
    }

    #[cfg(test)]
    async fn tracked_keys(&self) -> usize {
        self.state.lock().await.windows.len()
    }
}

impl Default for InMemoryCounterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CounterStore for InMemoryCounterStore {
    async fn increment(&self, key: &str, window: Duration) -> u64 {
        let now = Instant::now();
        let mut state = self.state.lock().await;

        if now.duration_since(state.last_sweep) >= self.sweep_interval {
            state
                .windows
                .retain(|_, w| now.duration_since(w.started) < w.duration);
            state.last_sweep = now;
        }

        let entry = state.windows.entry(key.to_owned()).or_insert(Window {
            started: now,
            duration: window,
            count: 0,
        });
        if now.duration_since(entry.started) >= entry.duration {
            *entry = Window {
                started: now,
                duration: window,
                count: 0,
            };
        }
        entry.count += 1;
        entry.count
    }
}

/// Budget and messaging for one throttled route.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    pub window: Duration,
    pub max_requests: u64,
    /// Client-facing message returned with the 429.
    pub message: &'static str,
}

impl RateLimitConfig {
    /// `max` requests per minute.
    #[must_use]
    pub const fn per_minute(max: u64, message: &'static str) -> Self {
        Self {
            window: Duration::from_secs(60),
            max_requests: max,
            message,
        }
    }
}

/// State for the [`fixed_window`] middleware on one route.
#[derive(Clone)]
pub struct RouteRateLimiter {
    scope: &'static str,
    store: Arc<dyn CounterStore>,
    config: RateLimitConfig,
}

impl RouteRateLimiter {
    #[must_use]
    pub fn new(scope: &'static str, store: Arc<dyn CounterStore>, config: RateLimitConfig) -> Self {
        Self {
            scope,
            store,
            config,
        }
    }

    /// Record one request from `ip` and decide whether it is allowed.
    pub async fn check(&self, ip: &str) -> Result<(), ApiError> {
        let key = format!("{}:{}", self.scope, ip);
        let count = self.store.increment(&key, self.config.window).await;

        if count > self.config.max_requests {
            tracing::warn!(scope = self.scope, ip, count, "rate limit exceeded");
            return Err(ApiError::RateLimited(self.config.message.to_owned()));
        }
        Ok(())
    }
}

/// Best-effort client IP: proxy headers first, then the peer address.
fn client_ip(request: &Request) -> String {
    let headers = request.headers();

    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_owned();
            }
        }
    }

    if let Some(real_ip) = headers.get("x-real-ip").and_then(|v| v.to_str().ok()) {
        let real_ip = real_ip.trim();
        if !real_ip.is_empty() {
            return real_ip.to_owned();
        }
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or_else(|| "unknown".to_owned(), |info| info.0.ip().to_string())
}

/// Fixed-window middleware; mount per route with `from_fn_with_state`.
pub async fn fixed_window(
    State(limiter): State<RouteRateLimiter>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    limiter.check(&client_ip(&request)).await?;
    Ok(next.run(request).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_counter_increments_within_window() {
        let store = InMemoryCounterStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.increment("a", window).await, 1);
        assert_eq!(store.increment("a", window).await, 2);
        assert_eq!(store.increment("a", window).await, 3);
    }

    #[tokio::test]
    async fn test_counter_keys_are_independent() {
        let store = InMemoryCounterStore::new();
        let window = Duration::from_secs(60);

        assert_eq!(store.increment("a", window).await, 1);
        assert_eq!(store.increment("b", window).await, 1);
        assert_eq!(store.increment("a", window).await, 2);
    }

    #[tokio::test]
    async fn test_counter_resets_after_window() {
        let store = InMemoryCounterStore::new();
        let window = Duration::from_millis(10);

        assert_eq!(store.increment("a", window).await, 1);
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.increment("a", window).await, 1);
    }

    #[tokio::test]
    async fn test_sweep_drops_stale_keys() {
        let store = InMemoryCounterStore::with_sweep_interval(Duration::from_millis(10));
        let window = Duration::from_millis(10);

        store.increment("a", window).await;
        store.increment("b", window).await;
        assert_eq!(store.tracked_keys().await, 2);

        tokio::time::sleep(Duration::from_millis(20)).await;
        store.increment("c", window).await;
        assert_eq!(store.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_sweep_keeps_live_windows() {
        let store = InMemoryCounterStore::with_sweep_interval(Duration::from_millis(10));

        store.increment("live", Duration::from_secs(60)).await;
        store.increment("stale", Duration::from_millis(10)).await;

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(store.increment("live", Duration::from_secs(60)).await, 2);
        assert_eq!(store.tracked_keys().await, 1);
    }

    #[tokio::test]
    async fn test_limiter_blocks_after_budget() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let limiter = RouteRateLimiter::new(
            "test",
            store,
            RateLimitConfig::per_minute(2, "too many requests"),
        );

        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_ok());
        let err = limiter.check("1.2.3.4").await.unwrap_err();
        assert!(matches!(err, ApiError::RateLimited(_)));
    }

    #[tokio::test]
    async fn test_limiter_budgets_per_ip() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let limiter = RouteRateLimiter::new(
            "test",
            store,
            RateLimitConfig::per_minute(1, "too many requests"),
        );

        assert!(limiter.check("1.2.3.4").await.is_ok());
        assert!(limiter.check("5.6.7.8").await.is_ok());
        assert!(limiter.check("1.2.3.4").await.is_err());
    }

    #[tokio::test]
    async fn test_scopes_do_not_share_budget() {
        let store: Arc<dyn CounterStore> = Arc::new(InMemoryCounterStore::new());
        let a = RouteRateLimiter::new(
            "create",
            Arc::clone(&store),
            RateLimitConfig::per_minute(1, "m"),
        );
        let b = RouteRateLimiter::new("update", store, RateLimitConfig::per_minute(1, "m"));

        assert!(a.check("1.2.3.4").await.is_ok());
        assert!(b.check("1.2.3.4").await.is_ok());
        assert!(a.check("1.2.3.4").await.is_err());
    }
}
