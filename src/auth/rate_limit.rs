//! In-memory rate limiting for login and signup routes.
//!
//! Counters live in this process only; several instances behind a load
//! balancer each keep their own windows.

use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Login-type routes: requests per window
pub const LOGIN_MAX_REQUESTS: u32 = 5;
/// Signup-type routes: requests per window
pub const SIGNUP_MAX_REQUESTS: u32 = 3;
pub const WINDOW_SECS: u64 = 60;

/// Entries untouched for this long are dropped by `cleanup`
const STALE_AFTER: Duration = Duration::from_secs(300);

struct Window {
    count: u32,
    started: Instant,
}

#[derive(Clone, Default)]
pub struct RateLimiter {
    /// route -> (client key -> window)
    inner: Arc<Mutex<HashMap<&'static str, HashMap<String, Window>>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a request. Returns `true` if it is allowed.
    pub async fn check(&self, route: &'static str, key: &str, max_requests: u32, window_secs: u64) -> bool {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        let window = map
            .entry(route)
            .or_default()
            .entry(key.to_owned())
            .or_insert_with(|| Window { count: 0, started: now });

        if now.duration_since(window.started).as_secs() >= window_secs {
            window.count = 0;
            window.started = now;
        }

        window.count += 1;
        window.count <= max_requests
    }

    /// Drop windows older than five minutes
    pub async fn cleanup(&self) {
        let mut map = self.inner.lock().await;
        let now = Instant::now();

        for route_map in map.values_mut() {
            route_map.retain(|_, w| now.duration_since(w.started) < STALE_AFTER);
        }
        map.retain(|_, route_map| !route_map.is_empty());
    }

    /// Number of tracked client keys across all routes
    pub async fn tracked_keys(&self) -> usize {
        self.inner.lock().await.values().map(|m| m.len()).sum()
    }
}

/// X-Forwarded-For first (reverse proxy), then the peer address
fn client_ip(request: &Request) -> String {
    let forwarded = request
        .headers()
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|ip| !ip.is_empty());

    if let Some(ip) = forwarded {
        return ip.to_owned();
    }

    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ci| ci.0.ip().to_string())
        .unwrap_or_else(|| "unknown".to_owned())
}

/// Middleware for sign-in routes: 5 requests/minute per IP
pub async fn login_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);
    if !state.rate_limiter.check("login", &ip, LOGIN_MAX_REQUESTS, WINDOW_SECS).await {
        tracing::warn!("Login rate limit hit for {}", ip);
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

/// Middleware for account creation routes: 3 requests/minute per IP
pub async fn signup_rate_limit(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let ip = client_ip(&request);
    if !state.rate_limiter.check("signup", &ip, SIGNUP_MAX_REQUESTS, WINDOW_SECS).await {
        tracing::warn!("Signup rate limit hit for {}", ip);
        return AppError::RateLimited.into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_allows_up_to_limit() {
        let limiter = RateLimiter::new();
        for _ in 0..5 {
            assert!(limiter.check("login", "10.0.0.1", 5, 60).await);
        }
        assert!(!limiter.check("login", "10.0.0.1", 5, 60).await);
    }

    #[tokio::test]
    async fn test_keys_and_routes_are_independent() {
        let limiter = RateLimiter::new();
        for _ in 0..3 {
            limiter.check("signup", "10.0.0.1", 3, 60).await;
        }
        assert!(!limiter.check("signup", "10.0.0.1", 3, 60).await);
        assert!(limiter.check("signup", "10.0.0.2", 3, 60).await);
        assert!(limiter.check("login", "10.0.0.1", 5, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_window_resets() {
        let limiter = RateLimiter::new();
        assert!(limiter.check("login", "ip", 1, 60).await);
        assert!(!limiter.check("login", "ip", 1, 60).await);

        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(limiter.check("login", "ip", 1, 60).await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cleanup_drops_stale_windows() {
        let limiter = RateLimiter::new();
        limiter.check("login", "a", 5, 60).await;
        limiter.check("signup", "b", 3, 60).await;
        assert_eq!(limiter.tracked_keys().await, 2);

        tokio::time::advance(Duration::from_secs(301)).await;
        limiter.check("login", "c", 5, 60).await;
        limiter.cleanup().await;
        assert_eq!(limiter.tracked_keys().await, 1);
    }
}
