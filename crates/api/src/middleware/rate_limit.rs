//! Rate limiting middleware.
//!
//! Per-client-IP sliding-window limiting with two quotas: a general one for
//! the API surface and a stricter one for authentication endpoints. A quota
//! of 0 disables the corresponding limiter (used by tests).

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::{header, Request},
    middleware::Next,
    response::{IntoResponse, Response},
};
use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter as GovRateLimiter,
};
use std::{
    collections::HashMap,
    net::{IpAddr, Ipv4Addr, SocketAddr},
    num::NonZeroU32,
    sync::{Arc, RwLock},
};

use crate::app::AppState;
use crate::error::ApiError;

/// Type alias for the limiter kept per client IP.
type IpRateLimiter = GovRateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Rate limiter state shared across all requests: one limiter per client
/// IP, created lazily.
pub struct RateLimiterState {
    limiters: RwLock<HashMap<IpAddr, Arc<IpRateLimiter>>>,
    quota_per_minute: u32,
}

impl RateLimiterState {
    /// Create a new rate limiter state with the given per-minute quota.
    /// A quota of 0 disables the limiter.
    pub fn new(quota_per_minute: u32) -> Self {
        Self {
            limiters: RwLock::new(HashMap::new()),
            quota_per_minute,
        }
    }

    pub fn is_disabled(&self) -> bool {
        self.quota_per_minute == 0
    }

    fn get_or_create_limiter(&self, ip: IpAddr) -> Arc<IpRateLimiter> {
        {
            let limiters = self.limiters.read().unwrap();
            if let Some(limiter) = limiters.get(&ip) {
                return limiter.clone();
            }
        }

        let mut limiters = self.limiters.write().unwrap();

        // Double-check in case another thread created it
        if let Some(limiter) = limiters.get(&ip) {
            return limiter.clone();
        }

        let quota = Quota::per_minute(
            NonZeroU32::new(self.quota_per_minute).unwrap_or(NonZeroU32::new(100).unwrap()),
        );
        let limiter = Arc::new(GovRateLimiter::direct(quota));
        limiters.insert(ip, limiter.clone());
        limiter
    }

    /// Check whether a request from the given IP is allowed.
    /// Returns Err with retry-after seconds when the quota is exhausted.
    pub fn check(&self, ip: IpAddr) -> Result<(), u64> {
        if self.is_disabled() {
            return Ok(());
        }
        let limiter = self.get_or_create_limiter(ip);

        match limiter.check() {
            Ok(_) => Ok(()),
            Err(not_until) => {
                let wait_time = not_until.wait_time_from(governor::clock::Clock::now(
                    &governor::clock::DefaultClock::default(),
                ));
                Err(wait_time.as_secs().max(1))
            }
        }
    }
}

impl std::fmt::Debug for RateLimiterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateLimiterState")
            .field("quota_per_minute", &self.quota_per_minute)
            .field("active_limiters", &self.limiters.read().unwrap().len())
            .finish()
    }
}

/// The two limiter tiers carried in application state.
#[derive(Debug)]
pub struct RateLimiters {
    pub general: RateLimiterState,
    pub auth: RateLimiterState,
}

impl RateLimiters {
    pub fn new(general_per_minute: u32, auth_per_minute: u32) -> Self {
        Self {
            general: RateLimiterState::new(general_per_minute),
            auth: RateLimiterState::new(auth_per_minute),
        }
    }
}

fn client_ip(req: &Request<Body>) -> IpAddr {
    req.extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|info| info.0.ip())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

fn rate_limited_response(retry_after_secs: u64) -> Response {
    let mut response = ApiError::RateLimited.into_response();
    if let Ok(value) = retry_after_secs.to_string().parse() {
        response.headers_mut().insert(header::RETRY_AFTER, value);
    }
    response
}

/// Middleware applying the general quota.
pub async fn general_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    match state.limiters.general.check(ip) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(client_ip = %ip, "Rate limit exceeded");
            rate_limited_response(retry_after)
        }
    }
}

/// Middleware applying the stricter authentication quota.
pub async fn auth_rate_limit(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let ip = client_ip(&req);
    match state.limiters.auth.check(ip) {
        Ok(()) => next.run(req).await,
        Err(retry_after) => {
            tracing::warn!(client_ip = %ip, "Auth rate limit exceeded");
            rate_limited_response(retry_after)
        }
    }
}
