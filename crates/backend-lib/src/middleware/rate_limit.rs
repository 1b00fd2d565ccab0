//! Fixed-window rate limiting per client IP.
use super::client_ip::client_ip;
use crate::{error::AppError, metrics::*, AppState};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use metrics::{counter, gauge};
use parking_lot::Mutex;
use std::{net::IpAddr, time::Duration};
use tokio::time::Instant;
use tracing::{debug, warn};

/// Request counter for one client within the current window
#[derive(Debug)]
struct Bucket {
    count: u32,
    window_start: Instant,
}

/// In-process fixed-window limiter.
///
/// Each bucket lives in a DashMap shard, so concurrent requests from the
/// same address serialise on the shard lock while different addresses
/// mostly proceed in parallel. Buckets whose window has elapsed are swept
/// on access, at most once per window.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<IpAddr, Bucket>,
    max_requests: u32,
    window: Duration,
    last_sweep: Mutex<Instant>,
}

impl RateLimiter {
    pub fn new(window: Duration, max_requests: u32) -> Self {
        Self {
            buckets: DashMap::new(),
            max_requests,
            window,
            last_sweep: Mutex::new(Instant::now()),
        }
    }

    /// Count a request from `ip`; false once the window's allowance is spent.
    /// Rejected requests do not count.
    pub fn check(&self, ip: IpAddr) -> bool {
        let now = Instant::now();
        self.sweep_stale(now);

        let mut bucket = self.buckets.entry(ip).or_insert_with(|| Bucket {
            count: 0,
            window_start: now,
        });

        if now.duration_since(bucket.window_start) > self.window {
            bucket.count = 0;
            bucket.window_start = now;
        }

        if bucket.count >= self.max_requests {
            return false;
        }

        bucket.count += 1;
        true
    }

    /// Number of tracked clients
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    fn sweep_stale(&self, now: Instant) {
        {
            let mut last_sweep = self.last_sweep.lock();
            if now.duration_since(*last_sweep) <= self.window {
                return;
            }
            *last_sweep = now;
        }

        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.duration_since(bucket.window_start) <= self.window);
        let after = self.buckets.len();

        gauge!(RATE_LIMIT_BUCKETS).set(after as f64);
        debug!(evicted = before - after, remaining = after, "swept rate limit buckets");
    }
}

/// Rate limiter middleware
pub async fn rate_limit(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let Some(ip) = client_ip(request.headers(), request.extensions()) else {
        warn!(path = %request.uri().path(), "could not determine client ip");
        return Err(AppError::UnknownClientIp);
    };

    if !state.rate_limiter.check(ip) {
        counter!(RATE_LIMITED).increment(1);
        warn!(client_ip = %ip, "rate limit exceeded");
        return Err(AppError::RateLimitExceeded);
    }

    Ok(next.run(request).await)
}
