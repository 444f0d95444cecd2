//! Fixed-window rate limiting.
//!
//! Every key gets a counter that resets entirely once its window's reset time
//! has passed. Requests past the quota are rejected but still counted, so a
//! client that keeps retrying during a blocked window stays blocked until the
//! window ends.

use async_trait::async_trait;
use axum::http::{HeaderMap, HeaderName, HeaderValue};
use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};
use dashmap::DashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::interval;

pub const REMAINING_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-remaining");
pub const RESET_HEADER: HeaderName = HeaderName::from_static("x-ratelimit-reset");

/// Longest window a quota may use (one week).
pub const MAX_WINDOW_SECS: u64 = 7 * 24 * 60 * 60;

/// Quota applied to one protected endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitConfig {
    pub max_requests: u32,
    pub window: Duration,
}

impl RateLimitConfig {
    pub fn new(max_requests: u32, window_seconds: u64) -> Self {
        Self {
            max_requests: max_requests.max(1),
            window: Duration::from_secs(window_seconds.clamp(1, MAX_WINDOW_SECS)),
        }
    }

    fn window_delta(&self) -> TimeDelta {
        TimeDelta::seconds(self.window.as_secs().clamp(1, MAX_WINDOW_SECS) as i64)
    }
}

// Rate limit window - tracks requests per client key
#[derive(Debug, Clone)]
pub struct RateLimitWindow {
    pub count: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitWindow {
    fn open(now: DateTime<Utc>, config: &RateLimitConfig) -> Self {
        Self {
            count: 1,
            reset_time: now + config.window_delta(),
        }
    }

    fn has_elapsed(&self, now: DateTime<Utc>) -> bool {
        now > self.reset_time
    }
}

/// Outcome of a single check. Computed per request, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_time: DateTime<Utc>,
}

impl RateLimitResult {
    /// Whole seconds until the window resets, rounded up. Never zero, so a
    /// rejected client is always told to wait.
    pub fn retry_after_secs(&self, now: DateTime<Utc>) -> u64 {
        let millis = (self.reset_time - now).num_milliseconds().max(0) as u64;
        millis.div_ceil(1000).max(1)
    }
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> RateLimitResult;

    async fn check(&self, key: &str, config: &RateLimitConfig) -> RateLimitResult {
        self.check_at(key, config, Utc::now()).await
    }

    /// Forget any window held for `key`.
    async fn reset(&self, key: &str);

    /// Drop windows whose reset time has passed. Returns how many were removed.
    async fn prune(&self, now: DateTime<Utc>) -> usize;

    fn tracked_keys(&self) -> usize;
}

/// Process-local limiter. Each key's check-and-increment runs while holding
/// that key's map entry, so concurrent requests for one client are serialized.
#[derive(Default)]
pub struct InMemoryRateLimiter {
    windows: DashMap<String, RateLimitWindow>,
}

impl InMemoryRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for InMemoryRateLimiter {
    async fn check_at(
        &self,
        key: &str,
        config: &RateLimitConfig,
        now: DateTime<Utc>,
    ) -> RateLimitResult {
        let mut entry = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| RateLimitWindow {
                count: 0,
                reset_time: now + config.window_delta(),
            });

        // first request, or window expired..? start a new one
        if entry.count == 0 || entry.has_elapsed(now) {
            *entry = RateLimitWindow::open(now, config);
            return RateLimitResult {
                allowed: true,
                remaining: config.max_requests.saturating_sub(1),
                reset_time: entry.reset_time,
            };
        }

        entry.count = entry.count.saturating_add(1);

        if entry.count <= config.max_requests {
            RateLimitResult {
                allowed: true,
                remaining: config.max_requests.saturating_sub(entry.count),
                reset_time: entry.reset_time,
            }
        } else {
            RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_time: entry.reset_time,
            }
        }
    }

    async fn reset(&self, key: &str) {
        self.windows.remove(key);
    }

    async fn prune(&self, now: DateTime<Utc>) -> usize {
        let before = self.windows.len();
        self.windows.retain(|_, window| !window.has_elapsed(now));
        before.saturating_sub(self.windows.len())
    }

    fn tracked_keys(&self) -> usize {
        self.windows.len()
    }
}

/// Headers describing the caller's remaining quota, sent on every response
/// from a rate limited endpoint.
pub fn rate_limit_headers(result: &RateLimitResult) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(REMAINING_HEADER, HeaderValue::from(result.remaining));
    let reset = result
        .reset_time
        .to_rfc3339_opts(SecondsFormat::Millis, true);
    if let Ok(value) = HeaderValue::from_str(&reset) {
        headers.insert(RESET_HEADER, value);
    }
    headers
}

/// Rate limit key for a request.
///
/// Proxy headers are only honoured with `trust_proxy`; otherwise a client
/// could pick its own key and dodge the limit.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>, trust_proxy: bool) -> String {
    if trust_proxy {
        let forwarded = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            // "client, proxy1, proxy2" - leftmost is the client
            .and_then(|s| s.split(',').next())
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
            });
        if let Some(ip) = forwarded {
            return ip;
        }
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

// Pruner - drops expired windows so the map doesn't grow with every client ever seen
pub async fn pruner(limiter: Arc<dyn RateLimiter>, every: Duration) {
    let mut interval = interval(every);

    tracing::info!(interval = ?every, "rate limit pruner started");

    loop {
        interval.tick().await;

        let removed = limiter.prune(Utc::now()).await;
        crate::metrics::RATE_LIMIT_KEYS.set(limiter.tracked_keys() as f64);
        if removed > 0 {
            tracing::debug!(removed, "pruned expired rate limit windows");
        }
    }
}
