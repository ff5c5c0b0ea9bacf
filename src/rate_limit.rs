//! Defensive throttle driven by GitHub's `X-RateLimit-*` response headers.
//!
//! Consulted after every HTTP call, before the body is validated. Missing
//! headers are treated as "not currently rate limited". This is best-effort:
//! a burst can still exhaust quota between the check and the next call.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::header::HeaderMap;
use tokio::time::sleep;

/// Low-water mark below which the guard pauses until the quota resets.
const LOW_WATER_MARK: u64 = 50;

/// Safety buffer added past the provider's reset timestamp.
const RESET_BUFFER_SECS: i64 = 1;

/// Quota state read from one response's headers.
#[derive(Debug, Clone, Copy)]
pub struct RateLimit {
    pub remaining: u64,
    pub reset_at: u64,
}

impl RateLimit {
    /// Reads `X-RateLimit-Remaining` and `X-RateLimit-Reset`, defaulting to
    /// a full quota and an already-passed reset when absent or malformed.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        Self {
            remaining: header_u64(headers, "x-ratelimit-remaining").unwrap_or(5000),
            reset_at: header_u64(headers, "x-ratelimit-reset").unwrap_or_else(now_unix),
        }
    }

    /// How long to pause before the next request, or `None` when quota is
    /// healthy or the reset time has already passed.
    pub fn wait_duration(&self, now: u64) -> Option<Duration> {
        if self.remaining >= LOW_WATER_MARK {
            return None;
        }
        let secs = (self.reset_at as i64) - (now as i64) + RESET_BUFFER_SECS;
        (secs > 0).then(|| Duration::from_secs(secs as u64))
    }
}

/// Suspends the task until the quota window resets if remaining quota is low.
pub async fn pause_if_depleted(headers: &HeaderMap) {
    let limit = RateLimit::from_headers(headers);
    if let Some(wait) = limit.wait_duration(now_unix()) {
        println!(
            "Rate limit approaching, sleeping for {} seconds...",
            wait.as_secs()
        );
        sleep(wait).await;
    }
}

fn header_u64(headers: &HeaderMap, name: &str) -> Option<u64> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok())
}

fn now_unix() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
