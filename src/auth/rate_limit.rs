use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::Response,
};
use std::{
    collections::HashMap,
    net::SocketAddr,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::AppState;

const AUTH_MAX_REQUESTS: u32 = 5;
const AUTH_WINDOW_SECS: u64 = 60;

// The Gemini-backed endpoints are the expensive ones; keep the window
// short so a chatty session recovers quickly.
const AI_MAX_REQUESTS: u32 = 10;
const AI_WINDOW_SECS: u64 = 60;

/// In-memory rate limit state (for single-instance deployments).
/// For multi-instance, use Redis or similar.
#[derive(Clone, Default)]
pub struct RateLimitState {
    entries: Arc<Mutex<HashMap<String, RateLimitEntry>>>,
}

struct RateLimitEntry {
    count: u32,
    window_start: Instant,
}

impl RateLimitState {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Check if the key is rate limited. Returns Ok(remaining) or Err with
    /// the time until the window resets.
    pub async fn check(&self, key: &str, max_requests: u32, window_secs: u64) -> Result<u32, Duration> {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        let window = Duration::from_secs(window_secs);

        let entry = entries.entry(key.to_string()).or_insert(RateLimitEntry {
            count: 0,
            window_start: now,
        });

        // Reset window if expired
        if now.duration_since(entry.window_start) > window {
            entry.count = 0;
            entry.window_start = now;
        }

        if entry.count >= max_requests {
            let retry_after = window.saturating_sub(now.duration_since(entry.window_start));
            return Err(retry_after);
        }

        entry.count += 1;
        Ok(max_requests - entry.count)
    }

    /// Drop entries whose window ended long enough ago that they can no
    /// longer affect a limit decision.
    pub async fn cleanup(&self) {
        // 2x the longest window in use
        self.sweep(Duration::from_secs(AUTH_WINDOW_SECS.max(AI_WINDOW_SECS) * 2))
            .await;
    }

    async fn sweep(&self, retain: Duration) {
        let mut entries = self.entries.lock().await;
        let now = Instant::now();
        entries.retain(|_, entry| now.duration_since(entry.window_start) < retain);
    }

    /// Periodically evict idle keys so the per-IP map cannot grow without
    /// bound.
    pub fn spawn_sweeper(&self) {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(300));
            loop {
                interval.tick().await;
                limiter.cleanup().await;
            }
        });
    }
}

/// Rate limiting middleware for auth endpoints
pub async fn rate_limit_auth(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let path = req.uri().path().to_string();

    // Rate limit key: IP + path (so /login and /register have separate limits)
    let key = format!("{}:{}", ip, path);

    match state
        .rate_limiter
        .check(&key, AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS)
        .await
    {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, path = %path, remaining = remaining, "Rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                path = %path,
                retry_after_secs = retry_after.as_secs(),
                "Rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

/// Rate limiting middleware for the LLM-backed endpoints (mood analysis, chat)
pub async fn rate_limit_ai(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let ip = addr.ip().to_string();
    let key = format!("ai:{}", ip);

    match state
        .rate_limiter
        .check(&key, AI_MAX_REQUESTS, AI_WINDOW_SECS)
        .await
    {
        Ok(remaining) => {
            tracing::debug!(ip = %ip, remaining = remaining, "AI rate limit check passed");
            Ok(next.run(req).await)
        }
        Err(retry_after) => {
            tracing::warn!(
                ip = %ip,
                retry_after_secs = retry_after.as_secs(),
                "AI rate limit exceeded"
            );
            Err(AppError::RateLimited)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn allows_under_limit() {
        let limiter = RateLimitState::new();

        for i in 0..AUTH_MAX_REQUESTS {
            let result = limiter.check("test_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
            assert!(result.is_ok(), "Request {} should be allowed", i + 1);
        }
    }

    #[tokio::test]
    async fn blocks_over_limit() {
        let limiter = RateLimitState::new();

        for _ in 0..AUTH_MAX_REQUESTS {
            let _ = limiter.check("test_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        }

        let result = limiter.check("test_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        assert!(result.is_err(), "Request over limit should be blocked");
    }

    #[tokio::test]
    async fn different_keys_have_separate_limits() {
        let limiter = RateLimitState::new();

        for _ in 0..AI_MAX_REQUESTS {
            let _ = limiter.check("ai:1.2.3.4", AI_MAX_REQUESTS, AI_WINDOW_SECS).await;
        }

        let result = limiter.check("ai:5.6.7.8", AI_MAX_REQUESTS, AI_WINDOW_SECS).await;
        assert!(result.is_ok(), "Different key should have separate limit");
    }

    #[tokio::test]
    async fn sweep_evicts_idle_entries() {
        let limiter = RateLimitState::new();

        for _ in 0..AUTH_MAX_REQUESTS {
            let _ = limiter.check("stale_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        }
        let result = limiter.check("stale_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        assert!(result.is_err(), "Key should be exhausted before the sweep");

        // Zero retention treats every entry as idle
        limiter.sweep(Duration::ZERO).await;

        let result = limiter.check("stale_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        assert!(result.is_ok(), "Swept key should start a fresh window");
    }

    #[tokio::test]
    async fn cleanup_keeps_live_entries() {
        let limiter = RateLimitState::new();

        for _ in 0..AUTH_MAX_REQUESTS {
            let _ = limiter.check("live_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        }

        // A just-used key is inside the retention horizon
        limiter.cleanup().await;

        let result = limiter.check("live_key", AUTH_MAX_REQUESTS, AUTH_WINDOW_SECS).await;
        assert!(result.is_err(), "Live key must still be rate limited after cleanup");
    }
}
