//! Fixed-window request budget per client IP.

use axum::{
    extract::{ConnectInfo, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use std::{collections::HashMap, net::SocketAddr, sync::Arc};
use tokio::sync::RwLock;

use crate::routes::ErrorResponse;

#[derive(Debug, Clone, Copy)]
struct Window {
    started_at: i64,
    count: u32,
}

#[derive(Debug, Clone)]
pub struct RateLimiter {
    windows: Arc<RwLock<HashMap<String, Window>>>,
    max_requests: u32,
    window_secs: i64,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window_secs: i64) -> Self {
        Self {
            windows: Arc::new(RwLock::new(HashMap::new())),
            max_requests,
            window_secs: window_secs.max(1),
        }
    }

    /// Count one request from `client` at `now` (unix seconds); `false` once
    /// the budget for the current window is spent.
    pub async fn check(&self, client: &str, now: i64) -> bool {
        let mut windows = self.windows.write().await;

        // Evict finished windows so memory tracks active clients only.
        windows.retain(|_, w| now - w.started_at < self.window_secs);

        let window = windows.entry(client.to_string()).or_insert(Window {
            started_at: now,
            count: 0,
        });
        if window.count >= self.max_requests {
            return false;
        }
        window.count += 1;
        true
    }
}

pub async fn limit_requests(
    State(limiter): State<RateLimiter>,
    request: Request,
    next: Next,
) -> Response {
    let client = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());

    if !limiter.check(&client, Utc::now().timestamp()).await {
        tracing::warn!(client = %client, "rate limit exceeded");
        return (
            StatusCode::TOO_MANY_REQUESTS,
            Json(ErrorResponse {
                error: "Too many requests, please try again later.".to_string(),
                message: None,
            }),
        )
            .into_response();
    }

    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_budget_per_window() {
        let limiter = RateLimiter::new(2, 60);
        assert!(limiter.check("1.1.1.1", 1000).await);
        assert!(limiter.check("1.1.1.1", 1001).await);
        assert!(!limiter.check("1.1.1.1", 1002).await);
        // Other clients have their own budget.
        assert!(limiter.check("2.2.2.2", 1002).await);
    }

    #[tokio::test]
    async fn test_window_resets() {
        let limiter = RateLimiter::new(1, 60);
        assert!(limiter.check("1.1.1.1", 1000).await);
        assert!(!limiter.check("1.1.1.1", 1059).await);
        assert!(limiter.check("1.1.1.1", 1060).await);
    }

    #[tokio::test]
    async fn test_stale_windows_are_evicted() {
        let limiter = RateLimiter::new(5, 10);
        limiter.check("a", 0).await;
        limiter.check("b", 0).await;
        limiter.check("c", 100).await;
        assert_eq!(limiter.windows.read().await.len(), 1);
    }
}
