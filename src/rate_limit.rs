//! Fixed-window request limiter keyed by client IP.
//!
//! State is process-local: it does not survive restarts and is not shared
//! between instances.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::HeaderMap,
    middleware::Next,
    response::{IntoResponse, Response},
};
use tokio::{sync::Mutex, task::JoinHandle};
use tracing::{debug, warn};

use crate::config::RateLimitConfig;
use crate::error::AuthError;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    reset_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u32 },
    Limited { retry_after_secs: u64 },
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<Mutex<HashMap<String, Window>>>,
    max_requests: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            windows: Arc::new(Mutex::new(HashMap::new())),
            max_requests,
            window,
        }
    }

    pub fn from_config(cfg: &RateLimitConfig) -> Self {
        Self::new(cfg.max_requests, cfg.window())
    }

    pub async fn check(&self, key: &str) -> Decision {
        self.check_at(key, Instant::now()).await
    }

    async fn check_at(&self, key: &str, now: Instant) -> Decision {
        let mut windows = self.windows.lock().await;

        match windows.get_mut(key) {
            Some(w) if now < w.reset_at => {
                if w.count >= self.max_requests {
                    let remaining = w.reset_at - now;
                    return Decision::Limited {
                        retry_after_secs: ceil_secs(remaining),
                    };
                }
                w.count += 1;
                Decision::Allowed {
                    remaining: self.max_requests - w.count,
                }
            }
            _ => {
                windows.insert(
                    key.to_string(),
                    Window {
                        count: 1,
                        reset_at: now + self.window,
                    },
                );
                Decision::Allowed {
                    remaining: self.max_requests.saturating_sub(1),
                }
            }
        }
    }

    /// Drops windows that have already ended. Returns how many were removed.
    pub async fn purge_expired(&self) -> usize {
        self.purge_expired_at(Instant::now()).await
    }

    async fn purge_expired_at(&self, now: Instant) -> usize {
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, w| now < w.reset_at);
        before - windows.len()
    }

    /// Spawns a task that purges expired windows every `every`.
    pub fn spawn_janitor(&self, every: Duration) -> JoinHandle<()> {
        let limiter = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            loop {
                ticker.tick().await;
                let purged = limiter.purge_expired().await;
                if purged > 0 {
                    debug!(purged, "rate limit windows purged");
                }
            }
        })
    }
}

fn ceil_secs(d: Duration) -> u64 {
    let secs = d.as_secs();
    if d.subsec_nanos() > 0 {
        secs + 1
    } else {
        secs
    }
}

/// Client identity: first `X-Forwarded-For` hop, then `X-Real-IP`, then the peer address.
pub fn client_key(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = forwarded {
        return ip.to_string();
    }

    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    if let Some(ip) = real_ip {
        return ip.to_string();
    }

    peer.map(|addr| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware for `axum::middleware::from_fn_with_state`.
pub async fn enforce_rate_limit(
    State(limiter): State<RateLimiter>,
    req: Request,
    next: Next,
) -> Response {
    let peer = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let key = client_key(req.headers(), peer);

    match limiter.check(&key).await {
        Decision::Allowed { remaining } => {
            debug!(client = %key, remaining, "rate limit check passed");
            next.run(req).await
        }
        Decision::Limited { retry_after_secs } => {
            warn!(client = %key, retry_after_secs, path = %req.uri().path(), "rate limit exceeded");
            AuthError::rate_limited(retry_after_secs).into_response()
        }
    }
}
