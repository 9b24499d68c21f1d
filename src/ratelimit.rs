use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use std::time::{Duration, Instant};

use axum::{
    extract::{ConnectInfo, Request, State},
    http::{HeaderMap, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use crate::state::AppState;

/// A fixed-window admission policy. `message` is the client-facing 429 body.
#[derive(Debug, Clone, Copy)]
pub struct Policy {
    pub name: &'static str,
    pub window: Duration,
    pub max_requests: u32,
    pub message: &'static str,
}

/// General API traffic: 100 requests per IP per 15 minutes.
pub const GENERAL: Policy = Policy {
    name: "general",
    window: Duration::from_secs(15 * 60),
    max_requests: 100,
    message: "Too many requests, please try again later",
};

/// Signup/signin traffic: 10 requests per IP per hour. Credential guessing
/// and account enumeration concentrate on these endpoints.
pub const AUTH: Policy = Policy {
    name: "auth",
    window: Duration::from_secs(60 * 60),
    max_requests: 10,
    message: "Too many sign-in attempts, please try again later",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed {
        remaining: u32,
        reset_after: Duration,
    },
    Rejected {
        retry_after: Duration,
    },
}

/// Admission state keyed by client IP. Kept behind a trait so a shared
/// counter store can replace the in-process map without touching callers.
pub trait AdmissionStore: Send + Sync {
    fn policy(&self) -> &Policy;
    fn admit(&self, key: IpAddr) -> Decision;
}

#[derive(Debug)]
struct Window {
    count: u32,
    started_at: Instant,
}

/// In-process fixed-window limiter. The outer map is read-mostly; each key
/// carries its own mutex so the check-and-increment is atomic per IP while
/// unrelated IPs proceed in parallel.
pub struct RateLimiter {
    policy: Policy,
    windows: RwLock<HashMap<IpAddr, Arc<Mutex<Window>>>>,
}

impl RateLimiter {
    pub fn new(policy: Policy) -> Self {
        Self {
            policy,
            windows: RwLock::new(HashMap::new()),
        }
    }

    fn window_for(&self, key: IpAddr, now: Instant) -> Arc<Mutex<Window>> {
        if let Some(entry) = read_lock(&self.windows).get(&key) {
            return Arc::clone(entry);
        }
        let mut windows = write_lock(&self.windows);
        Arc::clone(windows.entry(key).or_insert_with(|| {
            Arc::new(Mutex::new(Window {
                count: 0,
                started_at: now,
            }))
        }))
    }

    fn admit_at(&self, key: IpAddr, now: Instant) -> Decision {
        let window = self.window_for(key, now);
        let mut window = lock(&window);

        let elapsed = now.duration_since(window.started_at);
        if elapsed >= self.policy.window {
            window.count = 1;
            window.started_at = now;
            return Decision::Allowed {
                remaining: self.policy.max_requests - 1,
                reset_after: self.policy.window,
            };
        }

        window.count += 1;
        let reset_after = self.policy.window - elapsed;
        if window.count <= self.policy.max_requests {
            Decision::Allowed {
                remaining: self.policy.max_requests - window.count,
                reset_after,
            }
        } else {
            Decision::Rejected {
                retry_after: reset_after,
            }
        }
    }
}

impl AdmissionStore for RateLimiter {
    fn policy(&self) -> &Policy {
        &self.policy
    }

    fn admit(&self, key: IpAddr) -> Decision {
        self.admit_at(key, Instant::now())
    }
}

// A poisoned lock only means another request panicked mid-update; the window
// data stays usable, so recover the guard instead of propagating the panic.
fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|p| p.into_inner())
}

fn read_lock<T>(l: &RwLock<T>) -> std::sync::RwLockReadGuard<'_, T> {
    l.read().unwrap_or_else(|p| p.into_inner())
}

fn write_lock<T>(l: &RwLock<T>) -> std::sync::RwLockWriteGuard<'_, T> {
    l.write().unwrap_or_else(|p| p.into_inner())
}

pub async fn api_admission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    gate(state.api_limiter.as_ref(), addr.ip(), req, next).await
}

pub async fn auth_admission(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    req: Request,
    next: Next,
) -> Response {
    gate(state.auth_limiter.as_ref(), addr.ip(), req, next).await
}

async fn gate(limiter: &dyn AdmissionStore, ip: IpAddr, req: Request, next: Next) -> Response {
    let policy = *limiter.policy();
    match limiter.admit(ip) {
        Decision::Allowed {
            remaining,
            reset_after,
        } => {
            let mut res = next.run(req).await;
            set_ratelimit_headers(res.headers_mut(), &policy, remaining, reset_after);
            res
        }
        Decision::Rejected { retry_after } => {
            warn!(ip = %ip, policy = policy.name, "rate limit exceeded");
            let mut res = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "message": policy.message, "success": false })),
            )
                .into_response();
            set_ratelimit_headers(res.headers_mut(), &policy, 0, retry_after);
            res
        }
    }
}

// Standard draft RateLimit-* headers; the legacy X-RateLimit-* family is not
// emitted.
fn set_ratelimit_headers(
    headers: &mut HeaderMap,
    policy: &Policy,
    remaining: u32,
    reset_after: Duration,
) {
    if let Ok(v) = HeaderValue::from_str(&policy.max_requests.to_string()) {
        headers.insert("ratelimit-limit", v);
    }
    if let Ok(v) = HeaderValue::from_str(&remaining.to_string()) {
        headers.insert("ratelimit-remaining", v);
    }
    if let Ok(v) = HeaderValue::from_str(&reset_after.as_secs().to_string()) {
        headers.insert("ratelimit-reset", v);
    }
}
