use std::{
    collections::HashSet,
    sync::Arc,
    time::{Duration, Instant},
};

use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

/// Request ID carried through request extensions and echoed back in the
/// `x-request-id` response header.
#[derive(Debug, Clone)]
pub struct RequestId(pub String);

/// Bearer-key auth settings.
///
/// Keys come from `AQAR_API_KEYS` (comma-separated). Missing keys disable
/// auth in development and fail startup everywhere else.
#[derive(Debug, Clone)]
pub struct AuthState {
    keys: Arc<HashSet<String>>,
    pub enabled: bool,
}

impl AuthState {
    pub fn from_env(is_development: bool) -> anyhow::Result<Self> {
        let raw = std::env::var("AQAR_API_KEYS").unwrap_or_default();
        let keys: HashSet<String> = raw
            .split(',')
            .map(str::trim)
            .filter(|key| !key.is_empty())
            .map(ToOwned::to_owned)
            .collect();

        if keys.is_empty() && !is_development {
            anyhow::bail!(
                "AQAR_API_KEYS is required outside development; provide comma-separated bearer tokens"
            );
        }
        if keys.is_empty() {
            tracing::warn!(
                "AQAR_API_KEYS not set; bearer auth disabled in development environment"
            );
        }

        Ok(Self {
            enabled: !keys.is_empty(),
            keys: Arc::new(keys),
        })
    }

    fn allows(&self, token: &str) -> bool {
        self.keys.contains(token)
    }
}

/// Fixed-window request limiter shared across all routes.
#[derive(Debug, Clone)]
pub struct RateLimitState {
    max_requests: usize,
    window: Duration,
    counter: Arc<Mutex<WindowCounter>>,
}

#[derive(Debug)]
struct WindowCounter {
    opened_at: Instant,
    hits: usize,
}

impl RateLimitState {
    #[must_use]
    pub fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            counter: Arc::new(Mutex::new(WindowCounter {
                opened_at: Instant::now(),
                hits: 0,
            })),
        }
    }

    /// Count one request against the current window. Returns `false` when
    /// the window is exhausted.
    async fn try_admit(&self) -> bool {
        let mut counter = self.counter.lock().await;
        if counter.opened_at.elapsed() >= self.window {
            counter.opened_at = Instant::now();
            counter.hits = 0;
        }
        if counter.hits >= self.max_requests {
            return false;
        }
        counter.hits += 1;
        true
    }
}

#[derive(Debug, Serialize)]
struct GateErrorBody {
    error: GateError,
}

#[derive(Debug, Serialize)]
struct GateError {
    code: &'static str,
    message: &'static str,
}

fn gate_response(status: StatusCode, code: &'static str, message: &'static str) -> Response {
    (
        status,
        Json(GateErrorBody {
            error: GateError { code, message },
        }),
    )
        .into_response()
}

/// Extract or generate a request ID and propagate it both ways.
pub async fn request_id(mut req: Request, next: Next) -> Response {
    let id = req
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .map_or_else(|| Uuid::new_v4().to_string(), String::from);

    req.extensions_mut().insert(RequestId(id.clone()));

    let mut res = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&id) {
        res.headers_mut().insert("x-request-id", val);
    }
    res
}

/// Enforce bearer auth when enabled.
pub async fn require_bearer_auth(
    State(auth): State<AuthState>,
    req: Request,
    next: Next,
) -> Response {
    if !auth.enabled {
        return next.run(req).await;
    }

    match extract_bearer_token(req.headers().get(AUTHORIZATION)) {
        Some(token) if auth.allows(token) => next.run(req).await,
        _ => gate_response(
            StatusCode::UNAUTHORIZED,
            "unauthorized",
            "missing or invalid bearer token",
        ),
    }
}

/// Enforce the fixed-window request limit.
pub async fn enforce_rate_limit(
    State(rate_limit): State<RateLimitState>,
    req: Request,
    next: Next,
) -> Response {
    if rate_limit.try_admit().await {
        next.run(req).await
    } else {
        gate_response(
            StatusCode::TOO_MANY_REQUESTS,
            "rate_limited",
            "rate limit exceeded",
        )
    }
}

fn extract_bearer_token(value: Option<&HeaderValue>) -> Option<&str> {
    value
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .filter(|token| !token.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extract_bearer_token_accepts_valid_header() {
        let header = HeaderValue::from_static("Bearer test-token");
        assert_eq!(extract_bearer_token(Some(&header)), Some("test-token"));
    }

    #[test]
    fn extract_bearer_token_rejects_non_bearer_header() {
        let header = HeaderValue::from_static("Basic abc123");
        assert_eq!(extract_bearer_token(Some(&header)), None);
    }

    #[test]
    fn auth_state_disables_when_no_keys_in_dev() {
        std::env::remove_var("AQAR_API_KEYS");
        let state = AuthState::from_env(true).expect("dev should allow missing keys");
        assert!(!state.enabled);
    }

    #[tokio::test]
    async fn limiter_rejects_after_window_is_full() {
        let limiter = RateLimitState::new(2, Duration::from_secs(60));
        assert!(limiter.try_admit().await);
        assert!(limiter.try_admit().await);
        assert!(!limiter.try_admit().await);
    }

    #[tokio::test]
    async fn limiter_resets_when_window_rolls_over() {
        let limiter = RateLimitState::new(1, Duration::from_millis(0));
        assert!(limiter.try_admit().await);
        assert!(limiter.try_admit().await, "zero-length window always resets");
    }
}
