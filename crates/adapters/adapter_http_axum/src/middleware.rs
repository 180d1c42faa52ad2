//! HTTP middleware: per-IP rate limiting and the soft request deadline.
//!
//! The hardening headers are plain `tower-http` layers assembled by the
//! router; only the stateful pieces live here.

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use axum::extract::{ConnectInfo, Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use tokio::time::Instant;

use echobridge_app::ports::DeviceSource;

use crate::state::AppState;

/// Soft per-request deadline; a handler past it answers 500.
pub const REQUEST_DEADLINE: Duration = Duration::from_secs(10);

struct WindowSlot {
    started: Instant,
    count: u32,
}

/// Fixed-window request counter per client address.
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Mutex<HashMap<IpAddr, WindowSlot>>,
}

impl RateLimiter {
    #[must_use]
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// The policy every route runs under: `max_requests` per 15 minutes.
    #[must_use]
    pub fn per_quarter_hour(max_requests: u32) -> Self {
        Self::new(max_requests, Duration::from_secs(15 * 60))
    }

    /// Record a hit; `false` when the caller is over budget for the
    /// current window.
    pub fn allow(&self, addr: IpAddr) -> bool {
        let now = Instant::now();
        let mut windows = self
            .windows
            .lock()
            .unwrap_or_else(PoisonError::into_inner);

        let slot = windows.entry(addr).or_insert(WindowSlot {
            started: now,
            count: 0,
        });
        if now.duration_since(slot.started) >= self.window {
            slot.started = now;
            slot.count = 0;
        }
        slot.count += 1;
        slot.count <= self.max_requests
    }
}

/// Reject callers over their fixed-window budget with 429.
pub async fn rate_limit<S>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Response
where
    S: DeviceSource + 'static,
{
    let addr = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map_or(IpAddr::V4(Ipv4Addr::UNSPECIFIED), |info| info.0.ip());

    if state.limiter.allow(addr) {
        next.run(request).await
    } else {
        tracing::debug!(%addr, "rate limit exceeded");
        (StatusCode::TOO_MANY_REQUESTS, "Too many requests").into_response()
    }
}

/// Abort handlers that outlive the soft deadline with a 500.
///
/// The body is the Alexa `INTERNAL_ERROR` envelope: the directive endpoint
/// is the only caller that parses error bodies, the Hue routes only
/// promise the status code.
pub async fn deadline(request: Request, next: Next) -> Response {
    match tokio::time::timeout(REQUEST_DEADLINE, next.run(request)).await {
        Ok(response) => response,
        Err(_) => {
            tracing::warn!("request exceeded deadline, aborting");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                axum::Json(crate::alexa::internal_error_body("Request deadline exceeded")),
            )
                .into_response()
        }
    }
}
