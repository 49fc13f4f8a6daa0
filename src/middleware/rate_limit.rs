use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use governor::{state::InMemoryState, state::NotKeyed, Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;
use tracing::warn;

use crate::error::ErrorResponse;

/// Process-wide quota for a group of routes
#[derive(Clone)]
pub struct RateLimitLayer {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, governor::clock::DefaultClock>>,
}

impl RateLimitLayer {
    /// A zero quota is treated as one request per minute
    pub fn per_minute(requests: u32) -> Self {
        let requests = NonZeroU32::new(requests).unwrap_or(NonZeroU32::MIN);
        RateLimitLayer {
            limiter: Arc::new(RateLimiter::direct(Quota::per_minute(requests))),
        }
    }

    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimitLayer>,
    req: Request,
    next: Next,
) -> Response {
    if !limiter.check() {
        warn!("Rate limit exceeded for {}", req.uri().path());
        let body = ErrorResponse {
            status: "error",
            error_code: "RATE_LIMITED".to_string(),
            message: "Rate limit exceeded. Please try again later.".to_string(),
            details: None,
        };
        return (StatusCode::TOO_MANY_REQUESTS, Json(body)).into_response();
    }

    next.run(req).await
}
