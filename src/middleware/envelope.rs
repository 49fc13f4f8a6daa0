use axum::{
    http::{header::{CONTENT_LENGTH, CONTENT_TYPE}, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use tracing::debug;

use crate::error::ErrorResponse;

/// Give bodiless error responses from the framework and tower layers
/// (request timeout, unknown route, wrong method) the JSON error shape.
pub async fn wrap_bare_errors(response: Response) -> Response {
    let status = response.status();
    if !(status.is_client_error() || status.is_server_error())
        || response.headers().contains_key(CONTENT_TYPE)
    {
        return response;
    }

    debug!("Wrapping bare {} response", status);

    let body = ErrorResponse {
        status: "error",
        error_code: error_code(status).to_string(),
        message: message(status).to_string(),
        details: None,
    };

    let mut wrapped = (status, Json(body)).into_response();
    for (name, value) in response.headers() {
        if *name != CONTENT_LENGTH && !wrapped.headers().contains_key(name) {
            wrapped.headers_mut().insert(name.clone(), value.clone());
        }
    }
    wrapped
}

fn error_code(status: StatusCode) -> &'static str {
    match status {
        StatusCode::REQUEST_TIMEOUT => "REQUEST_TIMEOUT",
        StatusCode::NOT_FOUND => "NOT_FOUND",
        StatusCode::METHOD_NOT_ALLOWED => "METHOD_NOT_ALLOWED",
        s if s.is_server_error() => "INTERNAL_ERROR",
        _ => "INVALID_INPUT",
    }
}

fn message(status: StatusCode) -> &'static str {
    match status {
        StatusCode::REQUEST_TIMEOUT => "The request took too long to complete.",
        StatusCode::NOT_FOUND => "Route not found.",
        StatusCode::METHOD_NOT_ALLOWED => "Method not allowed on this route.",
        s => s.canonical_reason().unwrap_or("Request failed"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use serde_json::Value;

    async fn body_of(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_bare_timeout_gets_error_shape() {
        let bare = Response::builder()
            .status(StatusCode::REQUEST_TIMEOUT)
            .body(Body::empty())
            .unwrap();

        let wrapped = wrap_bare_errors(bare).await;
        assert_eq!(wrapped.status(), StatusCode::REQUEST_TIMEOUT);
        let body = body_of(wrapped).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["error_code"], "REQUEST_TIMEOUT");
    }

    #[tokio::test]
    async fn test_json_errors_pass_through_untouched() {
        let already = crate::error::AppError::Conflict("taken".to_string()).into_response();
        let wrapped = wrap_bare_errors(already).await;
        let body = body_of(wrapped).await;
        assert_eq!(body["error_code"], "CONFLICT");
        assert_eq!(body["message"], "taken");
    }

    #[tokio::test]
    async fn test_success_is_left_alone() {
        let ok = Response::builder().status(StatusCode::NO_CONTENT).body(Body::empty()).unwrap();
        let wrapped = wrap_bare_errors(ok).await;
        assert_eq!(wrapped.status(), StatusCode::NO_CONTENT);
        assert!(!wrapped.headers().contains_key(CONTENT_TYPE));
    }
}
