use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use sqlx::migrate::MigrateError;
use thiserror::Error;

/// Top-level error type for the entire application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Payment {reference} was not successful (gateway status: {status})")]
    PaymentNotSuccessful { reference: String, status: String },

    #[error("Transaction {0} carries no campaign reference in its metadata")]
    MissingCampaignReference(String),

    #[error("Not configured: {0}")]
    NotConfigured(String),

    #[error("Limit exceeded: at most {limit} allowed, request would make {attempted}")]
    LimitExceeded { limit: usize, attempted: usize },

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Failures talking to the payment gateway.
///
/// Every transport problem is folded into one of these at the client boundary,
/// so nothing above the gateway module ever sees a raw `reqwest::Error`.
#[derive(Error, Debug, Clone)]
pub enum GatewayError {
    /// Timeout or network failure. Safe to retry.
    #[error("Gateway unavailable: {message}")]
    Transient { message: String, timed_out: bool },

    /// The provider answered and refused the request.
    #[error("Gateway rejected request: {message}")]
    Rejected { status: Option<u16>, message: String },

    /// The provider answered with something we could not interpret.
    #[error("Unreadable gateway response: {0}")]
    Decode(String),
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, GatewayError::Transient { .. })
    }
}

impl From<reqwest::Error> for GatewayError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            GatewayError::Transient {
                message: "request to payment gateway timed out".to_string(),
                timed_out: true,
            }
        } else if error.is_connect() || error.is_request() {
            GatewayError::Transient {
                message: format!("could not reach payment gateway: {}", error),
                timed_out: false,
            }
        } else if error.is_decode() {
            GatewayError::Decode(error.to_string())
        } else {
            GatewayError::Rejected {
                status: error.status().map(|s| s.as_u16()),
                message: error.to_string(),
            }
        }
    }
}

/// API error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub error_code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String, Option<serde_json::Value>) {
        match self {
            AppError::NotFound(what) => (
                StatusCode::NOT_FOUND,
                "NOT_FOUND",
                format!("{} not found.", what),
                None,
            ),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, "FORBIDDEN", message.clone(), None)
            }
            AppError::PaymentNotSuccessful { reference, status } => (
                StatusCode::BAD_REQUEST,
                "PAYMENT_NOT_SUCCESSFUL",
                "Transaction was not successful.".to_string(),
                Some(serde_json::json!({
                    "reference": reference,
                    "gateway_status": status,
                    "retryable": false,
                })),
            ),
            AppError::MissingCampaignReference(reference) => (
                StatusCode::BAD_REQUEST,
                "MISSING_CAMPAIGN_REFERENCE",
                "CampaignId not found in metadata.".to_string(),
                Some(serde_json::json!({ "reference": reference })),
            ),
            AppError::NotConfigured(message) => {
                (StatusCode::BAD_REQUEST, "NOT_CONFIGURED", message.clone(), None)
            }
            AppError::LimitExceeded { limit, attempted } => (
                StatusCode::BAD_REQUEST,
                "LIMIT_EXCEEDED",
                format!("Maximum limit of {} evidence files reached.", limit),
                Some(serde_json::json!({ "limit": limit, "attempted": attempted })),
            ),
            AppError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message.clone(), None)
            }
            AppError::InvalidInput(message) => {
                (StatusCode::BAD_REQUEST, "INVALID_INPUT", message.clone(), None)
            }
            AppError::Conflict(message) => {
                (StatusCode::CONFLICT, "CONFLICT", message.clone(), None)
            }
            AppError::Gateway(GatewayError::Transient { message, timed_out }) => (
                if *timed_out {
                    StatusCode::GATEWAY_TIMEOUT
                } else {
                    StatusCode::SERVICE_UNAVAILABLE
                },
                "GATEWAY_UNAVAILABLE",
                message.clone(),
                Some(serde_json::json!({ "retryable": true })),
            ),
            AppError::Gateway(GatewayError::Rejected { status, message }) => (
                status
                    .and_then(|code| StatusCode::from_u16(code).ok())
                    .filter(|code| code.is_client_error() || code.is_server_error())
                    .unwrap_or(StatusCode::BAD_GATEWAY),
                "GATEWAY_REJECTED",
                message.clone(),
                None,
            ),
            AppError::Gateway(GatewayError::Decode(_)) => (
                StatusCode::BAD_GATEWAY,
                "GATEWAY_ERROR",
                "The payment gateway returned an unexpected response.".to_string(),
                None,
            ),
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "DATABASE_ERROR",
                "A database error occurred".to_string(),
                None,
            ),
            AppError::Config(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "INTERNAL_ERROR",
                "An internal error occurred".to_string(),
                None,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_code, message, details) = self.parts();

        if status.is_server_error() {
            tracing::error!("{} -> {}", status, self);
        }

        let body = Json(ErrorResponse {
            status: "error",
            error_code: error_code.to_string(),
            message,
            details,
        });

        (status, body).into_response()
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        AppError::Internal(format!("Error converting: {:?}", error))
    }
}

impl From<config::ConfigError> for AppError {
    fn from(error: config::ConfigError) -> Self {
        AppError::Config(error.to_string())
    }
}

impl From<MigrateError> for AppError {
    fn from(error: MigrateError) -> Self {
        AppError::Internal(format!("Migration error: {:?}", error))
    }
}

/// Result type alias for the application
pub type AppResult<T> = Result<T, AppError>;
