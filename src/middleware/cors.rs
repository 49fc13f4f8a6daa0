use axum::{
    http::{header, Method},
    http::HeaderValue,
};
use tower_http::cors::CorsLayer;

use crate::error::{AppError, AppResult};

pub fn create_cors_layer(origins: &[String]) -> AppResult<CorsLayer> {
    let allowed_origins = origins
        .iter()
        .map(|origin| {
            origin
                .parse::<HeaderValue>()
                .map_err(|_| AppError::Config(format!("Invalid CORS origin: {}", origin)))
        })
        .collect::<AppResult<Vec<_>>>()?;

    Ok(CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PATCH,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            header::ORIGIN,
        ])
        .allow_credentials(true)
        .max_age(std::time::Duration::from_secs(60 * 60))) // 1 hour
}
