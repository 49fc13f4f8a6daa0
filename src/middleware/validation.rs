use axum::{
    async_trait,
    extract::{FromRequest, FromRequestParts, Path, Request},
    http::request::Parts,
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// JSON body that has passed its `validator` rules
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid JSON: {}", e.body_text())))?;

        value
            .validate()
            .map_err(|e| AppError::InvalidInput(format_validation_errors(&e)))?;

        Ok(ValidatedJson(value))
    }
}

/// Path parameters that reject through `AppError` instead of axum's plain-text body
#[derive(Debug, Clone)]
pub struct ValidPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ValidPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(value) = Path::<T>::from_request_parts(parts, state)
            .await
            .map_err(|e| AppError::InvalidInput(format!("Invalid path parameter: {}", e.body_text())))?;

        Ok(ValidPath(value))
    }
}

pub fn format_validation_errors(errors: &ValidationErrors) -> String {
    let mut fields: Vec<String> = errors
        .field_errors()
        .into_iter()
        .map(|(field, errors)| {
            let error_messages: Vec<String> = errors
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|s| s.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            format!("{}: {}", field, error_messages.join(", "))
        })
        .collect();
    fields.sort();

    format!("Validation failed: {}", fields.join("; "))
}
