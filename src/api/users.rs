// User profile endpoints
use axum::{extract::State, http::StatusCode, Json};

use super::handler::AppState;
use super::models::*;
use crate::{auth::CallerIdentity, error::AppResult, ledger::models::User, middleware::ValidatedJson};

/// Register the caller's profile under their token subject
/// POST /api/users
pub async fn register_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<User>>)> {
    let user = state.users.register(&caller, request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("User registered successfully", user)),
    ))
}

/// GET /api/users/me
pub async fn current_user(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> AppResult<Json<ApiResponse<User>>> {
    let user = state.users.me(&caller).await?;
    Ok(Json(ApiResponse::success("User retrieved", user)))
}
