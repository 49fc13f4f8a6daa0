// Payment endpoints: donation verification, payouts, and bank helpers
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use tracing::info;
use uuid::Uuid;

use super::handler::AppState;
use super::models::*;
use crate::{
    auth::CallerIdentity,
    error::AppResult,
    funding::ReconcileOutcome,
    gateway::{Bank, ResolvedAccount},
    middleware::{ValidPath, ValidatedJson},
    settlement::PayoutReceipt,
};

/// Verify a donation by gateway reference and record it once
/// GET /api/payments/verify/:reference
pub async fn verify_payment(
    State(state): State<AppState>,
    ValidPath(reference): ValidPath<String>,
) -> AppResult<Response> {
    let response = match state.reconciler.reconcile(&reference).await? {
        ReconcileOutcome::Recorded(donation) => Json(ApiResponse::success(
            "Transaction has been verified successfully.",
            DonationView::from(donation),
        ))
        .into_response(),
        ReconcileOutcome::AlreadyProcessed { .. } => {
            Json(ApiResponse::message("Transaction has already been verified.")).into_response()
        }
    };

    Ok(response)
}

/// Release a campaign's funds to the owner's bank
/// POST /api/payments/payout/:campaign_id
pub async fn trigger_payout(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidPath(campaign_id): ValidPath<Uuid>,
) -> AppResult<Json<ApiResponse<PayoutReceipt>>> {
    let receipt = state.payouts.trigger(campaign_id, &caller).await?;

    Ok(Json(ApiResponse::success(
        "Payout has been initiated. Funds will be settled to your account shortly.",
        receipt,
    )))
}

/// GET /api/payments/banks
pub async fn list_banks(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Bank>>>> {
    let banks = state.gateway.list_banks().await?;
    Ok(Json(ApiResponse::list("Banks retrieved", banks)))
}

/// POST /api/payments/resolve
pub async fn resolve_account(
    State(state): State<AppState>,
    _caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<ResolveAccountRequest>,
) -> AppResult<Json<ApiResponse<ResolvedAccount>>> {
    let account = state
        .gateway
        .resolve_account_name(&request.account_number, &request.bank_code)
        .await?;

    Ok(Json(ApiResponse::success("Account number resolved", account)))
}

/// Provision a payout account for the caller
/// POST /api/payments/subaccount
pub async fn create_subaccount(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<CreateSubaccountRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<SubaccountView>>)> {
    let (user, payout) = state
        .campaigns
        .create_payout_account(
            &caller,
            &request.bank_code,
            &request.account_number,
            request.business_name.as_deref(),
        )
        .await?;

    info!("✓ Payout account {} stored for user {}", payout.code, user.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success(
            "Subaccount created successfully.",
            SubaccountView::new(&user, payout),
        )),
    ))
}
