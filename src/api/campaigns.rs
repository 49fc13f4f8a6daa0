// Campaign endpoints
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use super::handler::AppState;
use super::models::*;
use crate::{
    auth::CallerIdentity,
    error::AppResult,
    ledger::models::{Campaign, Evidence},
    middleware::{ValidPath, ValidatedJson},
};

/// POST /api/campaigns
pub async fn create_campaign(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidatedJson(request): ValidatedJson<CreateCampaignRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Campaign>>)> {
    let campaign = state.campaigns.create(&caller, request.into()).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::success("Campaign created successfully.", campaign)),
    ))
}

/// GET /api/campaigns
pub async fn list_campaigns(State(state): State<AppState>) -> AppResult<Json<ApiResponse<Vec<Campaign>>>> {
    let campaigns = state.campaigns.list().await?;
    Ok(Json(ApiResponse::list("Campaigns retrieved", campaigns)))
}

/// GET /api/campaigns/:id
pub async fn get_campaign(
    State(state): State<AppState>,
    ValidPath(campaign_id): ValidPath<Uuid>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let campaign = state.campaigns.get(campaign_id).await?;
    Ok(Json(ApiResponse::success("Campaign retrieved", campaign)))
}

/// PATCH /api/campaigns/:id/activate
pub async fn activate_campaign(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidPath(campaign_id): ValidPath<Uuid>,
    ValidatedJson(request): ValidatedJson<ActivateCampaignRequest>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let campaign = state
        .campaigns
        .activate(campaign_id, &caller, request.campaign_id)
        .await?;

    Ok(Json(ApiResponse::success("Campaign successfully activated.", campaign)))
}

/// PATCH /api/campaigns/:id/evidence
pub async fn add_evidence(
    State(state): State<AppState>,
    caller: CallerIdentity,
    ValidPath(campaign_id): ValidPath<Uuid>,
    ValidatedJson(request): ValidatedJson<AddEvidenceRequest>,
) -> AppResult<Json<ApiResponse<Campaign>>> {
    let items = request.evidence.into_iter().map(Evidence::from).collect();
    let campaign = state
        .campaigns
        .append_evidence(campaign_id, &caller, items)
        .await?;

    Ok(Json(ApiResponse::success("New evidence added successfully.", campaign)))
}

/// Newest first, anonymous donors masked
/// GET /api/campaigns/:id/donations
pub async fn campaign_donations(
    State(state): State<AppState>,
    ValidPath(campaign_id): ValidPath<Uuid>,
) -> AppResult<Json<ApiResponse<Vec<DonationView>>>> {
    let donations: Vec<DonationView> = state
        .campaigns
        .donations(campaign_id)
        .await?
        .into_iter()
        .map(DonationView::from)
        .collect();

    Ok(Json(ApiResponse::list("Donations retrieved", donations)))
}
