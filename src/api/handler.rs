use axum::{extract::State, http::StatusCode, Json};
use chrono::Utc;
use std::sync::Arc;
use tracing::error;

use super::models::HealthResponse;
use crate::{
    auth::TokenVerifier,
    campaigns::CampaignService,
    funding::DonationReconciler,
    gateway::PaymentGateway,
    ledger::LedgerStore,
    notifications::Notifier,
    settlement::PayoutTrigger,
    users::UserService,
};

#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<dyn LedgerStore>,
    pub gateway: Arc<dyn PaymentGateway>,
    pub reconciler: Arc<DonationReconciler>,
    pub payouts: Arc<PayoutTrigger>,
    pub campaigns: Arc<CampaignService>,
    pub users: Arc<UserService>,
    pub auth: Arc<TokenVerifier>,
}

impl AppState {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
        auth: Arc<TokenVerifier>,
        percentage_charge: f64,
    ) -> Self {
        let reconciler = Arc::new(DonationReconciler::new(gateway.clone(), ledger.clone()));
        let payouts = Arc::new(PayoutTrigger::new(ledger.clone(), gateway.clone(), notifier));
        let campaigns = Arc::new(CampaignService::new(
            ledger.clone(),
            gateway.clone(),
            percentage_charge,
        ));
        let users = Arc::new(UserService::new(ledger.clone()));

        Self {
            ledger,
            gateway,
            reconciler,
            payouts,
            campaigns,
            users,
            auth,
        }
    }
}

/// Health check endpoint
/// GET /health
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let (status, code, ledger) = match state.ledger.ping().await {
        Ok(()) => ("healthy", StatusCode::OK, "up"),
        Err(e) => {
            error!("Ledger health check failed: {}", e);
            ("degraded", StatusCode::SERVICE_UNAVAILABLE, "down")
        }
    };

    (
        code,
        Json(HealthResponse {
            status: status.to_string(),
            ledger: ledger.to_string(),
            timestamp: Utc::now(),
        }),
    )
}
