use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::auth::{ensure_owner, CallerIdentity};
use crate::error::{AppError, AppResult};
use crate::gateway::{PaymentGateway, SettlementSchedule};
use crate::ledger::models::Campaign;
use crate::ledger::LedgerStore;
use crate::notifications::{Notifier, PayoutNotice};

/// Result of a payout request
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PayoutReceipt {
    pub campaign_id: Uuid,
    pub payout_account: String,
    pub settlement_schedule: SettlementSchedule,
    pub raised_amount: i64,
    /// Whether the owner notice went out. Delivery failures never fail the payout.
    pub notified: bool,
    pub triggered_at: DateTime<Utc>,
}

/// Releases a campaign's held funds by switching its payout account to
/// automatic settlement.
pub struct PayoutTrigger {
    ledger: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    notifier: Arc<dyn Notifier>,
}

impl PayoutTrigger {
    pub fn new(
        ledger: Arc<dyn LedgerStore>,
        gateway: Arc<dyn PaymentGateway>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            ledger,
            gateway,
            notifier,
        }
    }

    pub async fn trigger(&self, campaign_id: Uuid, caller: &CallerIdentity) -> AppResult<PayoutReceipt> {
        let campaign = self
            .ledger
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))?;

        ensure_owner(&campaign, caller)?;

        if !campaign.has_payout_account() {
            return Err(AppError::NotConfigured(
                "Payout account not configured for this campaign.".to_string(),
            ));
        }
        let payout_account = campaign
            .payout_account
            .as_deref()
            .map(str::trim)
            .unwrap_or_default()
            .to_string();

        self.gateway
            .set_settlement_schedule(&payout_account, SettlementSchedule::Auto)
            .await?;

        info!(
            "💸 Payout triggered for campaign {} via {} ({} minor units raised)",
            campaign.id, payout_account, campaign.raised_amount
        );

        let notified = self.notify_owner(&campaign).await;

        Ok(PayoutReceipt {
            campaign_id: campaign.id,
            payout_account,
            settlement_schedule: SettlementSchedule::Auto,
            raised_amount: campaign.raised_amount,
            notified,
            triggered_at: Utc::now(),
        })
    }

    async fn notify_owner(&self, campaign: &Campaign) -> bool {
        let owner = match self.ledger.get_user(campaign.owner_id).await {
            Ok(Some(owner)) => owner,
            Ok(None) => {
                warn!("Owner {} of campaign {} not found, skipping payout notice", campaign.owner_id, campaign.id);
                return false;
            }
            Err(e) => {
                error!("Failed to load owner for payout notice: {}", e);
                return false;
            }
        };

        let notice = PayoutNotice {
            email: owner.email,
            owner_name: owner.full_name,
            campaign_title: campaign.title.clone(),
            raised_amount: campaign.raised_amount,
        };

        match self.notifier.send_payout_notice(&notice).await {
            Ok(()) => true,
            Err(e) => {
                error!("Failed to send payout notice for campaign {}: {}", campaign.id, e);
                false
            }
        }
    }
}
