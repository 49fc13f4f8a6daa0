// Campaign lifecycle: create (with payout-account provisioning), activate,
// evidence, and the public reads.

use chrono::{Duration, Utc};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

use crate::auth::{ensure_owner, CallerIdentity};
use crate::error::{AppError, AppResult};
use crate::gateway::{PaymentGateway, PayoutAccount, PayoutAccountRequest, SettlementSchedule};
use crate::ledger::models::{Campaign, CampaignStatus, Donation, Evidence, NewCampaign, User};
use crate::ledger::LedgerStore;

pub use crate::ledger::models::MAX_EVIDENCE;

pub const DEFAULT_DURATION_DAYS: i64 = 30;

/// Everything needed to open a campaign, already shape-checked by the API layer
#[derive(Debug, Clone)]
pub struct CampaignDraft {
    pub title: String,
    pub description: String,
    /// Major currency units
    pub goal_amount: i64,
    pub bank_code: String,
    pub account_number: String,
    pub image_url: Option<String>,
    pub duration_days: Option<i64>,
    pub evidence: Vec<Evidence>,
}

pub struct CampaignService {
    ledger: Arc<dyn LedgerStore>,
    gateway: Arc<dyn PaymentGateway>,
    percentage_charge: f64,
}

impl CampaignService {
    pub fn new(ledger: Arc<dyn LedgerStore>, gateway: Arc<dyn PaymentGateway>, percentage_charge: f64) -> Self {
        Self {
            ledger,
            gateway,
            percentage_charge,
        }
    }

    /// Provision a payout account for the caller, then persist a pending campaign.
    /// Nothing is stored if provisioning fails.
    pub async fn create(&self, caller: &CallerIdentity, draft: CampaignDraft) -> AppResult<Campaign> {
        if draft.goal_amount <= 0 {
            return Err(AppError::InvalidInput("Goal amount must be positive".to_string()));
        }
        let goal_amount = draft
            .goal_amount
            .checked_mul(100)
            .ok_or_else(|| AppError::InvalidInput("Goal amount is too large".to_string()))?;

        let duration_days = draft.duration_days.unwrap_or(DEFAULT_DURATION_DAYS);
        if duration_days <= 0 {
            return Err(AppError::InvalidInput("Duration must be at least one day".to_string()));
        }

        if draft.evidence.len() > MAX_EVIDENCE {
            return Err(AppError::LimitExceeded {
                limit: MAX_EVIDENCE,
                attempted: draft.evidence.len(),
            });
        }

        let owner = self.owner(caller).await?;

        let payout = self
            .provision_payout_account(&owner.full_name, &draft.bank_code, &draft.account_number)
            .await?;

        let new_campaign = NewCampaign {
            owner_id: owner.id,
            title: draft.title,
            description: draft.description,
            goal_amount,
            payout_account: payout.code.clone(),
            bank_name: payout.settlement_bank,
            account_number: draft.account_number,
            image_url: draft.image_url,
            deadline: Some(Utc::now() + Duration::days(duration_days)),
            evidence: draft.evidence,
        };

        match self.ledger.insert_campaign(new_campaign).await {
            Ok(campaign) => {
                info!("✓ Campaign {} created by {} (payout account {})", campaign.id, owner.id, payout.code);
                Ok(campaign)
            }
            Err(e) => {
                error!(
                    "Campaign insert failed after provisioning payout account {} for user {}: {}",
                    payout.code, owner.id, e
                );
                Err(e)
            }
        }
    }

    /// Owner-only. Binds the campaign to the external campaign id donations will carry.
    pub async fn activate(
        &self,
        campaign_id: Uuid,
        caller: &CallerIdentity,
        external_campaign_id: i64,
    ) -> AppResult<Campaign> {
        let campaign = self.get(campaign_id).await?;
        ensure_owner(&campaign, caller)?;

        if campaign.status == CampaignStatus::Failed {
            return Err(AppError::InvalidInput(
                "A failed campaign cannot be activated".to_string(),
            ));
        }
        if external_campaign_id <= 0 {
            return Err(AppError::InvalidInput("campaignId must be a positive integer".to_string()));
        }

        let campaign = self
            .ledger
            .activate_campaign(campaign_id, external_campaign_id)
            .await?;
        info!("✓ Campaign {} activated as campaign id {}", campaign.id, external_campaign_id);
        Ok(campaign)
    }

    /// Owner-only. All-or-nothing against the evidence cap.
    pub async fn append_evidence(
        &self,
        campaign_id: Uuid,
        caller: &CallerIdentity,
        items: Vec<Evidence>,
    ) -> AppResult<Campaign> {
        if items.is_empty() {
            return Err(AppError::InvalidInput("No evidence data provided".to_string()));
        }

        let campaign = self.get(campaign_id).await?;
        ensure_owner(&campaign, caller)?;

        let added = items.len();
        let campaign = self
            .ledger
            .append_evidence(campaign_id, items, MAX_EVIDENCE)
            .await?;
        info!("Added {} evidence item(s) to campaign {}", added, campaign.id);
        Ok(campaign)
    }

    pub async fn list(&self) -> AppResult<Vec<Campaign>> {
        self.ledger.list_campaigns().await
    }

    pub async fn get(&self, campaign_id: Uuid) -> AppResult<Campaign> {
        self.ledger
            .get_campaign(campaign_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))
    }

    /// Newest first
    pub async fn donations(&self, campaign_id: Uuid) -> AppResult<Vec<Donation>> {
        let campaign = self.get(campaign_id).await?;
        self.ledger.list_donations(campaign.id).await
    }

    /// Provision a standalone payout account for the caller and remember it on their profile.
    /// The account is registered under `business_name`, or the caller's full name when absent.
    pub async fn create_payout_account(
        &self,
        caller: &CallerIdentity,
        bank_code: &str,
        account_number: &str,
        business_name: Option<&str>,
    ) -> AppResult<(User, PayoutAccount)> {
        let owner = self.owner(caller).await?;
        let business_name = business_name
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or(owner.full_name.as_str());
        let payout = self
            .provision_payout_account(business_name, bank_code, account_number)
            .await?;

        let user = match self.ledger.set_user_payout_account(owner.id, &payout.code).await {
            Ok(user) => user,
            Err(e) => {
                error!(
                    "Failed to store payout account {} for user {}: {}",
                    payout.code, owner.id, e
                );
                return Err(e);
            }
        };

        Ok((user, payout))
    }

    async fn owner(&self, caller: &CallerIdentity) -> AppResult<User> {
        self.ledger
            .get_user(caller.user_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User".to_string()))
    }

    async fn provision_payout_account(
        &self,
        business_name: &str,
        bank_code: &str,
        account_number: &str,
    ) -> AppResult<PayoutAccount> {
        let request = PayoutAccountRequest {
            business_name: business_name.to_string(),
            bank_code: bank_code.to_string(),
            account_number: account_number.to_string(),
            settlement_schedule: SettlementSchedule::Manual,
            percentage_charge: self.percentage_charge,
        };

        Ok(self.gateway.create_payout_account(&request).await?)
    }
}
