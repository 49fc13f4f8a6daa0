use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::models::*;
use super::store::{LedgerStore, RecordOutcome};
use crate::error::{AppError, AppResult};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    campaigns: HashMap<Uuid, Campaign>,
    /// Keyed by gateway reference: this map is the uniqueness constraint
    donations: HashMap<String, Donation>,
}

/// In-process ledger for local runs and tests.
///
/// All tables sit behind one lock so `record_donation` is atomic the same way
/// the PostgreSQL transaction is.
pub struct InMemoryLedger {
    tables: RwLock<Tables>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

impl Default for InMemoryLedger {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerStore for InMemoryLedger {
    async fn insert_user(&self, user: NewUser) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        if tables.users.contains_key(&user.id) {
            return Err(AppError::Conflict("User profile already exists".to_string()));
        }

        let email = user.email.to_lowercase();
        if tables
            .users
            .values()
            .any(|u| u.username == user.username || u.email == email)
        {
            return Err(AppError::Conflict("Username or email already taken".to_string()));
        }

        let user = User {
            id: user.id,
            full_name: user.full_name,
            username: user.username,
            email,
            payout_account: None,
            created_at: Utc::now(),
        };
        tables.users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>> {
        let tables = self.tables.read().await;
        Ok(tables.users.get(&user_id).cloned())
    }

    async fn set_user_payout_account(&self, user_id: Uuid, payout_account: &str) -> AppResult<User> {
        let mut tables = self.tables.write().await;
        let user = tables
            .users
            .get_mut(&user_id)
            .ok_or_else(|| AppError::NotFound("User".to_string()))?;
        user.payout_account = Some(payout_account.to_string());
        Ok(user.clone())
    }

    async fn insert_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign> {
        let mut tables = self.tables.write().await;
        let campaign = campaign.into_campaign();
        tables.campaigns.insert(campaign.id, campaign.clone());
        Ok(campaign)
    }

    async fn get_campaign(&self, campaign_id: Uuid) -> AppResult<Option<Campaign>> {
        let tables = self.tables.read().await;
        Ok(tables.campaigns.get(&campaign_id).cloned())
    }

    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>> {
        let tables = self.tables.read().await;
        let mut campaigns: Vec<Campaign> = tables.campaigns.values().cloned().collect();
        campaigns.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(campaigns)
    }

    async fn activate_campaign(&self, campaign_id: Uuid, external_campaign_id: i64) -> AppResult<Campaign> {
        let mut tables = self.tables.write().await;

        let taken = tables.campaigns.values().any(|c| {
            c.id != campaign_id && c.external_campaign_id == Some(external_campaign_id)
        });
        if taken {
            return Err(AppError::Conflict(format!(
                "Campaign id {} is already bound to another campaign",
                external_campaign_id
            )));
        }

        let campaign = tables
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))?;
        campaign.status = CampaignStatus::Active;
        campaign.external_campaign_id = Some(external_campaign_id);
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn append_evidence(&self, campaign_id: Uuid, items: Vec<Evidence>, cap: usize) -> AppResult<Campaign> {
        let mut tables = self.tables.write().await;
        let campaign = tables
            .campaigns
            .get_mut(&campaign_id)
            .ok_or_else(|| AppError::NotFound("Campaign".to_string()))?;

        let attempted = campaign.evidence.len() + items.len();
        if attempted > cap {
            return Err(AppError::LimitExceeded { limit: cap, attempted });
        }

        campaign.evidence.extend(items);
        campaign.updated_at = Utc::now();
        Ok(campaign.clone())
    }

    async fn find_donation(&self, reference: &str) -> AppResult<Option<Donation>> {
        let tables = self.tables.read().await;
        Ok(tables.donations.get(reference).cloned())
    }

    async fn record_donation(&self, donation: NewDonation) -> AppResult<RecordOutcome> {
        let mut tables = self.tables.write().await;

        if tables.donations.contains_key(&donation.reference) {
            return Ok(RecordOutcome::AlreadyRecorded);
        }

        let campaign = tables
            .campaigns
            .values_mut()
            .find(|c| c.external_campaign_id == Some(donation.external_campaign_id))
            .ok_or_else(|| {
                AppError::NotFound(format!(
                    "Campaign with campaign id {}",
                    donation.external_campaign_id
                ))
            })?;

        campaign.raised_amount = campaign
            .raised_amount
            .checked_add(donation.amount)
            .ok_or_else(|| AppError::Internal("raised amount overflow".to_string()))?;
        campaign.updated_at = Utc::now();

        let donation = donation.into_donation(campaign.id);
        tables
            .donations
            .insert(donation.reference.clone(), donation.clone());

        Ok(RecordOutcome::Recorded(donation))
    }

    async fn list_donations(&self, campaign_id: Uuid) -> AppResult<Vec<Donation>> {
        let tables = self.tables.read().await;
        let mut donations: Vec<Donation> = tables
            .donations
            .values()
            .filter(|d| d.campaign_id == campaign_id)
            .cloned()
            .collect();
        donations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(donations)
    }
}
