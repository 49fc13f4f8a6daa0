use async_trait::async_trait;
use uuid::Uuid;

use super::models::*;
use crate::error::AppResult;

/// Result of trying to append a donation to the ledger
#[derive(Debug, Clone)]
pub enum RecordOutcome {
    /// The donation was written and the campaign total incremented
    Recorded(Donation),
    /// The reference already exists; nothing was written
    AlreadyRecorded,
}

/// Ledger store - THE source of truth for campaigns and donations.
///
/// Implementations must enforce uniqueness of `Donation::reference` at the
/// storage level and apply `record_donation` atomically (donation row plus
/// raised-amount increment, or neither).
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ========== USER OPERATIONS ==========

    async fn insert_user(&self, user: NewUser) -> AppResult<User>;

    async fn get_user(&self, user_id: Uuid) -> AppResult<Option<User>>;

    async fn set_user_payout_account(&self, user_id: Uuid, payout_account: &str) -> AppResult<User>;

    // ========== CAMPAIGN OPERATIONS ==========

    async fn insert_campaign(&self, campaign: NewCampaign) -> AppResult<Campaign>;

    async fn get_campaign(&self, campaign_id: Uuid) -> AppResult<Option<Campaign>>;

    /// All campaigns, newest first
    async fn list_campaigns(&self) -> AppResult<Vec<Campaign>>;

    /// Mark active and bind the external campaign id.
    /// Fails with `Conflict` if another campaign already holds that id.
    async fn activate_campaign(&self, campaign_id: Uuid, external_campaign_id: i64) -> AppResult<Campaign>;

    /// Append evidence only if the resulting count stays within `cap`.
    /// Fails with `LimitExceeded` otherwise, leaving the campaign untouched.
    async fn append_evidence(&self, campaign_id: Uuid, items: Vec<Evidence>, cap: usize) -> AppResult<Campaign>;

    // ========== DONATION OPERATIONS ==========

    async fn find_donation(&self, reference: &str) -> AppResult<Option<Donation>>;

    /// Append a donation and increment the owning campaign's raised amount.
    ///
    /// Returns `AlreadyRecorded` when the reference hits the uniqueness
    /// constraint, and `NotFound` when no campaign carries the external id.
    async fn record_donation(&self, donation: NewDonation) -> AppResult<RecordOutcome>;

    /// Donations for a campaign, newest first
    async fn list_donations(&self, campaign_id: Uuid) -> AppResult<Vec<Donation>>;

    /// Liveness check for /health
    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}
