use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, Type};
use std::fmt;
use uuid::Uuid;

/// Hard cap on evidence entries attached to a campaign
pub const MAX_EVIDENCE: usize = 10;

/// Campaign lifecycle
///
/// pending -> active (owner activation, sets the external campaign id)
/// failed is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Type)]
#[sqlx(type_name = "campaign_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Pending,
    Active,
    Failed,
}

impl CampaignStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Pending => "pending",
            CampaignStatus::Active => "active",
            CampaignStatus::Failed => "failed",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, CampaignStatus::Failed)
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A supporting document attached to a campaign (already uploaded elsewhere)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub name: String,
    pub url: String,
    #[serde(rename = "type")]
    pub mime_type: String,
}

///User entity
///
/// Credentials live with the upstream auth service; this is the part the
/// ledger needs for ownership and payout notices.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
    pub payout_account: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    /// Subject of the caller's bearer token
    pub id: Uuid,
    pub full_name: String,
    pub username: String,
    pub email: String,
}

/// Campaign entity
///
/// INVARIANT: raised_amount == sum of recorded donation amounts for this campaign.
/// It is only ever moved by `LedgerStore::record_donation`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Campaign {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub external_campaign_id: Option<i64>,
    pub title: String,
    pub description: String,
    /// Minor currency units
    pub goal_amount: i64,
    /// Minor currency units
    pub raised_amount: i64,
    pub payout_account: Option<String>,
    pub bank_name: Option<String>,
    #[serde(skip_serializing)]
    pub account_number: Option<String>,
    pub image_url: Option<String>,
    pub status: CampaignStatus,
    pub deadline: Option<DateTime<Utc>>,
    #[sqlx(json)]
    pub evidence: Vec<Evidence>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Campaign {
    pub fn has_payout_account(&self) -> bool {
        self.payout_account
            .as_deref()
            .map(|code| !code.trim().is_empty())
            .unwrap_or(false)
    }

    pub fn evidence_room(&self) -> usize {
        MAX_EVIDENCE.saturating_sub(self.evidence.len())
    }
}

/// Everything needed to persist a freshly provisioned campaign
#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub goal_amount: i64,
    pub payout_account: String,
    pub bank_name: Option<String>,
    pub account_number: String,
    pub image_url: Option<String>,
    pub deadline: Option<DateTime<Utc>>,
    pub evidence: Vec<Evidence>,
}

impl NewCampaign {
    pub fn into_campaign(self) -> Campaign {
        let now = Utc::now();
        Campaign {
            id: Uuid::new_v4(),
            owner_id: self.owner_id,
            external_campaign_id: None,
            title: self.title,
            description: self.description,
            goal_amount: self.goal_amount,
            raised_amount: 0,
            payout_account: Some(self.payout_account),
            bank_name: self.bank_name,
            account_number: Some(self.account_number),
            image_url: self.image_url,
            status: CampaignStatus::Pending,
            deadline: self.deadline,
            evidence: self.evidence,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Donation entity - append-only ledger entry keyed by the gateway reference
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Donation {
    pub id: Uuid,
    pub reference: String,
    pub campaign_id: Uuid,
    pub external_campaign_id: i64,
    pub donor_email: String,
    pub display_name: Option<String>,
    /// Minor currency units, exactly as reported by the gateway
    pub amount: i64,
    pub is_anonymous: bool,
    pub user_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A verified payment waiting to be written to the ledger.
///
/// The campaign is resolved from `external_campaign_id` inside the store.
#[derive(Debug, Clone)]
pub struct NewDonation {
    pub reference: String,
    pub external_campaign_id: i64,
    pub donor_email: String,
    pub display_name: Option<String>,
    pub amount: i64,
    pub is_anonymous: bool,
    pub user_id: Option<Uuid>,
}

impl NewDonation {
    pub fn into_donation(self, campaign_id: Uuid) -> Donation {
        Donation {
            id: Uuid::new_v4(),
            reference: self.reference,
            campaign_id,
            external_campaign_id: self.external_campaign_id,
            donor_email: self.donor_email,
            display_name: self.display_name,
            amount: self.amount,
            is_anonymous: self.is_anonymous,
            user_id: self.user_id,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn campaign_with_evidence(count: usize) -> Campaign {
        let mut campaign = NewCampaign {
            owner_id: Uuid::new_v4(),
            title: "Clean water".to_string(),
            description: "Boreholes".to_string(),
            goal_amount: 1_000_000,
            payout_account: "ACCT_1".to_string(),
            bank_name: None,
            account_number: "0123456789".to_string(),
            image_url: None,
            deadline: None,
            evidence: vec![],
        }
        .into_campaign();
        campaign.evidence = (0..count)
            .map(|i| Evidence {
                name: format!("doc-{}", i),
                url: format!("https://files.example/{}", i),
                mime_type: "application/pdf".to_string(),
            })
            .collect();
        campaign
    }

    #[test]
    fn test_new_campaign_starts_pending_with_nothing_raised() {
        let campaign = campaign_with_evidence(0);
        assert_eq!(campaign.status, CampaignStatus::Pending);
        assert_eq!(campaign.raised_amount, 0);
        assert!(campaign.external_campaign_id.is_none());
        assert!(campaign.has_payout_account());
    }

    #[test]
    fn test_blank_payout_account_counts_as_missing() {
        let mut campaign = campaign_with_evidence(0);
        campaign.payout_account = Some("  ".to_string());
        assert!(!campaign.has_payout_account());
    }

    #[test]
    fn test_evidence_room() {
        assert_eq!(campaign_with_evidence(9).evidence_room(), 1);
        assert_eq!(campaign_with_evidence(10).evidence_room(), 0);
    }

    #[test]
    fn test_evidence_serializes_type_field() {
        let evidence = Evidence {
            name: "receipt.pdf".to_string(),
            url: "https://files.example/receipt.pdf".to_string(),
            mime_type: "application/pdf".to_string(),
        };
        let json = serde_json::to_value(&evidence).unwrap();
        assert_eq!(json["type"], "application/pdf");
    }

    #[test]
    fn test_account_number_is_not_serialized() {
        let json = serde_json::to_value(campaign_with_evidence(0)).unwrap();
        assert!(json.get("account_number").is_none());
        assert_eq!(json["status"], "pending");
    }
}
