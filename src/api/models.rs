use crate::ledger::models::*;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::campaigns::CampaignDraft;
use crate::gateway::PayoutAccount;
use crate::users::ProfileDraft;

// ========== REQUEST MODELS ==========

/// One uploaded supporting document
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct EvidenceInput {
    #[validate(length(min = 1, message = "evidence name is required"))]
    pub name: String,
    #[validate(url(message = "evidence url must be a valid URL"))]
    pub url: String,
    #[serde(rename = "type")]
    #[validate(length(min = 1, message = "evidence type is required"))]
    pub mime_type: String,
}

impl From<EvidenceInput> for Evidence {
    fn from(input: EvidenceInput) -> Self {
        Evidence {
            name: input.name,
            url: input.url,
            mime_type: input.mime_type,
        }
    }
}

/// POST /api/campaigns
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateCampaignRequest {
    #[validate(length(min = 1, max = 200, message = "title is required"))]
    pub title: String,

    #[validate(length(min = 1, message = "description is required"))]
    pub description: String,

    /// Major currency units (naira)
    #[validate(range(min = 1, message = "goal amount must be positive"))]
    pub goal_amount: i64,

    #[validate(length(min = 1, message = "bank code is required"))]
    pub bank_code: String,

    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,

    #[validate(url(message = "image must be a valid URL"))]
    pub image: Option<String>,

    #[serde(alias = "duration")]
    #[validate(range(min = 1, message = "duration must be at least one day"))]
    pub duration_days: Option<i64>,

    #[serde(default)]
    #[validate]
    pub evidence: Vec<EvidenceInput>,
}

impl From<CreateCampaignRequest> for CampaignDraft {
    fn from(request: CreateCampaignRequest) -> Self {
        CampaignDraft {
            title: request.title.trim().to_string(),
            description: request.description,
            goal_amount: request.goal_amount,
            bank_code: request.bank_code,
            account_number: request.account_number,
            image_url: request.image,
            duration_days: request.duration_days,
            evidence: request.evidence.into_iter().map(Evidence::from).collect(),
        }
    }
}

/// PATCH /api/campaigns/{id}/activate
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ActivateCampaignRequest {
    #[validate(range(min = 1, message = "campaignId must be a positive integer"))]
    pub campaign_id: i64,
}

/// PATCH /api/campaigns/{id}/evidence
#[derive(Debug, Deserialize, Validate)]
pub struct AddEvidenceRequest {
    #[serde(default)]
    #[validate]
    pub evidence: Vec<EvidenceInput>,
}

/// POST /api/payments/resolve
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ResolveAccountRequest {
    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,
    #[validate(length(min = 1, message = "bank code is required"))]
    pub bank_code: String,
}

/// POST /api/payments/subaccount
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubaccountRequest {
    #[validate(length(min = 1, message = "bank code is required"))]
    pub bank_code: String,
    #[validate(length(min = 1, message = "account number is required"))]
    pub account_number: String,
    /// Defaults to the caller's full name
    #[validate(length(min = 1, max = 200, message = "business name must not be empty"))]
    pub business_name: Option<String>,
}

/// POST /api/users
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserRequest {
    #[validate(length(min = 1, message = "full name is required"))]
    pub full_name: String,
    #[validate(length(min = 1, max = 64, message = "username is required"))]
    pub username: String,
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
}

impl From<RegisterUserRequest> for ProfileDraft {
    fn from(request: RegisterUserRequest) -> Self {
        ProfileDraft {
            full_name: request.full_name,
            username: request.username,
            email: request.email,
        }
    }
}

// ========== RESPONSE MODELS ==========

/// Uniform success envelope
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub status: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T) -> Self {
        Self {
            status: "success",
            message: message.into(),
            count: None,
            data: Some(data),
        }
    }

    pub fn list(message: impl Into<String>, items: Vec<T>) -> ApiResponse<Vec<T>> {
        ApiResponse {
            status: "success",
            message: message.into(),
            count: Some(items.len()),
            data: Some(items),
        }
    }
}

impl ApiResponse<()> {
    pub fn message(message: impl Into<String>) -> Self {
        Self {
            status: "success",
            message: message.into(),
            count: None,
            data: None,
        }
    }
}

/// Public view of a donation. Anonymous donors are withheld.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationView {
    pub reference: String,
    pub campaign_id: Uuid,
    pub external_campaign_id: i64,
    pub amount: i64,
    pub is_anonymous: bool,
    pub display_name: Option<String>,
    pub donor_email: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<Donation> for DonationView {
    fn from(donation: Donation) -> Self {
        let (display_name, donor_email) = if donation.is_anonymous {
            (None, None)
        } else {
            (donation.display_name, Some(donation.donor_email))
        };

        DonationView {
            reference: donation.reference,
            campaign_id: donation.campaign_id,
            external_campaign_id: donation.external_campaign_id,
            amount: donation.amount,
            is_anonymous: donation.is_anonymous,
            display_name,
            donor_email,
            created_at: donation.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubaccountView {
    pub payout_account: String,
    pub settlement_bank: Option<String>,
    pub user_id: Uuid,
}

impl SubaccountView {
    pub fn new(user: &User, payout: PayoutAccount) -> Self {
        SubaccountView {
            payout_account: payout.code,
            settlement_bank: payout.settlement_bank,
            user_id: user.id,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub ledger: String,
    pub timestamp: DateTime<Utc>,
}
