// Payment gateway seam.
// Everything the ledger needs from the external processor goes through
// `PaymentGateway`, so handlers and services never hold an HTTP client.

pub mod paystack;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::GatewayError;

pub use paystack::{PaystackClient, PaystackConfig};

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Remote transaction status as reported by the processor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionStatus {
    Success,
    Failed,
    Abandoned,
    Ongoing,
    Pending,
    Processing,
    Queued,
    Reversed,
    #[serde(other)]
    Unknown,
}

impl TransactionStatus {
    pub fn is_successful(&self) -> bool {
        matches!(self, TransactionStatus::Success)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Success => "success",
            TransactionStatus::Failed => "failed",
            TransactionStatus::Abandoned => "abandoned",
            TransactionStatus::Ongoing => "ongoing",
            TransactionStatus::Pending => "pending",
            TransactionStatus::Processing => "processing",
            TransactionStatus::Queued => "queued",
            TransactionStatus::Reversed => "reversed",
            TransactionStatus::Unknown => "unknown",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Caller-supplied metadata attached to the payment at initiation time
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DonationMetadata {
    pub external_campaign_id: Option<i64>,
    pub internal_campaign_id: Option<String>,
    pub is_anonymous: bool,
    pub display_name: Option<String>,
    pub user_id: Option<Uuid>,
}

/// Server-side view of a payment, fetched by reference
#[derive(Debug, Clone)]
pub struct VerifiedTransaction {
    pub reference: String,
    pub status: TransactionStatus,
    /// Minor currency units
    pub amount: i64,
    pub payer_email: String,
    pub metadata: DonationMetadata,
}

/// Whether the processor holds settled funds or releases them to the bank
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SettlementSchedule {
    Manual,
    Auto,
}

impl SettlementSchedule {
    pub fn as_str(&self) -> &'static str {
        match self {
            SettlementSchedule::Manual => "manual",
            SettlementSchedule::Auto => "auto",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PayoutAccountRequest {
    pub business_name: String,
    pub bank_code: String,
    pub account_number: String,
    pub settlement_schedule: SettlementSchedule,
    pub percentage_charge: f64,
}

/// A provisioned payout sub-ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutAccount {
    pub code: String,
    pub settlement_bank: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bank {
    pub name: String,
    pub code: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedAccount {
    pub account_number: String,
    pub account_name: String,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Read-only lookup of a payment by its reference
    async fn verify_transaction(&self, reference: &str) -> GatewayResult<VerifiedTransaction>;

    async fn set_settlement_schedule(
        &self,
        payout_account: &str,
        schedule: SettlementSchedule,
    ) -> GatewayResult<()>;

    async fn create_payout_account(&self, request: &PayoutAccountRequest) -> GatewayResult<PayoutAccount>;

    async fn list_banks(&self) -> GatewayResult<Vec<Bank>>;

    async fn resolve_account_name(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> GatewayResult<ResolvedAccount>;
}
