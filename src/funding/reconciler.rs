use std::sync::Arc;
use tracing::{info, warn};

use crate::error::{AppError, AppResult};
use crate::gateway::PaymentGateway;
use crate::ledger::models::{Donation, NewDonation};
use crate::ledger::{LedgerStore, RecordOutcome};

/// What a successful reconcile did
#[derive(Debug, Clone)]
pub enum ReconcileOutcome {
    /// First time this reference was seen: donation written, campaign incremented
    Recorded(Donation),
    /// Reference was already in the ledger; nothing changed
    AlreadyProcessed { reference: String },
}

impl ReconcileOutcome {
    pub fn is_new(&self) -> bool {
        matches!(self, ReconcileOutcome::Recorded(_))
    }
}

/// Turns a claimed payment into exactly one ledger entry.
///
/// Exactly-once is enforced by the store's uniqueness constraint on the
/// reference, not by the read-before-write below, which is only a fast path.
pub struct DonationReconciler {
    gateway: Arc<dyn PaymentGateway>,
    ledger: Arc<dyn LedgerStore>,
}

impl DonationReconciler {
    pub fn new(gateway: Arc<dyn PaymentGateway>, ledger: Arc<dyn LedgerStore>) -> Self {
        Self { gateway, ledger }
    }

    pub async fn reconcile(&self, reference: &str) -> AppResult<ReconcileOutcome> {
        let reference = reference.trim();
        if reference.is_empty() {
            return Err(AppError::InvalidInput("Transaction reference is required".to_string()));
        }

        // Step 1: ask the gateway what actually happened (read-only)
        let txn = self.gateway.verify_transaction(reference).await?;

        // Step 2: only successful payments ever reach the ledger
        if !txn.status.is_successful() {
            info!("Transaction {} not successful ({})", reference, txn.status);
            return Err(AppError::PaymentNotSuccessful {
                reference: reference.to_string(),
                status: txn.status.to_string(),
            });
        }

        // Step 3: already recorded -> idempotent success
        if self.ledger.find_donation(reference).await?.is_some() {
            info!("Transaction {} has already been verified", reference);
            return Ok(ReconcileOutcome::AlreadyProcessed {
                reference: reference.to_string(),
            });
        }

        // Step 4: the frontend must have tagged the payment with a campaign
        let external_campaign_id = txn.metadata.external_campaign_id.ok_or_else(|| {
            warn!("CampaignId not found in metadata for reference {}", reference);
            AppError::MissingCampaignReference(reference.to_string())
        })?;

        if txn.amount <= 0 {
            return Err(AppError::Internal(format!(
                "gateway reported non-positive amount {} for {}",
                txn.amount, reference
            )));
        }

        // Step 5: one atomic write. A concurrent duplicate loses on the
        // unique constraint and lands in AlreadyRecorded.
        let outcome = self
            .ledger
            .record_donation(NewDonation {
                reference: reference.to_string(),
                external_campaign_id,
                donor_email: txn.payer_email,
                display_name: txn.metadata.display_name,
                amount: txn.amount,
                is_anonymous: txn.metadata.is_anonymous,
                user_id: txn.metadata.user_id,
            })
            .await?;

        match outcome {
            RecordOutcome::Recorded(donation) => {
                if let Some(hint) = txn.metadata.internal_campaign_id.as_deref() {
                    if hint != donation.campaign_id.to_string() {
                        warn!(
                            "Metadata campaignDbId {} does not match campaign {} resolved from campaign id {}",
                            hint, donation.campaign_id, external_campaign_id
                        );
                    }
                }
                info!(
                    "✓ Donation of {} (minor units) to campaign {} verified and recorded: {}",
                    donation.amount, donation.external_campaign_id, donation.reference
                );
                Ok(ReconcileOutcome::Recorded(donation))
            }
            RecordOutcome::AlreadyRecorded => {
                info!("Transaction {} recorded concurrently, treating as processed", reference);
                Ok(ReconcileOutcome::AlreadyProcessed {
                    reference: reference.to_string(),
                })
            }
        }
    }
}
