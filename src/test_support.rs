//! Shared fixtures and doubles for unit tests.

use async_trait::async_trait;
use chrono::Utc;
use ed25519_dalek::SigningKey;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use uuid::Uuid;

use crate::api::handler::AppState;
use crate::auth::{sign_token, TokenClaims, TokenVerifier};
use crate::error::{AppError, AppResult, GatewayError};
use crate::gateway::{
    Bank, DonationMetadata, GatewayResult, PaymentGateway, PayoutAccount, PayoutAccountRequest,
    ResolvedAccount, SettlementSchedule, TransactionStatus, VerifiedTransaction,
};
use crate::ledger::models::{Campaign, Evidence, NewCampaign, NewDonation, NewUser};
use crate::ledger::{InMemoryLedger, LedgerStore};
use crate::notifications::{Notifier, PayoutNotice};

pub fn new_user(name: &str) -> NewUser {
    NewUser {
        id: Uuid::new_v4(),
        full_name: format!("{} Tester", name),
        username: name.to_string(),
        email: format!("{}@example.com", name),
    }
}

pub fn new_campaign_for(owner_id: Uuid) -> NewCampaign {
    NewCampaign {
        owner_id,
        title: "Clean water for Ilorin".to_string(),
        description: "Boreholes for three communities".to_string(),
        goal_amount: 100_000_000,
        payout_account: "ACCT_test".to_string(),
        bank_name: Some("Test Bank".to_string()),
        account_number: "0123456789".to_string(),
        image_url: None,
        deadline: Some(Utc::now() + chrono::Duration::days(30)),
        evidence: Vec::new(),
    }
}

pub fn new_donation(reference: &str, external_campaign_id: i64, amount: i64) -> NewDonation {
    NewDonation {
        reference: reference.to_string(),
        external_campaign_id,
        donor_email: "donor@example.com".to_string(),
        display_name: None,
        amount,
        is_anonymous: false,
        user_id: None,
    }
}

pub fn evidence(count: usize) -> Vec<Evidence> {
    (0..count)
        .map(|i| Evidence {
            name: format!("receipt-{}.pdf", i),
            url: format!("https://files.example.com/receipt-{}.pdf", i),
            mime_type: "application/pdf".to_string(),
        })
        .collect()
}

/// Owner plus an active campaign bound to `external_campaign_id`
pub async fn active_campaign(ledger: &dyn LedgerStore, external_campaign_id: i64) -> Campaign {
    let owner = ledger
        .insert_user(new_user(&format!("owner{}", external_campaign_id)))
        .await
        .unwrap();
    let campaign = ledger.insert_campaign(new_campaign_for(owner.id)).await.unwrap();
    ledger
        .activate_campaign(campaign.id, external_campaign_id)
        .await
        .unwrap()
}

pub fn successful_txn(reference: &str, amount: i64, external_campaign_id: Option<i64>) -> VerifiedTransaction {
    VerifiedTransaction {
        reference: reference.to_string(),
        status: TransactionStatus::Success,
        amount,
        payer_email: "donor@example.com".to_string(),
        metadata: DonationMetadata {
            external_campaign_id,
            ..DonationMetadata::default()
        },
    }
}

pub fn signing_key() -> SigningKey {
    SigningKey::from_bytes(&[7u8; 32])
}

pub fn token_for(user_id: Uuid) -> String {
    sign_token(
        &signing_key(),
        &TokenClaims {
            sub: user_id,
            exp: Utc::now().timestamp() + 3600,
        },
    )
}

/// Scriptable payment gateway
pub struct StubGateway {
    transactions: Mutex<HashMap<String, VerifiedTransaction>>,
    verify_error: Mutex<Option<GatewayError>>,
    schedule_error: Mutex<Option<GatewayError>>,
    payout_account_error: Mutex<Option<GatewayError>>,
    schedule_calls: Mutex<Vec<(String, SettlementSchedule)>>,
    payout_requests: Mutex<Vec<PayoutAccountRequest>>,
    verify_calls: AtomicUsize,
}

impl StubGateway {
    pub fn new() -> Self {
        Self {
            transactions: Mutex::new(HashMap::new()),
            verify_error: Mutex::new(None),
            schedule_error: Mutex::new(None),
            payout_account_error: Mutex::new(None),
            schedule_calls: Mutex::new(Vec::new()),
            payout_requests: Mutex::new(Vec::new()),
            verify_calls: AtomicUsize::new(0),
        }
    }

    /// Register (or replace) what the gateway reports for a reference.
    /// Also clears any scripted verification failure.
    pub fn set_transaction(&self, txn: VerifiedTransaction) {
        *self.verify_error.lock().unwrap() = None;
        self.transactions
            .lock()
            .unwrap()
            .insert(txn.reference.clone(), txn);
    }

    pub fn fail_verification_with(&self, error: GatewayError) {
        *self.verify_error.lock().unwrap() = Some(error);
    }

    pub fn fail_settlement_with(&self, error: GatewayError) {
        *self.schedule_error.lock().unwrap() = Some(error);
    }

    pub fn fail_payout_account_with(&self, error: GatewayError) {
        *self.payout_account_error.lock().unwrap() = Some(error);
    }

    pub fn verify_calls(&self) -> usize {
        self.verify_calls.load(Ordering::SeqCst)
    }

    pub fn schedule_calls(&self) -> Vec<(String, SettlementSchedule)> {
        self.schedule_calls.lock().unwrap().clone()
    }

    pub fn payout_requests(&self) -> Vec<PayoutAccountRequest> {
        self.payout_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for StubGateway {
    async fn verify_transaction(&self, reference: &str) -> GatewayResult<VerifiedTransaction> {
        self.verify_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(error) = self.verify_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.transactions
            .lock()
            .unwrap()
            .get(reference)
            .cloned()
            .ok_or_else(|| GatewayError::Rejected {
                status: Some(400),
                message: "Transaction reference not found".to_string(),
            })
    }

    async fn set_settlement_schedule(
        &self,
        payout_account: &str,
        schedule: SettlementSchedule,
    ) -> GatewayResult<()> {
        if let Some(error) = self.schedule_error.lock().unwrap().clone() {
            return Err(error);
        }
        self.schedule_calls
            .lock()
            .unwrap()
            .push((payout_account.to_string(), schedule));
        Ok(())
    }

    async fn create_payout_account(&self, request: &PayoutAccountRequest) -> GatewayResult<PayoutAccount> {
        if let Some(error) = self.payout_account_error.lock().unwrap().clone() {
            return Err(error);
        }
        let mut requests = self.payout_requests.lock().unwrap();
        requests.push(request.clone());
        Ok(PayoutAccount {
            code: format!("ACCT_stub{}", requests.len()),
            settlement_bank: Some("Test Bank".to_string()),
        })
    }

    async fn list_banks(&self) -> GatewayResult<Vec<Bank>> {
        Ok(vec![
            Bank {
                name: "Access Bank".to_string(),
                code: "044".to_string(),
            },
            Bank {
                name: "Test Bank".to_string(),
                code: "999".to_string(),
            },
        ])
    }

    async fn resolve_account_name(
        &self,
        account_number: &str,
        _bank_code: &str,
    ) -> GatewayResult<ResolvedAccount> {
        Ok(ResolvedAccount {
            account_number: account_number.to_string(),
            account_name: "ADA TESTER".to_string(),
        })
    }
}

/// Notifier that remembers what it was asked to send
#[derive(Default)]
pub struct RecordingNotifier {
    sent: Mutex<Vec<PayoutNotice>>,
    failing: AtomicBool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail(&self) {
        self.failing.store(true, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<PayoutNotice> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send_payout_notice(&self, notice: &PayoutNotice) -> AppResult<()> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::Internal("mail provider down".to_string()));
        }
        self.sent.lock().unwrap().push(notice.clone());
        Ok(())
    }
}

/// Fully wired state over in-memory doubles
pub struct TestHarness {
    pub state: AppState,
    pub ledger: Arc<InMemoryLedger>,
    pub gateway: Arc<StubGateway>,
    pub notifier: Arc<RecordingNotifier>,
}

pub fn harness() -> TestHarness {
    let ledger = Arc::new(InMemoryLedger::new());
    let gateway = Arc::new(StubGateway::new());
    let notifier = Arc::new(RecordingNotifier::new());
    let auth = Arc::new(TokenVerifier::new(signing_key().verifying_key()));

    let state = AppState::new(ledger.clone(), gateway.clone(), notifier.clone(), auth, 0.0);

    TestHarness {
        state,
        ledger,
        gateway,
        notifier,
    }
}

/// Config with test-friendly values; nothing here is read from the environment
pub fn test_config() -> crate::config::Config {
    crate::config::Config {
        bind_address: "127.0.0.1:0".to_string(),
        database_url: None,
        database_max_connections: 1,
        paystack_base_url: "http://127.0.0.1:9".to_string(),
        paystack_secret_key: "sk_test".to_string(),
        gateway_timeout_secs: 1,
        gateway_connect_timeout_secs: 1,
        platform_percentage_charge: 0.0,
        sendgrid_api_key: None,
        notification_from_email: "payouts@donatefunds.app".to_string(),
        auth_public_key: hex::encode(signing_key().verifying_key().to_bytes()),
        cors_allowed_origins: "http://localhost:3000".to_string(),
        verify_rate_limit_per_minute: 1_000,
        request_timeout_secs: 5,
    }
}
