use async_trait::async_trait;
use reqwest::{
    header::{HeaderMap, HeaderValue, AUTHORIZATION},
    Client, RequestBuilder, StatusCode, Url,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use super::*;
use crate::error::{AppError, AppResult, GatewayError};

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
    pub connect_timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.paystack.co".to_string(),
            secret_key: String::new(),
            timeout: Duration::from_secs(15),
            connect_timeout: Duration::from_secs(5),
        }
    }
}

/// Every Paystack response is wrapped in this envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    status: bool,
    #[serde(default)]
    message: Option<String>,
    data: Option<T>,
}

#[derive(Debug, Deserialize)]
struct TransactionData {
    status: TransactionStatus,
    #[serde(default)]
    reference: Option<String>,
    amount: i64,
    customer: Customer,
    #[serde(default)]
    metadata: Value,
}

#[derive(Debug, Deserialize)]
struct Customer {
    email: String,
}

#[derive(Debug, Deserialize)]
struct SubaccountData {
    subaccount_code: String,
    #[serde(default)]
    settlement_bank: Option<String>,
}

#[derive(Debug, Serialize)]
struct SettlementUpdate<'a> {
    settlement_schedule: &'a str,
}

/// HTTP client for the Paystack API.
///
/// Built once from config and shared; every call is bounded by the client
/// timeout and every failure leaves here as a `GatewayError`.
pub struct PaystackClient {
    base_url: Url,
    client: Client,
}

impl PaystackClient {
    pub fn new(config: PaystackConfig) -> AppResult<Self> {
        let base_url = Url::parse(&config.base_url)
            .map_err(|e| AppError::Config(format!("Invalid PAYSTACK_BASE_URL: {}", e)))?;
        if base_url.cannot_be_a_base() {
            return Err(AppError::Config("PAYSTACK_BASE_URL must be an http(s) URL".to_string()));
        }

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.secret_key))
            .map_err(|_| AppError::Config("PAYSTACK_SECRET_KEY contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url, client })
    }

    fn endpoint(&self, segments: &[&str]) -> GatewayResult<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| GatewayError::Decode("gateway base URL cannot take a path".to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> GatewayResult<T> {
        let response = request.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let message = serde_json::from_slice::<Envelope<Value>>(&body)
                .ok()
                .and_then(|envelope| envelope.message)
                .unwrap_or_else(|| format!("payment gateway returned {}", status));

            warn!("Gateway responded {}: {}", status, message);

            return Err(match status {
                StatusCode::BAD_GATEWAY
                | StatusCode::SERVICE_UNAVAILABLE
                | StatusCode::GATEWAY_TIMEOUT => GatewayError::Transient {
                    message,
                    timed_out: status == StatusCode::GATEWAY_TIMEOUT,
                },
                _ => GatewayError::Rejected {
                    status: Some(status.as_u16()),
                    message,
                },
            });
        }

        let envelope: Envelope<T> = serde_json::from_slice(&body)
            .map_err(|e| GatewayError::Decode(e.to_string()))?;

        if !envelope.status {
            return Err(GatewayError::Rejected {
                status: Some(status.as_u16()),
                message: envelope
                    .message
                    .unwrap_or_else(|| "payment gateway refused the request".to_string()),
            });
        }

        envelope
            .data
            .ok_or_else(|| GatewayError::Decode("response carried no data".to_string()))
    }
}

#[async_trait]
impl PaymentGateway for PaystackClient {
    async fn verify_transaction(&self, reference: &str) -> GatewayResult<VerifiedTransaction> {
        let url = self.endpoint(&["transaction", "verify", reference])?;
        debug!("Verifying transaction {}", reference);

        let data: TransactionData = self.send(self.client.get(url)).await?;

        Ok(VerifiedTransaction {
            reference: data.reference.unwrap_or_else(|| reference.to_string()),
            status: data.status,
            amount: data.amount,
            payer_email: data.customer.email,
            metadata: parse_metadata(&data.metadata),
        })
    }

    async fn set_settlement_schedule(
        &self,
        payout_account: &str,
        schedule: SettlementSchedule,
    ) -> GatewayResult<()> {
        let url = self.endpoint(&["subaccount", payout_account])?;
        let body = SettlementUpdate {
            settlement_schedule: schedule.as_str(),
        };

        let _: Value = self.send(self.client.put(url).json(&body)).await?;
        Ok(())
    }

    async fn create_payout_account(&self, request: &PayoutAccountRequest) -> GatewayResult<PayoutAccount> {
        let url = self.endpoint(&["subaccount"])?;
        let data: SubaccountData = self.send(self.client.post(url).json(request)).await?;

        Ok(PayoutAccount {
            code: data.subaccount_code,
            settlement_bank: data.settlement_bank,
        })
    }

    async fn list_banks(&self) -> GatewayResult<Vec<Bank>> {
        let url = self.endpoint(&["bank"])?;
        self.send(self.client.get(url)).await
    }

    async fn resolve_account_name(
        &self,
        account_number: &str,
        bank_code: &str,
    ) -> GatewayResult<ResolvedAccount> {
        let url = self.endpoint(&["bank", "resolve"])?;
        let request = self
            .client
            .get(url)
            .query(&[("account_number", account_number), ("bank_code", bank_code)]);

        self.send(request).await
    }
}

/// Read the donation metadata a frontend attached at payment initiation.
///
/// Frontends send ids as numbers or strings, flags as booleans or strings,
/// and Paystack reports absent metadata as `""`, so everything is lenient.
pub fn parse_metadata(value: &Value) -> DonationMetadata {
    let object = match value {
        Value::Object(map) => map,
        Value::String(raw) if !raw.trim().is_empty() => {
            return match serde_json::from_str::<Value>(raw) {
                Ok(inner @ Value::Object(_)) => parse_metadata(&inner),
                _ => DonationMetadata::default(),
            };
        }
        _ => return DonationMetadata::default(),
    };

    DonationMetadata {
        external_campaign_id: object
            .get("campaignId")
            .and_then(lenient_i64)
            .filter(|id| *id > 0),
        internal_campaign_id: object.get("campaignDbId").and_then(lenient_string),
        is_anonymous: object
            .get("isAnonymous")
            .and_then(lenient_bool)
            .unwrap_or(false),
        display_name: object.get("displayName").and_then(lenient_string),
        user_id: object
            .get("userId")
            .and_then(lenient_string)
            .and_then(|raw| Uuid::parse_str(&raw).ok()),
    }
}

fn lenient_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn lenient_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Some(true),
            "false" | "0" | "no" | "" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}

fn lenient_string(value: &Value) -> Option<String> {
    let s = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!s.is_empty()).then_some(s)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        matchers::{body_json, header, method, path, query_param},
        Mock, MockServer, ResponseTemplate,
    };

    fn client_for(server: &MockServer) -> PaystackClient {
        PaystackClient::new(PaystackConfig {
            base_url: server.uri(),
            secret_key: "sk_test_123".to_string(),
            timeout: Duration::from_millis(500),
            connect_timeout: Duration::from_millis(500),
        })
        .unwrap()
    }

    #[test]
    fn test_metadata_accepts_strings_and_numbers() {
        let metadata = parse_metadata(&json!({
            "campaignId": "42",
            "campaignDbId": "65a1f0",
            "isAnonymous": "true",
            "displayName": "  Ada  ",
        }));

        assert_eq!(metadata.external_campaign_id, Some(42));
        assert_eq!(metadata.internal_campaign_id.as_deref(), Some("65a1f0"));
        assert!(metadata.is_anonymous);
        assert_eq!(metadata.display_name.as_deref(), Some("Ada"));
    }

    #[test]
    fn test_empty_string_metadata_has_no_campaign() {
        let metadata = parse_metadata(&json!(""));
        assert_eq!(metadata, DonationMetadata::default());
    }

    #[test]
    fn test_json_encoded_metadata_string() {
        let metadata = parse_metadata(&json!("{\"campaignId\": 9, \"isAnonymous\": false}"));
        assert_eq!(metadata.external_campaign_id, Some(9));
        assert!(!metadata.is_anonymous);
    }

    #[test]
    fn test_zero_campaign_id_counts_as_missing() {
        let metadata = parse_metadata(&json!({ "campaignId": 0 }));
        assert_eq!(metadata.external_campaign_id, None);
    }

    #[test]
    fn test_user_id_must_be_uuid() {
        let id = Uuid::new_v4();
        assert_eq!(parse_metadata(&json!({ "userId": id.to_string() })).user_id, Some(id));
        assert_eq!(parse_metadata(&json!({ "userId": "nope" })).user_id, None);
    }

    #[tokio::test]
    async fn test_verify_transaction_parses_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/txn_1"))
            .and(header("authorization", "Bearer sk_test_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Verification successful",
                "data": {
                    "status": "success",
                    "reference": "txn_1",
                    "amount": 500000,
                    "customer": { "email": "donor@example.com" },
                    "metadata": { "campaignId": 42, "isAnonymous": false }
                }
            })))
            .mount(&server)
            .await;

        let txn = client_for(&server).verify_transaction("txn_1").await.unwrap();
        assert_eq!(txn.status, TransactionStatus::Success);
        assert_eq!(txn.amount, 500_000);
        assert_eq!(txn.payer_email, "donor@example.com");
        assert_eq!(txn.metadata.external_campaign_id, Some(42));
    }

    #[tokio::test]
    async fn test_unknown_status_is_not_successful() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/txn_2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": {
                    "status": "brand_new_state",
                    "amount": 100,
                    "customer": { "email": "d@example.com" },
                    "metadata": ""
                }
            })))
            .mount(&server)
            .await;

        let txn = client_for(&server).verify_transaction("txn_2").await.unwrap();
        assert_eq!(txn.status, TransactionStatus::Unknown);
        assert!(!txn.status.is_successful());
        assert_eq!(txn.reference, "txn_2");
    }

    #[tokio::test]
    async fn test_provider_error_is_rejected_with_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status": false,
                "message": "Transaction reference not found"
            })))
            .mount(&server)
            .await;

        let err = client_for(&server).verify_transaction("missing").await.unwrap_err();
        match err {
            GatewayError::Rejected { status, message } => {
                assert_eq!(status, Some(404));
                assert_eq!(message, "Transaction reference not found");
            }
            other => panic!("expected rejection, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_slow_gateway_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/transaction/verify/slow"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_delay(Duration::from_secs(3))
                    .set_body_json(json!({ "status": true, "data": {} })),
            )
            .mount(&server)
            .await;

        let err = client_for(&server).verify_transaction("slow").await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_service_unavailable_is_transient() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bank"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = client_for(&server).list_banks().await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_settlement_schedule_update() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/subaccount/ACCT_abc"))
            .and(body_json(json!({ "settlement_schedule": "auto" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "message": "Subaccount updated",
                "data": { "subaccount_code": "ACCT_abc", "settlement_schedule": "AUTO" }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client_for(&server)
            .set_settlement_schedule("ACCT_abc", SettlementSchedule::Auto)
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_create_payout_account_holds_funds() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/subaccount"))
            .and(body_json(json!({
                "business_name": "Ada Obi",
                "bank_code": "058",
                "account_number": "0123456789",
                "settlement_schedule": "manual",
                "percentage_charge": 0.0
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "status": true,
                "data": { "subaccount_code": "ACCT_new", "settlement_bank": "Guaranty Trust Bank" }
            })))
            .mount(&server)
            .await;

        let account = client_for(&server)
            .create_payout_account(&PayoutAccountRequest {
                business_name: "Ada Obi".to_string(),
                bank_code: "058".to_string(),
                account_number: "0123456789".to_string(),
                settlement_schedule: SettlementSchedule::Manual,
                percentage_charge: 0.0,
            })
            .await
            .unwrap();

        assert_eq!(account.code, "ACCT_new");
        assert_eq!(account.settlement_bank.as_deref(), Some("Guaranty Trust Bank"));
    }

    #[tokio::test]
    async fn test_resolve_account_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/bank/resolve"))
            .and(query_param("account_number", "0123456789"))
            .and(query_param("bank_code", "058"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": true,
                "data": { "account_number": "0123456789", "account_name": "ADA OBI" }
            })))
            .mount(&server)
            .await;

        let resolved = client_for(&server)
            .resolve_account_name("0123456789", "058")
            .await
            .unwrap();
        assert_eq!(resolved.account_name, "ADA OBI");
    }

    #[test]
    fn test_rejects_non_base_url() {
        let result = PaystackClient::new(PaystackConfig {
            base_url: "mailto:ops@example.com".to_string(),
            ..PaystackConfig::default()
        });
        assert!(matches!(result, Err(AppError::Config(_))));
    }
}
