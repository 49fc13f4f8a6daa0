use async_trait::async_trait;
use serde::Serialize;
use std::time::Duration;
use tracing::info;

use super::{format_naira, Notifier, PayoutNotice};
use crate::error::{AppError, AppResult};

const SENDGRID_URL: &str = "https://api.sendgrid.com/v3/mail/send";

/// SendGrid email client
pub struct SendGridNotifier {
    api_key: String,
    from_email: String,
    endpoint: String,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
struct MailRequest {
    personalizations: Vec<Personalization>,
    from: Address,
    subject: String,
    content: Vec<Content>,
}

#[derive(Debug, Serialize)]
struct Personalization {
    to: Vec<Address>,
}

#[derive(Debug, Serialize)]
struct Address {
    email: String,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(rename = "type")]
    content_type: &'static str,
    value: String,
}

impl SendGridNotifier {
    pub fn new(api_key: String, from_email: String, timeout: Duration) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build email client: {}", e)))?;

        Ok(Self {
            api_key,
            from_email,
            endpoint: SENDGRID_URL.to_string(),
            client,
        })
    }

    /// Point at a different API host (used against mock servers)
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    fn compose(&self, notice: &PayoutNotice) -> MailRequest {
        let amount = format_naira(notice.raised_amount);
        let text = format!(
            "Dear {name},\n\n\
             This email confirms that the payout for your campaign, \"{title}\", has been successfully initiated.\n\
             An amount of {amount} is being processed.\n\
             The funds are scheduled to be settled to your linked bank account within the next 1-2 business days.\n\n\
             Sincerely,\nThe DonateFunds Team",
            name = notice.owner_name,
            title = notice.campaign_title,
            amount = amount,
        );
        let (name, title) = (escape_html(&notice.owner_name), escape_html(&notice.campaign_title));
        let html = format!(
            "<p>Dear {name},</p>\
             <p>This email confirms that the payout for your campaign, \"<strong>{title}</strong>\", has been successfully initiated.</p>\
             <p>An amount of <strong>{amount}</strong> is being processed.</p>\
             <p>The funds are scheduled to be settled to your linked bank account within the next 1-2 business days.</p>\
             <p>Sincerely,<br/>The <strong>DonateFunds</strong> Team</p>",
            name = name,
            title = title,
            amount = amount,
        );

        MailRequest {
            personalizations: vec![Personalization {
                to: vec![Address {
                    email: notice.email.clone(),
                }],
            }],
            from: Address {
                email: self.from_email.clone(),
            },
            subject: format!("Payout Initiated for Campaign: {}", notice.campaign_title),
            content: vec![
                Content {
                    content_type: "text/plain",
                    value: text,
                },
                Content {
                    content_type: "text/html",
                    value: html,
                },
            ],
        }
    }
}

/// Owner-supplied text for the HTML part
fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[async_trait]
impl Notifier for SendGridNotifier {
    async fn send_payout_notice(&self, notice: &PayoutNotice) -> AppResult<()> {
        let request = self.compose(notice);

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::Internal(format!("SendGrid request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(AppError::Internal(format!(
                "SendGrid API error {}: {}",
                status, error_text
            )));
        }

        info!("📧 Payout notification email sent for \"{}\"", notice.campaign_title);
        Ok(())
    }
}
