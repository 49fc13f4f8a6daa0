// Owner notifications.
//
// Email goes through SendGrid's v3 API when a key is configured; otherwise
// notices are only logged. Either way delivery is advisory: callers log a
// failure and carry on.

pub mod email;

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::AppResult;

pub use email::SendGridNotifier;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayoutNotice {
    pub email: String,
    pub owner_name: String,
    pub campaign_title: String,
    /// Minor currency units
    pub raised_amount: i64,
}

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_payout_notice(&self, notice: &PayoutNotice) -> AppResult<()>;
}

/// Fallback used when no email provider is configured
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_payout_notice(&self, notice: &PayoutNotice) -> AppResult<()> {
        info!(
            "📧 (log only) payout notice for \"{}\": {} to {}",
            notice.campaign_title,
            format_naira(notice.raised_amount),
            notice.owner_name
        );
        Ok(())
    }
}

/// Render kobo as naira, e.g. 500000 -> "₦5,000.00"
pub fn format_naira(kobo: i64) -> String {
    let amount = Decimal::new(kobo, 2);
    let sign = if amount.is_sign_negative() { "-" } else { "" };
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }

    format!("{}₦{}.{}", sign, grouped, fraction)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_naira() {
        assert_eq!(format_naira(500_000), "₦5,000.00");
        assert_eq!(format_naira(0), "₦0.00");
        assert_eq!(format_naira(5), "₦0.05");
        assert_eq!(format_naira(123_456_789), "₦1,234,567.89");
        assert_eq!(format_naira(100_000_000), "₦1,000,000.00");
    }

    #[tokio::test]
    async fn test_log_notifier_never_fails() {
        let notice = PayoutNotice {
            email: "ada@example.com".to_string(),
            owner_name: "Ada".to_string(),
            campaign_title: "Clean water".to_string(),
            raised_amount: 1_000,
        };
        assert!(LogNotifier.send_payout_notice(&notice).await.is_ok());
    }
}
