use serde::Deserialize;
use std::time::Duration;

use crate::gateway::PaystackConfig;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub bind_address: String,
    /// Absent means the in-memory ledger
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    pub paystack_base_url: String,
    pub paystack_secret_key: String,
    pub gateway_timeout_secs: u64,
    pub gateway_connect_timeout_secs: u64,
    pub platform_percentage_charge: f64,
    pub sendgrid_api_key: Option<String>,
    pub notification_from_email: String,
    pub auth_public_key: String,
    /// Comma-separated
    pub cors_allowed_origins: String,
    pub verify_rate_limit_per_minute: u32,
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self, config::ConfigError> {
        Self::load(config::Environment::default())
    }

    fn load(source: config::Environment) -> Result<Self, config::ConfigError> {
        let config: Config = config::Config::builder()
            .set_default("bind_address", "0.0.0.0:8080")?
            .set_default("database_max_connections", 20)?
            .set_default("paystack_base_url", "https://api.paystack.co")?
            .set_default("gateway_timeout_secs", 15)?
            .set_default("gateway_connect_timeout_secs", 5)?
            .set_default("platform_percentage_charge", 0.0)?
            .set_default("notification_from_email", "payouts@donatefunds.app")?
            .set_default("cors_allowed_origins", "http://localhost:3000")?
            .set_default("verify_rate_limit_per_minute", 120)?
            .set_default("request_timeout_secs", 30)?
            .add_source(source.try_parsing(true))
            .build()?
            .try_deserialize()?;

        if config.paystack_secret_key.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "PAYSTACK_SECRET_KEY must not be empty".to_string(),
            ));
        }
        if !(0.0..=100.0).contains(&config.platform_percentage_charge) {
            return Err(config::ConfigError::Message(
                "PLATFORM_PERCENTAGE_CHARGE must be between 0 and 100".to_string(),
            ));
        }

        Ok(config)
    }

    pub fn database_url(&self) -> Option<&str> {
        non_blank(self.database_url.as_deref())
    }

    pub fn sendgrid_api_key(&self) -> Option<&str> {
        non_blank(self.sendgrid_api_key.as_deref())
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn gateway_timeout(&self) -> Duration {
        Duration::from_secs(self.gateway_timeout_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn paystack_config(&self) -> PaystackConfig {
        PaystackConfig {
            base_url: self.paystack_base_url.clone(),
            secret_key: self.paystack_secret_key.clone(),
            timeout: self.gateway_timeout(),
            connect_timeout: Duration::from_secs(self.gateway_connect_timeout_secs),
        }
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> config::Environment {
        let map = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect::<config::Map<String, String>>();
        config::Environment::default().source(Some(map))
    }

    const REQUIRED: [(&str, &str); 2] = [
        ("PAYSTACK_SECRET_KEY", "sk_test_abc"),
        ("AUTH_PUBLIC_KEY", "ea4a6c63e29c520abef5507b132ec5f9954776aebebe7b92421eea691446d22c"),
    ];

    #[test]
    fn test_defaults_apply() {
        let config = Config::load(env(&REQUIRED)).unwrap();

        assert_eq!(config.bind_address, "0.0.0.0:8080");
        assert_eq!(config.database_url(), None);
        assert_eq!(config.database_max_connections, 20);
        assert_eq!(config.paystack_base_url, "https://api.paystack.co");
        assert_eq!(config.gateway_timeout(), Duration::from_secs(15));
        assert_eq!(config.platform_percentage_charge, 0.0);
        assert_eq!(config.sendgrid_api_key(), None);
        assert_eq!(config.cors_origins(), vec!["http://localhost:3000".to_string()]);
        assert_eq!(config.verify_rate_limit_per_minute, 120);
        assert_eq!(config.request_timeout(), Duration::from_secs(30));
    }

    #[test]
    fn test_environment_overrides() {
        let mut pairs = REQUIRED.to_vec();
        pairs.extend([
            ("DATABASE_URL", "postgres://localhost/crowdfund"),
            ("GATEWAY_TIMEOUT_SECS", "3"),
            ("CORS_ALLOWED_ORIGINS", "https://a.example, https://b.example"),
            ("SENDGRID_API_KEY", "  "),
        ]);
        let config = Config::load(env(&pairs)).unwrap();

        assert_eq!(config.database_url(), Some("postgres://localhost/crowdfund"));
        assert_eq!(config.paystack_config().timeout, Duration::from_secs(3));
        assert_eq!(config.cors_origins().len(), 2);
        assert_eq!(config.sendgrid_api_key(), None);
    }

    #[test]
    fn test_missing_secret_key_fails() {
        let result = Config::load(env(&[("AUTH_PUBLIC_KEY", "00")]));
        assert!(result.is_err());
    }

    #[test]
    fn test_percentage_charge_must_be_a_percentage() {
        let mut pairs = REQUIRED.to_vec();
        pairs.push(("PLATFORM_PERCENTAGE_CHARGE", "150"));
        assert!(Config::load(env(&pairs)).is_err());
    }
}
