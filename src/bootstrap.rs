use std::{sync::Arc, time::Duration};
use sqlx::{PgPool, postgres::PgPoolOptions};
use tracing::{info, warn};
use crate::{
    api::handler::AppState,
    auth::TokenVerifier,
    config::Config,
    error::AppResult,
    gateway::{PaymentGateway, PaystackClient},
    ledger::{InMemoryLedger, LedgerRepository, LedgerStore},
    notifications::{LogNotifier, Notifier, SendGridNotifier},
};

pub async fn initialize_app_state(config: &Config) -> AppResult<AppState> {
    info!("Initializing application components ...");

    let ledger: Arc<dyn LedgerStore> = match config.database_url() {
        Some(database_url) => {
            let pool = initialize_database(database_url, config.database_max_connections).await?;
            Arc::new(LedgerRepository::new(pool))
        }
        None => {
            warn!("⚠️  DATABASE_URL not set - using the in-memory ledger, nothing will persist");
            Arc::new(InMemoryLedger::new())
        }
    };

    let gateway: Arc<dyn PaymentGateway> = Arc::new(PaystackClient::new(config.paystack_config())?);
    info!("✅ Payment gateway client ready ({})", config.paystack_base_url);

    let notifier: Arc<dyn Notifier> = match config.sendgrid_api_key() {
        Some(api_key) => {
            info!("✅ Email notifications enabled");
            Arc::new(SendGridNotifier::new(
                api_key.to_string(),
                config.notification_from_email.clone(),
                config.gateway_timeout(),
            )?)
        }
        None => {
            warn!("⚠️  SENDGRID_API_KEY not set - payout notices will only be logged");
            Arc::new(LogNotifier)
        }
    };

    let auth = Arc::new(TokenVerifier::from_hex(&config.auth_public_key)?);

    let state = AppState::new(
        ledger,
        gateway,
        notifier,
        auth,
        config.platform_percentage_charge,
    );

    info!("✓ Application state initialized");
    Ok(state)
}

async fn initialize_database(database_url: &str, max_connections: u32) -> AppResult<PgPool> {
    info!("📊 Connecting to database...");

    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .acquire_timeout(Duration::from_secs(30))
        .idle_timeout(Duration::from_secs(600))
        .max_lifetime(Duration::from_secs(1800))
        .connect(database_url)
        .await?;

    info!("✓ Database pool configured: {} max connections", max_connections);

    // Run migrations
    info!("🔄 Running database migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;

    info!("✓ Database initialized");
    Ok(pool)
}
