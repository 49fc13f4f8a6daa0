use axum::{
    middleware::{from_fn_with_state, map_response},
    routing::{get, patch, post},
    Router,
};
use tower_http::{compression::CompressionLayer, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::{
    api::{
        campaigns::{
            activate_campaign, add_evidence, campaign_donations, create_campaign, get_campaign,
            list_campaigns,
        },
        handler::{health_check, AppState},
        payments::{create_subaccount, list_banks, resolve_account, trigger_payout, verify_payment},
        users::{current_user, register_user},
    },
    config::Config,
    error::AppResult,
    middleware::{create_cors_layer, rate_limit_middleware, wrap_bare_errors, RateLimitLayer},
};

pub fn create_app(state: AppState, config: &Config) -> AppResult<Router> {
    info!("⚙️ Setting up HTTP routes...");

    // Verification is public, so it gets its own quota
    let verify_limit = RateLimitLayer::per_minute(config.verify_rate_limit_per_minute);
    let verification = Router::new()
        .route("/verify/:reference", get(verify_payment))
        .route_layer(from_fn_with_state(verify_limit, rate_limit_middleware));

    let payments = Router::new()
        .route("/payout/:campaign_id", post(trigger_payout))
        .route("/banks", get(list_banks))
        .route("/resolve", post(resolve_account))
        .route("/subaccount", post(create_subaccount))
        .merge(verification);

    let campaigns = Router::new()
        .route("/", post(create_campaign).get(list_campaigns))
        .route("/:id", get(get_campaign))
        .route("/:id/activate", patch(activate_campaign))
        .route("/:id/evidence", patch(add_evidence))
        .route("/:id/donations", get(campaign_donations));

    let users = Router::new()
        .route("/", post(register_user))
        .route("/me", get(current_user));

    let app = Router::new()
        .route("/health", get(health_check))
        .nest(
            "/api",
            Router::new()
                .nest("/payments", payments)
                .nest("/campaigns", campaigns)
                .nest("/users", users),
        )
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(config.request_timeout()))
        .layer(map_response(wrap_bare_errors))
        .layer(create_cors_layer(&config.cors_origins())?)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    info!("✓ HTTP routes configured");
    Ok(app)
}

pub async fn run_server(app: Router, bind_address: &str) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(bind_address).await?;
    info!("🌐 Server listening on: {}", bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
