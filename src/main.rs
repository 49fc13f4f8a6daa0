use crowdfund_backend::{bootstrap, config::Config, server};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::info;


// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,crowdfund_backend=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load configuration
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("🚀 Starting crowdfunding backend");

    let config = Config::from_env()?;

    let state = bootstrap::initialize_app_state(&config).await?;

    // Create HTTP server
    let app = server::create_app(state, &config)?;

    // Run the Server
    server::run_server(app, &config.bind_address).await?;

    info!("👋 Server stopped");

    Ok(())
}
