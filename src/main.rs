//! CMS admin backend server.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use cms_admin::config::Config;
use cms_admin::db::{self, Repository};
use cms_admin::{create_router, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration
    let config = Config::from_env()?;

    // Initialize logging
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting CMS admin backend");
    tracing::info!("Database path: {:?}", config.db_path);
    tracing::info!("Bind address: {}", config.bind_addr);
    match config.cache_ttl() {
        Some(ttl) => tracing::info!(
            "Listing cache: ttl {:?}, capacity {}",
            ttl,
            config.cache_max_capacity
        ),
        None => tracing::warn!("Listing cache disabled (CMS_CACHE_TTL_SECS=0)"),
    }

    // Initialize database
    let pool = db::init_database(&config.db_path).await?;
    let repo = Repository::new(pool);

    let bind_addr = config.bind_addr;
    let state = AppState::new(repo, &config);

    // Build router
    let app = create_router(state);

    // Start server
    let listener = tokio::net::TcpListener::bind(bind_addr).await?;
    tracing::info!("Server listening on {}", bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
