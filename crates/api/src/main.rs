use anyhow::Result;
use std::net::SocketAddr;
use tracing::info;

use eventhub_api::{app, config, middleware};
use shared::clock::Clock;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Load configuration
    let config = config::Config::load()?;

    // Initialize logging
    middleware::logging::init_logging(&config.logging);

    info!("Starting EventHub API v{}", env!("CARGO_PKG_VERSION"));

    // Create database pool
    let pool = persistence::db::create_pool(&database_config(&config)).await?;

    // Run migrations
    info!("Running database migrations...");
    persistence::db::MIGRATOR.run(&pool).await?;
    info!("Migrations completed");

    // Build application
    let addr = config.socket_addr();
    let app = app::create_app(config, pool, Clock::system());

    // Start server
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

fn database_config(config: &config::Config) -> persistence::db::DatabaseConfig {
    persistence::db::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        min_connections: config.database.min_connections,
        connect_timeout_secs: config.database.connect_timeout_secs,
        idle_timeout_secs: config.database.idle_timeout_secs,
    }
}
