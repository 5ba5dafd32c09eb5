use anyhow::Result;
use std::time::Duration;
use tracing::info;

use rsvp_service::bootstrap::{build_scheduler, build_service};
use rsvp_service::config::Config;
use rsvp_service::logging::init_logging;
use rsvp_service::metrics::init_metrics;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = Config::load()?;
    init_logging(&config.logging);

    info!("Starting RSVP service v{}", env!("CARGO_PKG_VERSION"));

    init_metrics(&config.metrics)?;

    let pool = persistence::create_pool(&(&config.database).into()).await?;

    info!("Running database migrations...");
    persistence::run_migrations(&pool).await?;
    info!("Migrations completed");

    let service = build_service(&config, &pool);
    let mut scheduler = build_scheduler(&config, &service, Some(pool.clone()));
    scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutdown signal received");

    scheduler.shutdown();
    scheduler.wait_for_shutdown(SHUTDOWN_TIMEOUT).await;
    pool.close().await;

    Ok(())
}
