//! Closebook API Server
//!
//! Main entry point for the period closing service.

use anyhow::Context;
use sea_orm_migration::MigratorTrait;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use closebook_api::{AppState, create_router};
use closebook_core::closing::{ClosingPolicy, ClosingService};
use closebook_db::{PgClosingStore, connect, migration::Migrator};
use closebook_shared::AppConfig;
use closebook_shared::config::LogConfig;

fn init_tracing(log: &LogConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log.filter));
    let registry = tracing_subscriber::registry().with(filter);

    if log.json {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config.log);

    let db = connect(&config.database).await?;
    info!(
        max_connections = config.database.max_connections,
        "Connected to database"
    );

    if config.database.run_migrations {
        Migrator::up(&db, None).await?;
        info!("Migrations applied");
    }

    let policy = ClosingPolicy::from(&config.closing);
    info!(
        profit_account = %policy.profit_account,
        loss_account = %policy.loss_account,
        tolerance = %policy.balance_tolerance,
        "Closing policy loaded"
    );

    let service = ClosingService::new(PgClosingStore::new(db), policy);
    let app = create_router(AppState::new(service));

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
