use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use api::{
    AppState, create_router,
    jwt::{JwtConfig, JwtService},
    oauth::ProviderRegistry,
    password::PasswordHasher,
    repositories::PgUserStore,
    settings::Settings,
};
use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    metrics::HttpMetrics,
    telemetry::{LogConfig, init_tracing},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogConfig::from_env())?;

    info!("Starting leaderboard API");

    let settings = Settings::from_env()?;

    // Initialize database connection pool
    let db_config = DatabaseConfig::from_env()?;
    let pool = init_pool(&db_config).await?;
    health_check(&pool).await?;
    run_migrations(&pool).await?;

    let jwt_service = JwtService::new(JwtConfig::from_env()?);
    let providers = ProviderRegistry::from_enabled(&settings.enabled_providers())?;

    let app_state = AppState::new(
        Arc::new(PgUserStore::new(pool)),
        PasswordHasher::new()?,
        jwt_service,
        providers,
        settings.cookie_key()?,
        HttpMetrics::new()?,
    )
    .with_allowed_origins(settings.allowed_origins()?);

    let app = create_router(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.backend_port));
    let listener = TcpListener::bind(addr).await?;
    info!("Leaderboard API listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Leaderboard API stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
