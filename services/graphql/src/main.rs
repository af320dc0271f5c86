use std::{net::SocketAddr, sync::Arc};

use anyhow::Result;
use tokio::net::TcpListener;
use tracing::info;

use common::{
    database::{DatabaseConfig, health_check, init_pool, run_migrations},
    metrics::HttpMetrics,
    telemetry::{LogConfig, init_tracing},
};
use graphql_api::{
    AppState, create_router,
    schema::{SharedStore, build_schema},
    settings::{DataSource, Settings},
    store::{MemoryLeaderboardStore, PgLeaderboardStore},
};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing(LogConfig::from_env())?;

    info!("Starting leaderboard GraphQL server");

    let settings = Settings::from_env()?;

    let store: SharedStore = match settings.data_source()? {
        DataSource::Memory => {
            info!("Serving seeded in-memory leaderboard data");
            Arc::new(MemoryLeaderboardStore::seeded())
        }
        DataSource::Postgres => {
            let db_config = DatabaseConfig::from_env()?;
            let pool = init_pool(&db_config).await?;
            health_check(&pool).await?;
            run_migrations(&pool).await?;
            Arc::new(PgLeaderboardStore::new(pool))
        }
    };

    let app = create_router(AppState {
        schema: build_schema(store),
        metrics: HttpMetrics::new()?,
        allowed_origins: settings.allowed_origins()?,
    });

    let addr = SocketAddr::from(([0, 0, 0, 0], settings.backend_port));
    let listener = TcpListener::bind(addr).await?;
    info!("GraphQL server listening on {}, GraphiQL at /graphiql", addr);

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
