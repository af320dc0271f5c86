//! PostgreSQL connection pooling, health checks and migrations
//!
//! Both services build their pool through [`init_pool`] and apply the SQL
//! files under `migrations/` with [`run_migrations`] before serving traffic.

use sqlx::{PgPool, postgres::PgPoolOptions};
use std::{env, time::Duration};
use tracing::{error, info};

use crate::error::{DatabaseError, DatabaseResult};

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub database_url: String,
    /// Maximum number of connections in the pool
    pub max_connections: u32,
    /// Minimum number of connections in the pool
    pub min_connections: u32,
    /// Connection timeout in seconds
    pub connection_timeout: u64,
}

impl DatabaseConfig {
    /// Create a new DatabaseConfig from environment variables
    ///
    /// # Environment Variables
    /// - `DATABASE_URL`: full PostgreSQL URL; when unset the URL is composed from
    ///   `POSTGRES_HOST` (localhost), `POSTGRES_PORT` (5432), `POSTGRES_USER` (postgres),
    ///   `POSTGRES_PASSWORD` (postgres) and `POSTGRES_DB` (leaderboard)
    /// - `DATABASE_MAX_CONNECTIONS`: Maximum number of connections (default: 10)
    /// - `DATABASE_MIN_CONNECTIONS`: Minimum number of connections (default: 1)
    /// - `DATABASE_CONNECTION_TIMEOUT`: Connection timeout in seconds (default: 30)
    pub fn from_env() -> DatabaseResult<Self> {
        let database_url = match env::var("DATABASE_URL") {
            Ok(url) => url,
            Err(_) => compose_url_from_parts()?,
        };

        let max_connections = parse_var("DATABASE_MAX_CONNECTIONS", 10)?;
        let min_connections = parse_var("DATABASE_MIN_CONNECTIONS", 1)?;
        let connection_timeout = parse_var("DATABASE_CONNECTION_TIMEOUT", 30)?;

        if min_connections > max_connections {
            return Err(DatabaseError::Configuration(format!(
                "DATABASE_MIN_CONNECTIONS ({min_connections}) exceeds DATABASE_MAX_CONNECTIONS ({max_connections})"
            )));
        }

        Ok(DatabaseConfig {
            database_url,
            max_connections,
            min_connections,
            connection_timeout,
        })
    }
}

fn compose_url_from_parts() -> DatabaseResult<String> {
    let host = env::var("POSTGRES_HOST").unwrap_or_else(|_| "localhost".to_string());
    let port: u16 = parse_var("POSTGRES_PORT", 5432)?;
    let user = env::var("POSTGRES_USER").unwrap_or_else(|_| "postgres".to_string());
    let password = env::var("POSTGRES_PASSWORD").unwrap_or_else(|_| "postgres".to_string());
    let dbname = env::var("POSTGRES_DB").unwrap_or_else(|_| "leaderboard".to_string());

    Ok(format!(
        "postgresql://{user}:{password}@{host}:{port}/{dbname}?sslmode=disable"
    ))
}

fn parse_var<T: std::str::FromStr>(name: &str, default: T) -> DatabaseResult<T> {
    match env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| DatabaseError::Configuration(format!("{name} is not a valid number: {raw}"))),
        Err(_) => Ok(default),
    }
}

/// Initialize a PostgreSQL connection pool
///
/// # Arguments
/// * `config` - Database configuration
pub async fn init_pool(config: &DatabaseConfig) -> DatabaseResult<PgPool> {
    info!("Initializing database connection pool");

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout))
        .connect(&config.database_url)
        .await
        .map_err(DatabaseError::Connection)?;

    info!("Database connection pool initialized successfully");
    Ok(pool)
}

/// Apply every pending migration from the workspace `migrations/` directory
pub async fn run_migrations(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("Database migrations applied");
    Ok(())
}

/// Check database connectivity
pub async fn health_check(pool: &PgPool) -> DatabaseResult<()> {
    sqlx::query("SELECT 1")
        .fetch_one(pool)
        .await
        .map(|_| info!("Database health check successful"))
        .map_err(|e| {
            error!("Database health check failed: {}", e);
            DatabaseError::HealthCheck(e)
        })
}
