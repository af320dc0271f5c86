//! Common library for the leaderboard backend
//!
//! This crate provides functionality shared by the REST and GraphQL services:
//! database connectivity and migrations, the database error type, tracing
//! initialisation, CORS and HTTP metrics.
//!
//! ```rust,no_run
//! use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = DatabaseConfig::from_env()?;
//!     let pool = init_pool(&config).await?;
//!     run_migrations(&pool).await?;
//!     health_check(&pool).await?;
//!     Ok(())
//! }
//! ```

pub mod cors;
pub mod database;
pub mod error;
pub mod metrics;
pub mod telemetry;
