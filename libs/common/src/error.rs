//! Errors raised while configuring, connecting to and migrating PostgreSQL.

use sqlx::{Error as SqlxError, migrate::MigrateError};
use thiserror::Error;

/// Failure of one of the startup database steps
#[derive(Error, Debug)]
pub enum DatabaseError {
    /// The environment did not describe a usable database
    #[error("invalid database configuration: {0}")]
    Configuration(String),

    /// The pool could not open its connections
    #[error("failed to connect to PostgreSQL: {0}")]
    Connection(#[source] SqlxError),

    /// `SELECT 1` did not round-trip
    #[error("database health check failed: {0}")]
    HealthCheck(#[source] SqlxError),

    /// A migration in `migrations/` could not be applied
    #[error("failed to apply migrations: {0}")]
    Migration(#[from] MigrateError),
}

/// Type alias for Result with DatabaseError
pub type DatabaseResult<T> = Result<T, DatabaseError>;
