//! Server level settings loaded with the `config` crate

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use common::cors::parse_origins;
use config::{Config, Environment};
use serde::Deserialize;

fn default_port() -> u16 {
    3030
}

fn default_data_source() -> String {
    "memory".to_string()
}

/// Backing store of the GraphQL server
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataSource {
    /// Seeded sample data kept in process
    Memory,
    Postgres,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `BACKEND_PORT`
    #[serde(default = "default_port")]
    pub backend_port: u16,
    /// `CORS_ALLOWED_ORIGINS`, comma separated; empty mirrors the request origin
    #[serde(default)]
    pub cors_allowed_origins: String,
    /// `GRAPHQL_DATA_SOURCE`: `memory` or `postgres`
    #[serde(default = "default_data_source")]
    pub graphql_data_source: String,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
            .context("invalid server settings")
    }

    pub fn data_source(&self) -> Result<DataSource> {
        match self.graphql_data_source.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(DataSource::Memory),
            "postgres" | "postgresql" => Ok(DataSource::Postgres),
            other => anyhow::bail!("unknown GRAPHQL_DATA_SOURCE: {other}"),
        }
    }

    pub fn allowed_origins(&self) -> Result<Vec<HeaderValue>> {
        parse_origins(&self.cors_allowed_origins).context("invalid CORS_ALLOWED_ORIGINS")
    }
}
