//! Tracing subscriber setup shared by the services

use anyhow::Result;
use tracing_subscriber::{EnvFilter, fmt};

/// Logging configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LogConfig {
    /// Emit one JSON object per event instead of human readable lines
    pub json: bool,
    /// Lower the default level from `info` to `debug`
    pub debug: bool,
}

impl LogConfig {
    /// Create a new LogConfig from environment variables
    ///
    /// # Environment Variables
    /// - `LOG_JSON`: `true` to log as JSON (default: false)
    /// - `DEBUG_LOG`: `true` to log at debug level (default: false)
    ///
    /// `RUST_LOG`, when set, overrides the level chosen here.
    pub fn from_env() -> Self {
        Self {
            json: flag("LOG_JSON"),
            debug: flag("DEBUG_LOG"),
        }
    }

    fn default_directive(&self) -> &'static str {
        if self.debug { "debug" } else { "info" }
    }
}

fn flag(name: &str) -> bool {
    std::env::var(name)
        .map(|value| value.trim().eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}

/// Install the global tracing subscriber
pub fn init_tracing(config: LogConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.default_directive()));

    let builder = fmt().with_env_filter(filter).with_target(true);

    if config.json {
        builder
            .json()
            .try_init()
            .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))
    } else {
        builder
            .try_init()
            .map_err(|e| anyhow::anyhow!("setting default subscriber failed: {}", e))
    }
}
