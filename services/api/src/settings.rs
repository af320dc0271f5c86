//! Server level settings loaded with the `config` crate

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use axum_extra::extract::cookie::Key;
use common::cors::parse_origins;
use config::{Config, Environment};
use serde::Deserialize;
use tracing::warn;

fn default_port() -> u16 {
    3000
}

/// Settings read from the process environment
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// `BACKEND_PORT`
    #[serde(default = "default_port")]
    pub backend_port: u16,
    /// `ENABLED_PROVIDERS`, comma separated
    #[serde(default)]
    pub enabled_providers: String,
    /// `CORS_ALLOWED_ORIGINS`, comma separated; empty mirrors the request origin
    #[serde(default)]
    pub cors_allowed_origins: String,
    /// `OAUTH_SESSION_SECRET`, at least 64 bytes
    #[serde(default)]
    pub oauth_session_secret: Option<String>,
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        Config::builder()
            .add_source(Environment::default())
            .build()?
            .try_deserialize()
            .context("invalid server settings")
    }

    /// Lowercased provider names, empty entries removed
    pub fn enabled_providers(&self) -> Vec<String> {
        self.enabled_providers
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(str::to_ascii_lowercase)
            .collect()
    }

    pub fn allowed_origins(&self) -> Result<Vec<HeaderValue>> {
        parse_origins(&self.cors_allowed_origins).context("invalid CORS_ALLOWED_ORIGINS")
    }

    /// Key signing the OAuth session cookie
    pub fn cookie_key(&self) -> Result<Key> {
        match self.oauth_session_secret.as_deref() {
            Some(secret) => {
                Key::try_from(secret.as_bytes()).context("OAUTH_SESSION_SECRET must be at least 64 bytes")
            }
            None => {
                warn!("OAUTH_SESSION_SECRET not set, OAuth handshakes will not survive a restart");
                Ok(Key::generate())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 4] = [
        "BACKEND_PORT",
        "ENABLED_PROVIDERS",
        "CORS_ALLOWED_ORIGINS",
        "OAUTH_SESSION_SECRET",
    ];

    fn clear_env() {
        for var in VARS {
            unsafe {
                std::env::remove_var(var);
            }
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.backend_port, 3000);
        assert!(settings.enabled_providers().is_empty());
        assert!(settings.allowed_origins().unwrap().is_empty());
        assert!(settings.cookie_key().is_ok());
    }

    #[test]
    #[serial]
    fn test_values_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("BACKEND_PORT", "8080");
            std::env::set_var("ENABLED_PROVIDERS", "Twitter, ,google");
            std::env::set_var(
                "CORS_ALLOWED_ORIGINS",
                "http://localhost:5173,https://speedrun.example",
            );
            std::env::set_var("OAUTH_SESSION_SECRET", "short");
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.backend_port, 8080);
        assert_eq!(settings.enabled_providers(), vec!["twitter", "google"]);
        assert_eq!(settings.allowed_origins().unwrap().len(), 2);
        assert!(settings.cookie_key().is_err());

        unsafe {
            std::env::set_var("OAUTH_SESSION_SECRET", "x".repeat(64));
        }
        assert!(Settings::from_env().unwrap().cookie_key().is_ok());

        clear_env();
    }

    #[test]
    #[serial]
    fn test_numeric_secret_is_kept_verbatim() {
        clear_env();
        let secret = format!("000{}", "7".repeat(61));
        unsafe {
            std::env::set_var("OAUTH_SESSION_SECRET", &secret);
        }

        let settings = Settings::from_env().unwrap();
        assert_eq!(settings.oauth_session_secret.as_deref(), Some(secret.as_str()));
        assert!(settings.cookie_key().is_ok());

        clear_env();
    }
}
