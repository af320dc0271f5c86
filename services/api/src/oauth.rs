//! OAuth2 login through federated identity providers
//!
//! A provider implements [`IdentityProvider`]; enabled providers are kept in a
//! [`ProviderRegistry`] keyed by name. The handshake state (CSRF token and PKCE
//! verifier) travels in a signed cookie between `authenticate` and `callback`.

use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

mod client;
pub mod google;
pub mod resolver;
pub mod twitter;

pub use client::{OAuthClient, OAuthConfig, ProviderEndpoints};
pub use google::GoogleProvider;
pub use resolver::{IdentityResolver, Resolution};
pub use twitter::TwitterProvider;

/// Name of the signed cookie holding the [`OAuthSession`]
pub const SESSION_COOKIE: &str = "oauth_session";

/// Seconds a handshake may take before its session is rejected
pub const SESSION_TTL_SECONDS: i64 = 600;

#[derive(Error, Debug)]
pub enum OAuthError {
    #[error("invalid oauth configuration: {0}")]
    Configuration(String),

    #[error("authorization code exchange failed: {0}")]
    Exchange(String),

    #[error("failed to fetch the provider profile: {0}")]
    Profile(#[from] reqwest::Error),
}

/// Redirect target and the secrets that must come back on the callback
#[derive(Debug, Clone)]
pub struct AuthorizationRequest {
    pub url: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
}

/// Identity asserted by a provider after a successful handshake
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderIdentity {
    pub provider: String,
    pub provider_id: String,
    pub email: Option<String>,
}

/// A federated identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Lowercase name used in `?provider=`
    fn name(&self) -> &'static str;

    /// Start a handshake
    fn begin_auth(&self) -> AuthorizationRequest;

    /// Exchange the authorization code and read the user's provider id
    async fn complete_auth(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderIdentity, OAuthError>;
}

/// Enabled providers by name
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<&'static str, Arc<dyn IdentityProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the providers listed in a comma separated, case-insensitive list
    ///
    /// Each provider reads its own credentials from the environment. Unknown
    /// names are logged and skipped.
    pub fn from_enabled(enabled: &[String]) -> Result<Self, OAuthError> {
        let mut registry = Self::new();
        for name in enabled {
            match name.trim().to_ascii_lowercase().as_str() {
                "twitter" => registry.register(Arc::new(TwitterProvider::from_env()?)),
                "google" => registry.register(Arc::new(GoogleProvider::from_env()?)),
                "" => {}
                unknown => warn!("Ignoring unknown OAuth provider: {}", unknown),
            }
        }
        Ok(registry)
    }

    pub fn register(&mut self, provider: Arc<dyn IdentityProvider>) {
        info!("Enabled OAuth provider: {}", provider.name());
        self.providers.insert(provider.name(), provider);
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn IdentityProvider>> {
        self.providers
            .get(name.trim().to_ascii_lowercase().as_str())
            .cloned()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

/// Handshake state kept in the signed cookie
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OAuthSession {
    pub provider: String,
    pub csrf_state: String,
    pub pkce_verifier: String,
    pub created_at: i64,
}

impl OAuthSession {
    pub fn new(provider: &str, request: &AuthorizationRequest) -> Self {
        Self {
            provider: provider.to_string(),
            csrf_state: request.csrf_state.clone(),
            pkce_verifier: request.pkce_verifier.clone(),
            created_at: Utc::now().timestamp(),
        }
    }

    /// Whether a callback for `provider` carrying `state` belongs to this session
    pub fn matches(&self, provider: &str, state: &str) -> bool {
        let age = Utc::now().timestamp() - self.created_at;
        self.provider == provider
            && self.csrf_state == state
            && (0..=SESSION_TTL_SECONDS).contains(&age)
    }
}

#[cfg(test)]
pub mod testing {
    //! Provider double that never leaves the process

    use super::*;
    use uuid::Uuid;

    /// Code that makes [`FakeProvider::complete_auth`] fail
    pub const FAILING_CODE: &str = "fail";

    /// Treats the authorization code as the provider id
    pub struct FakeProvider;

    #[async_trait]
    impl IdentityProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        fn begin_auth(&self) -> AuthorizationRequest {
            let csrf_state = Uuid::new_v4().to_string();
            AuthorizationRequest {
                url: format!("https://provider.test/authorize?state={csrf_state}"),
                csrf_state,
                pkce_verifier: Uuid::new_v4().to_string(),
            }
        }

        async fn complete_auth(
            &self,
            code: &str,
            _pkce_verifier: &str,
        ) -> Result<ProviderIdentity, OAuthError> {
            if code == FAILING_CODE {
                return Err(OAuthError::Exchange("invalid_grant".to_string()));
            }
            Ok(ProviderIdentity {
                provider: self.name().to_string(),
                provider_id: code.to_string(),
                email: Some(format!("{code}@provider.test")),
            })
        }
    }
}
