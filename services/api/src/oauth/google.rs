//! Google OAuth 2.0 provider

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    AuthorizationRequest, IdentityProvider, OAuthClient, OAuthConfig, OAuthError,
    ProviderEndpoints, ProviderIdentity,
};

const ENDPOINTS: ProviderEndpoints = ProviderEndpoints {
    auth_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
};
const SCOPES: &[&str] = &["openid", "email", "profile"];
const PROFILE_URL: &str = "https://www.googleapis.com/oauth2/v2/userinfo";

/// Google user profile response
#[derive(Debug, Deserialize)]
struct GoogleUser {
    id: String,
    email: Option<String>,
    #[serde(default)]
    verified_email: bool,
}

impl GoogleUser {
    /// Only verified addresses are trusted
    fn into_identity(self) -> ProviderIdentity {
        ProviderIdentity {
            provider: "google".to_string(),
            provider_id: self.id,
            email: self.email.filter(|_| self.verified_email),
        }
    }
}

pub struct GoogleProvider {
    client: OAuthClient,
    http: reqwest::Client,
}

impl GoogleProvider {
    pub fn new(config: &OAuthConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            client: OAuthClient::new("google", config, ENDPOINTS, SCOPES)?,
            http: reqwest::Client::new(),
        })
    }

    /// Reads `GOOGLE_OAUTH_KEY`, `GOOGLE_OAUTH_SECRET` and `GOOGLE_OAUTH_CALLBACK_URL`
    pub fn from_env() -> Result<Self, OAuthError> {
        Self::new(&OAuthConfig::from_env("GOOGLE")?)
    }
}

#[async_trait]
impl IdentityProvider for GoogleProvider {
    fn name(&self) -> &'static str {
        "google"
    }

    fn begin_auth(&self) -> AuthorizationRequest {
        self.client.authorize()
    }

    async fn complete_auth(
        &self,
        code: &str,
        pkce_verifier: &str,
    ) -> Result<ProviderIdentity, OAuthError> {
        let access_token = self.client.exchange_code(code, pkce_verifier).await?;

        let user: GoogleUser = self
            .http
            .get(PROFILE_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(user.into_identity())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unverified_email_is_dropped() {
        let user: GoogleUser = serde_json::from_str(
            r#"{"id":"1089","email":"runner@gmail.com","verified_email":false}"#,
        )
        .unwrap();
        let identity = user.into_identity();

        assert_eq!(identity.provider_id, "1089");
        assert_eq!(identity.email, None);
    }

    #[test]
    fn test_verified_email_is_kept() {
        let user: GoogleUser = serde_json::from_str(
            r#"{"id":"1089","email":"runner@gmail.com","verified_email":true,"name":"R"}"#,
        )
        .unwrap();
        assert_eq!(
            user.into_identity().email.as_deref(),
            Some("runner@gmail.com")
        );
    }
}
