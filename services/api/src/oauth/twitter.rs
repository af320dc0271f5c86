//! Twitter (X) OAuth 2.0 provider

use async_trait::async_trait;
use serde::Deserialize;

use super::{
    AuthorizationRequest, IdentityProvider, OAuthClient, OAuthConfig, OAuthError,
    ProviderEndpoints, ProviderIdentity,
};

const ENDPOINTS: ProviderEndpoints = ProviderEndpoints {
    auth_url: "https://twitter.com/i/oauth2/authorize",
    token_url: "https://api.twitter.com/2/oauth2/token",
};
const SCOPES: &[&str] = &["users.read", "tweet.read"];
const PROFILE_URL: &str = "https://api.twitter.com/2/users/me";

#[derive(Debug, Deserialize)]
struct TwitterUser {
    data: TwitterUserData,
}

#[derive(Debug, Deserialize)]
struct TwitterUserData {
    id: String,
}

/// Twitter does not share email addresses, so identities carry none
pub struct TwitterProvider {
    client: OAuthClient,
    http: reqwest::Client,
}

impl TwitterProvider {
    pub fn new(config: &OAuthConfig) -> Result<Self, OAuthError> {
        Ok(Self {
            client: OAuthClient::new("twitter", config, ENDPOINTS, SCOPES)?,
            http: reqwest::Client::new(),
        })
    }

    /// Reads `TWITTER_OAUTH_KEY`, `TWITTER_OAUTH_SECRET` and `TWITTER_OAUTH_CALLBACK_URL`
    pub fn from_env() -> Result<Self, OAuthError> {
        Self::new(&OAuthConfig::from_env("TWITTER")?)
    }
}

#[async_trait]
impl IdentityProvider for TwitterProvider {
    fn name(&self) -> &'static str {
        "twitter"
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

        let user: TwitterUser = self
            .http
            .get(PROFILE_URL)
            .bearer_auth(access_token)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        Ok(ProviderIdentity {
            provider: self.name().to_string(),
            provider_id: user.data.id,
            email: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_profile_payload() {
        let user: TwitterUser = serde_json::from_str(
            r#"{"data":{"id":"2244994945","name":"Dev","username":"dev"}}"#,
        )
        .unwrap();
        assert_eq!(user.data.id, "2244994945");
    }
}
