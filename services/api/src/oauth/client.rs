//! OAuth2 authorization code + PKCE client shared by the providers

use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, PkceCodeChallenge,
    PkceCodeVerifier, RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
    reqwest::async_http_client,
};
use tracing::info;

use super::{AuthorizationRequest, OAuthError};

/// Application credentials registered with a provider
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_url: String,
}

impl OAuthConfig {
    /// Read `<PREFIX>_OAUTH_KEY`, `<PREFIX>_OAUTH_SECRET` and `<PREFIX>_OAUTH_CALLBACK_URL`
    pub fn from_env(prefix: &str) -> Result<Self, OAuthError> {
        let var = |suffix: &str| {
            let name = format!("{prefix}_OAUTH_{suffix}");
            std::env::var(&name)
                .map_err(|_| OAuthError::Configuration(format!("{name} environment variable not set")))
        };

        Ok(Self {
            client_id: var("KEY")?,
            client_secret: var("SECRET")?,
            redirect_url: var("CALLBACK_URL")?,
        })
    }
}

/// Authorization and token endpoints of a provider
#[derive(Debug, Clone, Copy)]
pub struct ProviderEndpoints {
    pub auth_url: &'static str,
    pub token_url: &'static str,
}

/// OAuth2 client wrapper
#[derive(Clone)]
pub struct OAuthClient {
    provider: &'static str,
    client: BasicClient,
    scopes: &'static [&'static str],
}

impl OAuthClient {
    pub fn new(
        provider: &'static str,
        config: &OAuthConfig,
        endpoints: ProviderEndpoints,
        scopes: &'static [&'static str],
    ) -> Result<Self, OAuthError> {
        let invalid = |e: url::ParseError| OAuthError::Configuration(format!("{provider}: {e}"));

        let client = BasicClient::new(
            ClientId::new(config.client_id.clone()),
            Some(ClientSecret::new(config.client_secret.clone())),
            AuthUrl::new(endpoints.auth_url.to_string()).map_err(invalid)?,
            Some(TokenUrl::new(endpoints.token_url.to_string()).map_err(invalid)?),
        )
        .set_redirect_uri(RedirectUrl::new(config.redirect_url.clone()).map_err(invalid)?);

        Ok(Self {
            provider,
            client,
            scopes,
        })
    }

    /// Generate authorization URL with PKCE
    pub fn authorize(&self) -> AuthorizationRequest {
        let (pkce_challenge, pkce_verifier) = PkceCodeChallenge::new_random_sha256();

        let mut request = self
            .client
            .authorize_url(CsrfToken::new_random)
            .set_pkce_challenge(pkce_challenge);
        for scope in self.scopes {
            request = request.add_scope(Scope::new(scope.to_string()));
        }
        let (auth_url, csrf_token) = request.url();

        AuthorizationRequest {
            url: auth_url.to_string(),
            csrf_state: csrf_token.secret().clone(),
            pkce_verifier: pkce_verifier.secret().clone(),
        }
    }

    /// Exchange authorization code for an access token
    pub async fn exchange_code(&self, code: &str, pkce_verifier: &str) -> Result<String, OAuthError> {
        info!("Exchanging authorization code with {}", self.provider);

        let token = self
            .client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .set_pkce_verifier(PkceCodeVerifier::new(pkce_verifier.to_string()))
            .request_async(async_http_client)
            .await
            .map_err(|e| OAuthError::Exchange(e.to_string()))?;

        Ok(token.access_token().secret().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn test_authorize_url_carries_state_and_challenge() {
        let config = OAuthConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "http://localhost:3000/api/v1/oauth/callback?provider=test".to_string(),
        };
        let client = OAuthClient::new(
            "test",
            &config,
            ProviderEndpoints {
                auth_url: "https://provider.test/authorize",
                token_url: "https://provider.test/token",
            },
            &["users.read", "tweet.read"],
        )
        .unwrap();

        let request = client.authorize();
        let url = Url::parse(&request.url).unwrap();
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(params["state"], request.csrf_state);
        assert_eq!(params["client_id"], "client");
        assert_eq!(params["code_challenge_method"], "S256");
        assert_eq!(params["scope"], "users.read tweet.read");
        assert!(!request.pkce_verifier.is_empty());
    }

    #[test]
    fn test_invalid_redirect_url_is_a_configuration_error() {
        let config = OAuthConfig {
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            redirect_url: "not a url".to_string(),
        };
        let result = OAuthClient::new(
            "test",
            &config,
            ProviderEndpoints {
                auth_url: "https://provider.test/authorize",
                token_url: "https://provider.test/token",
            },
            &[],
        );
        assert!(matches!(result, Err(OAuthError::Configuration(_))));
    }
}
