//! JWT service for bearer token issuing, validation and refresh
//!
//! Tokens are HS256 signed. The identity claim `id` holds the user id in
//! base 36; `orig_iat` is the time of the original login and survives
//! refreshes so that a session cannot be extended forever.

use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::models::UserId;

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// HMAC secret for signing tokens
    pub secret: String,
    /// Token lifetime in seconds (default: 1 hour)
    pub timeout: u64,
    /// How long after the original login a token may still be refreshed (default: 1 hour)
    pub max_refresh: u64,
    /// Also hand the token out as a `jwt` cookie
    pub send_cookie: bool,
}

impl JwtConfig {
    /// Create a new JwtConfig from environment variables
    ///
    /// # Environment Variables
    /// - `JWT_SECRET`: HMAC signing secret (required)
    /// - `JWT_TIMEOUT_SECONDS`: token lifetime in seconds (default: 3600)
    /// - `JWT_MAX_REFRESH_SECONDS`: refresh window in seconds (default: 3600)
    /// - `JWT_SEND_COOKIE`: `true` to set the `jwt` cookie on login (default: false)
    pub fn from_env() -> Result<Self> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable not set"))?;
        if secret.is_empty() {
            anyhow::bail!("JWT_SECRET must not be empty");
        }

        Ok(JwtConfig {
            secret,
            timeout: seconds_var("JWT_TIMEOUT_SECONDS", 3600)?,
            max_refresh: seconds_var("JWT_MAX_REFRESH_SECONDS", 3600)?,
            send_cookie: std::env::var("JWT_SEND_COOKIE")
                .map(|value| value.trim().eq_ignore_ascii_case("true"))
                .unwrap_or(false),
        })
    }

    /// Configuration with default lifetimes for the given secret
    pub fn with_secret(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            timeout: 3600,
            max_refresh: 3600,
            send_cookie: false,
        }
    }
}

fn seconds_var(name: &str, default: u64) -> Result<u64> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be a number of seconds, got {raw}")),
        Err(_) => Ok(default),
    }
}

/// JWT claims structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id in base 36
    pub id: String,
    /// Expiration time
    pub exp: i64,
    /// Issue time of the first token of this login
    pub orig_iat: i64,
    /// Unique token id
    pub jti: String,
}

/// A signed token and its expiry
#[derive(Debug, Clone)]
pub struct IssuedToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("invalid token: {0}")]
    Invalid(#[from] jsonwebtoken::errors::Error),

    #[error("token is too old to be refreshed")]
    RefreshExpired,

    #[error("token identity is not a base 36 user id")]
    BadIdentity,
}

/// JWT service
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    config: JwtConfig,
}

impl JwtService {
    pub fn new(config: JwtConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        JwtService {
            encoding_key,
            decoding_key,
            validation,
            config,
        }
    }

    /// Sign a token for a fresh login
    pub fn issue(&self, user_id: UserId) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        self.sign(user_id, now.timestamp(), now)
    }

    /// Validate signature and expiry and return the claims
    pub fn validate(&self, token: &str) -> Result<Claims, TokenError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        Ok(token_data.claims)
    }

    /// Re-sign a validated token with a new expiry, keeping `orig_iat`
    pub fn refresh(&self, claims: &Claims) -> Result<IssuedToken, TokenError> {
        let now = Utc::now();
        let max_refresh = i64::try_from(self.config.max_refresh).unwrap_or(i64::MAX);
        if now.timestamp() > claims.orig_iat.saturating_add(max_refresh) {
            return Err(TokenError::RefreshExpired);
        }
        let user_id = Self::identity(claims)?;
        self.sign(user_id, claims.orig_iat, now)
    }

    /// User id carried by the claims
    pub fn identity(claims: &Claims) -> Result<UserId, TokenError> {
        decode_base36(&claims.id)
            .and_then(|id| UserId::try_from(id).ok())
            .ok_or(TokenError::BadIdentity)
    }

    /// Whether tokens are also handed out as a cookie
    pub fn send_cookie(&self) -> bool {
        self.config.send_cookie
    }

    /// Token lifetime in seconds
    pub fn timeout(&self) -> u64 {
        self.config.timeout
    }

    fn sign(
        &self,
        user_id: UserId,
        orig_iat: i64,
        now: DateTime<Utc>,
    ) -> Result<IssuedToken, TokenError> {
        let lifetime = i64::try_from(self.config.timeout).unwrap_or(i64::MAX);
        let expires_at = now + Duration::seconds(lifetime);
        let claims = Claims {
            id: encode_base36(user_id.unsigned_abs()),
            exp: expires_at.timestamp(),
            orig_iat,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)?;
        Ok(IssuedToken { token, expires_at })
    }
}

/// Lowercase base 36 rendering of an id
pub fn encode_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}

/// Parse a base 36 id, either case
pub fn decode_base36(value: &str) -> Option<u64> {
    if value.is_empty() || value.starts_with('+') {
        return None;
    }
    u64::from_str_radix(value, 36).ok()
}
