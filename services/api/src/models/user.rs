//! User entity, its projections and the registration/login payloads

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::validation::validate_username;

/// Database-assigned user id
pub type UserId = i64;

/// User entity
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub oauth_provider: Option<String>,
    pub provider_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn identifier(&self) -> UserIdentifier {
        UserIdentifier {
            id: self.id,
            username: self.username.clone(),
        }
    }

    pub fn personal(&self) -> UserPersonal {
        UserPersonal {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public view of a user, safe to echo to anyone
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserIdentifier {
    pub id: UserId,
    pub username: String,
}

/// View of a user for the user themselves
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct UserPersonal {
    pub id: UserId,
    pub username: String,
    pub email: Option<String>,
}

/// Link between a local account and a federated identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderLink {
    pub provider: String,
    pub provider_id: String,
}

/// New user creation payload
///
/// Fields are private so that every value carries a password hash, a provider
/// link, or both.
#[derive(Debug, Clone)]
pub struct NewUser {
    username: String,
    email: Option<String>,
    password_hash: Option<String>,
    provider: Option<ProviderLink>,
}

impl NewUser {
    /// Account registered with email and password
    pub fn with_password(username: String, email: String, password_hash: String) -> Self {
        Self {
            username,
            email: Some(email),
            password_hash: Some(password_hash),
            provider: None,
        }
    }

    /// Account provisioned on first login through an OAuth provider
    pub fn with_provider(username: String, email: Option<String>, link: ProviderLink) -> Self {
        Self {
            username,
            email,
            password_hash: None,
            provider: Some(link),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    pub fn password_hash(&self) -> Option<&str> {
        self.password_hash.as_deref()
    }

    pub fn provider(&self) -> Option<&ProviderLink> {
        self.provider.as_ref()
    }
}

/// Body of `POST /api/v1/register`
#[derive(Deserialize, Validate)]
pub struct UserRegister {
    #[validate(custom(function = "validate_username"))]
    pub username: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(
        min = 8,
        max = 128,
        message = "password must be between 8 and 128 characters long"
    ))]
    pub password: String,
    #[validate(must_match(other = "password", message = "passwords do not match"))]
    pub password_confirm: String,
}

/// Body of `POST /api/v1/login`
#[derive(Deserialize, Validate)]
pub struct UserLogin {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}
