//! User persistence: the `UserStore` seam and its error type

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{NewUser, User, UserId, UserIdentifier, UserPersonal};

pub mod user;

#[cfg(test)]
pub mod memory;

pub use user::PgUserStore;

/// Column guarded by a unique index
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniqueField {
    Username,
    Email,
    ProviderId,
}

impl UniqueField {
    /// Derive the offending field from a unique index name
    pub fn from_constraint(constraint: &str) -> Option<Self> {
        if constraint.contains("username") {
            Some(Self::Username)
        } else if constraint.contains("email") {
            Some(Self::Email)
        } else if constraint.contains("provider") {
            Some(Self::ProviderId)
        } else {
            None
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Username => "username",
            Self::Email => "email",
            Self::ProviderId => "provider_id",
        }
    }
}

/// Failure of a [`UserStore`] operation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("the requested user was not found")]
    NotFound,

    #[error("attempted to create a user with duplicate data")]
    NotUnique {
        constraint: Option<String>,
        field: Option<UniqueField>,
    },

    #[error("user creation failed: {0}")]
    CreationFailed(#[source] sqlx::Error),

    #[error("user store query failed: {0}")]
    Database(#[source] sqlx::Error),
}

impl StoreError {
    /// Duplicate data rejected by the named unique index
    pub fn not_unique(constraint: Option<String>) -> Self {
        let field = constraint.as_deref().and_then(UniqueField::from_constraint);
        Self::NotUnique { constraint, field }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Storage of user accounts
///
/// Lookups never return soft-deleted users.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn get_user_identifier_by_id(&self, id: UserId) -> StoreResult<UserIdentifier>;

    async fn get_user_personal_by_id(&self, id: UserId) -> StoreResult<UserPersonal>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User>;

    async fn get_user_by_provider_id(&self, provider: &str, provider_id: &str)
    -> StoreResult<User>;

    async fn create_user(&self, new_user: &NewUser) -> StoreResult<User>;

    /// Soft delete: the row is kept with `deleted_at` set
    async fn delete_user(&self, id: UserId) -> StoreResult<()>;
}
