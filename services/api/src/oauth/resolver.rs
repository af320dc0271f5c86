//! Map a provider identity onto a local account, creating it on first login

use std::sync::Arc;

use rand::Rng;
use tracing::info;

use super::ProviderIdentity;
use crate::{
    models::{NewUser, ProviderLink, UserIdentifier},
    repositories::{StoreError, StoreResult, UserStore},
};

/// Outcome of [`IdentityResolver::resolve`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Existing(UserIdentifier),
    Created(UserIdentifier),
}

impl Resolution {
    pub fn user(&self) -> &UserIdentifier {
        match self {
            Resolution::Existing(user) | Resolution::Created(user) => user,
        }
    }
}

#[derive(Clone)]
pub struct IdentityResolver {
    store: Arc<dyn UserStore>,
}

impl IdentityResolver {
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Find the account linked to `identity`, or create one
    ///
    /// A new account gets a random `Runner-<n>` username, the provider's email
    /// and no password. Store failures are returned as they are.
    pub async fn resolve(&self, identity: &ProviderIdentity) -> StoreResult<Resolution> {
        match self
            .store
            .get_user_by_provider_id(&identity.provider, &identity.provider_id)
            .await
        {
            Ok(user) => return Ok(Resolution::Existing(user.identifier())),
            Err(StoreError::NotFound) => {}
            Err(e) => return Err(e),
        }

        let new_user = NewUser::with_provider(
            default_username(),
            identity.email.clone(),
            ProviderLink {
                provider: identity.provider.clone(),
                provider_id: identity.provider_id.clone(),
            },
        );
        let user = self.store.create_user(&new_user).await?;
        info!(
            "Created user {} for {} identity {}",
            user.id, identity.provider, identity.provider_id
        );

        Ok(Resolution::Created(user.identifier()))
    }
}

/// `Runner-<n>` with a random non-negative 63-bit `n`
pub fn default_username() -> String {
    let n: i64 = rand::thread_rng().gen_range(0..i64::MAX);
    format!("Runner-{n}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{repositories::memory::MemoryUserStore, validation::validate_username};

    fn identity(provider_id: &str, email: Option<&str>) -> ProviderIdentity {
        ProviderIdentity {
            provider: "twitter".to_string(),
            provider_id: provider_id.to_string(),
            email: email.map(str::to_owned),
        }
    }

    #[test]
    fn test_default_username_is_a_valid_username() {
        let name = default_username();
        assert!(name.starts_with("Runner-"));
        assert!(validate_username(&name).is_ok());
    }

    #[tokio::test]
    async fn test_unseen_identity_creates_exactly_one_user() {
        let store = Arc::new(MemoryUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let created = resolver.resolve(&identity("42", None)).await.unwrap();
        assert!(matches!(created, Resolution::Created(_)));
        assert_eq!(store.row_count(), 1);

        let found = resolver.resolve(&identity("42", None)).await.unwrap();
        assert_eq!(found, Resolution::Existing(created.user().clone()));
        assert_eq!(store.row_count(), 1);
    }

    #[tokio::test]
    async fn test_provider_email_is_stored() {
        let store = Arc::new(MemoryUserStore::new());
        let resolver = IdentityResolver::new(store.clone());

        let created = resolver
            .resolve(&identity("7", Some("seven@example.com")))
            .await
            .unwrap();
        let user = store.get_user_by_email("seven@example.com").await.unwrap();
        assert_eq!(user.id, created.user().id);
        assert!(user.password_hash.is_none());
    }

    #[tokio::test]
    async fn test_lookup_failure_is_propagated() {
        let store = Arc::new(MemoryUserStore::new());
        store.fail_lookups(true);
        let resolver = IdentityResolver::new(store.clone());

        let err = resolver.resolve(&identity("42", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::Database(_)));
        assert_eq!(store.row_count(), 0);
    }

    #[tokio::test]
    async fn test_email_taken_by_local_account_is_a_conflict() {
        let store = Arc::new(MemoryUserStore::new());
        store
            .create_user(&NewUser::with_password(
                "local".to_string(),
                "taken@example.com".to_string(),
                "hash".to_string(),
            ))
            .await
            .unwrap();
        let resolver = IdentityResolver::new(store.clone());

        let err = resolver
            .resolve(&identity("42", Some("taken@example.com")))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotUnique { .. }));
    }

    #[tokio::test]
    async fn test_creation_failure_is_propagated() {
        let store = Arc::new(MemoryUserStore::new());
        store.fail_creates(true);
        let resolver = IdentityResolver::new(store);

        let err = resolver.resolve(&identity("42", None)).await.unwrap_err();
        assert!(matches!(err, StoreError::CreationFailed(_)));
    }
}
