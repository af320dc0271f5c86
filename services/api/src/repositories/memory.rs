//! In-memory [`UserStore`] used by the handler and resolver tests

use std::sync::{
    Mutex,
    atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;

use super::{StoreError, StoreResult, UserStore};
use crate::models::{NewUser, User, UserId, UserIdentifier, UserPersonal};

/// Mirrors the partial unique indexes of the `users` table
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<Vec<User>>,
    fail_lookups: AtomicBool,
    fail_creates: AtomicBool,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every lookup fail as if the database were unreachable
    pub fn fail_lookups(&self, fail: bool) {
        self.fail_lookups.store(fail, Ordering::SeqCst);
    }

    /// Make every insert fail for a reason other than uniqueness
    pub fn fail_creates(&self, fail: bool) {
        self.fail_creates.store(fail, Ordering::SeqCst);
    }

    /// Rows stored so far, soft-deleted ones included
    pub fn row_count(&self) -> usize {
        self.users.lock().unwrap().len()
    }

    fn find(&self, predicate: impl Fn(&User) -> bool) -> StoreResult<User> {
        if self.fail_lookups.load(Ordering::SeqCst) {
            return Err(StoreError::Database(sqlx::Error::PoolTimedOut));
        }
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|user| user.deleted_at.is_none() && predicate(user))
            .cloned()
            .ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn get_user_identifier_by_id(&self, id: UserId) -> StoreResult<UserIdentifier> {
        self.find(|user| user.id == id).map(|user| user.identifier())
    }

    async fn get_user_personal_by_id(&self, id: UserId) -> StoreResult<UserPersonal> {
        self.find(|user| user.id == id).map(|user| user.personal())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        self.find(|user| user.email.as_deref() == Some(email))
    }

    async fn get_user_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> StoreResult<User> {
        self.find(|user| {
            user.oauth_provider.as_deref() == Some(provider)
                && user.provider_id.as_deref() == Some(provider_id)
        })
    }

    async fn create_user(&self, new_user: &NewUser) -> StoreResult<User> {
        if self.fail_creates.load(Ordering::SeqCst) {
            return Err(StoreError::CreationFailed(sqlx::Error::PoolTimedOut));
        }

        let mut users = self.users.lock().unwrap();
        let provider = new_user.provider();
        for existing in users.iter().filter(|user| user.deleted_at.is_none()) {
            let constraint = if existing.username == new_user.username() {
                Some("users_username_key")
            } else if new_user.email().is_some() && existing.email.as_deref() == new_user.email()
            {
                Some("users_email_key")
            } else if provider.is_some_and(|link| {
                existing.oauth_provider.as_deref() == Some(link.provider.as_str())
                    && existing.provider_id.as_deref() == Some(link.provider_id.as_str())
            }) {
                Some("users_provider_id_key")
            } else {
                None
            };
            if let Some(constraint) = constraint {
                return Err(StoreError::not_unique(Some(constraint.to_string())));
            }
        }

        let now = Utc::now();
        let user = User {
            id: users.len() as UserId + 1,
            username: new_user.username().to_string(),
            email: new_user.email().map(str::to_owned),
            password_hash: new_user.password_hash().map(str::to_owned),
            oauth_provider: provider.map(|link| link.provider.clone()),
            provider_id: provider.map(|link| link.provider_id.clone()),
            created_at: now,
            updated_at: now,
            deleted_at: None,
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|user| user.id == id && user.deleted_at.is_none())
            .ok_or(StoreError::NotFound)?;
        let now = Utc::now();
        user.deleted_at = Some(now);
        user.updated_at = now;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ProviderLink;

    fn local(username: &str, email: &str) -> NewUser {
        NewUser::with_password(
            username.to_string(),
            email.to_string(),
            "hash".to_string(),
        )
    }

    #[tokio::test]
    async fn test_soft_deleted_users_are_invisible_and_free_their_email() {
        let store = MemoryUserStore::new();
        let user = store.create_user(&local("a", "a@example.com")).await.unwrap();

        store.delete_user(user.id).await.unwrap();
        assert!(matches!(
            store.get_user_identifier_by_id(user.id).await,
            Err(StoreError::NotFound)
        ));
        assert!(matches!(
            store.delete_user(user.id).await,
            Err(StoreError::NotFound)
        ));

        store.create_user(&local("a", "a@example.com")).await.unwrap();
        assert_eq!(store.row_count(), 2);
    }

    #[tokio::test]
    async fn test_provider_pair_is_unique() {
        let store = MemoryUserStore::new();
        let link = ProviderLink {
            provider: "twitter".to_string(),
            provider_id: "42".to_string(),
        };
        store
            .create_user(&NewUser::with_provider("one".to_string(), None, link.clone()))
            .await
            .unwrap();

        let err = store
            .create_user(&NewUser::with_provider("two".to_string(), None, link))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotUnique { .. }));
    }
}
