//! PostgreSQL implementation of [`UserStore`]

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::{debug, info};

use super::{StoreError, StoreResult, UserStore};
use crate::models::{NewUser, User, UserId, UserIdentifier, UserPersonal};

const USER_COLUMNS: &str = "id, username, email, password_hash, oauth_provider, provider_id, \
                            created_at, updated_at, deleted_at";

/// User store backed by the `users` table
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.is_unique_violation() {
            return StoreError::not_unique(db_err.constraint().map(str::to_owned));
        }
    }
    StoreError::CreationFailed(err)
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn get_user_identifier_by_id(&self, id: UserId) -> StoreResult<UserIdentifier> {
        debug!("Finding user identifier by ID: {}", id);

        sqlx::query_as::<_, UserIdentifier>(
            "SELECT id, username FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Database)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_user_personal_by_id(&self, id: UserId) -> StoreResult<UserPersonal> {
        debug!("Finding personal user data by ID: {}", id);

        sqlx::query_as::<_, UserPersonal>(
            "SELECT id, username, email FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Database)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<User> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1 AND deleted_at IS NULL"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Database)?
        .ok_or(StoreError::NotFound)
    }

    async fn get_user_by_provider_id(
        &self,
        provider: &str,
        provider_id: &str,
    ) -> StoreResult<User> {
        debug!("Finding user by {} id: {}", provider, provider_id);

        sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE oauth_provider = $1 AND provider_id = $2 AND deleted_at IS NULL"
        ))
        .bind(provider)
        .bind(provider_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::Database)?
        .ok_or(StoreError::NotFound)
    }

    async fn create_user(&self, new_user: &NewUser) -> StoreResult<User> {
        info!("Creating new user: {}", new_user.username());

        let provider = new_user.provider();
        sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (username, email, password_hash, oauth_provider, provider_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(new_user.username())
        .bind(new_user.email())
        .bind(new_user.password_hash())
        .bind(provider.map(|link| link.provider.as_str()))
        .bind(provider.map(|link| link.provider_id.as_str()))
        .fetch_one(&self.pool)
        .await
        .map_err(insert_error)
    }

    async fn delete_user(&self, id: UserId) -> StoreResult<()> {
        info!("Soft deleting user: {}", id);

        let result = sqlx::query(
            r#"
            UPDATE users
            SET deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(StoreError::Database)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }
}
