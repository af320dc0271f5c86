//! Application state shared across handlers

use std::sync::Arc;

use axum::{extract::FromRef, http::HeaderValue};
use axum_extra::extract::cookie::Key;
use common::metrics::HttpMetrics;

use crate::{
    jwt::JwtService,
    oauth::{IdentityResolver, ProviderRegistry},
    password::PasswordHasher,
    repositories::UserStore,
};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub user_store: Arc<dyn UserStore>,
    pub resolver: IdentityResolver,
    pub password_hasher: PasswordHasher,
    pub jwt_service: JwtService,
    pub providers: ProviderRegistry,
    pub cookie_key: Key,
    pub metrics: HttpMetrics,
    /// Empty mirrors the request origin
    pub allowed_origins: Vec<HeaderValue>,
}

impl AppState {
    pub fn new(
        user_store: Arc<dyn UserStore>,
        password_hasher: PasswordHasher,
        jwt_service: JwtService,
        providers: ProviderRegistry,
        cookie_key: Key,
        metrics: HttpMetrics,
    ) -> Self {
        Self {
            resolver: IdentityResolver::new(user_store.clone()),
            user_store,
            password_hasher,
            jwt_service,
            providers,
            cookie_key,
            metrics,
            allowed_origins: Vec::new(),
        }
    }

    pub fn with_allowed_origins(mut self, origins: Vec<HeaderValue>) -> Self {
        self.allowed_origins = origins;
        self
    }
}

impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.cookie_key.clone()
    }
}

impl FromRef<AppState> for HttpMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}
