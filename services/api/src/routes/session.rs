//! Password login, logout and token refresh

use axum::{
    Extension, Json,
    extract::{State, rejection::JsonRejection},
};
use axum_extra::extract::{
    CookieJar,
    cookie::{Cookie, SameSite},
};
use time::Duration;
use tracing::{debug, error, info};
use validator::Validate;

use crate::{
    AppState,
    error::{ApiError, ApiResult},
    jwt::{IssuedToken, TokenError},
    middleware::{AuthUser, JWT_COOKIE},
    models::UserLogin,
    repositories::StoreError,
    response::{DataBody, MessagePayload, TokenPayload, data},
};

/// Same answer for unknown emails, wrong passwords and malformed bodies
const FAILED_LOGIN: &str = "incorrect email or password";

/// `POST /api/v1/login`
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<UserLogin>, JsonRejection>,
) -> ApiResult<(CookieJar, Json<DataBody<TokenPayload>>)> {
    let Ok(Json(credentials)) = payload else {
        return Err(ApiError::Unauthenticated(FAILED_LOGIN));
    };
    if credentials.validate().is_err() {
        return Err(ApiError::Unauthenticated(FAILED_LOGIN));
    }

    let user = match state.user_store.get_user_by_email(&credentials.email).await {
        Ok(user) => Some(user),
        Err(StoreError::NotFound) => None,
        Err(e) => return Err(e.into()),
    };
    let digest = user.as_ref().and_then(|user| user.password_hash.clone());

    let verified = state
        .password_hasher
        .verify_blocking(digest, credentials.password)
        .await
        .map_err(|e| {
            error!("Password verification failed to run: {}", e);
            ApiError::Internal
        })?;

    let user = match user {
        Some(user) if verified => user,
        _ => {
            debug!("Rejected login attempt");
            return Err(ApiError::Unauthenticated(FAILED_LOGIN));
        }
    };

    let issued = state.jwt_service.issue(user.id).map_err(token_failure)?;
    info!("User {} logged in", user.id);

    Ok(token_response(&state, jar, issued))
}

/// `GET /api/v1/refresh_token`
pub async fn refresh_token(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
    jar: CookieJar,
) -> ApiResult<(CookieJar, Json<DataBody<TokenPayload>>)> {
    let issued = state.jwt_service.refresh(&auth.claims).map_err(|e| match e {
        TokenError::RefreshExpired => ApiError::Unauthenticated("token is too old to be refreshed"),
        other => token_failure(other),
    })?;

    Ok(token_response(&state, jar, issued))
}

/// `POST /api/v1/logout`
///
/// Tokens are not tracked server side; this only drops the `jwt` cookie.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<DataBody<MessagePayload>>) {
    let jar = jar.remove(Cookie::build(JWT_COOKIE).path("/"));

    (
        jar,
        data(MessagePayload {
            message: "successfully logged out",
        }),
    )
}

fn token_response(
    state: &AppState,
    jar: CookieJar,
    issued: IssuedToken,
) -> (CookieJar, Json<DataBody<TokenPayload>>) {
    let jar = if state.jwt_service.send_cookie() {
        let max_age = i64::try_from(state.jwt_service.timeout()).unwrap_or(i64::MAX);
        jar.add(
            Cookie::build((JWT_COOKIE, issued.token.clone()))
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::seconds(max_age)),
        )
    } else {
        jar
    };

    (jar, data(TokenPayload::from(issued)))
}

fn token_failure(err: TokenError) -> ApiError {
    error!("Failed to sign token: {}", err);
    ApiError::Internal
}
