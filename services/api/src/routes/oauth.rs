//! OAuth handshake handlers

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::Redirect,
};
use axum_extra::extract::{
    SignedCookieJar,
    cookie::{Cookie, SameSite},
};
use serde::Deserialize;
use time::Duration;
use tracing::{error, info, warn};

use crate::{
    AppState,
    error::{ApiError, ApiResult, ErrorDetail},
    models::UserIdentifier,
    oauth::{IdentityProvider, OAuthSession, Resolution, SESSION_COOKIE, SESSION_TTL_SECONDS},
    response::{DataBody, OAuthLoginPayload, data, rfc3339},
};

const COOKIE_PATH: &str = "/api/v1/oauth";

#[derive(Debug, Deserialize)]
pub struct AuthenticateQuery {
    provider: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    provider: Option<String>,
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

fn provider_for(
    state: &AppState,
    name: Option<&str>,
) -> ApiResult<std::sync::Arc<dyn IdentityProvider>> {
    name.and_then(|name| state.providers.get(name)).ok_or_else(|| {
        ApiError::Validation(vec![ErrorDetail::for_field(
            "provider",
            "unsupported oauth provider",
        )])
    })
}

/// `GET /api/v1/oauth/authenticate?provider=<name>`
pub async fn authenticate(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<AuthenticateQuery>,
) -> ApiResult<(SignedCookieJar, Redirect)> {
    let provider = provider_for(&state, query.provider.as_deref())?;
    let request = provider.begin_auth();

    let session = OAuthSession::new(provider.name(), &request);
    let value = serde_json::to_string(&session).map_err(|e| {
        error!("Failed to encode OAuth session: {}", e);
        ApiError::Internal
    })?;
    let jar = jar.add(
        Cookie::build((SESSION_COOKIE, value))
            .path(COOKIE_PATH)
            .http_only(true)
            .same_site(SameSite::Lax)
            .max_age(Duration::seconds(SESSION_TTL_SECONDS)),
    );

    info!("Redirecting to {} for authorization", provider.name());
    Ok((jar, Redirect::to(&request.url)))
}

/// `GET /api/v1/oauth/callback?provider=<name>&code=..&state=..`
///
/// `provider` may be omitted; the one recorded in the session cookie is used.
/// 200 for a returning user, 201 when the account was just created.
pub async fn callback(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Query(query): Query<CallbackQuery>,
) -> ApiResult<(
    StatusCode,
    SignedCookieJar,
    Json<DataBody<OAuthLoginPayload<UserIdentifier>>>,
)> {
    let stored = jar
        .get(SESSION_COOKIE)
        .and_then(|cookie| serde_json::from_str::<OAuthSession>(cookie.value()).ok());
    let provider_name = query
        .provider
        .as_deref()
        .or_else(|| stored.as_ref().map(|session| session.provider.as_str()));
    let provider = provider_for(&state, provider_name)?;

    if let Some(reason) = query.error.as_deref() {
        warn!("{} refused the authorization: {}", provider.name(), reason);
        return Err(ApiError::Unauthenticated("authorization was refused"));
    }

    let session = stored
        .filter(|session| {
            query
                .state
                .as_deref()
                .is_some_and(|csrf_state| session.matches(provider.name(), csrf_state))
        })
        .ok_or(ApiError::Unauthenticated(
            "oauth session is missing or does not match",
        ))?;
    let jar = jar.remove(Cookie::build(SESSION_COOKIE).path(COOKIE_PATH));

    let code = query.code.as_deref().ok_or_else(|| {
        ApiError::Validation(vec![ErrorDetail::for_field(
            "code",
            "authorization code is required",
        )])
    })?;

    let identity = provider
        .complete_auth(code, &session.pkce_verifier)
        .await
        .map_err(|e| {
            error!("OAuth handshake with {} failed: {}", provider.name(), e);
            ApiError::Internal
        })?;

    let resolution = state.resolver.resolve(&identity).await?;
    let status = match resolution {
        Resolution::Existing(_) => StatusCode::OK,
        Resolution::Created(_) => StatusCode::CREATED,
    };
    let user = resolution.user().clone();

    let issued = state.jwt_service.issue(user.id).map_err(|e| {
        error!("Failed to sign token: {}", e);
        ApiError::Internal
    })?;

    Ok((
        status,
        jar,
        data(OAuthLoginPayload {
            user,
            token: issued.token,
            expiry: rfc3339(issued.expires_at),
        }),
    ))
}
