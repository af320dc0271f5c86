//! Registration and user lookup handlers

use axum::{
    Extension,
    extract::{Path, State},
    http::{StatusCode, header::LOCATION},
    response::IntoResponse,
};
use tracing::{error, info};

use crate::{
    AppState,
    error::{ApiError, ApiResult, ErrorDetail},
    middleware::AuthUser,
    models::{NewUser, UserId, UserRegister},
    response::{UserPayload, data},
    validation::ValidatedJson,
};

/// `POST /api/v1/register`
pub async fn register(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UserRegister>,
) -> ApiResult<impl IntoResponse> {
    let password_hash = state
        .password_hasher
        .hash_blocking(payload.password)
        .await
        .map_err(|e| {
            error!("Failed to hash password: {}", e);
            ApiError::Internal
        })?;

    let new_user = NewUser::with_password(payload.username, payload.email, password_hash);
    let user = state.user_store.create_user(&new_user).await?;
    info!("Registered user {}", user.id);

    Ok((
        StatusCode::CREATED,
        [(LOCATION, format!("/api/v1/users/{}", user.id))],
        data(UserPayload {
            user: user.identifier(),
        }),
    ))
}

/// `GET /api/v1/users/:id`
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<impl IntoResponse> {
    let id = parse_user_id(&id)?;
    let user = state.user_store.get_user_identifier_by_id(id).await?;

    Ok(data(UserPayload { user }))
}

/// `GET /api/v1/me`
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<impl IntoResponse> {
    let user = state.user_store.get_user_personal_by_id(auth.id).await?;

    Ok(data(UserPayload { user }))
}

/// `DELETE /api/v1/me`
pub async fn delete_me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthUser>,
) -> ApiResult<StatusCode> {
    state.user_store.delete_user(auth.id).await?;
    info!("Deleted user {}", auth.id);

    Ok(StatusCode::NO_CONTENT)
}

/// Non-numeric ids are invalid; numbers beyond the id range cannot exist
fn parse_user_id(raw: &str) -> ApiResult<UserId> {
    let id: u64 = raw.parse().map_err(|_| {
        ApiError::Validation(vec![ErrorDetail::for_field(
            "id",
            "user id must be a non-negative integer",
        )])
    })?;

    UserId::try_from(id).map_err(|_| ApiError::NotFound("the requested user was not found".to_string()))
}
