//! Input validation: username rules and the `ValidatedJson` extractor

use std::{borrow::Cow, sync::OnceLock};

use axum::{
    Json, async_trait,
    extract::{FromRequest, Request},
};
use regex::Regex;
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

use crate::error::{ApiError, ErrorDetail};

const USERNAME_MAX_CHARS: usize = 32;

fn username_error(message: &'static str) -> ValidationError {
    ValidationError::new("username").with_message(Cow::Borrowed(message))
}

/// Validate username
///
/// Usernames are 1 to 32 characters of letters, digits, `_`, `-`, `.` and
/// inner spaces.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.trim().is_empty() {
        return Err(username_error("username is required"));
    }

    if username.chars().count() > USERNAME_MAX_CHARS {
        return Err(username_error("username must be at most 32 characters long"));
    }

    if username.trim() != username {
        return Err(username_error(
            "username cannot start or end with whitespace",
        ));
    }

    static USERNAME_REGEX: OnceLock<Regex> = OnceLock::new();
    let regex = USERNAME_REGEX.get_or_init(|| {
        Regex::new(r"^[\p{L}\p{N}_.\- ]+$").expect("Failed to compile username regex")
    });

    if !regex.is_match(username) {
        return Err(username_error(
            "username can only contain letters, numbers, spaces, '_', '-' and '.'",
        ));
    }

    Ok(())
}

/// JSON body that has been deserialized and then checked with [`Validate`]
///
/// Both malformed JSON and failed validation are rejected with 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                ApiError::Validation(vec![ErrorDetail::new(rejection.body_text())])
            })?;
        value.validate()?;
        Ok(Self(value))
    }
}
