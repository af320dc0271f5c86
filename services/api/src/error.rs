//! Custom error types for the API service

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use validator::ValidationErrors;

use crate::repositories::StoreError;

/// One entry of the `errors` array of an error response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub constraint: Option<String>,
}

impl ErrorDetail {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            field: None,
            constraint: None,
        }
    }

    pub fn for_field(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: Some(field.into()),
            ..Self::new(message)
        }
    }
}

/// `{"errors": [...]}` body
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorDetail>,
}

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Malformed or invalid input
    #[error("validation failed")]
    Validation(Vec<ErrorDetail>),

    /// Missing, invalid or rejected credentials
    #[error("{0}")]
    Unauthenticated(&'static str),

    #[error("{0}")]
    NotFound(String),

    /// A unique index rejected the data
    #[error("attempted to create a user with duplicate data")]
    Conflict {
        constraint: Option<String>,
        field: Option<String>,
    },

    /// Details are logged, never returned
    #[error("internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict { .. } => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn details(self) -> Vec<ErrorDetail> {
        let message = self.to_string();
        match self {
            ApiError::Validation(details) => details,
            ApiError::Conflict { constraint, field } => vec![ErrorDetail {
                message,
                field,
                constraint,
            }],
            _ => vec![ErrorDetail::new(message)],
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorBody {
            errors: self.details(),
        };
        (status, Json(body)).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => ApiError::NotFound(err.to_string()),
            StoreError::NotUnique { constraint, field } => ApiError::Conflict {
                constraint,
                field: field.map(|field| field.as_str().to_string()),
            },
            StoreError::CreationFailed(_) | StoreError::Database(_) => {
                error!("User store failure: {}", err);
                ApiError::Internal
            }
        }
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut details: Vec<ErrorDetail> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errors)| {
                errors.iter().map(move |error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|message| message.to_string())
                        .unwrap_or_else(|| format!("{field} is invalid"));
                    ErrorDetail::for_field(field.to_string(), message)
                })
            })
            .collect();
        details.sort_by(|a, b| a.field.cmp(&b.field));
        ApiError::Validation(details)
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{Value, json};

    async fn body_of(err: ApiError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_body_carries_constraint() {
        let err = ApiError::from(StoreError::not_unique(Some("users_email_key".to_string())));
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(
            body,
            json!({"errors": [{
                "message": "attempted to create a user with duplicate data",
                "field": "email",
                "constraint": "users_email_key"
            }]})
        );
    }

    #[tokio::test]
    async fn test_internal_errors_hide_details() {
        let err = ApiError::from(StoreError::Database(sqlx::Error::PoolTimedOut));
        let (status, body) = body_of(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({"errors": [{"message": "internal server error"}]}));
    }

    #[tokio::test]
    async fn test_not_found_status() {
        let (status, body) = body_of(StoreError::NotFound.into()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["errors"][0]["message"], "the requested user was not found");
    }
}
