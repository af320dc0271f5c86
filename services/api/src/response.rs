//! Success envelopes and response payloads

use axum::Json;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;

use crate::jwt::IssuedToken;

/// `{"data": ...}` body
#[derive(Debug, Serialize)]
pub struct DataBody<T> {
    pub data: T,
}

/// Wrap a payload in the success envelope
pub fn data<T: Serialize>(data: T) -> Json<DataBody<T>> {
    Json(DataBody { data })
}

#[derive(Debug, Serialize)]
pub struct UserPayload<T> {
    pub user: T,
}

#[derive(Debug, Serialize)]
pub struct MessagePayload {
    pub message: &'static str,
}

#[derive(Debug, Serialize)]
pub struct TokenPayload {
    pub token: String,
    /// RFC 3339
    pub expiry: String,
}

impl From<IssuedToken> for TokenPayload {
    fn from(issued: IssuedToken) -> Self {
        Self {
            token: issued.token,
            expiry: rfc3339(issued.expires_at),
        }
    }
}

/// Result of a completed OAuth login
#[derive(Debug, Serialize)]
pub struct OAuthLoginPayload<T> {
    pub user: T,
    pub token: String,
    pub expiry: String,
}

pub fn rfc3339(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}
