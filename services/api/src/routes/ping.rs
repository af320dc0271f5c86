//! Liveness endpoints

use axum::response::IntoResponse;

use crate::response::{MessagePayload, data};

/// `GET /ping` and `GET /api/v1/ping`
pub async fn ping() -> impl IntoResponse {
    data(MessagePayload { message: "pong" })
}

/// `GET /api/v1/auth_ping`, behind the auth middleware
pub async fn auth_ping() -> impl IntoResponse {
    data(MessagePayload {
        message: "authenticated pong",
    })
}
