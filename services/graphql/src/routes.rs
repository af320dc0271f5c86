//! GraphQL service routes

use axum::{
    Json, Router,
    extract::{FromRef, State},
    http::HeaderValue,
    middleware,
    response::{Html, IntoResponse},
    routing::{get, post},
};
use async_graphql::http::GraphiQLSource;
use common::{
    cors::cors_layer,
    metrics::{HttpMetrics, metrics_handler, track_metrics},
};
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::schema::LeaderboardSchema;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub schema: LeaderboardSchema,
    pub metrics: HttpMetrics,
    /// Empty mirrors the request origin
    pub allowed_origins: Vec<HeaderValue>,
}

impl FromRef<AppState> for LeaderboardSchema {
    fn from_ref(state: &AppState) -> Self {
        state.schema.clone()
    }
}

impl FromRef<AppState> for HttpMetrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Create the router for the GraphQL service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/graphql", post(graphql_handler))
        .route("/graphiql", get(graphiql))
        .route("/ping", get(ping))
        .route("/metrics", get(metrics_handler))
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.allowed_origins))
        .with_state(state)
}

/// `POST /graphql`
pub async fn graphql_handler(
    State(schema): State<LeaderboardSchema>,
    Json(request): Json<async_graphql::Request>,
) -> Json<async_graphql::Response> {
    Json(schema.execute(request).await)
}

/// `GET /graphiql`
pub async fn graphiql() -> impl IntoResponse {
    Html(GraphiQLSource::build().endpoint("/graphql").finish())
}

/// `GET /ping`
pub async fn ping() -> impl IntoResponse {
    Json(json!({"data": {"message": "pong"}}))
}
