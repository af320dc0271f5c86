//! API service routes

use axum::{
    Router, middleware,
    routing::{get, post},
};
use common::{
    cors::cors_layer,
    metrics::{metrics_handler, track_metrics},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, middleware::auth_middleware};

mod oauth;
mod ping;
mod session;
mod users;


/// Create the router for the API service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(users::me).delete(users::delete_me))
        .route("/refresh_token", get(session::refresh_token))
        .route("/auth_ping", get(ping::auth_ping))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ));

    let api_routes = Router::new()
        .route("/register", post(users::register))
        .route("/login", post(session::login))
        .route("/logout", post(session::logout))
        .route("/users/:id", get(users::get_user))
        .route("/ping", get(ping::ping))
        .route("/oauth/authenticate", get(oauth::authenticate))
        .route("/oauth/callback", get(oauth::callback))
        .merge(protected_routes);

    Router::new()
        .route("/ping", get(ping::ping))
        .route("/metrics", get(metrics_handler))
        .nest("/api/v1", api_routes)
        .layer(middleware::from_fn_with_state(
            state.metrics.clone(),
            track_metrics,
        ))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.allowed_origins))
        .with_state(state)
}
