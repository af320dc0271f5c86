//! REST backend of the speedrun leaderboard
//!
//! Account registration, password and OAuth login, and JWT-protected user
//! endpoints under `/api/v1`. Persistence goes through the [`UserStore`]
//! trait so handlers can be exercised without a database.
//!
//! [`UserStore`]: repositories::UserStore

pub mod error;
pub mod jwt;
pub mod middleware;
pub mod models;
pub mod oauth;
pub mod password;
pub mod repositories;
pub mod response;
pub mod routes;
pub mod settings;
pub mod state;
pub mod validation;

pub use routes::create_router;
pub use state::AppState;
