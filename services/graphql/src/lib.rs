//! GraphQL server of the speedrun leaderboard
//!
//! Read-mostly access to games, users and their runs with Relay style
//! pagination, served from PostgreSQL or from seeded in-process data.

pub mod models;
pub mod routes;
pub mod schema;
pub mod settings;
pub mod store;

pub use routes::{AppState, create_router};
