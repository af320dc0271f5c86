//! Leaderboard records as stored

use sqlx::FromRow;

/// A game runs are submitted for
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Game {
    pub id: i64,
    pub title: String,
}

/// A user seen from the leaderboard; exposed to GraphQL as `User`
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Runner {
    pub id: i64,
    pub name: String,
}

/// One timed attempt of a runner at a game
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct Run {
    pub id: i64,
    pub runner_id: i64,
    pub game_id: i64,
    pub duration_ms: i64,
}
