//! Read access to games, runners and runs

use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Game, Run, Runner};

pub mod memory;
pub mod postgres;

pub use memory::MemoryLeaderboardStore;
pub use postgres::PgLeaderboardStore;

#[derive(Error, Debug)]
pub enum LeaderboardError {
    #[error("a game titled {0:?} already exists")]
    DuplicateTitle(String),

    #[error("leaderboard query failed: {0}")]
    Database(#[from] sqlx::Error),
}

pub type LeaderboardResult<T> = Result<T, LeaderboardError>;

/// Source of leaderboard data
///
/// Listings are ordered by id. Deleted runners are invisible, and so are
/// their runs, so every listed run resolves to its runner.
#[async_trait]
pub trait LeaderboardStore: Send + Sync {
    async fn games(&self) -> LeaderboardResult<Vec<Game>>;

    async fn runners(&self) -> LeaderboardResult<Vec<Runner>>;

    async fn runs(&self) -> LeaderboardResult<Vec<Run>>;

    async fn game(&self, id: i64) -> LeaderboardResult<Option<Game>>;

    async fn runner(&self, id: i64) -> LeaderboardResult<Option<Runner>>;

    async fn runs_for_game(&self, game_id: i64) -> LeaderboardResult<Vec<Run>>;

    async fn runs_for_runner(&self, runner_id: i64) -> LeaderboardResult<Vec<Run>>;

    async fn add_game(&self, title: &str) -> LeaderboardResult<Game>;
}
