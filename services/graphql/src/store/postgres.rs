//! PostgreSQL store over the `users`, `games` and `runs` tables

use async_trait::async_trait;
use sqlx::PgPool;
use tracing::info;

use super::{LeaderboardError, LeaderboardResult, LeaderboardStore};
use crate::models::{Game, Run, Runner};

// Runs of soft-deleted users are hidden, matching `runner()`.
const RUN_SELECT: &str = "SELECT r.id, r.user_id AS runner_id, r.game_id, r.duration_ms \
    FROM runs r JOIN users u ON u.id = r.user_id AND u.deleted_at IS NULL";

#[derive(Clone)]
pub struct PgLeaderboardStore {
    pool: PgPool,
}

impl PgLeaderboardStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl LeaderboardStore for PgLeaderboardStore {
    async fn games(&self) -> LeaderboardResult<Vec<Game>> {
        let games = sqlx::query_as::<_, Game>("SELECT id, title FROM games ORDER BY id")
            .fetch_all(&self.pool)
            .await?;
        Ok(games)
    }

    async fn runners(&self) -> LeaderboardResult<Vec<Runner>> {
        let runners = sqlx::query_as::<_, Runner>(
            "SELECT id, username AS name FROM users WHERE deleted_at IS NULL ORDER BY id",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(runners)
    }

    async fn runs(&self) -> LeaderboardResult<Vec<Run>> {
        let runs = sqlx::query_as::<_, Run>(&format!("{RUN_SELECT} ORDER BY r.id"))
            .fetch_all(&self.pool)
            .await?;
        Ok(runs)
    }

    async fn game(&self, id: i64) -> LeaderboardResult<Option<Game>> {
        let game = sqlx::query_as::<_, Game>("SELECT id, title FROM games WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(game)
    }

    async fn runner(&self, id: i64) -> LeaderboardResult<Option<Runner>> {
        let runner = sqlx::query_as::<_, Runner>(
            "SELECT id, username AS name FROM users WHERE id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(runner)
    }

    async fn runs_for_game(&self, game_id: i64) -> LeaderboardResult<Vec<Run>> {
        let runs = sqlx::query_as::<_, Run>(&format!(
            "{RUN_SELECT} WHERE r.game_id = $1 ORDER BY r.id"
        ))
        .bind(game_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(runs)
    }

    async fn runs_for_runner(&self, runner_id: i64) -> LeaderboardResult<Vec<Run>> {
        let runs = sqlx::query_as::<_, Run>(&format!(
            "{RUN_SELECT} WHERE r.user_id = $1 ORDER BY r.id"
        ))
        .bind(runner_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(runs)
    }

    async fn add_game(&self, title: &str) -> LeaderboardResult<Game> {
        info!("Adding game: {}", title);

        sqlx::query_as::<_, Game>("INSERT INTO games (title) VALUES ($1) RETURNING id, title")
            .bind(title)
            .fetch_one(&self.pool)
            .await
            .map_err(|err| {
                if let sqlx::Error::Database(db_err) = &err {
                    if db_err.is_unique_violation() {
                        return LeaderboardError::DuplicateTitle(title.to_string());
                    }
                }
                LeaderboardError::Database(err)
            })
    }
}
