//! In-process store, seeded with a small sample leaderboard

use std::sync::RwLock;

use async_trait::async_trait;

use super::{LeaderboardError, LeaderboardResult, LeaderboardStore};
use crate::models::{Game, Run, Runner};

#[derive(Default)]
struct Data {
    games: Vec<Game>,
    runners: Vec<Runner>,
    runs: Vec<Run>,
}

#[derive(Default)]
pub struct MemoryLeaderboardStore {
    data: RwLock<Data>,
}

impl MemoryLeaderboardStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Two games, three runners and three runs, all on the first game
    pub fn seeded() -> Self {
        let game = |id, title: &str| Game {
            id,
            title: title.to_string(),
        };
        let runner = |id, name: &str| Runner {
            id,
            name: name.to_string(),
        };
        let run = |id, runner_id, duration_ms| Run {
            id,
            runner_id,
            game_id: 1,
            duration_ms,
        };

        Self {
            data: RwLock::new(Data {
                games: vec![game(1, "Great game"), game(2, "Unloved game")],
                runners: vec![
                    runner(1, "Fast runner"),
                    runner(2, "Slow runner"),
                    runner(3, "Non-runner"),
                ],
                runs: vec![run(1, 1, 15), run(2, 1, 17), run(3, 2, 3 * 60 * 60 * 1000)],
            }),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Data) -> T) -> T {
        let data = self.data.read().unwrap_or_else(|poisoned| poisoned.into_inner());
        f(&data)
    }
}

#[async_trait]
impl LeaderboardStore for MemoryLeaderboardStore {
    async fn games(&self) -> LeaderboardResult<Vec<Game>> {
        Ok(self.read(|data| data.games.clone()))
    }

    async fn runners(&self) -> LeaderboardResult<Vec<Runner>> {
        Ok(self.read(|data| data.runners.clone()))
    }

    async fn runs(&self) -> LeaderboardResult<Vec<Run>> {
        Ok(self.read(|data| data.runs.clone()))
    }

    async fn game(&self, id: i64) -> LeaderboardResult<Option<Game>> {
        Ok(self.read(|data| data.games.iter().find(|game| game.id == id).cloned()))
    }

    async fn runner(&self, id: i64) -> LeaderboardResult<Option<Runner>> {
        Ok(self.read(|data| data.runners.iter().find(|runner| runner.id == id).cloned()))
    }

    async fn runs_for_game(&self, game_id: i64) -> LeaderboardResult<Vec<Run>> {
        Ok(self.read(|data| {
            data.runs
                .iter()
                .filter(|run| run.game_id == game_id)
                .cloned()
                .collect()
        }))
    }

    async fn runs_for_runner(&self, runner_id: i64) -> LeaderboardResult<Vec<Run>> {
        Ok(self.read(|data| {
            data.runs
                .iter()
                .filter(|run| run.runner_id == runner_id)
                .cloned()
                .collect()
        }))
    }

    async fn add_game(&self, title: &str) -> LeaderboardResult<Game> {
        let mut data = self.data.write().unwrap_or_else(|poisoned| poisoned.into_inner());
        if data.games.iter().any(|game| game.title == title) {
            return Err(LeaderboardError::DuplicateTitle(title.to_string()));
        }

        let game = Game {
            id: data.games.iter().map(|game| game.id).max().unwrap_or(0) + 1,
            title: title.to_string(),
        };
        data.games.push(game.clone());
        Ok(game)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_seeded_data() {
        let store = MemoryLeaderboardStore::seeded();

        assert_eq!(store.games().await.unwrap().len(), 2);
        assert_eq!(store.runners().await.unwrap().len(), 3);
        assert_eq!(store.runs_for_runner(1).await.unwrap().len(), 2);
        assert_eq!(store.runs_for_runner(3).await.unwrap().len(), 0);
        assert_eq!(store.runs_for_game(2).await.unwrap().len(), 0);
    }

    #[tokio::test]
    async fn test_add_game_rejects_duplicate_titles() {
        let store = MemoryLeaderboardStore::seeded();

        let game = store.add_game("New game").await.unwrap();
        assert_eq!(game.id, 3);
        assert_eq!(store.game(3).await.unwrap(), Some(game));

        assert!(matches!(
            store.add_game("Great game").await,
            Err(LeaderboardError::DuplicateTitle(_))
        ));
    }
}
