//! GraphQL schema: leaderboard queries and mutations

use std::sync::Arc;

use async_graphql::{
    Context, EmptySubscription, Object, Result, Schema, connection::Connection,
};
use regex::{Regex, RegexBuilder};
use tracing::error;

use crate::{
    models::{Game, Run, Runner},
    store::{LeaderboardError, LeaderboardStore},
};

pub mod pagination;

use pagination::paginate;

/// Store shared with every resolver through the schema data
pub type SharedStore = Arc<dyn LeaderboardStore>;

pub type LeaderboardSchema = Schema<QueryRoot, MutationRoot, EmptySubscription>;

const MAX_REGEX_SIZE: usize = 1 << 20;

pub fn build_schema(store: SharedStore) -> LeaderboardSchema {
    Schema::build(QueryRoot, MutationRoot, EmptySubscription)
        .data(store)
        .finish()
}

fn store<'a>(ctx: &Context<'a>) -> Result<&'a SharedStore> {
    ctx.data::<SharedStore>()
}

/// Client visible error; database details are only logged
fn store_error(err: LeaderboardError) -> async_graphql::Error {
    match err {
        LeaderboardError::DuplicateTitle(_) => err.into(),
        LeaderboardError::Database(_) => {
            error!("Leaderboard store failure: {}", err);
            "internal error".into()
        }
    }
}

fn compile(pattern: Option<&str>) -> Result<Option<Regex>> {
    pattern
        .map(|pattern| {
            RegexBuilder::new(pattern)
                .size_limit(MAX_REGEX_SIZE)
                .build()
                .map_err(|e| format!("invalid regex: {e}").into())
        })
        .transpose()
}

fn is_kept(regex: &Option<Regex>, value: &str) -> bool {
    regex.as_ref().is_none_or(|regex| regex.is_match(value))
}

#[Object]
impl Game {
    async fn title(&self) -> &str {
        &self.title
    }

    async fn runs(&self, ctx: &Context<'_>) -> Result<Vec<Run>> {
        store(ctx)?
            .runs_for_game(self.id)
            .await
            .map_err(store_error)
    }
}

#[Object(name = "User")]
impl Runner {
    async fn name(&self) -> &str {
        &self.name
    }

    async fn runs(&self, ctx: &Context<'_>) -> Result<Vec<Run>> {
        store(ctx)?
            .runs_for_runner(self.id)
            .await
            .map_err(store_error)
    }
}

#[Object]
impl Run {
    async fn duration_ms(&self) -> i64 {
        self.duration_ms
    }

    async fn runner(&self, ctx: &Context<'_>) -> Result<Runner> {
        store(ctx)?
            .runner(self.runner_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| format!("run {} has no runner", self.id).into())
    }

    async fn game(&self, ctx: &Context<'_>) -> Result<Game> {
        store(ctx)?
            .game(self.game_id)
            .await
            .map_err(store_error)?
            .ok_or_else(|| format!("run {} has no game", self.id).into())
    }
}

pub struct QueryRoot;

#[Object]
impl QueryRoot {
    /// Games whose title matches `titleRegex`
    async fn games(
        &self,
        ctx: &Context<'_>,
        title_regex: Option<String>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<Connection<String, Game>> {
        let regex = compile(title_regex.as_deref())?;
        let games = store(ctx)?.games().await.map_err(store_error)?;
        let games = games
            .into_iter()
            .filter(|game| is_kept(&regex, &game.title))
            .collect();
        paginate(games, first, after)
    }

    /// Users whose name matches `nameRegex`
    async fn users(
        &self,
        ctx: &Context<'_>,
        name_regex: Option<String>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<Connection<String, Runner>> {
        let regex = compile(name_regex.as_deref())?;
        let runners = store(ctx)?.runners().await.map_err(store_error)?;
        let runners = runners
            .into_iter()
            .filter(|runner| is_kept(&regex, &runner.name))
            .collect();
        paginate(runners, first, after)
    }

    /// Runs strictly shorter than `maxDurationMs`
    async fn runs(
        &self,
        ctx: &Context<'_>,
        max_duration_ms: Option<i64>,
        first: Option<i32>,
        after: Option<String>,
    ) -> Result<Connection<String, Run>> {
        let runs = store(ctx)?.runs().await.map_err(store_error)?;
        let runs = runs
            .into_iter()
            .filter(|run| max_duration_ms.is_none_or(|max| run.duration_ms < max))
            .collect();
        paginate(runs, first, after)
    }
}

pub struct MutationRoot;

#[Object]
impl MutationRoot {
    /// Returns its argument
    async fn echo(&self, message: String) -> String {
        message
    }

    async fn add_game(&self, ctx: &Context<'_>, title: String) -> Result<Game> {
        let title = title.trim();
        if title.is_empty() {
            return Err("title must not be empty".into());
        }
        store(ctx)?.add_game(title).await.map_err(store_error)
    }
}
