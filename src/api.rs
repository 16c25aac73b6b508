//! HTTP API endpoints.
//!
//! Player routes expect the upstream auth layer to set `X-Player-Id`.
//! Admin routes sit behind HTTP Basic Auth when it is configured.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::auth::{admin_auth_middleware, AdminAuthConfig, Player};
use crate::board::{PlayerStats, RecentGame, ReshuffleStats, DEFAULT_PREFETCH};
use crate::error::{BoardError, BoardResult};
use crate::state::AppState;
use crate::store::snapshot::StoreSnapshot;
use crate::types::*;

#[derive(Debug, Deserialize)]
pub struct CreateGameRequest {
    pub mode: GameMode,
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub teams: Vec<Team>,
}

#[derive(Debug, Deserialize)]
pub struct FinishRoundRequest {
    /// Validated by hand so malformed entries get a precise message
    #[serde(default)]
    pub played_question_ids: Option<Value>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FinishRoundResponse {
    pub status: String,
    pub saved: usize,
}

#[derive(Debug, Deserialize)]
pub struct PrefetchQuery {
    pub count: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReshuffleRequest {
    pub category: Option<CategoryId>,
    #[serde(default)]
    pub all: bool,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ReshuffleResponse {
    Category { category: CategoryId, shuffled: usize },
    All(ReshuffleStats),
}

/// Build the application router
pub fn router(state: Arc<AppState>, auth_config: Arc<AdminAuthConfig>) -> Router {
    let admin_routes = Router::new()
        .route("/api/admin/reshuffle", post(reshuffle))
        .route("/api/admin/state/export", get(export_state))
        .route("/api/admin/state/import", post(import_state))
        .layer(middleware::from_fn_with_state(
            auth_config,
            admin_auth_middleware,
        ));

    Router::new()
        .route("/api/games", post(create_game))
        .route("/api/games/stats", get(game_stats))
        .route("/api/games/recent", get(recent_games))
        .route(
            "/api/games/{id}/available_questions",
            get(available_questions),
        )
        .route("/api/games/{id}/finish_round", post(finish_round))
        .route(
            "/api/games/{id}/prefetch_outside_board",
            get(prefetch_outside_board),
        )
        .merge(admin_routes)
        .with_state(state)
}

/// Accept integers or integer strings; anything else is a client error
fn parse_question_ids(value: Option<Value>) -> BoardResult<Vec<QuestionId>> {
    let items = match value {
        None => return Ok(vec![]),
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(BoardError::BadRequest(
                "played_question_ids must be a list".to_string(),
            ))
        }
    };

    items
        .iter()
        .map(|item| match item {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().parse().ok(),
            _ => None,
        })
        .collect::<Option<Vec<_>>>()
        .ok_or_else(|| {
            BoardError::BadRequest("played_question_ids must contain integers".to_string())
        })
}

/// Create a new game.
///
/// POST /api/games
pub async fn create_game(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
    Json(request): Json<CreateGameRequest>,
) -> BoardResult<(StatusCode, Json<Game>)> {
    let game = state
        .engine
        .create_game(NewGame {
            player,
            mode: request.mode,
            categories: request.categories,
            teams: request.teams,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(game)))
}

/// The game's board minus questions already played in it.
///
/// GET /api/games/{id}/available_questions
pub async fn available_questions(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
    Path(id): Path<GameId>,
) -> BoardResult<Json<Vec<Question>>> {
    let game = state.engine.game_for_player(id, &player).await?;
    let questions = state.engine.get_available_questions(&game).await?;
    tracing::debug!("Available questions count for game {}: {}", id, questions.len());
    Ok(Json(questions))
}

/// Record a batch of played questions at the end of a round.
///
/// POST /api/games/{id}/finish_round
pub async fn finish_round(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
    Path(id): Path<GameId>,
    Json(request): Json<FinishRoundRequest>,
) -> BoardResult<Json<FinishRoundResponse>> {
    let ids = parse_question_ids(request.played_question_ids)?;
    let game = state.engine.game_for_player(id, &player).await?;
    let saved = state.engine.finish_round(&game, &ids).await?;
    Ok(Json(FinishRoundResponse {
        status: "ok".to_string(),
        saved,
    }))
}

/// Spare questions outside the current board.
///
/// GET /api/games/{id}/prefetch_outside_board?count=N
///
/// An unparseable count falls back to the default.
pub async fn prefetch_outside_board(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
    Path(id): Path<GameId>,
    Query(query): Query<PrefetchQuery>,
) -> BoardResult<Json<Vec<Question>>> {
    let count = query
        .count
        .and_then(|c| c.trim().parse::<i64>().ok())
        .map(|c| c.max(0) as usize)
        .unwrap_or(DEFAULT_PREFETCH);
    let game = state.engine.game_for_player(id, &player).await?;
    Ok(Json(state.engine.prefetch_outside_board(&game, count).await?))
}

/// GET /api/games/stats
pub async fn game_stats(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
) -> BoardResult<Json<PlayerStats>> {
    Ok(Json(state.engine.player_stats(&player).await?))
}

/// GET /api/games/recent
pub async fn recent_games(
    State(state): State<Arc<AppState>>,
    Player(player): Player,
) -> BoardResult<Json<Vec<RecentGame>>> {
    Ok(Json(state.engine.recent_games(&player).await?))
}

/// Re-randomize shuffle keys for one category or all of them.
///
/// POST /api/admin/reshuffle
pub async fn reshuffle(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ReshuffleRequest>,
) -> BoardResult<Json<ReshuffleResponse>> {
    let response = match request {
        ReshuffleRequest {
            category: Some(category),
            ..
        } => ReshuffleResponse::Category {
            category,
            shuffled: state.engine.reshuffle(category).await?,
        },
        ReshuffleRequest { all: true, .. } => {
            ReshuffleResponse::All(state.engine.reshuffle_all().await?)
        }
        _ => {
            return Err(BoardError::BadRequest(
                "Specify a category id or all".to_string(),
            ))
        }
    };
    Ok(Json(response))
}

/// GET /api/admin/state/export
pub async fn export_state(State(state): State<Arc<AppState>>) -> Json<StoreSnapshot> {
    Json(state.store.export_snapshot().await)
}

/// Replace all content and play history with a snapshot.
///
/// POST /api/admin/state/import
pub async fn import_state(
    State(state): State<Arc<AppState>>,
    Json(snapshot): Json<StoreSnapshot>,
) -> BoardResult<StatusCode> {
    state.import_snapshot(snapshot).await.map_err(|e| {
        tracing::error!("State import failed: {}", e);
        BoardError::BadRequest(format!("Import failed: {}", e))
    })?;
    Ok(StatusCode::NO_CONTENT)
}
