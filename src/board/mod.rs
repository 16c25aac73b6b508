//! Game board generation engine.
//!
//! A board is never stored. It is derived from the pre-shuffled question
//! order, the player's completion history and the game's own completions,
//! then memoized by question id in the cache store.

mod cache;
mod history;
mod prefetch;
mod selector;
mod shuffle;

use std::sync::Arc;
use std::time::Duration;

use crate::error::{BoardError, BoardResult};
use crate::store::{CacheStore, GameLedger, QuestionPool};
use crate::types::*;

pub use cache::board_fingerprint;
pub use history::{PlayerStats, RecentGame};
pub use prefetch::{DEFAULT_PREFETCH, MAX_PREFETCH};
pub use selector::{select_from_category, PER_CATEGORY, PER_TIER};
pub use shuffle::{draw_shuffle_keys, ReshuffleStats};

/// Configuration for the board engine
#[derive(Debug, Clone)]
pub struct BoardConfig {
    /// How long a computed board stays in the cache
    pub cache_ttl: Duration,
    /// When false the engine is wired to a `NullCache`
    pub cache_enabled: bool,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            cache_ttl: Duration::from_secs(600),
            cache_enabled: true,
        }
    }
}

impl BoardConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let cache_ttl = std::env::var("BOARD_CACHE_TTL_SECS")
            .ok()
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(600));

        let cache_enabled = std::env::var("BOARD_CACHE_ENABLED")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        tracing::info!(
            cache_ttl_secs = cache_ttl.as_secs(),
            cache_enabled,
            "Board config loaded"
        );

        Self {
            cache_ttl,
            cache_enabled,
        }
    }
}

/// Entry point for everything board related
#[derive(Clone)]
pub struct BoardEngine {
    questions: Arc<dyn QuestionPool>,
    ledger: Arc<dyn GameLedger>,
    cache: Arc<dyn CacheStore>,
    config: BoardConfig,
}

impl BoardEngine {
    pub fn new(
        questions: Arc<dyn QuestionPool>,
        ledger: Arc<dyn GameLedger>,
        cache: Arc<dyn CacheStore>,
        config: BoardConfig,
    ) -> Self {
        Self {
            questions,
            ledger,
            cache,
            config,
        }
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Create a game for `player` over the chosen categories
    pub async fn create_game(&self, game: NewGame) -> BoardResult<Game> {
        if game.categories.is_empty() {
            return Err(BoardError::BadRequest(
                "A game needs at least one category".to_string(),
            ));
        }
        Ok(self.ledger.create_game(game).await?)
    }

    pub async fn game(&self, id: GameId) -> BoardResult<Game> {
        self.ledger
            .game(id)
            .await?
            .ok_or(BoardError::GameNotFound(id))
    }

    /// Look up a game and make sure it belongs to `player`.
    /// Someone else's game is reported as missing.
    pub async fn game_for_player(&self, id: GameId, player: &PlayerId) -> BoardResult<Game> {
        let game = self.game(id).await?;
        if &game.player != player {
            return Err(BoardError::GameNotFound(id));
        }
        Ok(game)
    }

    /// The game's categories that still exist, in natural order
    async fn game_categories(&self, game: &Game) -> BoardResult<Vec<Category>> {
        let mut categories = Vec::with_capacity(game.categories.len());
        for id in &game.categories {
            match self.questions.category(*id).await? {
                Some(category) => categories.push(category),
                None => tracing::debug!("Game {}: category {} no longer exists", game.id, id),
            }
        }
        categories.sort_by(Category::natural_cmp);
        Ok(categories)
    }
}
