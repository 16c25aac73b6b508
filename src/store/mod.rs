//! Data-access contracts consumed by the board engine.
//!
//! The relational store, its transactions and the shared cache live outside
//! this crate in production; the engine only ever talks to these traits.
//! `MemoryStore` and `MemoryCache` back them in-process.

mod cache;
mod memory;
pub mod snapshot;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::time::Duration;

use crate::error::{CacheError, StoreResult};
use crate::types::*;

pub use cache::{MemoryCache, NullCache};
pub use memory::MemoryStore;

/// Read access to categories and questions, plus the shuffle-key bulk write
#[async_trait]
pub trait QuestionPool: Send + Sync {
    /// All categories in natural order
    async fn categories(&self) -> StoreResult<Vec<Category>>;

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>>;

    async fn questions_in_category(&self, category: CategoryId) -> StoreResult<Vec<Question>>;

    /// Questions for the given ids; ids that do not resolve are simply absent.
    /// No ordering guarantee.
    async fn questions_by_ids(&self, ids: &[QuestionId]) -> StoreResult<Vec<Question>>;

    /// Persist new shuffle keys in one all-or-nothing write.
    /// If any id is unknown nothing is written.
    async fn update_shuffle_keys(&self, updates: &[(QuestionId, f64)]) -> StoreResult<()>;
}

/// Games and their append-only completion records
#[async_trait]
pub trait GameLedger: Send + Sync {
    async fn create_game(&self, game: NewGame) -> StoreResult<Game>;

    async fn game(&self, id: GameId) -> StoreResult<Option<Game>>;

    /// A player's games, newest first
    async fn games_for_player(&self, player: &PlayerId) -> StoreResult<Vec<Game>>;

    async fn played_in_game(&self, game: GameId) -> StoreResult<Vec<QuestionId>>;

    /// Questions completed by `player`, optionally only in games created
    /// strictly before `created_before`, optionally skipping one game
    async fn played_by_player(
        &self,
        player: &PlayerId,
        created_before: Option<DateTime<Utc>>,
        excluding: Option<GameId>,
    ) -> StoreResult<Vec<QuestionId>>;

    /// Insert completion rows, skipping pairs that already exist.
    /// Returns how many rows were newly inserted.
    async fn record_played(&self, game: GameId, questions: &[QuestionId]) -> StoreResult<usize>;
}

/// Generic key/value cache holding small ordered id lists
#[async_trait]
pub trait CacheStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<QuestionId>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<QuestionId>, ttl: Duration) -> Result<(), CacheError>;
}
