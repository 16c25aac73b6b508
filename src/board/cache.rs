use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use super::BoardEngine;
use crate::error::BoardResult;
use crate::types::*;

/// Cache key for a game's board given its current completions.
///
/// Derived from the full sorted completion set, not just its size, so two
/// different completion sets of equal size never share an entry. Bump the
/// version prefix when the cached value format changes.
pub fn board_fingerprint(game: GameId, played: &HashSet<QuestionId>) -> String {
    let mut ids: Vec<QuestionId> = played.iter().copied().collect();
    ids.sort_unstable();

    let mut hasher = Sha256::new();
    for id in &ids {
        hasher.update(id.to_be_bytes());
    }
    let digest = hex::encode(hasher.finalize());

    format!("v1:game_{}_board_{}_{}", game, ids.len(), &digest[..16])
}

impl BoardEngine {
    /// The game's board minus completed questions, served from the cache
    /// when possible.
    ///
    /// The cache only ever holds question ids. Records are always re-read
    /// from the pool, so edits show up immediately and deleted questions
    /// silently drop out. A failing cache is treated as a miss.
    pub async fn get_available_questions(&self, game: &Game) -> BoardResult<Vec<Question>> {
        let played = self.recorded_in_game(game.id).await?;
        let key = board_fingerprint(game.id, &played);

        match self.cache.get(&key).await {
            Ok(Some(ids)) => {
                tracing::debug!("Game {}: using cached question ids (cache hit)", game.id);
                return self.hydrate(&ids).await;
            }
            Ok(None) => {
                tracing::debug!("Game {}: cache miss, generating questions", game.id);
            }
            Err(e) => {
                tracing::warn!("Game {}: cache read failed, computing uncached: {}", game.id, e);
            }
        }

        let questions = self.select_board_with(game, &played).await?;

        let ids: Vec<QuestionId> = questions.iter().map(|q| q.id).collect();
        let count = ids.len();
        match self.cache.set(&key, ids, self.config.cache_ttl).await {
            Ok(()) => tracing::debug!("Game {}: cached {} question ids", game.id, count),
            Err(e) => tracing::warn!("Game {}: cache write failed: {}", game.id, e),
        }

        Ok(questions)
    }

    /// Fetch live records for `ids`, keeping their order and skipping any
    /// that no longer exist
    async fn hydrate(&self, ids: &[QuestionId]) -> BoardResult<Vec<Question>> {
        let mut by_id: HashMap<QuestionId, Question> = self
            .questions
            .questions_by_ids(ids)
            .await?
            .into_iter()
            .map(|q| (q.id, q))
            .collect();

        Ok(ids.iter().filter_map(|id| by_id.remove(id)).collect())
    }
}
