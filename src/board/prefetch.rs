use rand::seq::SliceRandom;
use std::collections::HashSet;

use super::BoardEngine;
use crate::error::BoardResult;
use crate::types::*;

pub const DEFAULT_PREFETCH: usize = 4;
pub const MAX_PREFETCH: usize = 10;

impl BoardEngine {
    /// Random spare questions from the game's categories that are neither on
    /// the board nor already played in this game (used for rerolls).
    ///
    /// `count` is clamped to 1..=MAX_PREFETCH. This randomness never feeds
    /// back into board selection.
    pub async fn prefetch_outside_board(&self, game: &Game, count: usize) -> BoardResult<Vec<Question>> {
        let count = count.clamp(1, MAX_PREFETCH);

        let mut taken: HashSet<QuestionId> = self
            .get_available_questions(game)
            .await?
            .iter()
            .map(|q| q.id)
            .collect();
        taken.extend(self.recorded_in_game(game.id).await?);

        let mut pool = Vec::new();
        for category in &game.categories {
            pool.extend(
                self.questions
                    .questions_in_category(*category)
                    .await?
                    .into_iter()
                    .filter(|q| !taken.contains(&q.id)),
            );
        }

        pool.shuffle(&mut rand::rng());
        pool.truncate(count);

        tracing::debug!("Game {}: prefetched {} questions outside the board", game.id, pool.len());
        Ok(pool)
    }
}
