use std::collections::HashSet;

use super::BoardEngine;
use crate::error::BoardResult;
use crate::types::*;

/// Questions taken from each difficulty tier before backfilling
pub const PER_TIER: usize = 2;

/// Hard cap on questions per category
pub const PER_CATEGORY: usize = 6;

/// Pick one category's slice of the board.
///
/// Eligible questions are bucketed by tier and ordered by shuffle key. Up to
/// `PER_TIER` are taken from each tier (easy, medium, hard); open slots are
/// then filled from the leftovers of the easy tier, then medium, then hard,
/// up to `PER_CATEGORY`. No randomness: the same inputs always give the same
/// slice.
pub fn select_from_category(
    questions: Vec<Question>,
    exclude: &HashSet<QuestionId>,
) -> Vec<Question> {
    let mut tiers: [Vec<Question>; 3] = Default::default();
    for question in questions.into_iter().filter(|q| !exclude.contains(&q.id)) {
        tiers[question.difficulty.index()].push(question);
    }
    for tier in &mut tiers {
        tier.sort_by(|a, b| {
            a.shuffle_key
                .total_cmp(&b.shuffle_key)
                .then_with(|| a.id.cmp(&b.id))
        });
    }

    let mut selected = Vec::with_capacity(PER_CATEGORY);
    let mut leftovers = Vec::new();
    for tier in tiers {
        let mut tier = tier.into_iter();
        selected.extend(tier.by_ref().take(PER_TIER));
        leftovers.extend(tier);
    }

    let open = PER_CATEGORY.saturating_sub(selected.len());
    selected.extend(leftovers.into_iter().take(open));
    selected
}

impl BoardEngine {
    /// The game's board minus anything already played in this game.
    ///
    /// A game with no completions gets a fresh board that avoids everything
    /// the player has ever completed elsewhere. Once a completion exists the
    /// board is fixed: it is rebuilt against the player's history as of the
    /// game's creation, which reproduces the original selection.
    pub async fn select_board(&self, game: &Game) -> BoardResult<Vec<Question>> {
        let played = self.recorded_in_game(game.id).await?;
        self.select_board_with(game, &played).await
    }

    pub(super) async fn select_board_with(
        &self,
        game: &Game,
        played: &HashSet<QuestionId>,
    ) -> BoardResult<Vec<Question>> {
        let exclude = if played.is_empty() {
            tracing::debug!("Game {}: generating initial board", game.id);
            self.history_all_time(&game.player, Some(game.id)).await?
        } else {
            tracing::debug!("Game {}: board is fixed, reconstructing", game.id);
            self.history_before(&game.player, game.created_at, Some(game.id))
                .await?
        };

        tracing::debug!(
            "Game {}: excluding {} previously played questions",
            game.id,
            exclude.len()
        );

        let mut board = Vec::new();
        for category in self.game_categories(game).await? {
            let questions = self.questions.questions_in_category(category.id).await?;
            let selected = select_from_category(questions, &exclude);
            tracing::debug!(
                "Category {}: selected {} questions for game {}",
                category.name,
                selected.len(),
                game.id
            );
            board.extend(selected);
        }

        let total = board.len();
        board.retain(|q| !played.contains(&q.id));
        tracing::debug!(
            "Game {}: board has {} questions, {} still available",
            game.id,
            total,
            board.len()
        );
        Ok(board)
    }
}
