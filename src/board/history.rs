use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

use super::BoardEngine;
use crate::error::BoardResult;
use crate::types::*;

/// How many games `recent_games` returns
const RECENT_GAMES: usize = 3;

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PlayerStats {
    pub total_games: usize,
    pub total_questions_answered: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct RecentGame {
    pub id: GameId,
    pub mode: GameMode,
    pub created_at: DateTime<Utc>,
    pub categories: Vec<Category>,
}

impl BoardEngine {
    /// Everything `player` completed in games created strictly before `cutoff`
    pub async fn history_before(
        &self,
        player: &PlayerId,
        cutoff: DateTime<Utc>,
        excluding: Option<GameId>,
    ) -> BoardResult<HashSet<QuestionId>> {
        Ok(self
            .ledger
            .played_by_player(player, Some(cutoff), excluding)
            .await?
            .into_iter()
            .collect())
    }

    /// Everything `player` has ever completed
    pub async fn history_all_time(
        &self,
        player: &PlayerId,
        excluding: Option<GameId>,
    ) -> BoardResult<HashSet<QuestionId>> {
        Ok(self
            .ledger
            .played_by_player(player, None, excluding)
            .await?
            .into_iter()
            .collect())
    }

    /// Questions already completed within `game`
    pub async fn recorded_in_game(&self, game: GameId) -> BoardResult<HashSet<QuestionId>> {
        Ok(self.ledger.played_in_game(game).await?.into_iter().collect())
    }

    /// Record a finished round. Ids that don't resolve to a question are
    /// ignored and pairs already recorded are no-ops.
    /// Returns how many completions were newly saved.
    pub async fn finish_round(&self, game: &Game, question_ids: &[QuestionId]) -> BoardResult<usize> {
        let requested: BTreeSet<QuestionId> = question_ids.iter().copied().collect();
        if requested.is_empty() {
            return Ok(0);
        }

        let requested: Vec<QuestionId> = requested.into_iter().collect();
        let mut known: Vec<QuestionId> = self
            .questions
            .questions_by_ids(&requested)
            .await?
            .into_iter()
            .map(|q| q.id)
            .collect();
        if known.is_empty() {
            tracing::debug!("Game {}: none of {:?} are known questions", game.id, requested);
            return Ok(0);
        }
        known.sort_unstable();

        let saved = self.ledger.record_played(game.id, &known).await?;

        tracing::info!(
            "Game {}: recorded {} new completions ({} requested)",
            game.id,
            saved,
            requested.len()
        );
        Ok(saved)
    }

    pub async fn player_stats(&self, player: &PlayerId) -> BoardResult<PlayerStats> {
        let total_games = self.ledger.games_for_player(player).await?.len();
        let total_questions_answered = self
            .ledger
            .played_by_player(player, None, None)
            .await?
            .len();
        Ok(PlayerStats {
            total_games,
            total_questions_answered,
        })
    }

    /// The player's newest games with their categories
    pub async fn recent_games(&self, player: &PlayerId) -> BoardResult<Vec<RecentGame>> {
        let games = self.ledger.games_for_player(player).await?;
        let mut recent = Vec::with_capacity(RECENT_GAMES);
        for game in games.into_iter().take(RECENT_GAMES) {
            let categories = self.game_categories(&game).await?;
            recent.push(RecentGame {
                id: game.id,
                mode: game.mode,
                created_at: game.created_at,
                categories,
            });
        }
        Ok(recent)
    }
}
