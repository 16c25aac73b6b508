use rand::Rng;
use serde::{Deserialize, Serialize};

use super::BoardEngine;
use crate::error::{BoardError, BoardResult};
use crate::types::*;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReshuffleStats {
    /// Categories that had at least one question
    pub categories_shuffled: usize,
    pub total_questions: usize,
}

/// Draw an independent uniform key in [0, 1) for every question
pub fn draw_shuffle_keys<R: Rng + ?Sized>(
    questions: &[Question],
    rng: &mut R,
) -> Vec<(QuestionId, f64)> {
    questions
        .iter()
        .map(|q| (q.id, rng.random::<f64>()))
        .collect()
}

impl BoardEngine {
    /// Assign fresh shuffle keys to every question in `category`.
    /// Returns the number of questions shuffled.
    pub async fn reshuffle(&self, category: CategoryId) -> BoardResult<usize> {
        if self.questions.category(category).await?.is_none() {
            return Err(BoardError::CategoryNotFound(category));
        }
        self.reshuffle_category(category).await
    }

    /// Reshuffle every category. Empty categories are skipped and not counted.
    pub async fn reshuffle_all(&self) -> BoardResult<ReshuffleStats> {
        let mut stats = ReshuffleStats::default();
        for category in self.questions.categories().await? {
            let count = self.reshuffle_category(category.id).await?;
            if count > 0 {
                stats.categories_shuffled += 1;
                stats.total_questions += count;
            }
        }

        tracing::info!(
            "Shuffled {} questions across {} categories",
            stats.total_questions,
            stats.categories_shuffled
        );
        Ok(stats)
    }

    async fn reshuffle_category(&self, category: CategoryId) -> BoardResult<usize> {
        let questions = self.questions.questions_in_category(category).await?;
        if questions.is_empty() {
            return Ok(0);
        }

        let updates = draw_shuffle_keys(&questions, &mut rand::rng());
        self.questions.update_shuffle_keys(&updates).await?;

        tracing::info!("Shuffled {} questions in category {}", updates.len(), category);
        Ok(updates.len())
    }
}
