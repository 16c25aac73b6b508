use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{HashMap, HashSet};
use tokio::sync::RwLock;

use super::{GameLedger, QuestionPool};
use crate::error::{StoreError, StoreResult};
use crate::types::*;

/// All tables behind one lock so cascades and bulk writes are atomic
#[derive(Debug, Default, Clone)]
pub(crate) struct Tables {
    pub categories: HashMap<CategoryId, Category>,
    pub questions: HashMap<QuestionId, Question>,
    pub games: HashMap<GameId, Game>,
    /// Completion rows in insertion order
    pub played: Vec<PlayedQuestion>,
    /// Uniqueness index over `played`
    pub played_index: HashSet<PlayedQuestion>,
    /// Highest game id issued or inserted so far. Never decreases, so a
    /// deleted game's id is never handed out again.
    pub last_game_id: GameId,
}

impl Tables {
    fn next_game_id(&mut self) -> GameId {
        self.last_game_id += 1;
        self.last_game_id
    }

    pub(crate) fn reserve_game_id(&mut self, id: GameId) {
        self.last_game_id = self.last_game_id.max(id);
    }
}

/// Drop repeated category ids, keeping first occurrences in order
pub(crate) fn dedupe_categories(categories: &mut Vec<CategoryId>) {
    let mut seen = HashSet::new();
    categories.retain(|id| seen.insert(*id));
}

/// In-process store implementing both `QuestionPool` and `GameLedger`
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub(crate) tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    // =========================================================================
    // Admin helpers (content management lives upstream in production)
    // =========================================================================

    pub async fn insert_category(&self, category: Category) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.categories.contains_key(&category.id) {
            return Err(StoreError::Duplicate(category.id));
        }
        tables.categories.insert(category.id, category);
        Ok(())
    }

    pub async fn insert_question(&self, question: Question) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if !tables.categories.contains_key(&question.category_id) {
            return Err(StoreError::CategoryNotFound(question.category_id));
        }
        if tables.questions.contains_key(&question.id) {
            return Err(StoreError::Duplicate(question.id));
        }
        tables.questions.insert(question.id, question);
        Ok(())
    }

    /// Replace a stored question's content (same id)
    pub async fn update_question(&self, question: Question) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        match tables.questions.get_mut(&question.id) {
            Some(existing) => {
                *existing = question;
                Ok(())
            }
            None => Err(StoreError::QuestionNotFound(question.id)),
        }
    }

    /// Delete a question and its completion rows.
    /// Returns true if the question existed.
    pub async fn remove_question(&self, id: QuestionId) -> bool {
        let mut tables = self.tables.write().await;
        if tables.questions.remove(&id).is_none() {
            return false;
        }
        tables.played.retain(|p| p.question_id != id);
        tables.played_index.retain(|p| p.question_id != id);
        tracing::info!("Removed question {}", id);
        true
    }

    /// Insert a game with an explicit id and timestamp (imports, fixtures)
    pub async fn insert_game(&self, mut game: Game) -> StoreResult<()> {
        let mut tables = self.tables.write().await;
        if tables.games.contains_key(&game.id) {
            return Err(StoreError::Duplicate(game.id));
        }
        if let Some(missing) = game
            .categories
            .iter()
            .find(|c| !tables.categories.contains_key(c))
        {
            return Err(StoreError::CategoryNotFound(*missing));
        }
        dedupe_categories(&mut game.categories);
        tables.reserve_game_id(game.id);
        tables.games.insert(game.id, game);
        Ok(())
    }

    /// Delete a game and its completion rows.
    /// Returns true if the game existed.
    pub async fn delete_game(&self, id: GameId) -> bool {
        let mut tables = self.tables.write().await;
        if tables.games.remove(&id).is_none() {
            return false;
        }
        tables.played.retain(|p| p.game_id != id);
        tables.played_index.retain(|p| p.game_id != id);
        tracing::info!("Deleted game {}", id);
        true
    }
}

#[async_trait]
impl QuestionPool for MemoryStore {
    async fn categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> =
            self.tables.read().await.categories.values().cloned().collect();
        categories.sort_by(Category::natural_cmp);
        Ok(categories)
    }

    async fn category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn questions_in_category(&self, category: CategoryId) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        let mut questions: Vec<Question> = tables
            .questions
            .values()
            .filter(|q| q.category_id == category)
            .cloned()
            .collect();
        // HashMap order is arbitrary; hand back something stable
        questions.sort_by_key(|q| q.id);
        Ok(questions)
    }

    async fn questions_by_ids(&self, ids: &[QuestionId]) -> StoreResult<Vec<Question>> {
        let tables = self.tables.read().await;
        Ok(ids
            .iter()
            .filter_map(|id| tables.questions.get(id).cloned())
            .collect())
    }

    async fn update_shuffle_keys(&self, updates: &[(QuestionId, f64)]) -> StoreResult<()> {
        let mut tables = self.tables.write().await;

        if let Some((missing, _)) = updates
            .iter()
            .find(|(id, _)| !tables.questions.contains_key(id))
        {
            return Err(StoreError::QuestionNotFound(*missing));
        }

        for (id, key) in updates {
            if let Some(question) = tables.questions.get_mut(id) {
                question.shuffle_key = *key;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl GameLedger for MemoryStore {
    async fn create_game(&self, new_game: NewGame) -> StoreResult<Game> {
        let mut tables = self.tables.write().await;

        if let Some(missing) = new_game
            .categories
            .iter()
            .find(|c| !tables.categories.contains_key(c))
        {
            return Err(StoreError::CategoryNotFound(*missing));
        }
        let mut categories = new_game.categories;
        dedupe_categories(&mut categories);

        let game = Game {
            id: tables.next_game_id(),
            player: new_game.player,
            mode: new_game.mode,
            categories,
            teams: new_game.teams,
            created_at: Utc::now(),
        };
        tables.games.insert(game.id, game.clone());

        tracing::info!("Created game {} for player {}", game.id, game.player);
        Ok(game)
    }

    async fn game(&self, id: GameId) -> StoreResult<Option<Game>> {
        Ok(self.tables.read().await.games.get(&id).cloned())
    }

    async fn games_for_player(&self, player: &PlayerId) -> StoreResult<Vec<Game>> {
        let mut games: Vec<Game> = self
            .tables
            .read()
            .await
            .games
            .values()
            .filter(|g| &g.player == player)
            .cloned()
            .collect();
        games.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(games)
    }

    async fn played_in_game(&self, game: GameId) -> StoreResult<Vec<QuestionId>> {
        Ok(self
            .tables
            .read()
            .await
            .played
            .iter()
            .filter(|p| p.game_id == game)
            .map(|p| p.question_id)
            .collect())
    }

    async fn played_by_player(
        &self,
        player: &PlayerId,
        created_before: Option<DateTime<Utc>>,
        excluding: Option<GameId>,
    ) -> StoreResult<Vec<QuestionId>> {
        let tables = self.tables.read().await;

        let games: HashSet<GameId> = tables
            .games
            .values()
            .filter(|g| &g.player == player)
            .filter(|g| Some(g.id) != excluding)
            .filter(|g| created_before.is_none_or(|cutoff| g.created_at < cutoff))
            .map(|g| g.id)
            .collect();

        Ok(tables
            .played
            .iter()
            .filter(|p| games.contains(&p.game_id))
            .map(|p| p.question_id)
            .collect())
    }

    async fn record_played(&self, game: GameId, questions: &[QuestionId]) -> StoreResult<usize> {
        let mut tables = self.tables.write().await;
        if !tables.games.contains_key(&game) {
            return Err(StoreError::GameNotFound(game));
        }

        // Nothing is written unless every question exists
        if let Some(missing) = questions
            .iter()
            .find(|id| !tables.questions.contains_key(id))
        {
            return Err(StoreError::QuestionNotFound(*missing));
        }

        let mut inserted = 0;
        for &question_id in questions {
            let row = PlayedQuestion {
                game_id: game,
                question_id,
            };
            // Uniqueness constraint: a second insert of the same pair is a no-op
            if tables.played_index.insert(row) {
                tables.played.push(row);
                inserted += 1;
            }
        }
        Ok(inserted)
    }
}
