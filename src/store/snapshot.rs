//! Serializable snapshots of the in-memory store.
//!
//! Used to seed the service at startup and to back up / restore content and
//! play history through the admin API.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use super::memory::{dedupe_categories, MemoryStore, Tables};
use crate::types::*;

/// Schema version for snapshot format compatibility
/// Version 1: categories, questions, games, played
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse snapshot: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid snapshot: {0}")]
    Invalid(String),
}

/// A full copy of the store's tables
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreSnapshot {
    pub schema_version: u32,
    /// Export timestamp (ISO8601); absent in hand-written seed files
    #[serde(default)]
    pub exported_at: Option<String>,
    #[serde(default)]
    pub categories: Vec<Category>,
    #[serde(default)]
    pub questions: Vec<Question>,
    #[serde(default)]
    pub games: Vec<Game>,
    #[serde(default)]
    pub played: Vec<PlayedQuestion>,
}

impl StoreSnapshot {
    /// Check ids are unique and every reference resolves
    pub fn validate(&self) -> Result<(), String> {
        if self.schema_version > SNAPSHOT_SCHEMA_VERSION {
            return Err(format!(
                "Snapshot schema version {} is newer than supported version {}",
                self.schema_version, SNAPSHOT_SCHEMA_VERSION
            ));
        }

        let mut category_ids = HashSet::new();
        for category in &self.categories {
            if !category_ids.insert(category.id) {
                return Err(format!("Duplicate category id {}", category.id));
            }
        }

        let mut question_ids = HashSet::new();
        for question in &self.questions {
            if !question_ids.insert(question.id) {
                return Err(format!("Duplicate question id {}", question.id));
            }
            if !category_ids.contains(&question.category_id) {
                return Err(format!(
                    "Question {} references category {} which doesn't exist",
                    question.id, question.category_id
                ));
            }
            if !(0.0..1.0).contains(&question.shuffle_key) {
                return Err(format!(
                    "Question {} has shuffle key {} outside [0, 1)",
                    question.id, question.shuffle_key
                ));
            }
        }

        let mut game_ids = HashSet::new();
        for game in &self.games {
            if !game_ids.insert(game.id) {
                return Err(format!("Duplicate game id {}", game.id));
            }
            if let Some(missing) = game.categories.iter().find(|c| !category_ids.contains(c)) {
                return Err(format!(
                    "Game {} references category {} which doesn't exist",
                    game.id, missing
                ));
            }
        }

        for row in &self.played {
            if !game_ids.contains(&row.game_id) || !question_ids.contains(&row.question_id) {
                return Err(format!(
                    "Played question ({}, {}) references a missing game or question",
                    row.game_id, row.question_id
                ));
            }
        }

        Ok(())
    }

    pub fn load_file(path: impl AsRef<Path>) -> Result<Self, SnapshotError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;
        snapshot.validate().map_err(SnapshotError::Invalid)?;
        Ok(snapshot)
    }
}

impl MemoryStore {
    pub async fn export_snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read().await;

        let mut categories: Vec<Category> = tables.categories.values().cloned().collect();
        categories.sort_by_key(|c| c.id);
        let mut questions: Vec<Question> = tables.questions.values().cloned().collect();
        questions.sort_by_key(|q| q.id);
        let mut games: Vec<Game> = tables.games.values().cloned().collect();
        games.sort_by_key(|g| g.id);

        StoreSnapshot {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            exported_at: Some(chrono::Utc::now().to_rfc3339()),
            categories,
            questions,
            games,
            played: tables.played.clone(),
        }
    }

    /// Replace all state with the snapshot's contents.
    /// Duplicate completion rows and repeated game categories collapse to
    /// one. Game ids issued afterwards stay above both the imported ids and
    /// every id issued before the import.
    pub async fn import_snapshot(&self, snapshot: StoreSnapshot) -> Result<(), String> {
        snapshot.validate()?;

        let mut tables = Tables::default();
        for category in snapshot.categories {
            tables.categories.insert(category.id, category);
        }
        for question in snapshot.questions {
            tables.questions.insert(question.id, question);
        }
        for mut game in snapshot.games {
            dedupe_categories(&mut game.categories);
            tables.reserve_game_id(game.id);
            tables.games.insert(game.id, game);
        }
        for row in snapshot.played {
            if tables.played_index.insert(row) {
                tables.played.push(row);
            }
        }

        tracing::info!(
            "Imported snapshot: {} categories, {} questions, {} games, {} played",
            tables.categories.len(),
            tables.questions.len(),
            tables.games.len(),
            tables.played.len()
        );
        let mut current = self.tables.write().await;
        tables.reserve_game_id(current.last_game_id);
        *current = tables;
        Ok(())
    }
}
