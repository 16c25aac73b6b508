use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Integer identifiers as issued by the relational store
pub type QuestionId = i64;
pub type CategoryId = i64;
pub type GameId = i64;

/// Opaque player identity handed to us by the auth layer
pub type PlayerId = String;

/// Difficulty tier. Serialized as its point value, matching the stored column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Difficulty {
    #[serde(rename = "200")]
    Easy,
    #[serde(rename = "400")]
    Medium,
    #[serde(rename = "600")]
    Hard,
}

impl Difficulty {
    /// Tiers in board order (low to high)
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard];

    pub fn points(self) -> u32 {
        match self {
            Difficulty::Easy => 200,
            Difficulty::Medium => 400,
            Difficulty::Hard => 600,
        }
    }

    /// Position of this tier in `ALL`
    pub fn index(self) -> usize {
        match self {
            Difficulty::Easy => 0,
            Difficulty::Medium => 1,
            Difficulty::Hard => 2,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Premium-only. Filtering on this happens upstream of the board engine.
    #[serde(default)]
    pub locked: bool,
    pub created_at: DateTime<Utc>,
}

impl Category {
    /// Natural ordering: newest first, ties broken by ascending id
    pub fn natural_cmp(a: &Category, b: &Category) -> Ordering {
        b.created_at
            .cmp(&a.created_at)
            .then_with(|| a.id.cmp(&b.id))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Question {
    pub id: QuestionId,
    pub category_id: CategoryId,
    pub text: String,
    pub answer: String,
    /// Extra multiple-choice options (at most three)
    #[serde(default)]
    pub choices: Vec<String>,
    pub difficulty: Difficulty,
    /// Pre-shuffled order key in [0, 1); only changed by a reshuffle
    #[serde(default = "default_shuffle_key")]
    pub shuffle_key: f64,
}

pub fn default_shuffle_key() -> f64 {
    0.5
}

impl Question {
    pub fn points(&self) -> u32 {
        self.difficulty.points()
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Offline,
    Solo,
    Online,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Team {
    pub name: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Game {
    pub id: GameId,
    pub player: PlayerId,
    pub mode: GameMode,
    pub categories: Vec<CategoryId>,
    #[serde(default)]
    pub teams: Vec<Team>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a game; the ledger assigns id and timestamp
#[derive(Debug, Clone)]
pub struct NewGame {
    pub player: PlayerId,
    pub mode: GameMode,
    pub categories: Vec<CategoryId>,
    pub teams: Vec<Team>,
}

/// Completion of one question within one game
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PlayedQuestion {
    pub game_id: GameId,
    pub question_id: QuestionId,
}
