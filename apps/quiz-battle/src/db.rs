//! Profile storage for quiz battle.
//!
//! The only persisted state is a single user profile, stored as JSON in a
//! one-row SQLite table.

use crate::adaptive::DifficultyLevel;
use crate::models::Outcome;
use crate::summary::{ResultSummary, TopicTally};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use thiserror::Error;
use tracing::info;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type DbResult<T> = Result<T, DbError>;

/// Topics answered correctly less often than this are weak.
pub const WEAK_TOPIC_ACCURACY: f64 = 0.6;

/// Lifetime battle record for the local user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    #[serde(default)]
    pub battles: u32,
    #[serde(default)]
    pub wins: u32,
    #[serde(default)]
    pub losses: u32,
    #[serde(default)]
    pub draws: u32,
    #[serde(default)]
    pub total_score: u64,
    #[serde(default)]
    pub best_streak: u32,
    #[serde(default)]
    pub total_correct: u64,
    #[serde(default)]
    pub total_questions: u64,
    /// Level applied from a recommendation, `None` for all questions.
    #[serde(default)]
    pub preferred_level: Option<DifficultyLevel>,
    #[serde(default)]
    pub last_battle_at: Option<DateTime<Utc>>,
    /// Lifetime results per question topic.
    #[serde(default)]
    pub topic_stats: BTreeMap<String, TopicTally>,
}

impl UserProfile {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            battles: 0,
            wins: 0,
            losses: 0,
            draws: 0,
            total_score: 0,
            best_streak: 0,
            total_correct: 0,
            total_questions: 0,
            preferred_level: None,
            last_battle_at: None,
            topic_stats: BTreeMap::new(),
        }
    }

    /// Lifetime accuracy, 0.0 to 1.0.
    pub fn accuracy(&self) -> f64 {
        if self.total_questions == 0 {
            0.0
        } else {
            self.total_correct as f64 / self.total_questions as f64
        }
    }

    /// Fraction of battles won.
    pub fn win_rate(&self) -> f64 {
        if self.battles == 0 {
            0.0
        } else {
            self.wins as f64 / self.battles as f64
        }
    }

    /// Fold a finished battle into the totals.
    pub fn apply(&mut self, summary: &ResultSummary) {
        self.battles += 1;
        match summary.outcome {
            Outcome::Win => self.wins += 1,
            Outcome::Lose => self.losses += 1,
            Outcome::Draw => self.draws += 1,
        }
        self.total_score += summary.player_score as u64;
        self.best_streak = self.best_streak.max(summary.best_streak);
        self.total_correct += summary.correct_answers as u64;
        self.total_questions += summary.question_count as u64;
        for (topic, tally) in &summary.topics {
            self.topic_stats.entry(topic.clone()).or_default().merge(*tally);
        }
        self.last_battle_at = Some(Utc::now());
    }

    /// Topics below the weak threshold, weakest first.
    pub fn weak_topics(&self) -> Vec<String> {
        let mut weak: Vec<(&String, f64)> = self
            .topic_stats
            .iter()
            .filter(|(_, tally)| tally.total > 0)
            .map(|(topic, tally)| (topic, tally.accuracy()))
            .filter(|(_, accuracy)| *accuracy < WEAK_TOPIC_ACCURACY)
            .collect();
        weak.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));
        weak.into_iter().map(|(topic, _)| topic.clone()).collect()
    }
}

pub struct Database {
    conn: Connection,
}

impl Database {
    pub fn open(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> DbResult<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS profile (
                id INTEGER PRIMARY KEY CHECK (id = 1),
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    /// Load the stored profile, if any.
    pub fn get_profile(&self) -> DbResult<Option<UserProfile>> {
        let data: Option<String> = self
            .conn
            .query_row("SELECT data FROM profile WHERE id = 1", [], |row| row.get(0))
            .optional()?;

        match data {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    /// Load the profile, creating and storing a fresh one if missing.
    pub fn load_profile(&self, default_username: &str) -> DbResult<UserProfile> {
        if let Some(profile) = self.get_profile()? {
            return Ok(profile);
        }
        let profile = UserProfile::new(default_username);
        self.save_profile(&profile)?;
        info!(username = %profile.username, "created profile");
        Ok(profile)
    }

    pub fn save_profile(&self, profile: &UserProfile) -> DbResult<()> {
        self.conn.execute(
            "INSERT INTO profile (id, data, updated_at) VALUES (1, ?1, ?2)
             ON CONFLICT(id) DO UPDATE SET data = excluded.data, updated_at = excluded.updated_at",
            params![serde_json::to_string(profile)?, Utc::now().to_rfc3339()],
        )?;
        Ok(())
    }

    /// Apply a battle result to the stored profile and persist it.
    pub fn record_battle(&self, profile: &mut UserProfile, summary: &ResultSummary) -> DbResult<()> {
        profile.apply(summary);
        self.save_profile(profile)?;
        info!(
            battles = profile.battles,
            wins = profile.wins,
            outcome = summary.outcome.as_str(),
            "recorded battle"
        );
        Ok(())
    }
}
