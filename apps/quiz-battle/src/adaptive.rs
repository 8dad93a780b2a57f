//! Adaptive difficulty recommendations.

use crate::db::UserProfile;
use crate::models::Difficulty;
use crate::summary::ResultSummary;
use serde::{Deserialize, Serialize};

/// Five-step difficulty scale used to pick battle questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DifficultyLevel {
    Easy,
    EasyMedium,
    #[default]
    Medium,
    MediumHard,
    Hard,
}

impl DifficultyLevel {
    pub const ALL: [DifficultyLevel; 5] = [
        Self::Easy,
        Self::EasyMedium,
        Self::Medium,
        Self::MediumHard,
        Self::Hard,
    ];

    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::EasyMedium => "Easy-Medium",
            Self::Medium => "Medium",
            Self::MediumHard => "Medium-Hard",
            Self::Hard => "Hard",
        }
    }

    /// Whether questions of a difficulty belong to this level.
    pub fn admits(&self, difficulty: Difficulty) -> bool {
        match self {
            Self::Easy => difficulty == Difficulty::Easy,
            Self::EasyMedium => matches!(difficulty, Difficulty::Easy | Difficulty::Medium),
            Self::Medium => difficulty == Difficulty::Medium,
            Self::MediumHard => matches!(difficulty, Difficulty::Medium | Difficulty::Hard),
            Self::Hard => difficulty == Difficulty::Hard,
        }
    }

    /// Next level in the cycle, `None` after the last meaning "any".
    pub fn cycle(current: Option<Self>) -> Option<Self> {
        match current {
            None => Some(Self::Easy),
            Some(level) => {
                let pos = Self::ALL.iter().position(|l| *l == level).unwrap_or(0);
                Self::ALL.get(pos + 1).copied()
            }
        }
    }
}

/// Recent performance figures.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Performance {
    /// Accuracy of the latest battle, percent.
    pub recent_accuracy: f64,
    /// Best streak in the latest battle.
    pub streak: u32,
    /// Mean seconds per answer.
    pub average_time_secs: f64,
    /// Lifetime accuracy, percent.
    pub confidence: f64,
}

impl Performance {
    /// Combine the latest battle with lifetime stats.
    pub fn from_battle(summary: &ResultSummary, profile: &UserProfile) -> Self {
        Self {
            recent_accuracy: summary.accuracy * 100.0,
            streak: summary.best_streak,
            average_time_secs: summary.average_response_secs,
            confidence: profile.accuracy() * 100.0,
        }
    }
}

/// Suggested level and the reason for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recommendation {
    pub level: DifficultyLevel,
    pub reason: &'static str,
}

/// Pick a difficulty level from performance. First matching rule wins.
pub fn recommend(perf: &Performance) -> Recommendation {
    let (level, reason) = if perf.recent_accuracy >= 85.0 && perf.streak >= 5 && perf.confidence >= 80.0 {
        (DifficultyLevel::Hard, "Excellent performance! Ready for advanced challenges.")
    } else if perf.recent_accuracy >= 70.0 && perf.streak >= 3 {
        (DifficultyLevel::MediumHard, "Good progress! Gradually increasing difficulty.")
    } else if perf.recent_accuracy < 50.0 || perf.streak < 2 {
        (DifficultyLevel::Easy, "Building foundation with easier questions.")
    } else if perf.average_time_secs > 120.0 {
        (DifficultyLevel::EasyMedium, "Taking time to think - let's reinforce concepts.")
    } else {
        (DifficultyLevel::Medium, "Steady performance. Keep practicing at this level.")
    };
    Recommendation { level, reason }
}
