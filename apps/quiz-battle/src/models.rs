//! Data models for quiz battles.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of answer options on every question.
pub const OPTION_COUNT: usize = 4;

/// Question difficulty.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    #[default]
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    /// Get display name.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
        }
    }
}

/// A quiz item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within a bank.
    pub id: String,
    /// Question text.
    pub text: String,
    /// Answer options, always `OPTION_COUNT` long.
    pub options: Vec<String>,
    /// Index of the correct option.
    pub correct_option: usize,
    /// Topic label.
    pub topic: String,
    /// Difficulty.
    pub difficulty: Difficulty,
    /// Seconds allowed for an answer.
    pub time_limit_secs: u32,
}

impl Question {
    /// Create a new question.
    pub fn new(
        id: impl Into<String>,
        text: impl Into<String>,
        options: [&str; OPTION_COUNT],
        correct_option: usize,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            options: options.iter().map(|o| o.to_string()).collect(),
            correct_option,
            topic: String::new(),
            difficulty: Difficulty::Easy,
            time_limit_secs: 15,
        }
    }

    /// Set topic.
    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = topic.into();
        self
    }

    /// Set difficulty.
    pub fn with_difficulty(mut self, difficulty: Difficulty) -> Self {
        self.difficulty = difficulty;
        self
    }

    /// Set time limit.
    pub fn with_time_limit(mut self, secs: u32) -> Self {
        self.time_limit_secs = secs;
        self
    }

    /// Check an option against the correct one.
    pub fn is_correct(&self, option: usize) -> bool {
        option == self.correct_option
    }

    /// Text of the correct option.
    pub fn correct_text(&self) -> &str {
        self.options
            .get(self.correct_option)
            .map(String::as_str)
            .unwrap_or_default()
    }
}

/// Resolution of one question for one party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerRecord {
    /// Question index within the battle.
    pub question_index: usize,
    /// Chosen option, `None` when time ran out.
    pub choice: Option<usize>,
    /// Whether the choice was correct.
    pub correct: bool,
    /// Points awarded.
    pub points: u32,
    /// Seconds left on the question timer at resolution.
    pub remaining_secs: u32,
    /// Seconds spent before resolution.
    pub response_secs: u32,
}

/// Per-party battle state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyState {
    /// Unique identifier.
    pub id: Uuid,
    /// Name shown in the UI.
    pub display_name: String,
    /// Accumulated points.
    pub score: u32,
    /// Consecutive correct answers.
    pub streak: u32,
    /// Longest streak this battle.
    pub best_streak: u32,
    /// Answers that carried a choice.
    pub answered_count: usize,
    /// One record per resolved question.
    pub answers: Vec<AnswerRecord>,
}

impl PartyState {
    /// Create a fresh party.
    pub fn new(display_name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            display_name: display_name.into(),
            score: 0,
            streak: 0,
            best_streak: 0,
            answered_count: 0,
            answers: Vec::new(),
        }
    }

    /// Check whether a question has been resolved for this party.
    pub fn has_answered(&self, question_index: usize) -> bool {
        self.answers.iter().any(|a| a.question_index == question_index)
    }

    /// Get the record for a question.
    pub fn answer_for(&self, question_index: usize) -> Option<&AnswerRecord> {
        self.answers.iter().find(|a| a.question_index == question_index)
    }

    /// Number of correct answers.
    pub fn correct_count(&self) -> usize {
        self.answers.iter().filter(|a| a.correct).count()
    }

    /// Apply a resolution. Returns false if the question was already resolved.
    pub fn record(&mut self, record: AnswerRecord) -> bool {
        if self.has_answered(record.question_index) {
            return false;
        }
        if record.correct {
            self.streak += 1;
            self.best_streak = self.best_streak.max(self.streak);
        } else {
            self.streak = 0;
        }
        if record.choice.is_some() {
            self.answered_count += 1;
        }
        self.score += record.points;
        self.answers.push(record);
        true
    }
}

/// Battle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Pre-battle countdown.
    Countdown,
    /// Questions are being asked.
    InProgress,
    /// Terminal.
    Complete,
}

/// Final battle result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Win,
    Lose,
    Draw,
}

impl Outcome {
    /// Headline for the results screen.
    pub fn headline(&self) -> &'static str {
        match self {
            Self::Win => "Victory!",
            Self::Lose => "Defeat",
            Self::Draw => "It's a Draw!",
        }
    }

    /// Longer message for the results screen.
    pub fn message(&self) -> &'static str {
        match self {
            Self::Win => "Congratulations! You won the battle!",
            Self::Lose => "Good effort! Better luck next time.",
            Self::Draw => "Great battle! You're evenly matched.",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Win => "win",
            Self::Lose => "lose",
            Self::Draw => "draw",
        }
    }
}
