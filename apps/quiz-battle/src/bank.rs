//! Question banks: the built-in set and TOML question files.

use crate::adaptive::DifficultyLevel;
use crate::models::{Difficulty, Question, OPTION_COUNT};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BankError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Question {id}: expected {expected} options, found {found}")]
    OptionCount { id: String, expected: usize, found: usize },
    #[error("Question {id}: correct option {index} out of range")]
    CorrectOutOfRange { id: String, index: usize },
    #[error("Question {0}: time limit must be positive")]
    ZeroTimeLimit(String),
    #[error("Duplicate question id: {0}")]
    DuplicateId(String),
    #[error("Question file has no questions")]
    Empty,
}

pub type BankResult<T> = Result<T, BankError>;

/// On-disk question entry.
#[derive(Debug, Deserialize)]
struct QuestionEntry {
    id: String,
    text: String,
    options: Vec<String>,
    correct: usize,
    #[serde(default)]
    topic: String,
    #[serde(default)]
    difficulty: Difficulty,
    #[serde(default = "default_time_limit")]
    time_limit: u32,
}

fn default_time_limit() -> u32 { 15 }

#[derive(Debug, Deserialize)]
struct QuestionFile {
    #[serde(default)]
    questions: Vec<QuestionEntry>,
}

/// Ordered, read-only list of questions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    questions: Vec<Question>,
}

impl QuestionBank {
    /// The questions shipped with the app.
    pub fn builtin() -> Self {
        let questions = vec![
            Question::new("q1", "What is the derivative of x²?", ["2x", "x²", "2", "x"], 0)
                .with_topic("Calculus")
                .with_difficulty(Difficulty::Easy)
                .with_time_limit(15),
            Question::new("q2", "What is Newton's Second Law?", ["F = ma", "E = mc²", "F = mg", "a = v/t"], 0)
                .with_topic("Physics")
                .with_difficulty(Difficulty::Medium)
                .with_time_limit(20),
            Question::new("q3", "What is the chemical formula for water?", ["H₂O", "CO₂", "NaCl", "CH₄"], 0)
                .with_topic("Chemistry")
                .with_difficulty(Difficulty::Easy)
                .with_time_limit(10),
            Question::new("q4", "What is the integral of 2x?", ["x²", "x² + C", "2", "2x + C"], 1)
                .with_topic("Calculus")
                .with_difficulty(Difficulty::Medium)
                .with_time_limit(25),
            Question::new(
                "q5",
                "What is the speed of light?",
                ["3×10⁸ m/s", "3×10⁶ m/s", "3×10¹⁰ m/s", "3×10⁴ m/s"],
                0,
            )
            .with_topic("Physics")
            .with_difficulty(Difficulty::Hard)
            .with_time_limit(30),
        ];
        Self { questions }
    }

    /// Load and validate a TOML question file.
    pub fn load(path: &Path) -> BankResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    /// Parse and validate TOML question text.
    pub fn parse(content: &str) -> BankResult<Self> {
        let file: QuestionFile = toml::from_str(content)?;
        if file.questions.is_empty() {
            return Err(BankError::Empty);
        }

        let mut seen = HashSet::new();
        let mut questions = Vec::with_capacity(file.questions.len());
        for entry in file.questions {
            if entry.options.len() != OPTION_COUNT {
                return Err(BankError::OptionCount {
                    id: entry.id,
                    expected: OPTION_COUNT,
                    found: entry.options.len(),
                });
            }
            if entry.correct >= OPTION_COUNT {
                return Err(BankError::CorrectOutOfRange {
                    id: entry.id,
                    index: entry.correct,
                });
            }
            if entry.time_limit == 0 {
                return Err(BankError::ZeroTimeLimit(entry.id));
            }
            if !seen.insert(entry.id.clone()) {
                return Err(BankError::DuplicateId(entry.id));
            }

            questions.push(Question {
                id: entry.id,
                text: entry.text,
                options: entry.options,
                correct_option: entry.correct,
                topic: entry.topic,
                difficulty: entry.difficulty,
                time_limit_secs: entry.time_limit,
            });
        }

        Ok(Self { questions })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Questions for a level, or all of them if the level matches none.
    pub fn for_level(&self, level: Option<DifficultyLevel>) -> Vec<Question> {
        let Some(level) = level else {
            return self.questions.clone();
        };
        let filtered: Vec<Question> = self
            .questions
            .iter()
            .filter(|q| level.admits(q.difficulty))
            .cloned()
            .collect();
        if filtered.is_empty() {
            self.questions.clone()
        } else {
            filtered
        }
    }

    /// Questions for a battle: level filter, then weak topics (weakest first)
    /// when any match, then an optional cap.
    pub fn select(
        &self,
        level: Option<DifficultyLevel>,
        weak_topics: &[String],
        limit: Option<usize>,
    ) -> Vec<Question> {
        let mut questions = self.for_level(level);
        let mut targeted: Vec<Question> = questions
            .iter()
            .filter(|q| weak_topics.contains(&q.topic))
            .cloned()
            .collect();
        if !targeted.is_empty() {
            targeted.sort_by_key(|q| weak_topics.iter().position(|t| *t == q.topic));
            questions = targeted;
        }
        if let Some(limit) = limit {
            questions.truncate(limit);
        }
        questions
    }
}

impl Default for QuestionBank {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"
[[questions]]
id = "cells"
text = "Powerhouse of the cell?"
options = ["Nucleus", "Mitochondria", "Ribosome", "Golgi"]
correct = 1
topic = "Biology"
difficulty = "medium"
time_limit = 20

[[questions]]
id = "atoms"
text = "Smallest unit of an element?"
options = ["Atom", "Molecule", "Cell", "Quark"]
correct = 0
"#;

    #[test]
    fn test_builtin_bank() {
        let bank = QuestionBank::builtin();
        assert_eq!(bank.len(), 5);
        assert!(bank.questions().iter().all(|q| q.options.len() == OPTION_COUNT));
        assert_eq!(bank.questions()[3].correct_text(), "x² + C");
    }

    #[test]
    fn test_parse_with_defaults() {
        let bank = QuestionBank::parse(SAMPLE).unwrap();
        assert_eq!(bank.len(), 2);
        let atoms = &bank.questions()[1];
        assert_eq!(atoms.difficulty, Difficulty::Easy);
        assert_eq!(atoms.time_limit_secs, 15);
        assert_eq!(bank.questions()[0].difficulty, Difficulty::Medium);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        let bank = QuestionBank::load(file.path()).unwrap();
        assert_eq!(bank.questions()[0].id, "cells");
    }

    #[test]
    fn test_validation_errors() {
        let three = r#"
[[questions]]
id = "x"
text = "?"
options = ["a", "b", "c"]
correct = 0
"#;
        assert!(matches!(QuestionBank::parse(three), Err(BankError::OptionCount { found: 3, .. })));

        let bad_index = SAMPLE.replace("correct = 1", "correct = 4");
        assert!(matches!(QuestionBank::parse(&bad_index), Err(BankError::CorrectOutOfRange { .. })));

        let zero = SAMPLE.replace("time_limit = 20", "time_limit = 0");
        assert!(matches!(QuestionBank::parse(&zero), Err(BankError::ZeroTimeLimit(_))));

        let dup = SAMPLE.replace("id = \"atoms\"", "id = \"cells\"");
        assert!(matches!(QuestionBank::parse(&dup), Err(BankError::DuplicateId(_))));

        assert!(matches!(QuestionBank::parse(""), Err(BankError::Empty)));
        assert!(matches!(QuestionBank::parse("questions = 3"), Err(BankError::Toml(_))));
    }

    #[test]
    fn test_level_filter_falls_back() {
        let bank = QuestionBank::builtin();
        let hard = bank.for_level(Some(DifficultyLevel::Hard));
        assert_eq!(hard.len(), 1);
        assert_eq!(hard[0].id, "q5");

        let medium_hard = bank.for_level(Some(DifficultyLevel::MediumHard));
        assert_eq!(medium_hard.len(), 3);

        let only_easy = QuestionBank::parse(SAMPLE.replace("difficulty = \"medium\"", "").as_str()).unwrap();
        assert_eq!(only_easy.for_level(Some(DifficultyLevel::Hard)).len(), 2);

        assert_eq!(bank.select(None, &[], Some(2)).len(), 2);
    }

    #[test]
    fn test_select_weak_topics_first() {
        let bank = QuestionBank::builtin();
        let weak = vec!["Physics".to_string(), "Calculus".to_string()];

        let ids: Vec<String> = bank.select(None, &weak, None).into_iter().map(|q| q.id).collect();
        assert_eq!(ids, vec!["q2", "q5", "q1", "q4"]);

        let capped = bank.select(None, &weak, Some(1));
        assert_eq!(capped[0].id, "q2");

        let easy_only = bank.select(Some(DifficultyLevel::Easy), &weak, None);
        assert_eq!(easy_only.len(), 1);
        assert_eq!(easy_only[0].id, "q1");
    }

    #[test]
    fn test_select_unknown_weak_topics_falls_back() {
        let bank = QuestionBank::builtin();
        let weak = vec!["History".to_string()];
        assert_eq!(bank.select(None, &weak, None).len(), 5);
        assert_eq!(bank.select(Some(DifficultyLevel::Hard), &weak, None)[0].id, "q5");
    }
}
