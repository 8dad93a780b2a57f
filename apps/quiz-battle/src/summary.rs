//! Battle result summaries.

use crate::models::{Outcome, PartyState, Question};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

/// Correct answers against questions asked, for one topic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TopicTally {
    pub correct: u32,
    pub total: u32,
}

impl TopicTally {
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.correct as f64 / self.total as f64
        }
    }

    pub fn merge(&mut self, other: TopicTally) {
        self.correct += other.correct;
        self.total += other.total;
    }
}

/// Aggregate result handed to the host when a battle ends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultSummary {
    pub outcome: Outcome,
    pub player_score: u32,
    pub opponent_score: u32,
    /// Correct answers over question count, 0.0 to 1.0.
    pub accuracy: f64,
    /// Answers the player actually submitted.
    pub questions_answered: usize,
    pub question_count: usize,
    pub correct_answers: usize,
    pub best_streak: u32,
    /// Mean seconds taken over submitted answers.
    pub average_response_secs: f64,
    pub opponent_accuracy: f64,
    /// Player results per question topic. Untitled questions are left out.
    #[serde(default)]
    pub topics: BTreeMap<String, TopicTally>,
}

/// Compare final scores.
pub fn outcome(player_score: u32, opponent_score: u32) -> Outcome {
    match player_score.cmp(&opponent_score) {
        Ordering::Greater => Outcome::Win,
        Ordering::Less => Outcome::Lose,
        Ordering::Equal => Outcome::Draw,
    }
}

fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64
    }
}

/// Derive the summary from the final party states.
pub fn summarize(player: &PartyState, opponent: &PartyState, questions: &[Question]) -> ResultSummary {
    let question_count = questions.len();
    let submitted: Vec<u32> = player
        .answers
        .iter()
        .filter(|a| a.choice.is_some())
        .map(|a| a.response_secs)
        .collect();
    let average_response_secs = if submitted.is_empty() {
        0.0
    } else {
        submitted.iter().map(|&s| s as f64).sum::<f64>() / submitted.len() as f64
    };

    let mut topics: BTreeMap<String, TopicTally> = BTreeMap::new();
    for (index, question) in questions.iter().enumerate() {
        if question.topic.is_empty() {
            continue;
        }
        let tally = topics.entry(question.topic.clone()).or_default();
        tally.total += 1;
        if player.answer_for(index).is_some_and(|a| a.correct) {
            tally.correct += 1;
        }
    }

    ResultSummary {
        outcome: outcome(player.score, opponent.score),
        player_score: player.score,
        opponent_score: opponent.score,
        accuracy: ratio(player.correct_count(), question_count),
        questions_answered: player.answered_count,
        question_count,
        correct_answers: player.correct_count(),
        best_streak: player.best_streak,
        average_response_secs,
        opponent_accuracy: ratio(opponent.correct_count(), question_count),
        topics,
    }
}

impl ResultSummary {
    /// Accuracy as a whole percentage.
    pub fn accuracy_percent(&self) -> u32 {
        (self.accuracy * 100.0).round() as u32
    }
}

impl fmt::Display for ResultSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} - {} ({}% accuracy, {}/{} answered)",
            self.outcome.headline(),
            self.player_score,
            self.opponent_score,
            self.accuracy_percent(),
            self.questions_answered,
            self.question_count
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AnswerRecord;

    fn questions(topics: &[&str]) -> Vec<Question> {
        topics
            .iter()
            .enumerate()
            .map(|(i, topic)| {
                Question::new(format!("q{}", i), "?", ["a", "b", "c", "d"], 0).with_topic(*topic)
            })
            .collect()
    }

    fn answer(index: usize, choice: Option<usize>, correct: bool, points: u32, taken: u32) -> AnswerRecord {
        AnswerRecord {
            question_index: index,
            choice,
            correct,
            points,
            remaining_secs: 0,
            response_secs: taken,
        }
    }

    #[test]
    fn test_outcome() {
        assert_eq!(outcome(10, 5), Outcome::Win);
        assert_eq!(outcome(5, 10), Outcome::Lose);
        assert_eq!(outcome(7, 7), Outcome::Draw);
    }

    #[test]
    fn test_summary_fields() {
        let mut player = PartyState::new("me");
        player.record(answer(0, Some(0), true, 15, 4));
        player.record(answer(1, Some(2), false, 0, 6));
        player.record(answer(2, None, false, 0, 10));
        let mut opponent = PartyState::new("them");
        opponent.record(answer(0, Some(0), true, 12, 5));

        let summary = summarize(&player, &opponent, &questions(&["Physics", "Physics", ""]));
        assert_eq!(summary.outcome, Outcome::Win);
        assert_eq!(summary.questions_answered, 2);
        assert_eq!(summary.correct_answers, 1);
        assert!((summary.accuracy - 1.0 / 3.0).abs() < 1e-9);
        assert!((summary.average_response_secs - 5.0).abs() < 1e-9);
        assert_eq!(summary.best_streak, 1);
        assert_eq!(summary.topics.len(), 1);
        assert_eq!(summary.topics["Physics"], TopicTally { correct: 1, total: 2 });
    }

    #[test]
    fn test_topic_tallies_count_timeouts_and_unreached() {
        let mut player = PartyState::new("me");
        player.record(answer(0, Some(0), true, 15, 2));
        player.record(answer(1, None, false, 0, 10));
        let opponent = PartyState::new("them");

        let summary = summarize(&player, &opponent, &questions(&["Calculus", "Chemistry", "Calculus"]));
        assert_eq!(summary.topics["Calculus"], TopicTally { correct: 1, total: 2 });
        assert_eq!(summary.topics["Chemistry"], TopicTally { correct: 0, total: 1 });
        assert!((summary.topics["Calculus"].accuracy() - 0.5).abs() < 1e-9);
        assert_eq!(TopicTally::default().accuracy(), 0.0);
    }

    #[test]
    fn test_empty_battle_has_zero_accuracy() {
        let player = PartyState::new("me");
        let opponent = PartyState::new("them");
        let summary = summarize(&player, &opponent, &[]);
        assert_eq!(summary.accuracy, 0.0);
        assert_eq!(summary.opponent_accuracy, 0.0);
        assert_eq!(summary.average_response_secs, 0.0);
        assert_eq!(summary.outcome, Outcome::Draw);
    }

    #[test]
    fn test_display() {
        let mut player = PartyState::new("me");
        for i in 0..3 {
            player.record(answer(i, Some(0), true, 15, 5));
        }
        let mut opponent = PartyState::new("them");
        opponent.record(answer(0, Some(0), true, 30, 2));

        let summary = summarize(&player, &opponent, &questions(&["Math"; 3]));
        insta::assert_snapshot!(summary.to_string(), @"Victory! 45 - 30 (100% accuracy, 3/3 answered)");
    }
}
