//! Point values for battle answers.

use crate::models::{Difficulty, Question};

/// Points for a correct answer before any time bonus.
pub fn base_points(difficulty: Difficulty) -> u32 {
    match difficulty {
        Difficulty::Easy => 10,
        Difficulty::Medium => 20,
        Difficulty::Hard => 30,
    }
}

/// Speed bonus: half the remaining seconds, never more than the base points.
pub fn time_bonus(difficulty: Difficulty, remaining_secs: u32) -> u32 {
    (remaining_secs / 2).min(base_points(difficulty))
}

/// Points for a correct answer given the time left on the question.
pub fn points(difficulty: Difficulty, remaining_secs: u32) -> u32 {
    base_points(difficulty) + time_bonus(difficulty, remaining_secs)
}

/// Points for an answer of known correctness. Wrong answers score nothing.
pub fn score_answer(difficulty: Difficulty, remaining_secs: u32, correct: bool) -> u32 {
    if correct {
        points(difficulty, remaining_secs)
    } else {
        0
    }
}

/// Best possible score over a question list (instant correct answers).
pub fn max_score(questions: &[Question]) -> u32 {
    questions
        .iter()
        .map(|q| points(q.difficulty, q.time_limit_secs))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_base_points() {
        assert_eq!(base_points(Difficulty::Easy), 10);
        assert_eq!(base_points(Difficulty::Medium), 20);
        assert_eq!(base_points(Difficulty::Hard), 30);
    }

    #[test]
    fn test_time_bonus_floors() {
        assert_eq!(points(Difficulty::Easy, 10), 15);
        assert_eq!(points(Difficulty::Easy, 11), 15);
        assert_eq!(points(Difficulty::Easy, 1), 10);
        assert_eq!(points(Difficulty::Easy, 0), 10);
    }

    #[test]
    fn test_time_bonus_capped_by_base() {
        assert_eq!(time_bonus(Difficulty::Easy, 60), 10);
        assert_eq!(time_bonus(Difficulty::Hard, 60), 30);
        assert_eq!(points(Difficulty::Easy, 1000), 20);
    }

    #[test]
    fn test_wrong_answers_score_zero() {
        assert_eq!(score_answer(Difficulty::Hard, 30, false), 0);
        assert_eq!(score_answer(Difficulty::Hard, 30, true), 45);
    }

    #[test]
    fn test_max_score() {
        let questions = vec![
            Question::new("a", "A", ["1", "2", "3", "4"], 0).with_time_limit(10),
            Question::new("b", "B", ["1", "2", "3", "4"], 0)
                .with_difficulty(Difficulty::Hard)
                .with_time_limit(30),
        ];
        assert_eq!(max_score(&questions), 15 + 45);
        assert_eq!(max_score(&[]), 0);
    }

    proptest! {
        #[test]
        fn prop_points_deterministic(remaining in 0u32..600, pick in 0usize..3) {
            let difficulty = [Difficulty::Easy, Difficulty::Medium, Difficulty::Hard][pick];
            let first = points(difficulty, remaining);
            prop_assert_eq!(first, points(difficulty, remaining));
            prop_assert!(first >= base_points(difficulty));
            prop_assert!(first <= 2 * base_points(difficulty));
        }
    }
}
