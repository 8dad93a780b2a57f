//! Simulated opponents.

use crate::config::OpponentConfig;
use crate::models::Question;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;

/// A planned opponent answer for one question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpponentPlan {
    /// Option the opponent will pick.
    pub option: usize,
    /// Delay after the question starts.
    pub delay: Duration,
}

impl OpponentPlan {
    pub fn new(option: usize, delay: Duration) -> Self {
        Self { option, delay }
    }
}

/// Trait for opponent behaviour.
pub trait OpponentStrategy: Send {
    /// Strategy name.
    fn name(&self) -> &str;

    /// Decide the answer for a question. `None` means no answer.
    fn plan(&mut self, question: &Question) -> Option<OpponentPlan>;
}

/// Random opponent with a fixed chance of being right.
pub struct SimulatedOpponent {
    /// Probability of answering correctly.
    pub accuracy: f64,
    /// Answers land within this fraction of the time limit.
    pub max_delay_fraction: f64,
    rng: StdRng,
}

/// Accuracy used when the configured value is not a finite number.
const DEFAULT_ACCURACY: f64 = 0.7;

impl SimulatedOpponent {
    /// Create an opponent seeded from the OS.
    pub fn new(accuracy: f64, max_delay_fraction: f64) -> Self {
        Self::with_rng(accuracy, max_delay_fraction, StdRng::from_os_rng())
    }

    /// Create an opponent with a reproducible seed.
    pub fn seeded(accuracy: f64, max_delay_fraction: f64, seed: u64) -> Self {
        Self::with_rng(accuracy, max_delay_fraction, StdRng::seed_from_u64(seed))
    }

    fn with_rng(accuracy: f64, max_delay_fraction: f64, rng: StdRng) -> Self {
        let max_delay_fraction = if max_delay_fraction > 0.0 {
            max_delay_fraction.min(1.0)
        } else {
            1.0
        };
        let accuracy = if accuracy.is_finite() {
            accuracy.clamp(0.0, 1.0)
        } else {
            DEFAULT_ACCURACY
        };
        Self {
            accuracy,
            max_delay_fraction,
            rng,
        }
    }
}

impl Default for SimulatedOpponent {
    fn default() -> Self {
        Self::new(DEFAULT_ACCURACY, 0.8)
    }
}

impl OpponentStrategy for SimulatedOpponent {
    fn name(&self) -> &str {
        "simulated"
    }

    fn plan(&mut self, question: &Question) -> Option<OpponentPlan> {
        let option = if question.options.len() < 2 || self.rng.random_bool(self.accuracy) {
            question.correct_option
        } else {
            // Uniform over the wrong options.
            let pick = self.rng.random_range(0..question.options.len() - 1);
            if pick >= question.correct_option {
                pick + 1
            } else {
                pick
            }
        };

        let window_ms = (question.time_limit_secs as f64 * 1000.0 * self.max_delay_fraction) as u64;
        let delay_ms = if window_ms == 0 {
            0
        } else {
            self.rng.random_range(0..window_ms)
        };

        Some(OpponentPlan::new(option, Duration::from_millis(delay_ms)))
    }
}

/// Opponent that replays fixed plans in question order.
#[derive(Debug, Clone, Default)]
pub struct ScriptedOpponent {
    plans: VecDeque<Option<OpponentPlan>>,
}

impl ScriptedOpponent {
    pub fn new(plans: impl IntoIterator<Item = Option<OpponentPlan>>) -> Self {
        Self {
            plans: plans.into_iter().collect(),
        }
    }
}

impl OpponentStrategy for ScriptedOpponent {
    fn name(&self) -> &str {
        "scripted"
    }

    fn plan(&mut self, _question: &Question) -> Option<OpponentPlan> {
        self.plans.pop_front().flatten()
    }
}

/// Opponent that never answers.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentOpponent;

impl OpponentStrategy for SilentOpponent {
    fn name(&self) -> &str {
        "silent"
    }

    fn plan(&mut self, _question: &Question) -> Option<OpponentPlan> {
        None
    }
}

/// Get strategy by name.
pub fn get_strategy(name: &str, config: &OpponentConfig) -> Box<dyn OpponentStrategy> {
    match name.to_lowercase().as_str() {
        "silent" | "none" => Box::new(SilentOpponent),
        _ => match config.seed {
            Some(seed) => Box::new(SimulatedOpponent::seeded(
                config.accuracy,
                config.max_delay_fraction,
                seed,
            )),
            None => Box::new(SimulatedOpponent::new(config.accuracy, config.max_delay_fraction)),
        },
    }
}
