//! Battle state machine.
//!
//! A battle runs `Countdown -> InProgress -> Complete`. All timing is virtual:
//! the host calls [`BattleEngine::advance`] with elapsed wall time and the engine
//! consumes it deadline by deadline (whole-second ticks, the opponent's answer,
//! the reveal pause), so coarse and fine-grained advancing give the same result.

use crate::models::{AnswerRecord, Outcome, PartyState, Phase, Question};
use crate::opponent::OpponentStrategy;
use crate::scoring;
use crate::summary::{self, ResultSummary};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};

const SECOND: Duration = Duration::from_secs(1);

/// Engine timing settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BattleSettings {
    /// Seconds counted down before the first question.
    pub countdown_secs: u32,
    /// Pause after the player's resolution before moving on.
    pub reveal_delay: Duration,
}

impl Default for BattleSettings {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            reveal_delay: Duration::from_millis(2000),
        }
    }
}

/// Something that happened while the engine ran.
#[derive(Debug, Clone, PartialEq)]
pub enum BattleEvent {
    CountdownTick(u32),
    BattleStarted,
    PlayerAnswered(AnswerRecord),
    PlayerTimedOut(AnswerRecord),
    OpponentAnswered(AnswerRecord),
    NextQuestion(usize),
    Completed(ResultSummary),
}

/// Opponent answer waiting for its delay to elapse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PendingAnswer {
    question_index: usize,
    option: usize,
    due_in: Duration,
}

/// Complete battle state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BattleSession {
    pub phase: Phase,
    pub questions: Vec<Question>,
    pub current_question_index: usize,
    pub countdown_remaining: u32,
    pub question_time_remaining: u32,
    pub player: PartyState,
    pub opponent: PartyState,
    /// Time since the last whole-second tick.
    since_tick: Duration,
    pending_opponent: Option<PendingAnswer>,
    reveal_remaining: Option<Duration>,
    summary: Option<ResultSummary>,
    acknowledged: bool,
}

impl BattleSession {
    fn new(questions: Vec<Question>, player: PartyState, opponent: PartyState, countdown: u32) -> Self {
        Self {
            phase: Phase::Countdown,
            questions,
            current_question_index: 0,
            countdown_remaining: countdown,
            question_time_remaining: 0,
            player,
            opponent,
            since_tick: Duration::ZERO,
            pending_opponent: None,
            reveal_remaining: None,
            summary: None,
            acknowledged: false,
        }
    }

    /// The question being asked, if any.
    pub fn current_question(&self) -> Option<&Question> {
        match self.phase {
            Phase::Countdown => None,
            _ => self.questions.get(self.current_question_index),
        }
    }

    /// Whether the player's answer for the current question is settled.
    pub fn player_resolved(&self) -> bool {
        self.player.has_answered(self.current_question_index)
    }

    /// Whether the correct answer is being shown.
    pub fn revealing(&self) -> bool {
        self.reveal_remaining.is_some()
    }

    /// Whether the opponent has answered the current question.
    pub fn opponent_resolved(&self) -> bool {
        self.opponent.has_answered(self.current_question_index)
    }

    /// Final summary once complete.
    pub fn summary(&self) -> Option<&ResultSummary> {
        self.summary.as_ref()
    }
}

/// Drives a [`BattleSession`] with an opponent strategy.
pub struct BattleEngine {
    session: BattleSession,
    settings: BattleSettings,
    strategy: Box<dyn OpponentStrategy>,
}

impl BattleEngine {
    /// Create a battle in the countdown phase.
    pub fn new(
        settings: BattleSettings,
        questions: Vec<Question>,
        player_name: impl Into<String>,
        opponent_name: impl Into<String>,
        strategy: Box<dyn OpponentStrategy>,
    ) -> Self {
        let session = BattleSession::new(
            questions,
            PartyState::new(player_name),
            PartyState::new(opponent_name),
            settings.countdown_secs,
        );
        let mut engine = Self {
            session,
            settings,
            strategy,
        };

        info!(
            questions = engine.session.questions.len(),
            opponent = %engine.session.opponent.display_name,
            strategy = engine.strategy.name(),
            "battle created"
        );

        if settings.countdown_secs == 0 {
            let mut events = Vec::new();
            engine.start_battle(&mut events);
        }
        engine
    }

    pub fn session(&self) -> &BattleSession {
        &self.session
    }

    pub fn settings(&self) -> &BattleSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.session.phase
    }

    pub fn is_complete(&self) -> bool {
        self.session.phase == Phase::Complete
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.session.current_question()
    }

    /// Move virtual time forward and return what happened, in order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<BattleEvent> {
        let mut events = Vec::new();
        let mut budget = elapsed;

        while self.session.phase != Phase::Complete {
            let Some(step) = self.next_deadline() else {
                break;
            };
            if step > budget {
                self.elapse(budget);
                break;
            }
            self.elapse(step);
            budget -= step;
            self.fire_due(&mut events);
        }

        events
    }

    /// Submit the player's answer for the current question.
    ///
    /// Ignored outside `InProgress`, after the question is resolved, or for an
    /// option the question does not have.
    pub fn submit_answer(&mut self, option: usize) -> Option<BattleEvent> {
        if self.session.phase != Phase::InProgress {
            return None;
        }
        let index = self.session.current_question_index;
        let question = self.session.questions.get(index)?;
        if option >= question.options.len() || self.session.player.has_answered(index) {
            debug!(index, option, "answer ignored");
            return None;
        }

        let remaining = self.session.question_time_remaining;
        let correct = question.is_correct(option);
        let record = AnswerRecord {
            question_index: index,
            choice: Some(option),
            correct,
            points: scoring::score_answer(question.difficulty, remaining, correct),
            remaining_secs: remaining,
            response_secs: question.time_limit_secs.saturating_sub(remaining),
        };

        self.session.player.record(record.clone());
        self.session.reveal_remaining = Some(self.settings.reveal_delay);
        debug!(index, option, correct, points = record.points, "player answered");
        Some(BattleEvent::PlayerAnswered(record))
    }

    /// Hand over the final summary. Returns `Some` exactly once, after completion.
    pub fn acknowledge(&mut self) -> Option<ResultSummary> {
        if self.session.phase != Phase::Complete || self.session.acknowledged {
            return None;
        }
        self.session.acknowledged = true;
        self.session.summary.clone()
    }

    fn second_timer_active(&self) -> bool {
        match self.session.phase {
            Phase::Countdown => true,
            Phase::InProgress => !self.session.player_resolved(),
            Phase::Complete => false,
        }
    }

    fn next_deadline(&self) -> Option<Duration> {
        let tick = self
            .second_timer_active()
            .then(|| SECOND.saturating_sub(self.session.since_tick));
        let opponent = self.session.pending_opponent.as_ref().map(|p| p.due_in);

        [tick, opponent, self.session.reveal_remaining]
            .into_iter()
            .flatten()
            .min()
    }

    fn elapse(&mut self, by: Duration) {
        if self.second_timer_active() {
            self.session.since_tick += by;
        }
        if let Some(pending) = &mut self.session.pending_opponent {
            pending.due_in = pending.due_in.saturating_sub(by);
        }
        if let Some(reveal) = &mut self.session.reveal_remaining {
            *reveal = reveal.saturating_sub(by);
        }
    }

    fn fire_due(&mut self, events: &mut Vec<BattleEvent>) {
        if self
            .session
            .pending_opponent
            .as_ref()
            .is_some_and(|p| p.due_in.is_zero())
        {
            if let Some(pending) = self.session.pending_opponent.take() {
                self.resolve_opponent(pending, events);
            }
        }

        if self.second_timer_active() && self.session.since_tick >= SECOND {
            self.session.since_tick = Duration::ZERO;
            self.on_second(events);
        }

        if self.session.reveal_remaining.is_some_and(|r| r.is_zero()) {
            self.session.reveal_remaining = None;
            self.next_question(events);
        }
    }

    fn on_second(&mut self, events: &mut Vec<BattleEvent>) {
        match self.session.phase {
            Phase::Countdown => {
                self.session.countdown_remaining = self.session.countdown_remaining.saturating_sub(1);
                events.push(BattleEvent::CountdownTick(self.session.countdown_remaining));
                if self.session.countdown_remaining == 0 {
                    self.start_battle(events);
                }
            }
            Phase::InProgress => {
                self.session.question_time_remaining = self.session.question_time_remaining.saturating_sub(1);
                if self.session.question_time_remaining == 0 {
                    self.resolve_timeout(events);
                }
            }
            Phase::Complete => {}
        }
    }

    fn start_battle(&mut self, events: &mut Vec<BattleEvent>) {
        if self.session.phase != Phase::Countdown {
            return;
        }
        self.session.phase = Phase::InProgress;
        self.session.countdown_remaining = 0;
        events.push(BattleEvent::BattleStarted);
        info!("battle started");

        if self.session.questions.is_empty() {
            self.complete(events);
        } else {
            self.begin_question(0, events);
        }
    }

    fn begin_question(&mut self, index: usize, events: &mut Vec<BattleEvent>) {
        let Some(question) = self.session.questions.get(index) else {
            return;
        };
        let limit = question.time_limit_secs;
        let plan = self.strategy.plan(question);

        self.session.current_question_index = index;
        self.session.question_time_remaining = limit;
        self.session.since_tick = Duration::ZERO;
        self.session.reveal_remaining = None;
        self.session.pending_opponent = plan.map(|p| PendingAnswer {
            question_index: index,
            option: p.option,
            due_in: p.delay,
        });
        debug!(index, limit, opponent_plan = ?plan, "question started");

        if index > 0 {
            events.push(BattleEvent::NextQuestion(index));
        }
        if limit == 0 {
            self.resolve_timeout(events);
        }
    }

    fn resolve_timeout(&mut self, events: &mut Vec<BattleEvent>) {
        let index = self.session.current_question_index;
        if self.session.phase != Phase::InProgress || self.session.player.has_answered(index) {
            return;
        }
        let Some(question) = self.session.questions.get(index) else {
            return;
        };

        let record = AnswerRecord {
            question_index: index,
            choice: None,
            correct: false,
            points: 0,
            remaining_secs: 0,
            response_secs: question.time_limit_secs,
        };
        self.session.player.record(record.clone());
        self.session.reveal_remaining = Some(self.settings.reveal_delay);
        debug!(index, "player timed out");
        events.push(BattleEvent::PlayerTimedOut(record));
    }

    fn resolve_opponent(&mut self, pending: PendingAnswer, events: &mut Vec<BattleEvent>) {
        let index = self.session.current_question_index;
        if self.session.phase != Phase::InProgress
            || pending.question_index != index
            || self.session.opponent.has_answered(index)
        {
            debug!(stale = pending.question_index, current = index, "opponent answer dropped");
            return;
        }
        let Some(question) = self.session.questions.get(index) else {
            return;
        };

        let remaining = self.session.question_time_remaining;
        let correct = question.is_correct(pending.option);
        let record = AnswerRecord {
            question_index: index,
            choice: Some(pending.option),
            correct,
            points: scoring::score_answer(question.difficulty, remaining, correct),
            remaining_secs: remaining,
            response_secs: question.time_limit_secs.saturating_sub(remaining),
        };
        self.session.opponent.record(record.clone());
        debug!(index, option = pending.option, correct, "opponent answered");
        events.push(BattleEvent::OpponentAnswered(record));
    }

    fn next_question(&mut self, events: &mut Vec<BattleEvent>) {
        let next = self.session.current_question_index + 1;
        if next < self.session.questions.len() {
            self.begin_question(next, events);
        } else {
            self.complete(events);
        }
    }

    fn complete(&mut self, events: &mut Vec<BattleEvent>) {
        if self.session.phase == Phase::Complete {
            return;
        }
        self.session.phase = Phase::Complete;
        self.session.pending_opponent = None;
        self.session.reveal_remaining = None;

        let result = summary::summarize(
            &self.session.player,
            &self.session.opponent,
            &self.session.questions,
        );
        info!(
            outcome = result.outcome.as_str(),
            player = result.player_score,
            opponent = result.opponent_score,
            "battle complete"
        );
        self.session.summary = Some(result.clone());
        events.push(BattleEvent::Completed(result));
    }
}
