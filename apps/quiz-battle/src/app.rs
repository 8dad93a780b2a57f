//! Application state and logic.

use crate::adaptive::{recommend, DifficultyLevel, Performance, Recommendation};
use crate::bank::QuestionBank;
use crate::battle::{BattleEngine, BattleEvent};
use crate::clock::{Clock, SystemClock, TickDriver};
use crate::config::Config;
use crate::db::{Database, DbResult, UserProfile};
use crate::models::{Phase, OPTION_COUNT};
use crate::opponent::get_strategy;
use crate::summary::ResultSummary;
use crossterm::event::{KeyCode, KeyEvent};
use tracing::{info, warn};

pub struct App {
    pub db: Database,
    pub config: Config,
    pub bank: QuestionBank,
    pub profile: UserProfile,
    pub view: View,
    pub battle: Option<BattleEngine>,
    pub last_summary: Option<ResultSummary>,
    pub recommendation: Option<Recommendation>,
    pub selected_option: usize,
    pub message: Option<String>,
    pub show_help: bool,
    pub focus: Focus,
    driver: TickDriver<Box<dyn Clock>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Lobby,
    Battle,
    Results,
}

/// Which questions the next battle draws from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Focus {
    #[default]
    All,
    WeakTopics,
}

impl Focus {
    pub fn name(&self) -> &'static str {
        match self {
            Self::All => "All topics",
            Self::WeakTopics => "Weak topics",
        }
    }
}

impl App {
    pub fn new() -> anyhow::Result<Self> {
        let config = Config::load();
        if Config::config_path().is_some_and(|p| !p.exists()) {
            if let Err(err) = config.save() {
                warn!(error = %err, "failed to write default config");
            }
        }
        let db_path = Config::db_path().unwrap_or_else(|| "quiz-battle.db".into());
        if let Some(parent) = db_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let db = Database::open(&db_path)?;

        let mut message = None;
        let bank = match &config.battle.question_bank {
            Some(path) => match QuestionBank::load(path) {
                Ok(bank) => bank,
                Err(err) => {
                    warn!(path = %path.display(), error = %err, "falling back to built-in questions");
                    message = Some(format!("Question file error: {}", err));
                    QuestionBank::builtin()
                }
            },
            None => QuestionBank::builtin(),
        };

        let mut app = Self::with_parts(config, db, bank, Box::new(SystemClock::new()))?;
        app.message = message;
        Ok(app)
    }

    /// Build an app from explicit parts.
    pub fn with_parts(
        config: Config,
        db: Database,
        bank: QuestionBank,
        clock: Box<dyn Clock>,
    ) -> DbResult<Self> {
        let profile = db.load_profile(&config.player.name)?;
        Ok(Self {
            db,
            config,
            bank,
            profile,
            view: View::Lobby,
            battle: None,
            last_summary: None,
            recommendation: None,
            selected_option: 0,
            message: None,
            show_help: false,
            focus: Focus::default(),
            driver: TickDriver::new(clock),
        })
    }

    pub fn can_quit(&self) -> bool {
        self.battle.is_none()
    }

    /// Feed elapsed time to the running battle.
    pub fn tick(&mut self) {
        let elapsed = self.driver.elapsed();
        let Some(battle) = &mut self.battle else {
            return;
        };
        let events = battle.advance(elapsed);
        for event in events {
            self.on_event(event);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if self.show_help {
            self.show_help = false;
            return;
        }

        match self.view {
            View::Lobby => self.handle_lobby_key(key),
            View::Battle => self.handle_battle_key(key),
            View::Results => self.handle_results_key(key),
        }
    }

    fn handle_lobby_key(&mut self, key: KeyEvent) {
        self.message = None;
        match key.code {
            KeyCode::Enter | KeyCode::Char(' ') => self.start_battle(),
            KeyCode::Char('d') => {
                let level = DifficultyLevel::cycle(self.profile.preferred_level);
                self.set_level(level);
            }
            KeyCode::Char('r') => self.apply_recommendation(),
            KeyCode::Char('w') => self.toggle_focus(),
            KeyCode::Char('?') => self.show_help = true,
            _ => {}
        }
    }

    fn handle_battle_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char(c @ '1'..='4') => self.answer(c as usize - '1' as usize),
            KeyCode::Char(c @ 'a'..='d') => self.answer(c as usize - 'a' as usize),
            KeyCode::Char('j') | KeyCode::Down => {
                self.selected_option = (self.selected_option + 1).min(OPTION_COUNT - 1);
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.selected_option = self.selected_option.saturating_sub(1);
            }
            KeyCode::Enter | KeyCode::Char(' ') => self.answer(self.selected_option),
            KeyCode::Esc => self.abandon_battle(),
            _ => {}
        }
    }

    fn handle_results_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Enter | KeyCode::Esc | KeyCode::Char(' ') => self.finish_battle(),
            KeyCode::Char('r') => {
                self.finish_battle();
                self.apply_recommendation();
            }
            _ => {}
        }
    }

    fn set_level(&mut self, level: Option<DifficultyLevel>) {
        self.profile.preferred_level = level;
        if let Err(err) = self.db.save_profile(&self.profile) {
            warn!(error = %err, "failed to save profile");
        }
        self.message = Some(format!(
            "Difficulty: {}",
            level.map(|l| l.name()).unwrap_or("Any")
        ));
    }

    fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::All => Focus::WeakTopics,
            Focus::WeakTopics => Focus::All,
        };
        self.message = Some(match self.focus {
            Focus::WeakTopics if self.profile.weak_topics().is_empty() => {
                "Focus: Weak topics (none yet, using all topics)".to_string()
            }
            focus => format!("Focus: {}", focus.name()),
        });
    }

    fn apply_recommendation(&mut self) {
        if let Some(level) = self.recommendation.as_ref().map(|r| r.level) {
            self.set_level(Some(level));
        }
    }

    pub fn start_battle(&mut self) {
        let weak_topics = match self.focus {
            Focus::All => Vec::new(),
            Focus::WeakTopics => self.profile.weak_topics(),
        };
        let questions = self.bank.select(
            self.profile.preferred_level,
            &weak_topics,
            self.config.battle.questions_per_battle,
        );
        let strategy = get_strategy(&self.config.opponent.strategy, &self.config.opponent);
        let battle = BattleEngine::new(
            self.config.to_battle_settings(),
            questions,
            self.profile.username.clone(),
            self.config.opponent.name.clone(),
            strategy,
        );

        self.battle = Some(battle);
        self.driver.reset();
        self.selected_option = 0;
        self.message = None;
        self.view = if self.battle.as_ref().is_some_and(|b| b.is_complete()) {
            View::Results
        } else {
            View::Battle
        };
    }

    fn answer(&mut self, option: usize) {
        let Some(battle) = &mut self.battle else {
            return;
        };
        if let Some(event) = battle.submit_answer(option) {
            self.on_event(event);
        }
    }

    fn on_event(&mut self, event: BattleEvent) {
        match event {
            BattleEvent::PlayerAnswered(record) => {
                self.message = Some(if record.correct {
                    format!("Correct! +{} points", record.points)
                } else {
                    format!("Incorrect. The answer was {}", self.correct_text())
                });
            }
            BattleEvent::PlayerTimedOut(_) => {
                self.message = Some(format!("Time's up! The answer was {}", self.correct_text()));
            }
            BattleEvent::NextQuestion(_) => {
                self.message = None;
                self.selected_option = 0;
            }
            BattleEvent::Completed(_) => {
                self.message = None;
                self.view = View::Results;
            }
            BattleEvent::CountdownTick(_)
            | BattleEvent::BattleStarted
            | BattleEvent::OpponentAnswered(_) => {}
        }
    }

    fn correct_text(&self) -> String {
        self.battle
            .as_ref()
            .and_then(|b| b.current_question())
            .map(|q| q.correct_text().to_string())
            .unwrap_or_default()
    }

    /// Acknowledge the results: record them once and return to the lobby.
    pub fn finish_battle(&mut self) {
        let Some(battle) = &mut self.battle else {
            self.view = View::Lobby;
            return;
        };
        if battle.phase() != Phase::Complete {
            return;
        }

        if let Some(summary) = battle.acknowledge() {
            self.on_battle_end(summary);
        }
        self.battle = None;
        self.view = View::Lobby;
    }

    fn on_battle_end(&mut self, summary: ResultSummary) {
        info!(outcome = summary.outcome.as_str(), score = summary.player_score, "battle acknowledged");
        if let Err(err) = self.db.record_battle(&mut self.profile, &summary) {
            warn!(error = %err, "failed to record battle");
            self.message = Some(format!("Could not save result: {}", err));
        }
        let perf = Performance::from_battle(&summary, &self.profile);
        self.recommendation = Some(recommend(&perf));
        self.last_summary = Some(summary);
    }

    fn abandon_battle(&mut self) {
        if self.battle.take().is_some() {
            info!("battle abandoned");
            self.message = Some("Battle abandoned".to_string());
        }
        self.view = View::Lobby;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::models::Outcome;
    use crossterm::event::KeyModifiers;
    use std::time::Duration;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn test_app() -> (App, ManualClock) {
        let mut config = Config::default();
        config.opponent.strategy = "silent".to_string();
        config.player.name = "tester".to_string();
        let clock = ManualClock::new();
        let app = App::with_parts(
            config,
            Database::in_memory().unwrap(),
            QuestionBank::builtin(),
            Box::new(clock.clone()),
        )
        .unwrap();
        (app, clock)
    }

    fn run_for(app: &mut App, clock: &ManualClock, secs: u64) {
        for _ in 0..secs * 10 {
            clock.advance(Duration::from_millis(100));
            app.tick();
        }
    }

    #[test]
    fn test_full_battle_records_profile_once() {
        let (mut app, clock) = test_app();
        assert_eq!(app.profile.username, "tester");

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Battle);
        assert!(!app.can_quit());

        run_for(&mut app, &clock, 3);
        let correct = app.battle.as_ref().unwrap().current_question().unwrap().correct_option;
        app.handle_key(key(KeyCode::Char((b'1' + correct as u8) as char)));
        assert!(app.message.as_deref().unwrap().starts_with("Correct!"));

        run_for(&mut app, &clock, 200);
        assert_eq!(app.view, View::Results);

        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.view, View::Lobby);
        assert!(app.battle.is_none());
        assert_eq!(app.profile.battles, 1);
        assert_eq!(app.profile.wins, 1);
        assert_eq!(app.last_summary.as_ref().unwrap().outcome, Outcome::Win);
        assert!(app.recommendation.is_some());

        app.handle_key(key(KeyCode::Enter));
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.db.get_profile().unwrap().unwrap().battles, 1);
    }

    #[test]
    fn test_results_key_applies_recommendation() {
        let (mut app, clock) = test_app();
        app.start_battle();
        run_for(&mut app, &clock, 200);
        assert_eq!(app.view, View::Results);

        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.view, View::Lobby);
        assert_eq!(app.profile.battles, 1);
        assert_eq!(app.recommendation.as_ref().unwrap().level, DifficultyLevel::Easy);
        assert_eq!(app.profile.preferred_level, Some(DifficultyLevel::Easy));
        let stored = app.db.get_profile().unwrap().unwrap();
        assert_eq!(stored.preferred_level, Some(DifficultyLevel::Easy));
    }

    #[test]
    fn test_results_ignored_before_completion() {
        let (mut app, clock) = test_app();
        app.start_battle();
        run_for(&mut app, &clock, 4);
        app.finish_battle();
        assert_eq!(app.view, View::Battle);
        assert!(app.battle.is_some());
    }

    #[test]
    fn test_abandon_discards_battle() {
        let (mut app, clock) = test_app();
        app.start_battle();
        run_for(&mut app, &clock, 5);
        app.handle_key(key(KeyCode::Esc));
        assert_eq!(app.view, View::Lobby);
        assert!(app.battle.is_none());
        assert_eq!(app.profile.battles, 0);
        assert!(app.can_quit());
    }

    #[test]
    fn test_timeout_message() {
        let (mut app, clock) = test_app();
        app.start_battle();
        run_for(&mut app, &clock, 3 + 15);
        assert_eq!(app.message.as_deref(), Some("Time's up! The answer was 2x"));
    }

    #[test]
    fn test_difficulty_cycle_and_apply() {
        let (mut app, _clock) = test_app();
        app.handle_key(key(KeyCode::Char('d')));
        assert_eq!(app.profile.preferred_level, Some(DifficultyLevel::Easy));

        app.start_battle();
        let questions = &app.battle.as_ref().unwrap().session().questions;
        assert_eq!(questions.len(), 2);
        app.handle_key(key(KeyCode::Esc));

        app.recommendation = Some(Recommendation {
            level: DifficultyLevel::Hard,
            reason: "test",
        });
        app.handle_key(key(KeyCode::Char('r')));
        assert_eq!(app.profile.preferred_level, Some(DifficultyLevel::Hard));
        let stored = app.db.get_profile().unwrap().unwrap();
        assert_eq!(stored.preferred_level, Some(DifficultyLevel::Hard));
    }

    #[test]
    fn test_weak_topic_focus() {
        let (mut app, _clock) = test_app();
        app.handle_key(key(KeyCode::Char('w')));
        assert_eq!(app.focus, Focus::WeakTopics);
        assert!(app.message.as_deref().unwrap().contains("none yet"));
        app.start_battle();
        assert_eq!(app.battle.as_ref().unwrap().session().questions.len(), 5);
        app.handle_key(key(KeyCode::Esc));

        app.profile.topic_stats.insert(
            "Chemistry".to_string(),
            crate::summary::TopicTally { correct: 0, total: 2 },
        );
        app.start_battle();
        let questions = &app.battle.as_ref().unwrap().session().questions;
        assert_eq!(questions.len(), 1);
        assert_eq!(questions[0].topic, "Chemistry");
        app.handle_key(key(KeyCode::Esc));

        app.handle_key(key(KeyCode::Char('w')));
        assert_eq!(app.focus, Focus::All);
        assert_eq!(app.message.as_deref(), Some("Focus: All topics"));
    }

    #[test]
    fn test_battle_topics_fold_into_profile() {
        let (mut app, clock) = test_app();
        app.start_battle();
        run_for(&mut app, &clock, 200);
        app.handle_key(key(KeyCode::Enter));
        assert_eq!(app.profile.topic_stats["Physics"].total, 2);
        assert_eq!(app.profile.topic_stats["Physics"].correct, 0);
        assert_eq!(app.profile.weak_topics().len(), 3);
    }

    #[test]
    fn test_help_swallows_key() {
        let (mut app, _clock) = test_app();
        app.handle_key(key(KeyCode::Char('?')));
        assert!(app.show_help);
        app.handle_key(key(KeyCode::Enter));
        assert!(!app.show_help);
        assert_eq!(app.view, View::Lobby);
    }
}
