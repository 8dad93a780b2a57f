//! Configuration for quiz battle.

use crate::battle::BattleSettings;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub battle: BattleConfig,
    #[serde(default)]
    pub opponent: OpponentConfig,
    #[serde(default)]
    pub player: PlayerConfig,
    #[serde(default)]
    pub display: DisplayConfig,
}

impl Config {
    pub fn load() -> Self {
        Self::config_path()
            .and_then(|p| std::fs::read_to_string(p).ok())
            .and_then(|s| toml::from_str(&s).ok())
            .unwrap_or_default()
    }

    pub fn save(&self) -> anyhow::Result<()> {
        if let Some(path) = Self::config_path() {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            let content = toml::to_string_pretty(self)?;
            std::fs::write(path, content)?;
        }
        Ok(())
    }

    fn project_dirs() -> Option<directories::ProjectDirs> {
        directories::ProjectDirs::from("", "", "quiz-battle")
    }

    pub fn config_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.config_dir().join("config.toml"))
    }

    pub fn db_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.data_dir().join("quiz-battle.db"))
    }

    pub fn log_path() -> Option<PathBuf> {
        Self::project_dirs().map(|d| d.data_dir().join("quiz-battle.log"))
    }

    pub fn to_battle_settings(&self) -> BattleSettings {
        BattleSettings {
            countdown_secs: self.battle.countdown_secs,
            reveal_delay: Duration::from_millis(self.battle.reveal_delay_ms),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BattleConfig {
    #[serde(default = "default_countdown")]
    pub countdown_secs: u32,
    #[serde(default = "default_reveal_delay")]
    pub reveal_delay_ms: u64,
    /// TOML question file replacing the built-in questions.
    #[serde(default)]
    pub question_bank: Option<PathBuf>,
    #[serde(default)]
    pub questions_per_battle: Option<usize>,
}

fn default_countdown() -> u32 { 3 }
fn default_reveal_delay() -> u64 { 2000 }

impl Default for BattleConfig {
    fn default() -> Self {
        Self {
            countdown_secs: 3,
            reveal_delay_ms: 2000,
            question_bank: None,
            questions_per_battle: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpponentConfig {
    #[serde(default = "default_opponent_name")]
    pub name: String,
    #[serde(default = "default_strategy")]
    pub strategy: String,
    #[serde(default = "default_accuracy")]
    pub accuracy: f64,
    #[serde(default = "default_delay_fraction")]
    pub max_delay_fraction: f64,
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_opponent_name() -> String { "sarah_chen".to_string() }
fn default_strategy() -> String { "simulated".to_string() }
fn default_accuracy() -> f64 { 0.7 }
fn default_delay_fraction() -> f64 { 0.8 }

impl Default for OpponentConfig {
    fn default() -> Self {
        Self {
            name: default_opponent_name(),
            strategy: default_strategy(),
            accuracy: 0.7,
            max_delay_fraction: 0.8,
            seed: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlayerConfig {
    #[serde(default = "default_player_name")]
    pub name: String,
}

fn default_player_name() -> String { "player".to_string() }

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            name: default_player_name(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayConfig {
    #[serde(default = "default_true")]
    pub show_opponent_progress: bool,
    #[serde(default = "default_true")]
    pub show_time_bonus: bool,
}

fn default_true() -> bool { true }

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            show_opponent_progress: true,
            show_time_bonus: true,
        }
    }
}
