//! Configuration loading and typed config structures for Infiltration.
//!
//! The canonical configuration lives in `infiltration-config.yaml` at the
//! project root. This module defines strongly-typed structs that mirror the
//! YAML structure, a loader that reads the file, and [`GameConfig::validate`]
//! which rejects combinations a session cannot run with.

use std::path::Path;

use serde::Deserialize;

use infiltration_rules::{RatioTable, RewardTable, SuspicionThresholds, TaskTemplate, WinRules};
use infiltration_rules::zones::default_catalog;
use infiltration_types::TiePolicy;

use crate::runner::MIN_TICK_INTERVAL_MS;

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// The configuration parsed but cannot drive a session.
    #[error("invalid configuration: {reason}")]
    Invalid {
        /// Explanation of what is wrong with the configuration.
        reason: String,
    },
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}

/// Top-level session configuration.
///
/// Mirrors the structure of `infiltration-config.yaml`. All fields have
/// defaults matching the standard game.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct GameConfig {
    /// Roster bounds.
    #[serde(default)]
    pub lobby: LobbyConfig,

    /// Phase countdowns and ticker speed.
    #[serde(default)]
    pub timing: TimingConfig,

    /// Role ratio table.
    #[serde(default)]
    pub roles: RatioTable,

    /// Task board and task win threshold.
    #[serde(default)]
    pub tasks: TaskConfig,

    /// Voting rules.
    #[serde(default)]
    pub voting: VotingConfig,

    /// Sabotage limits.
    #[serde(default)]
    pub sabotage: SabotageConfig,

    /// Emergency meeting limits.
    #[serde(default)]
    pub emergency: EmergencyConfig,

    /// Movement rules.
    #[serde(default)]
    pub movement: MovementConfig,

    /// Suspicion heuristic thresholds.
    #[serde(default)]
    pub suspicion: SuspicionThresholds,

    /// Completion rewards.
    #[serde(default)]
    pub rewards: RewardTable,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Random seed for role assignment and tie breaks. Drawn from the OS
    /// when unset.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// Environment variables override YAML values:
    /// - `INFILTRATION_SEED` overrides `seed`
    /// - `INFILTRATION_TICK_INTERVAL_MS` overrides `timing.tick_interval_ms`
    /// - `INFILTRATION_LOG_LEVEL` overrides `logging.level`
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// Apply environment variable overrides.
    pub fn apply_env_overrides(&mut self) {
        if let Some(seed) = env_u64("INFILTRATION_SEED") {
            self.seed = Some(seed);
        }
        if let Some(ms) = env_u64("INFILTRATION_TICK_INTERVAL_MS") {
            self.timing.tick_interval_ms = ms;
        }
        if let Ok(level) = std::env::var("INFILTRATION_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Check the configuration can drive a session.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first problem found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let lobby = &self.lobby;
        if lobby.min_players == 0 || lobby.min_players > lobby.max_players {
            return Err(invalid(format!(
                "lobby bounds {}..={} are empty",
                lobby.min_players, lobby.max_players
            )));
        }
        for roster in [lobby.min_players, lobby.max_players] {
            self.roles
                .counts_for(roster)
                .map_err(|e| invalid(format!("roles for {roster} players: {e}")))?;
        }

        let timing = &self.timing;
        if timing.voting_call_remaining_secs >= timing.task_phase_secs {
            return Err(invalid(String::from(
                "voting_call_remaining_secs must be below task_phase_secs",
            )));
        }
        if timing.voting_secs == 0 || timing.emergency_voting_secs == 0 {
            return Err(invalid(String::from("voting countdowns must be at least 1s")));
        }
        if timing.tick_interval_ms < MIN_TICK_INTERVAL_MS {
            return Err(invalid(format!(
                "tick_interval_ms must be at least {MIN_TICK_INTERVAL_MS}"
            )));
        }

        let catalog = u32::try_from(self.tasks.catalog.len()).unwrap_or(u32::MAX);
        if self.tasks.tasks_to_win == 0 || self.tasks.tasks_to_win > catalog {
            return Err(invalid(format!(
                "tasks_to_win {} does not fit a board of {catalog} tasks",
                self.tasks.tasks_to_win
            )));
        }
        if self
            .sabotage
            .critical_sabotage_threshold
            .is_some_and(|n| n == 0 || n > self.sabotage.max_sabotages)
        {
            return Err(invalid(String::from(
                "critical_sabotage_threshold must be between 1 and max_sabotages",
            )));
        }
        Ok(())
    }

    /// The thresholds the win evaluator checks.
    pub const fn win_rules(&self) -> WinRules {
        WinRules {
            tasks_to_win: self.tasks.tasks_to_win,
            critical_sabotage_threshold: self.sabotage.critical_sabotage_threshold,
        }
    }
}

fn invalid(reason: String) -> ConfigError {
    ConfigError::Invalid { reason }
}

fn env_u64(key: &str) -> Option<u64> {
    std::env::var(key).ok().and_then(|v| v.parse().ok())
}

/// Roster bounds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LobbyConfig {
    /// Smallest roster that can start, and the connected quorum after start.
    #[serde(default = "default_min_players")]
    pub min_players: u32,

    /// Largest roster the lobby accepts.
    #[serde(default = "default_max_players")]
    pub max_players: u32,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            min_players: default_min_players(),
            max_players: default_max_players(),
        }
    }
}

/// Phase countdowns, in session-clock seconds.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TimingConfig {
    /// Task phase countdown length.
    #[serde(default = "default_task_phase_secs")]
    pub task_phase_secs: u64,

    /// Remaining task time at which voting is called.
    #[serde(default = "default_voting_call_remaining_secs")]
    pub voting_call_remaining_secs: u64,

    /// Voting countdown after the task countdown runs low.
    #[serde(default = "default_voting_secs")]
    pub voting_secs: u64,

    /// Voting countdown after an emergency meeting.
    #[serde(default = "default_emergency_voting_secs")]
    pub emergency_voting_secs: u64,

    /// How long the reveal is shown.
    #[serde(default = "default_reveal_secs")]
    pub reveal_secs: u64,

    /// Real-time milliseconds per session-clock second for the ticker.
    /// Must be at least [`MIN_TICK_INTERVAL_MS`].
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            task_phase_secs: default_task_phase_secs(),
            voting_call_remaining_secs: default_voting_call_remaining_secs(),
            voting_secs: default_voting_secs(),
            emergency_voting_secs: default_emergency_voting_secs(),
            reveal_secs: default_reveal_secs(),
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

/// Task board configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct TaskConfig {
    /// Genuine completions needed for a loyal win.
    #[serde(default = "default_tasks_to_win")]
    pub tasks_to_win: u32,

    /// Whether tasks and sabotages must happen in the player's zone.
    #[serde(default = "default_true")]
    pub require_zone_presence: bool,

    /// Tasks placed on every new board.
    #[serde(default = "default_catalog")]
    pub catalog: Vec<TaskTemplate>,
}

impl Default for TaskConfig {
    fn default() -> Self {
        Self {
            tasks_to_win: default_tasks_to_win(),
            require_zone_presence: true,
            catalog: default_catalog(),
        }
    }
}

/// Voting rules.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct VotingConfig {
    /// What a tied round does.
    #[serde(default)]
    pub tie_policy: TiePolicy,

    /// Whether a player may vote against themself.
    #[serde(default)]
    pub allow_self_vote: bool,

    /// Cut the voting countdown short once every living player has voted.
    #[serde(default)]
    pub end_voting_when_all_cast: bool,
}

/// Sabotage limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SabotageConfig {
    /// Sabotages allowed per session.
    #[serde(default = "default_max_sabotages")]
    pub max_sabotages: u32,

    /// Sabotage count that wins the game for the saboteurs.
    #[serde(default)]
    pub critical_sabotage_threshold: Option<u32>,
}

impl Default for SabotageConfig {
    fn default() -> Self {
        Self {
            max_sabotages: default_max_sabotages(),
            critical_sabotage_threshold: None,
        }
    }
}

/// Emergency meeting limits.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EmergencyConfig {
    /// Emergency meetings allowed per session.
    #[serde(default = "default_meetings_per_session")]
    pub meetings_per_session: u32,
}

impl Default for EmergencyConfig {
    fn default() -> Self {
        Self {
            meetings_per_session: default_meetings_per_session(),
        }
    }
}

/// Movement rules.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MovementConfig {
    /// Seconds a player must wait between moves.
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: u64,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of human-readable output.
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// ---------------------------------------------------------------------------
// Default value functions
// ---------------------------------------------------------------------------

const fn default_min_players() -> u32 {
    3
}

const fn default_max_players() -> u32 {
    12
}

const fn default_task_phase_secs() -> u64 {
    300
}

const fn default_voting_call_remaining_secs() -> u64 {
    120
}

const fn default_voting_secs() -> u64 {
    60
}

const fn default_emergency_voting_secs() -> u64 {
    90
}

const fn default_reveal_secs() -> u64 {
    5
}

const fn default_tick_interval_ms() -> u64 {
    1000
}

const fn default_tasks_to_win() -> u32 {
    8
}

const fn default_max_sabotages() -> u32 {
    3
}

const fn default_meetings_per_session() -> u32 {
    2
}

const fn default_cooldown_secs() -> u64 {
    2
}

fn default_log_level() -> String {
    "info".to_owned()
}

const fn default_true() -> bool {
    true
}
