//! Round configuration. Every option has a default so a missing key never fails.

use serde::{Deserialize, Serialize};

/// Minimum interval between two puzzle requests, in seconds.
pub const DEFAULT_TRIAL_DELAY: f64 = 1.0;

/// Round length in seconds (one minute).
pub const DEFAULT_ROUND_SECONDS: f64 = 60.0;

pub const DEFAULT_PUZZLE_COLOR: &str = "white";

/// What to do with a second answer for the same trial.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnswerPolicy {
    /// Replace the previous answer and correctness flag.
    #[default]
    Overwrite,
    /// Refuse the second answer; the trial keeps its first one.
    Reject,
}

/// Options consumed by the round handler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RoundConfig {
    /// Deterministic puzzles for automated testing.
    #[serde(default)]
    pub testing: bool,
    #[serde(default = "default_trial_delay")]
    pub trial_delay: f64,
    /// Advisory for the client UI; unanswered trials are always tolerated.
    #[serde(default)]
    pub allow_skip: bool,
    #[serde(default = "default_round_seconds")]
    pub round_seconds: f64,
    #[serde(default)]
    pub answer_policy: AnswerPolicy,
    #[serde(default = "default_puzzle_color")]
    pub puzzle_color: String,
}

fn default_trial_delay() -> f64 {
    DEFAULT_TRIAL_DELAY
}
fn default_round_seconds() -> f64 {
    DEFAULT_ROUND_SECONDS
}
fn default_puzzle_color() -> String {
    DEFAULT_PUZZLE_COLOR.to_string()
}

impl Default for RoundConfig {
    fn default() -> Self {
        Self {
            testing: false,
            trial_delay: default_trial_delay(),
            allow_skip: false,
            round_seconds: default_round_seconds(),
            answer_policy: AnswerPolicy::default(),
            puzzle_color: default_puzzle_color(),
        }
    }
}

impl RoundConfig {
    /// Config with deterministic puzzles, otherwise defaults.
    pub fn testing() -> Self {
        Self {
            testing: true,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.trial_delay.is_finite() || self.trial_delay < 0.0 {
            return Err(ConfigError::TrialDelay(self.trial_delay));
        }
        if !self.round_seconds.is_finite() || self.round_seconds <= 0.0 {
            return Err(ConfigError::RoundSeconds(self.round_seconds));
        }
        Ok(())
    }

    /// Variables the client UI needs to pace itself.
    pub fn client_vars(&self) -> ClientVars {
        ClientVars {
            trial_delay: self.trial_delay,
            allow_skip: self.allow_skip,
            round_seconds: self.round_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientVars {
    pub trial_delay: f64,
    pub allow_skip: bool,
    pub round_seconds: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("trial_delay must be a non-negative number of seconds, got {0}")]
    TrialDelay(f64),
    #[error("round_seconds must be a positive number of seconds, got {0}")]
    RoundSeconds(f64),
}
