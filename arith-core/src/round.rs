//! Round protocol handler. The host passes one inbound message, the current time and
//! a random source; the handler updates the ledger and returns the reply.
//!
//! Per player the state is either idle (no trial, or the latest trial is answered)
//! or open (the latest trial has no answer yet). Calls for one player must be serialized
//! by the host; different players never touch each other's trials.

use rand::Rng;
use serde_json::Value;

use crate::config::{AnswerPolicy, RoundConfig};
use crate::ledger::{PlayerId, TrialLedger};
use crate::protocol::{AnswerValue, Inbound, MalformedAnswer, MessageError, Outbound};
use crate::puzzle::PuzzleGenerator;
use crate::render::Renderer;

pub struct RoundHandler {
    config: RoundConfig,
    generator: PuzzleGenerator,
    renderer: Box<dyn Renderer>,
}

impl RoundHandler {
    pub fn new(config: RoundConfig, renderer: Box<dyn Renderer>) -> Self {
        Self {
            generator: PuzzleGenerator::new(config.testing),
            config,
            renderer,
        }
    }

    pub fn config(&self) -> &RoundConfig {
        &self.config
    }

    /// Validate a raw JSON message and handle it.
    pub fn handle_value<R: Rng + ?Sized>(
        &self,
        ledger: &mut TrialLedger,
        player: PlayerId,
        raw: &Value,
        now: f64,
        rng: &mut R,
    ) -> Result<Outbound, HandleError> {
        let msg = Inbound::try_from(raw.clone())?;
        self.handle(ledger, player, msg, now, rng)
    }

    pub fn handle<R: Rng + ?Sized>(
        &self,
        ledger: &mut TrialLedger,
        player: PlayerId,
        msg: Inbound,
        now: f64,
        rng: &mut R,
    ) -> Result<Outbound, HandleError> {
        match msg {
            Inbound::Next => self.on_next(ledger, player, now, rng),
            Inbound::Answer(value) => self.on_answer(ledger, player, &value),
        }
    }

    /// Issue the first or next puzzle, unless the previous one was issued too recently.
    fn on_next<R: Rng + ?Sized>(
        &self,
        ledger: &mut TrialLedger,
        player: PlayerId,
        now: f64,
        rng: &mut R,
    ) -> Result<Outbound, HandleError> {
        let latest = ledger.latest(player);
        if let Some(trial) = latest {
            let elapsed = now - trial.timestamp;
            if elapsed < self.config.trial_delay {
                tracing::warn!(%player, elapsed, "client is too fast");
                return Err(HandleError::TooFast {
                    elapsed,
                    trial_delay: self.config.trial_delay,
                });
            }
        }
        let iteration = latest.map(|t| t.iteration + 1).unwrap_or(1);

        let puzzle = self.generator.generate(rng);
        let image = self
            .renderer
            .render(&puzzle.text, Some(self.config.puzzle_color.as_str()));
        ledger.append(player, now, iteration, puzzle.text, puzzle.solution);
        tracing::debug!(%player, iteration, "puzzle issued");
        Ok(Outbound::Image(image))
    }

    /// Check the answer against the latest trial.
    fn on_answer(
        &self,
        ledger: &mut TrialLedger,
        player: PlayerId,
        value: &AnswerValue,
    ) -> Result<Outbound, HandleError> {
        let trial = ledger.latest_mut(player).ok_or(HandleError::NoOpenTrial)?;
        if trial.is_answered() && self.config.answer_policy == AnswerPolicy::Reject {
            return Err(HandleError::AlreadyAnswered {
                iteration: trial.iteration,
            });
        }
        let answer = value.parse().map_err(|e| {
            tracing::warn!(%player, iteration = trial.iteration, "bogus answer from client");
            HandleError::MalformedAnswer(e)
        })?;
        let is_correct = trial.record_answer(answer);
        tracing::debug!(%player, iteration = trial.iteration, is_correct, "answer recorded");
        Ok(Outbound::Feedback(is_correct))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum HandleError {
    #[error("client is too fast: {elapsed:.3}s since last puzzle, minimum {trial_delay}s")]
    TooFast { elapsed: f64, trial_delay: f64 },
    #[error("invalid message from client: {0}")]
    InvalidMessage(#[from] MessageError),
    #[error("answer received before any puzzle was issued")]
    NoOpenTrial,
    #[error("trial {iteration} already answered")]
    AlreadyAnswered { iteration: u32 },
    #[error("bogus answer from client: {0}")]
    MalformedAnswer(#[from] MalformedAnswer),
    #[error("unknown player")]
    UnknownPlayer,
    #[error("round is over")]
    RoundOver,
}
