//! Per-session store: players, their trials, the round handler and the random source.
//! Built at session start and passed (behind the host's lock) to every message.

use std::collections::HashMap;
use std::io;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use serde_json::Value;

use crate::aggregate::{self, Summary};
use crate::config::{ConfigError, RoundConfig};
use crate::export;
use crate::ledger::{PlayerId, TrialLedger};
use crate::protocol::Outbound;
use crate::render::Renderer;
use crate::round::{HandleError, RoundHandler};

/// A participant in one round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Player {
    pub id: PlayerId,
    pub participant_code: String,
    /// Time of first join, seconds since the Unix epoch.
    pub started_at: f64,
    pub total: u32,
    pub answered: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub payoff: i64,
    pub round_over: bool,
}

impl Player {
    pub fn new(id: PlayerId, participant_code: String, started_at: f64) -> Self {
        Self {
            id,
            participant_code,
            started_at,
            total: 0,
            answered: 0,
            correct: 0,
            incorrect: 0,
            payoff: 0,
            round_over: false,
        }
    }

    fn apply(&mut self, summary: Summary) {
        self.total = summary.total;
        self.answered = summary.answered;
        self.correct = summary.correct;
        self.incorrect = summary.incorrect;
        self.payoff = summary.payoff();
    }
}

pub struct Session {
    code: String,
    handler: RoundHandler,
    ledger: TrialLedger,
    players: Vec<Player>,
    by_code: HashMap<String, PlayerId>,
    rng: StdRng,
}

impl Session {
    pub fn new(
        code: String,
        config: RoundConfig,
        renderer: Box<dyn Renderer>,
    ) -> Result<Self, ConfigError> {
        Self::with_rng(code, config, renderer, StdRng::from_entropy())
    }

    /// Like `new` with a caller-supplied random source (seeded in tests).
    pub fn with_rng(
        code: String,
        config: RoundConfig,
        renderer: Box<dyn Renderer>,
        rng: StdRng,
    ) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self {
            code,
            handler: RoundHandler::new(config, renderer),
            ledger: TrialLedger::new(),
            players: Vec::new(),
            by_code: HashMap::new(),
            rng,
        })
    }

    /// Short random session code.
    pub fn generate_code() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        id[..8].to_string()
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn config(&self) -> &RoundConfig {
        self.handler.config()
    }

    pub fn ledger(&self) -> &TrialLedger {
        &self.ledger
    }

    /// Players in join order.
    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.index(id).map(|i| &self.players[i])
    }

    /// Register a participant; rejoining with the same code returns the same id.
    pub fn join(&mut self, participant_code: &str, now: f64) -> Result<PlayerId, SessionError> {
        let code = participant_code.trim();
        if code.is_empty() {
            return Err(SessionError::EmptyParticipantCode);
        }
        if let Some(&id) = self.by_code.get(code) {
            return Ok(id);
        }
        let id = PlayerId(self.players.len() as u32 + 1);
        self.players.push(Player::new(id, code.to_string(), now));
        self.by_code.insert(code.to_string(), id);
        tracing::info!(session = %self.code, player = %id, participant = code, "player joined");
        Ok(id)
    }

    /// Handle one raw inbound message for `player`.
    pub fn on_message(
        &mut self,
        player: PlayerId,
        raw: &Value,
        now: f64,
    ) -> Result<Outbound, HandleError> {
        let p = self.player(player).ok_or(HandleError::UnknownPlayer)?;
        if p.round_over {
            return Err(HandleError::RoundOver);
        }
        self.handler
            .handle_value(&mut self.ledger, player, raw, now, &mut self.rng)
    }

    /// When the player's round ends.
    pub fn round_deadline(&self, player: PlayerId) -> Option<f64> {
        self.player(player)
            .map(|p| p.started_at + self.config().round_seconds)
    }

    pub fn is_round_over(&self, player: PlayerId) -> bool {
        self.player(player).map(|p| p.round_over).unwrap_or(false)
    }

    /// Summarize the player's trials and close the round. Calling again recomputes the same counters.
    pub fn end_round(&mut self, player: PlayerId) -> Option<&Player> {
        let i = self.index(player)?;
        let summary = aggregate::summarize(&self.ledger, player);
        let p = &mut self.players[i];
        if !p.round_over {
            tracing::info!(
                session = %self.code,
                player = %player,
                total = summary.total,
                answered = summary.answered,
                correct = summary.correct,
                incorrect = summary.incorrect,
                payoff = summary.payoff(),
                "round ended"
            );
        }
        p.apply(summary);
        p.round_over = true;
        Some(&self.players[i])
    }

    /// End every round still open. Returns how many were closed.
    pub fn end_all_rounds(&mut self) -> usize {
        let open: Vec<PlayerId> = self
            .players
            .iter()
            .filter(|p| !p.round_over)
            .map(|p| p.id)
            .collect();
        for &id in &open {
            self.end_round(id);
        }
        open.len()
    }

    /// Header plus one row per trial, players in join order.
    pub fn export_rows(&self) -> impl Iterator<Item = Vec<String>> + '_ {
        export::export(&self.code, &self.players, &self.ledger)
    }

    pub fn write_csv<W: io::Write>(&self, out: W) -> io::Result<()> {
        export::write_csv(out, self.export_rows())
    }

    fn index(&self, id: PlayerId) -> Option<usize> {
        let i = (id.0 as usize).checked_sub(1)?;
        (i < self.players.len()).then_some(i)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("participant code is empty")]
    EmptyParticipantCode,
}
