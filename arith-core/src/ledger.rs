//! Trial ledger: per-player, insertion-ordered record of issued puzzles and their answers.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Player identifier within a session (1-based, in join order).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u32);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Recorded answer. Answer and correctness are set together or not at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    pub answer: i64,
    pub is_correct: bool,
}

/// One issued puzzle and its eventual answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub player: PlayerId,
    /// Issuance time, seconds since the Unix epoch.
    pub timestamp: f64,
    /// 1-based sequence number per player.
    pub iteration: u32,
    pub puzzle: String,
    pub solution: i64,
    outcome: Option<Outcome>,
}

impl Trial {
    pub fn answer(&self) -> Option<i64> {
        self.outcome.map(|o| o.answer)
    }

    pub fn is_correct(&self) -> Option<bool> {
        self.outcome.map(|o| o.is_correct)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    pub fn is_answered(&self) -> bool {
        self.outcome.is_some()
    }

    /// Record an answer and its correctness against the solution. Returns correctness.
    pub fn record_answer(&mut self, answer: i64) -> bool {
        let is_correct = answer == self.solution;
        self.outcome = Some(Outcome { answer, is_correct });
        is_correct
    }
}

/// Trials of every player in a session, partitioned by player.
#[derive(Debug, Default)]
pub struct TrialLedger {
    trials: HashMap<PlayerId, Vec<Trial>>,
}

impl TrialLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new unanswered trial and return it.
    pub fn append(
        &mut self,
        player: PlayerId,
        timestamp: f64,
        iteration: u32,
        puzzle: String,
        solution: i64,
    ) -> &Trial {
        let list = self.trials.entry(player).or_default();
        list.push(Trial {
            player,
            timestamp,
            iteration,
            puzzle,
            solution,
            outcome: None,
        });
        &list[list.len() - 1]
    }

    /// Most recently issued trial for `player`.
    pub fn latest(&self, player: PlayerId) -> Option<&Trial> {
        self.trials.get(&player).and_then(|l| l.last())
    }

    pub fn latest_mut(&mut self, player: PlayerId) -> Option<&mut Trial> {
        self.trials.get_mut(&player).and_then(|l| l.last_mut())
    }

    /// All trials of `player` in iteration order.
    pub fn all(&self, player: PlayerId) -> &[Trial] {
        self.trials.get(&player).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Trials of `player` matching `pred`, in iteration order.
    pub fn filter<'a, P>(&'a self, player: PlayerId, pred: P) -> impl Iterator<Item = &'a Trial> + 'a
    where
        P: Fn(&Trial) -> bool + 'a,
    {
        self.all(player).iter().filter(move |t| pred(*t))
    }

    pub fn count<P>(&self, player: PlayerId, pred: P) -> usize
    where
        P: Fn(&Trial) -> bool,
    {
        self.all(player).iter().filter(|t| pred(*t)).count()
    }
}
