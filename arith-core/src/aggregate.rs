//! End-of-round scoring.

use serde::{Deserialize, Serialize};

use crate::ledger::{PlayerId, TrialLedger};

/// Trial counters for one player.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    pub total: u32,
    pub answered: u32,
    pub correct: u32,
    pub incorrect: u32,
}

impl Summary {
    pub fn payoff(&self) -> i64 {
        i64::from(self.correct) - i64::from(self.incorrect)
    }
}

/// Reduce the player's trials to counters. Pure function of the ledger contents.
pub fn summarize(ledger: &TrialLedger, player: PlayerId) -> Summary {
    let total = ledger.all(player).len();
    // at least one is unanswered on timeout, more if skipping is allowed
    let unanswered = ledger.count(player, |t| t.answer().is_none());
    Summary {
        total: total as u32,
        answered: (total - unanswered) as u32,
        correct: ledger.count(player, |t| t.is_correct() == Some(true)) as u32,
        incorrect: ledger.count(player, |t| t.is_correct() == Some(false)) as u32,
    }
}
