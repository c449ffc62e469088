//! Tabular export of every trial, for offline analysis.

use std::io::{self, Write};

use serde::Serialize;

use crate::ledger::{Trial, TrialLedger};
use crate::session::Player;

pub const HEADER: [&str; 8] = [
    "session",
    "participant_code",
    "time",
    "iteration",
    "puzzle",
    "solution",
    "answer",
    "is_correct",
];

/// One trial, flattened with its session and participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExportRow {
    pub session: String,
    pub participant_code: String,
    pub time: f64,
    pub iteration: u32,
    pub puzzle: String,
    pub solution: i64,
    pub answer: Option<i64>,
    pub is_correct: Option<bool>,
}

impl ExportRow {
    fn new(session: &str, participant_code: &str, trial: &Trial) -> Self {
        Self {
            session: session.to_string(),
            participant_code: participant_code.to_string(),
            time: trial.timestamp,
            iteration: trial.iteration,
            puzzle: trial.puzzle.clone(),
            solution: trial.solution,
            answer: trial.answer(),
            is_correct: trial.is_correct(),
        }
    }

    /// Cells in `HEADER` order; absent values are empty.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.session.clone(),
            self.participant_code.clone(),
            format!("{:?}", self.time),
            self.iteration.to_string(),
            self.puzzle.clone(),
            self.solution.to_string(),
            self.answer.map(|a| a.to_string()).unwrap_or_default(),
            self.is_correct.map(|c| c.to_string()).unwrap_or_default(),
        ]
    }
}

/// Trial rows of `players`, in the given player order and per-player iteration order.
pub fn trial_rows<'a>(
    session: &'a str,
    players: &'a [Player],
    ledger: &'a TrialLedger,
) -> impl Iterator<Item = ExportRow> + 'a {
    players.iter().flat_map(move |p| {
        ledger
            .all(p.id)
            .iter()
            .map(move |t| ExportRow::new(session, &p.participant_code, t))
    })
}

/// Header row followed by one row per trial. Lazy; reads the ledger only.
pub fn export<'a>(
    session: &'a str,
    players: &'a [Player],
    ledger: &'a TrialLedger,
) -> impl Iterator<Item = Vec<String>> + 'a {
    std::iter::once(HEADER.iter().map(|h| h.to_string()).collect::<Vec<String>>())
        .chain(trial_rows(session, players, ledger).map(|r| r.cells()))
}

/// Write rows as CSV (RFC 4180 quoting).
pub fn write_csv<W, I>(mut out: W, rows: I) -> io::Result<()>
where
    W: Write,
    I: IntoIterator<Item = Vec<String>>,
{
    for row in rows {
        let line: Vec<String> = row.iter().map(|c| csv_cell(c)).collect();
        writeln!(out, "{}", line.join(","))?;
    }
    out.flush()
}

fn csv_cell(cell: &str) -> String {
    if cell.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", cell.replace('"', "\"\""))
    } else {
        cell.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::PlayerId;

    fn fixture() -> (Vec<Player>, TrialLedger) {
        let players = vec![
            Player::new(PlayerId(1), "alpha".into(), 0.0),
            Player::new(PlayerId(2), "bravo".into(), 0.0),
        ];
        let mut ledger = TrialLedger::new();
        ledger.append(PlayerId(2), 5.0, 1, "11 + 11 = ".into(), 22);
        ledger.append(PlayerId(1), 1.0, 1, "12 + 34 = ".into(), 46);
        ledger.latest_mut(PlayerId(1)).unwrap().record_answer(46);
        ledger.append(PlayerId(1), 2.5, 2, "12 + 34 = ".into(), 46);
        (players, ledger)
    }

    #[test]
    fn header_then_one_row_per_trial() {
        let (players, ledger) = fixture();
        let rows: Vec<Vec<String>> = export("s1", &players, &ledger).collect();
        assert_eq!(rows.len(), 4);
        assert_eq!(rows[0], HEADER.to_vec());
        assert_eq!(
            rows[1],
            vec!["s1", "alpha", "1.0", "1", "12 + 34 = ", "46", "46", "true"]
        );
        assert_eq!(
            rows[2],
            vec!["s1", "alpha", "2.5", "2", "12 + 34 = ", "46", "", ""]
        );
        assert_eq!(rows[3][1], "bravo");
    }

    #[test]
    fn rows_match_trials() {
        let (players, ledger) = fixture();
        let rows: Vec<ExportRow> = trial_rows("s1", &players[..1], &ledger).collect();
        assert_eq!(rows.len(), 2);
        for (row, trial) in rows.iter().zip(ledger.all(PlayerId(1))) {
            assert_eq!(row.time, trial.timestamp);
            assert_eq!(row.iteration, trial.iteration);
            assert_eq!(row.puzzle, trial.puzzle);
            assert_eq!(row.solution, trial.solution);
            assert_eq!(row.answer, trial.answer());
            assert_eq!(row.is_correct, trial.is_correct());
        }
    }

    #[test]
    fn csv_quotes_when_needed() {
        let mut buf = Vec::new();
        let rows = vec![
            vec!["a".to_string(), "b,c".to_string()],
            vec!["say \"hi\"".to_string(), String::new()],
        ];
        write_csv(&mut buf, rows).unwrap();
        assert_eq!(
            String::from_utf8(buf).unwrap(),
            "a,\"b,c\"\n\"say \"\"hi\"\"\",\n"
        );
    }
}
