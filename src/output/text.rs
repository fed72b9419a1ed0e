//! Human-readable text publication log
//!
//! One fixed-width row per snapshot: the status code of every player and
//! goalie, the referee status, the team counter and the free counts. The
//! header carries the scenario parameters and a start timestamp so a log
//! is self-describing.

use crate::state::MatchState;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// File-backed text sink
pub struct TextSink {
    writer: BufWriter<File>,
    header_written: bool,
}

impl TextSink {
    /// Create the log file, truncating any previous content
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
            header_written: false,
        })
    }

    fn write_header(&mut self, state: &MatchState) -> Result<()> {
        let started = chrono::Local::now().format("%Y-%m-%d %H:%M:%S");
        writeln!(self.writer, "matchsync publication log")?;
        writeln!(self.writer, "started: {}", started)?;
        writeln!(
            self.writer,
            "players={} goalies={} quota={}p+{}g",
            state.initial_players(),
            state.initial_goalies(),
            state.quota().players_per_team,
            state.quota().goalies_per_team,
        )?;
        writeln!(self.writer)?;

        let mut columns = String::new();
        for id in 0..state.initial_players() {
            columns.push_str(&format!("{:>5}", format!("PL{}", id)));
        }
        for id in 0..state.initial_goalies() {
            columns.push_str(&format!("{:>5}", format!("GL{}", id)));
        }
        columns.push_str(&format!("{:>5}", "RF"));
        columns.push_str(&format!("{:>6}", "TEAM"));
        columns.push_str(&format!("{:>5}", "FP"));
        columns.push_str(&format!("{:>5}", "FG"));
        writeln!(self.writer, "{}", columns)?;
        Ok(())
    }
}

impl super::SnapshotSink for TextSink {
    fn publish(&mut self, state: &MatchState) -> Result<()> {
        if !self.header_written {
            self.write_header(state)?;
            self.header_written = true;
        }

        let mut row = String::new();
        for status in state.player_statuses() {
            row.push_str(&format!("{:>5}", status.code()));
        }
        for status in state.goalie_statuses() {
            row.push_str(&format!("{:>5}", status.code()));
        }
        row.push_str(&format!("{:>5}", state.referee_status().code()));
        row.push_str(&format!("{:>6}", state.team_counter()));
        row.push_str(&format!("{:>5}", state.free_players()));
        row.push_str(&format!("{:>5}", state.free_goalies()));
        writeln!(self.writer, "{}", row).context("Failed to append log row")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush text log")?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SnapshotSink;
    use crate::state::{EntityKind, TeamQuota};

    fn sample_state() -> MatchState {
        MatchState::new(
            4,
            2,
            TeamQuota {
                players_per_team: 2,
                goalies_per_team: 1,
            },
        )
    }

    #[test]
    fn test_text_log_has_header_and_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.log");

        let mut state = sample_state();
        {
            let mut sink = TextSink::create(&path).unwrap();
            sink.publish(&state).unwrap();
            state.form_team(EntityKind::Player, 0);
            sink.publish(&state).unwrap();
            sink.flush().unwrap();
        }

        let contents = std::fs::read_to_string(&path).unwrap();
        assert!(contents.contains("players=4 goalies=2 quota=2p+1g"));
        assert!(contents.contains("PL0"));
        assert!(contents.contains("GL1"));

        // Two data rows follow the column header.
        let rows: Vec<&str> = contents
            .lines()
            .skip_while(|line| !line.contains("TEAM"))
            .skip(1)
            .collect();
        assert_eq!(rows.len(), 2);
        assert!(rows[0].contains("ARR"));
        assert!(rows[1].contains("FRM"));
    }

    #[test]
    fn test_rows_are_appended_never_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.log");

        let state = sample_state();
        let mut sink = TextSink::create(&path).unwrap();
        for _ in 0..5 {
            sink.publish(&state).unwrap();
        }
        sink.flush().unwrap();

        let contents = std::fs::read_to_string(&path).unwrap();
        let rows = contents
            .lines()
            .skip_while(|line| !line.contains("TEAM"))
            .skip(1)
            .count();
        assert_eq!(rows, 5);
    }
}
