//! JSON-lines publication log
//!
//! One JSON object per line, each a complete snapshot of the shared state.
//! Line order is publication order, which is what the replay checker in
//! [`crate::output::replay`] verifies invariants against.

use crate::state::MatchState;
use crate::Result;
use anyhow::Context;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// File-backed JSON-lines sink
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Create the log file, truncating any previous content
    pub fn create(path: &Path) -> Result<Self> {
        let file = File::create(path)
            .with_context(|| format!("Failed to create log file {}", path.display()))?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

impl super::SnapshotSink for JsonLinesSink {
    fn publish(&mut self, state: &MatchState) -> Result<()> {
        serde_json::to_writer(&mut self.writer, state).context("Failed to serialize snapshot")?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        self.writer.flush().context("Failed to flush JSON log")?;
        Ok(())
    }
}

/// Read every snapshot back from a JSON-lines log
pub fn read_log(path: &Path) -> Result<Vec<MatchState>> {
    let file =
        File::open(path).with_context(|| format!("Failed to open log {}", path.display()))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let state: MatchState = serde_json::from_str(&line)
            .with_context(|| format!("Malformed snapshot on line {}", lineno + 1))?;
        records.push(state);
    }
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SnapshotSink;
    use crate::state::{EntityKind, FieldStatus, TeamQuota};

    #[test]
    fn test_json_log_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.jsonl");

        let mut state = MatchState::new(
            4,
            2,
            TeamQuota {
                players_per_team: 2,
                goalies_per_team: 1,
            },
        );
        {
            let mut sink = JsonLinesSink::create(&path).unwrap();
            sink.publish(&state).unwrap();
            state.form_team(EntityKind::Goalie, 1);
            sink.publish(&state).unwrap();
            sink.flush().unwrap();
        }

        let records = read_log(&path).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].teams_formed(), 0);
        assert_eq!(records[1].teams_formed(), 1);
        assert_eq!(records[1].goalie_status(1), FieldStatus::FormingTeam);
    }

    #[test]
    fn test_read_log_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("match.jsonl");
        std::fs::write(&path, "not json\n").unwrap();

        assert!(read_log(&path).is_err());
    }
}
