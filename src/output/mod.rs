//! State publication sinks
//!
//! Every lifecycle transition publishes one complete snapshot of the shared
//! match state, under the same lock that guarded the transition. The sinks
//! here give that publication stream a durable form: a human-readable text
//! table or machine-readable JSON lines. All sinks are append-only; a
//! record, once written, is never overwritten.
//!
//! Because publication happens inside the critical section, the order of
//! records in a sink is exactly the serialization order of the critical
//! sections that produced them. The replay checker in [`replay`] leans on
//! this to verify the protocol invariants after a run.

pub mod json;
pub mod replay;
pub mod text;

use crate::state::MatchState;
use crate::Result;
use anyhow::Context;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Append-only sink for shared-state snapshots
///
/// Implementations must record the entire snapshot on every call; partial
/// or coalesced records would break replay verification. Sinks are driven
/// from inside a critical section, so `publish` should do buffered writes
/// and leave expensive work (fsync etc.) to `flush`.
pub trait SnapshotSink: Send {
    /// Durably append one complete snapshot
    fn publish(&mut self, state: &MatchState) -> Result<()>;

    /// Flush any buffered records; called once after the match ends
    fn flush(&mut self) -> Result<()>;
}

/// Log format for the publication stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkFormat {
    /// Human-readable state table, one row per publication
    Text,
    /// One JSON object per line, replayable with `--verify-log`
    Json,
}

impl std::fmt::Display for SinkFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SinkFormat::Text => write!(f, "text"),
            SinkFormat::Json => write!(f, "json"),
        }
    }
}

/// Create a file-backed sink in the requested format
pub fn create_sink(path: &Path, format: SinkFormat) -> Result<Box<dyn SnapshotSink>> {
    match format {
        SinkFormat::Text => {
            let sink = text::TextSink::create(path)
                .with_context(|| format!("Failed to create text log at {}", path.display()))?;
            Ok(Box::new(sink))
        }
        SinkFormat::Json => {
            let sink = json::JsonLinesSink::create(path)
                .with_context(|| format!("Failed to create JSON log at {}", path.display()))?;
            Ok(Box::new(sink))
        }
    }
}

/// In-memory sink that retains every snapshot
///
/// Used by tests and dry runs to observe the publication stream without
/// touching the filesystem. The record list is shared: clone the sink (or
/// call [`MemorySink::records`]) before handing it to the match, then
/// inspect the records after the threads have joined.
#[derive(Clone, Default)]
pub struct MemorySink {
    records: Arc<Mutex<Vec<MatchState>>>,
}

impl MemorySink {
    /// Create an empty in-memory sink
    pub fn new() -> Self {
        Self::default()
    }

    /// Handle to the records captured so far
    pub fn records(&self) -> Arc<Mutex<Vec<MatchState>>> {
        Arc::clone(&self.records)
    }

    /// Copy of the records captured so far
    pub fn snapshot_log(&self) -> Vec<MatchState> {
        self.records.lock().expect("memory sink poisoned").clone()
    }
}

impl SnapshotSink for MemorySink {
    fn publish(&mut self, state: &MatchState) -> Result<()> {
        self.records
            .lock()
            .map_err(|_| anyhow::anyhow!("memory sink poisoned"))?
            .push(state.clone());
        Ok(())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }
}
