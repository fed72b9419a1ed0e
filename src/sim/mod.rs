//! Match driver
//!
//! Runs one complete match: builds the shared coordination state, spawns a
//! thread per player and goalie plus the referee, waits for every lifecycle
//! to finish, and collects the per-entity outcomes into a report.
//!
//! Threads replace the original process-per-entity model; the protocol only
//! needs the shared lock and gates, so it does not care which one carries
//! it. Entity failures are collected rather than aborting the run: each
//! lifecycle returns a `Result`, and the report lists every failure so the
//! caller can decide the process exit code.

use crate::config::Config;
use crate::entity::{EntityOutcome, Goalie, MatchContext, Player, Referee};
use crate::output::SnapshotSink;
use crate::state::{EntityKind, MatchState, TeamId};
use crate::util::delay::DelaySampler;
use crate::Result;
use anyhow::anyhow;
use std::time::{Duration, Instant};

/// Everything a finished match left behind
#[derive(Debug)]
pub struct MatchReport {
    /// Final position of every player and goalie
    pub outcomes: Vec<EntityOutcome>,
    /// Per-entity failures, empty for a clean run
    pub failures: Vec<String>,
    /// Shared state as it stood after the last transition
    pub final_state: MatchState,
    /// Wall-clock duration of the match
    pub elapsed: Duration,
}

impl MatchReport {
    /// True if every entity completed its lifecycle without error
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Team ids assigned during the match, in outcome order
    pub fn assigned_teams(&self) -> Vec<TeamId> {
        self.outcomes.iter().filter_map(|o| o.team).collect()
    }

    /// Entities of `kind` that formed a team
    pub fn teamed(&self, kind: EntityKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == kind && o.team.is_some())
            .count()
    }

    /// Entities of `kind` that arrived late
    pub fn late(&self, kind: EntityKind) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.kind == kind && o.team.is_none())
            .count()
    }
}

/// Per-entity seed layout: the referee takes the scenario seed itself,
/// players follow, goalies after them
fn entity_seed(base: u64, kind: EntityKind, id: usize, players: usize) -> u64 {
    match kind {
        EntityKind::Player => base.wrapping_add(1 + id as u64),
        EntityKind::Goalie => base.wrapping_add(1 + players as u64 + id as u64),
    }
}

/// Run one match to completion
///
/// Blocks until every entity thread has finished. With a healthy
/// configuration this is bounded by the entity delays; if a participant
/// crashes inside a critical section or the referee dies before opening a
/// gate, the remaining participants deadlock by design and so does this
/// call.
pub fn run_match(config: &Config, sink: Box<dyn SnapshotSink>) -> Result<MatchReport> {
    let state = MatchState::new(
        config.roster.players,
        config.roster.goalies,
        config.roster.quota(),
    );
    let context = MatchContext::new(
        state,
        sink,
        config.roster.teams,
        Duration::from_micros(config.timing.poll_interval_us),
    );

    let base_seed = config.runtime.seed.unwrap_or_else(rand::random);
    if config.runtime.debug {
        eprintln!("DEBUG: scenario seed: {}", base_seed);
        eprintln!("DEBUG: gate seats per phase: {}", context.gate_seats());
    }

    let started = Instant::now();
    let mut outcomes = Vec::new();
    let mut failures = Vec::new();

    crossbeam::thread::scope(|scope| {
        let context = &context;
        let timing = &config.timing;

        let referee_handle = scope.spawn(move |_| {
            let mut referee = Referee::new(
                context,
                DelaySampler::seeded(base_seed),
                timing.referee_arrival,
                timing.referee_play,
            );
            referee.run()
        });

        let mut field_handles = Vec::new();
        for id in 0..config.roster.players {
            let seed = entity_seed(base_seed, EntityKind::Player, id, config.roster.players);
            let handle = scope.spawn(move |_| -> Result<EntityOutcome> {
                let mut player =
                    Player::new(id, context, DelaySampler::seeded(seed), timing.player_arrival)?;
                player.run()
            });
            field_handles.push((EntityKind::Player, id, handle));
        }
        for id in 0..config.roster.goalies {
            let seed = entity_seed(base_seed, EntityKind::Goalie, id, config.roster.players);
            let handle = scope.spawn(move |_| -> Result<EntityOutcome> {
                let mut goalie =
                    Goalie::new(id, context, DelaySampler::seeded(seed), timing.goalie_arrival)?;
                goalie.run()
            });
            field_handles.push((EntityKind::Goalie, id, handle));
        }

        for (kind, id, handle) in field_handles {
            match handle.join() {
                Ok(Ok(outcome)) => outcomes.push(outcome),
                Ok(Err(err)) => failures.push(format!("{} {}: {:#}", kind, id, err)),
                Err(_) => failures.push(format!("{} {}: panicked", kind, id)),
            }
        }
        match referee_handle.join() {
            Ok(Ok(())) => {}
            Ok(Err(err)) => failures.push(format!("referee: {:#}", err)),
            Err(_) => failures.push("referee: panicked".to_string()),
        }
    })
    .map_err(|_| anyhow!("match thread scope panicked"))?;

    context.finish()?;
    let final_state = context.snapshot()?;

    Ok(MatchReport {
        outcomes,
        failures,
        final_state,
        elapsed: started.elapsed(),
    })
}
