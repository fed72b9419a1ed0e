//! Entity lifecycles
//!
//! Each participant in a match runs one of three sequential state machines:
//!
//! - **Player / Goalie**: arrive, try to form a team, then either play
//!   through both rendezvous gates or leave late
//! - **Referee**: arrive, wait for the teams to form, open the start gate,
//!   referee the play phase, open the end gate
//!
//! All three are written against [`MatchContext`], which owns the guarded
//! shared state, the publication sink and the two gates. Every lifecycle
//! transition is one critical section: acquire the lock, mutate the
//! caller's own status, append a snapshot, release. Gate waits always
//! happen outside the lock; blocking on a gate while holding the lock
//! would wedge every other participant.

pub mod goalie;
pub mod player;
pub mod referee;

pub use goalie::Goalie;
pub use player::Player;
pub use referee::Referee;

use crate::output::SnapshotSink;
use crate::state::{EntityKind, MatchState, RefereeStatus, TeamId};
use crate::sync::{Gate, GuardedState};
use crate::Result;
use std::time::Duration;

/// Final position of a player or goalie after its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntityOutcome {
    pub kind: EntityKind,
    pub id: usize,
    /// Assigned team, or `None` if the entity arrived late
    pub team: Option<TeamId>,
}

/// Shared state plus journal, guarded as one unit
///
/// Fusing the two means a snapshot is appended in the same critical
/// section as the mutation it records, so the journal's record order is
/// exactly the serialization order of the critical sections.
struct Scorebook {
    state: MatchState,
    sink: Box<dyn SnapshotSink>,
}

impl Scorebook {
    fn publish(&mut self) -> Result<()> {
        self.sink.publish(&self.state)
    }
}

/// The coordination surface every entity runs against
///
/// One `MatchContext` exists per match. It owns the only mutable shared
/// resource (the scorebook, behind the mutual-exclusion cell) and the two
/// rendezvous gates. Entities never see the lock or the raw state; they
/// call the protocol methods below, each of which is a single complete
/// critical section or gate operation.
pub struct MatchContext {
    shared: GuardedState<Scorebook>,
    start_gate: Gate,
    end_gate: Gate,
    /// Teams that must form before the referee starts the game
    teams_required: u32,
    /// Permits the referee posts per gate: one per seat across all teams
    gate_seats: u32,
    /// Player population, for entity id bounds checks
    players: usize,
    /// Goalie population, for entity id bounds checks
    goalies: usize,
    /// Upper bound on one parked interval while the referee waits for teams
    poll_interval: Duration,
}

impl MatchContext {
    /// Create the context for one match
    pub fn new(
        state: MatchState,
        sink: Box<dyn SnapshotSink>,
        teams_required: u32,
        poll_interval: Duration,
    ) -> Self {
        let gate_seats = teams_required * state.quota().seats();
        let players = state.player_statuses().len();
        let goalies = state.goalie_statuses().len();
        Self {
            shared: GuardedState::new(Scorebook { state, sink }),
            start_gate: Gate::new("start"),
            end_gate: Gate::new("end"),
            teams_required,
            gate_seats,
            players,
            goalies,
            poll_interval,
        }
    }

    /// Permits posted per gate when the referee opens it
    pub fn gate_seats(&self) -> u32 {
        self.gate_seats
    }

    /// Player population for this match
    pub fn player_count(&self) -> usize {
        self.players
    }

    /// Goalie population for this match
    pub fn goalie_count(&self) -> usize {
        self.goalies
    }

    /// Record a player or goalie arrival
    pub fn record_arrival(&self, kind: EntityKind, id: usize) -> Result<()> {
        let mut book = self.shared.lock()?;
        book.state.mark_arriving(kind, id);
        book.publish()
    }

    /// Run the team-formation decision for one player or goalie
    ///
    /// The whole decision is one critical section: check, reserve, assign,
    /// publish. Team formation also wakes the referee so it can re-check
    /// the team counter.
    pub fn form_team(&self, kind: EntityKind, id: usize) -> Result<Option<TeamId>> {
        let team = {
            let mut book = self.shared.lock()?;
            let team = book.state.form_team(kind, id);
            book.publish()?;
            team
        };
        if team.is_some() {
            self.shared.notify_all();
        }
        Ok(team)
    }

    /// Block on the start gate, then record that the caller is playing
    pub fn await_kickoff(&self, kind: EntityKind, id: usize) -> Result<()> {
        self.start_gate.wait()?;
        let mut book = self.shared.lock()?;
        book.state.mark_playing(kind, id);
        book.publish()
    }

    /// Block on the end gate, then record that the caller is ending
    pub fn await_final_whistle(&self, kind: EntityKind, id: usize) -> Result<()> {
        self.end_gate.wait()?;
        let mut book = self.shared.lock()?;
        book.state.mark_ending(kind, id);
        book.publish()
    }

    /// Record a referee status transition
    pub fn record_referee(&self, status: RefereeStatus) -> Result<()> {
        let mut book = self.shared.lock()?;
        book.state.mark_referee(status);
        book.publish()
    }

    /// Publish the waiting status, then park until enough teams have formed
    ///
    /// The park releases the lock, so team formation proceeds while the
    /// referee waits; each formation notifies, and the poll interval bounds
    /// how long a missed wakeup can go unnoticed. The team counter is only
    /// ever read under the lock.
    pub fn wait_for_teams(&self) -> Result<()> {
        let mut book = self.shared.lock()?;
        book.state.mark_referee(RefereeStatus::WaitingTeams);
        book.publish()?;

        while !book.state.teams_ready(self.teams_required) {
            book = self.shared.wait_timeout(book, self.poll_interval)?;
        }
        Ok(())
    }

    /// Publish the start transition, then open the start gate
    ///
    /// The snapshot is appended before the first permit is posted, so no
    /// worker can be observed playing before the referee is observed
    /// starting the game.
    pub fn start_game(&self) -> Result<()> {
        self.record_referee(RefereeStatus::StartingGame)?;
        self.start_gate.post_many(self.gate_seats)?;
        Ok(())
    }

    /// Publish the end transition, then open the end gate
    pub fn end_game(&self) -> Result<()> {
        self.record_referee(RefereeStatus::EndingGame)?;
        self.end_gate.post_many(self.gate_seats)?;
        Ok(())
    }

    /// Flush the publication sink; called once after all entities joined
    pub fn finish(&self) -> Result<()> {
        self.shared.lock()?.sink.flush()
    }

    /// Clone of the current shared state
    pub fn snapshot(&self) -> Result<MatchState> {
        Ok(self.shared.lock()?.state.clone())
    }
}
