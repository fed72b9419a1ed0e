//! Player lifecycle
//!
//! A player arrives, attempts to form a team, and either plays the match
//! through both rendezvous gates or leaves late. Its status is published
//! after every transition, always from inside the critical section that
//! performed it.

use super::{EntityOutcome, MatchContext};
use crate::state::EntityKind;
use crate::util::delay::{DelaySampler, JitterUs};
use crate::Result;
use anyhow::Context;

/// One player's sequential state machine
pub struct Player<'a> {
    id: usize,
    context: &'a MatchContext,
    delays: DelaySampler,
    arrival: JitterUs,
}

impl<'a> Player<'a> {
    /// Create a player, bounds-checking its id against the population
    pub fn new(
        id: usize,
        context: &'a MatchContext,
        delays: DelaySampler,
        arrival: JitterUs,
    ) -> Result<Self> {
        if id >= context.player_count() {
            anyhow::bail!(
                "player id {} out of range for population {}",
                id,
                context.player_count()
            );
        }
        Ok(Self {
            id,
            context,
            delays,
            arrival,
        })
    }

    /// Run the lifecycle to completion
    ///
    /// A player that obtains a team cannot pass either gate before the
    /// referee opens it; a late player terminates without touching the
    /// gates at all.
    pub fn run(&mut self) -> Result<EntityOutcome> {
        self.context
            .record_arrival(EntityKind::Player, self.id)
            .with_context(|| format!("player {}: arrival", self.id))?;
        self.delays.pause(self.arrival);

        let team = self
            .context
            .form_team(EntityKind::Player, self.id)
            .with_context(|| format!("player {}: team formation", self.id))?;

        if team.is_some() {
            self.context
                .await_kickoff(EntityKind::Player, self.id)
                .with_context(|| format!("player {}: waiting for kickoff", self.id))?;
            self.context
                .await_final_whistle(EntityKind::Player, self.id)
                .with_context(|| format!("player {}: waiting for final whistle", self.id))?;
        }

        Ok(EntityOutcome {
            kind: EntityKind::Player,
            id: self.id,
            team,
        })
    }
}
