//! Goalie lifecycle
//!
//! Symmetric to the player lifecycle: arrive, attempt to form a team, then
//! play through both gates or leave late. Goalies differ from players only
//! in which free count their formation call draws down.

use super::{EntityOutcome, MatchContext};
use crate::state::EntityKind;
use crate::util::delay::{DelaySampler, JitterUs};
use crate::Result;
use anyhow::Context;

/// One goalie's sequential state machine
pub struct Goalie<'a> {
    id: usize,
    context: &'a MatchContext,
    delays: DelaySampler,
    arrival: JitterUs,
}

impl<'a> Goalie<'a> {
    /// Create a goalie, bounds-checking its id against the population
    pub fn new(
        id: usize,
        context: &'a MatchContext,
        delays: DelaySampler,
        arrival: JitterUs,
    ) -> Result<Self> {
        if id >= context.goalie_count() {
            anyhow::bail!(
                "goalie id {} out of range for population {}",
                id,
                context.goalie_count()
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
    pub fn run(&mut self) -> Result<EntityOutcome> {
        self.context
            .record_arrival(EntityKind::Goalie, self.id)
            .with_context(|| format!("goalie {}: arrival", self.id))?;
        self.delays.pause(self.arrival);

        let team = self
            .context
            .form_team(EntityKind::Goalie, self.id)
            .with_context(|| format!("goalie {}: team formation", self.id))?;

        if team.is_some() {
            self.context
                .await_kickoff(EntityKind::Goalie, self.id)
                .with_context(|| format!("goalie {}: waiting for kickoff", self.id))?;
            self.context
                .await_final_whistle(EntityKind::Goalie, self.id)
                .with_context(|| format!("goalie {}: waiting for final whistle", self.id))?;
        }

        Ok(EntityOutcome {
            kind: EntityKind::Goalie,
            id: self.id,
            team,
        })
    }
}
