//! Referee lifecycle
//!
//! The referee drives both rendezvous: it waits until enough teams have
//! formed, publishes its start transition and opens the start gate, lets
//! the play phase run, then publishes its end transition and opens the end
//! gate. Both gate releases strictly follow the corresponding publication,
//! so the log always shows the referee's transition before any worker's
//! reaction to it.

use super::MatchContext;
use crate::state::RefereeStatus;
use crate::util::delay::{DelaySampler, JitterUs};
use crate::Result;
use anyhow::Context;

/// The referee's sequential state machine
pub struct Referee<'a> {
    context: &'a MatchContext,
    delays: DelaySampler,
    arrival: JitterUs,
    play: JitterUs,
}

impl<'a> Referee<'a> {
    /// Create the referee; there is exactly one per match
    pub fn new(
        context: &'a MatchContext,
        delays: DelaySampler,
        arrival: JitterUs,
        play: JitterUs,
    ) -> Self {
        Self {
            context,
            delays,
            arrival,
            play,
        }
    }

    /// Run the lifecycle to completion
    pub fn run(&mut self) -> Result<()> {
        self.context
            .record_referee(RefereeStatus::Arriving)
            .context("referee: arrival")?;
        self.delays.pause(self.arrival);

        self.context
            .wait_for_teams()
            .context("referee: waiting for teams")?;

        self.context.start_game().context("referee: starting game")?;

        self.context
            .record_referee(RefereeStatus::Refereeing)
            .context("referee: play phase")?;
        self.delays.pause(self.play);

        self.context.end_game().context("referee: ending game")?;
        Ok(())
    }
}
