//! Shared match state
//!
//! This module defines the single piece of state every participant reads and
//! writes during a match: the team-formation counters and the per-entity
//! status fields. The state itself is plain data; all concurrency discipline
//! lives in [`crate::sync::GuardedState`], which is the only way entities
//! ever reach a `MatchState`.
//!
//! Team formation is the one non-trivial operation here. A single call to
//! [`MatchState::form_team`], executed inside the lock, atomically checks
//! the free counts against the team quota, reserves a full team's worth of
//! resources, and hands the caller the next team id. Callers that observe
//! insufficient resources are late and never join the match. There is no
//! rendezvous among the individual teammates whose arrival crossed the
//! threshold: the forming call is the whole formation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a formed team, starting at 1
pub type TeamId = u32;

/// Which kind of field entity is acting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Player,
    Goalie,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityKind::Player => write!(f, "player"),
            EntityKind::Goalie => write!(f, "goalie"),
        }
    }
}

/// Lifecycle status of a player or goalie
///
/// Statuses only ever advance; no entity regresses to an earlier state.
/// `Late` is terminal: a late entity skips both rendezvous gates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FieldStatus {
    Arriving,
    FormingTeam,
    Late,
    Playing,
    EndingGame,
}

impl FieldStatus {
    /// Fixed-width code used in the text publication log
    pub fn code(&self) -> &'static str {
        match self {
            FieldStatus::Arriving => "ARR",
            FieldStatus::FormingTeam => "FRM",
            FieldStatus::Late => "LATE",
            FieldStatus::Playing => "PLAY",
            FieldStatus::EndingGame => "END",
        }
    }
}

impl fmt::Display for FieldStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldStatus::Arriving => write!(f, "arriving"),
            FieldStatus::FormingTeam => write!(f, "forming_team"),
            FieldStatus::Late => write!(f, "late"),
            FieldStatus::Playing => write!(f, "playing"),
            FieldStatus::EndingGame => write!(f, "ending_game"),
        }
    }
}

/// Lifecycle status of the referee
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RefereeStatus {
    Arriving,
    WaitingTeams,
    StartingGame,
    Refereeing,
    EndingGame,
}

impl RefereeStatus {
    /// Fixed-width code used in the text publication log
    pub fn code(&self) -> &'static str {
        match self {
            RefereeStatus::Arriving => "ARR",
            RefereeStatus::WaitingTeams => "WTM",
            RefereeStatus::StartingGame => "STG",
            RefereeStatus::Refereeing => "REF",
            RefereeStatus::EndingGame => "END",
        }
    }
}

impl fmt::Display for RefereeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefereeStatus::Arriving => write!(f, "arriving"),
            RefereeStatus::WaitingTeams => write!(f, "waiting_teams"),
            RefereeStatus::StartingGame => write!(f, "starting_game"),
            RefereeStatus::Refereeing => write!(f, "refereeing"),
            RefereeStatus::EndingGame => write!(f, "ending_game"),
        }
    }
}

/// Fixed composition of a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamQuota {
    /// Players reserved per formed team
    pub players_per_team: u32,
    /// Goalies reserved per formed team
    pub goalies_per_team: u32,
}

impl TeamQuota {
    /// Seats a single team occupies
    pub fn seats(&self) -> u32 {
        self.players_per_team + self.goalies_per_team
    }
}

/// The state shared by every participant in the match
///
/// A `MatchState` is created once, before any entity starts, and mutated
/// only through the methods below while holding the surrounding lock. The
/// whole struct is cloneable and serializable: each publication appends a
/// complete snapshot of it, including the quota and initial populations so
/// a log can be verified without the original configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchState {
    /// Next team id to assign; 1 before any team has formed
    team_counter: TeamId,
    /// Players not yet reserved for a team
    free_players: u32,
    /// Goalies not yet reserved for a team
    free_goalies: u32,
    /// Initial player population
    initial_players: u32,
    /// Initial goalie population
    initial_goalies: u32,
    /// Team composition in force for this match
    quota: TeamQuota,
    /// Per-player status, indexed by player id
    players: Vec<FieldStatus>,
    /// Per-goalie status, indexed by goalie id
    goalies: Vec<FieldStatus>,
    /// Referee status
    referee: RefereeStatus,
}

impl MatchState {
    /// Create the initial state for the given populations and quota
    ///
    /// Every entity starts as arriving, mirroring a zero-filled shared
    /// region, and the team counter starts at 1.
    pub fn new(players: usize, goalies: usize, quota: TeamQuota) -> Self {
        Self {
            team_counter: 1,
            free_players: players as u32,
            free_goalies: goalies as u32,
            initial_players: players as u32,
            initial_goalies: goalies as u32,
            quota,
            players: vec![FieldStatus::Arriving; players],
            goalies: vec![FieldStatus::Arriving; goalies],
            referee: RefereeStatus::Arriving,
        }
    }

    /// Next team id to assign
    pub fn team_counter(&self) -> TeamId {
        self.team_counter
    }

    /// Number of teams fully formed so far
    pub fn teams_formed(&self) -> u32 {
        self.team_counter - 1
    }

    /// Players not yet reserved for a team
    pub fn free_players(&self) -> u32 {
        self.free_players
    }

    /// Goalies not yet reserved for a team
    pub fn free_goalies(&self) -> u32 {
        self.free_goalies
    }

    /// Initial player population
    pub fn initial_players(&self) -> u32 {
        self.initial_players
    }

    /// Initial goalie population
    pub fn initial_goalies(&self) -> u32 {
        self.initial_goalies
    }

    /// Team composition in force for this match
    pub fn quota(&self) -> TeamQuota {
        self.quota
    }

    /// Status of one player
    pub fn player_status(&self, id: usize) -> FieldStatus {
        self.players[id]
    }

    /// Status of one goalie
    pub fn goalie_status(&self, id: usize) -> FieldStatus {
        self.goalies[id]
    }

    /// Per-player statuses, indexed by player id
    pub fn player_statuses(&self) -> &[FieldStatus] {
        &self.players
    }

    /// Per-goalie statuses, indexed by goalie id
    pub fn goalie_statuses(&self) -> &[FieldStatus] {
        &self.goalies
    }

    /// Referee status
    pub fn referee_status(&self) -> RefereeStatus {
        self.referee
    }

    /// True once `required` teams have fully formed
    pub fn teams_ready(&self, required: u32) -> bool {
        self.teams_formed() >= required
    }

    /// Record that a player or goalie is arriving
    ///
    /// Ids are bounds-checked against the population at entity construction.
    pub fn mark_arriving(&mut self, kind: EntityKind, id: usize) {
        self.set_field_status(kind, id, FieldStatus::Arriving);
    }

    /// Attempt to form a team on behalf of the calling entity
    ///
    /// If enough free players and goalies remain for a full team, this call
    /// is the formation: both free counts drop by the quota in the same
    /// step the team id is assigned, so no two callers can both observe a
    /// stale "enough resources" view. The returned id is the pre-increment
    /// counter value. Callers that find the counts short are late and get
    /// no team.
    pub fn form_team(&mut self, kind: EntityKind, id: usize) -> Option<TeamId> {
        if self.free_players >= self.quota.players_per_team
            && self.free_goalies >= self.quota.goalies_per_team
        {
            let team = self.team_counter;
            self.team_counter += 1;
            self.free_players -= self.quota.players_per_team;
            self.free_goalies -= self.quota.goalies_per_team;
            self.set_field_status(kind, id, FieldStatus::FormingTeam);
            Some(team)
        } else {
            self.set_field_status(kind, id, FieldStatus::Late);
            None
        }
    }

    /// Record that a teamed player or goalie has entered play
    pub fn mark_playing(&mut self, kind: EntityKind, id: usize) {
        self.set_field_status(kind, id, FieldStatus::Playing);
    }

    /// Record that a teamed player or goalie is ending the game
    pub fn mark_ending(&mut self, kind: EntityKind, id: usize) {
        self.set_field_status(kind, id, FieldStatus::EndingGame);
    }

    /// Record a referee status transition
    pub fn mark_referee(&mut self, status: RefereeStatus) {
        self.referee = status;
    }

    fn set_field_status(&mut self, kind: EntityKind, id: usize, status: FieldStatus) {
        match kind {
            EntityKind::Player => self.players[id] = status,
            EntityKind::Goalie => self.goalies[id] = status,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quota(players: u32, goalies: u32) -> TeamQuota {
        TeamQuota {
            players_per_team: players,
            goalies_per_team: goalies,
        }
    }

    #[test]
    fn test_initial_state() {
        let state = MatchState::new(10, 3, quota(4, 1));

        assert_eq!(state.team_counter(), 1);
        assert_eq!(state.teams_formed(), 0);
        assert_eq!(state.free_players(), 10);
        assert_eq!(state.free_goalies(), 3);
        assert_eq!(state.referee_status(), RefereeStatus::Arriving);
        assert!(state.player_statuses().iter().all(|s| *s == FieldStatus::Arriving));
        assert!(state.goalie_statuses().iter().all(|s| *s == FieldStatus::Arriving));
    }

    #[test]
    fn test_form_team_reserves_full_quota() {
        let mut state = MatchState::new(10, 3, quota(4, 1));

        let team = state.form_team(EntityKind::Player, 0);
        assert_eq!(team, Some(1));
        assert_eq!(state.free_players(), 6);
        assert_eq!(state.free_goalies(), 2);
        assert_eq!(state.team_counter(), 2);
        assert_eq!(state.player_status(0), FieldStatus::FormingTeam);
    }

    #[test]
    fn test_team_ids_are_sequential_and_unique() {
        let mut state = MatchState::new(10, 3, quota(4, 1));

        assert_eq!(state.form_team(EntityKind::Player, 0), Some(1));
        assert_eq!(state.form_team(EntityKind::Goalie, 0), Some(2));
        assert_eq!(state.teams_formed(), 2);
    }

    #[test]
    fn test_late_when_players_short() {
        let mut state = MatchState::new(5, 2, quota(2, 1));

        assert_eq!(state.form_team(EntityKind::Player, 0), Some(1));
        assert_eq!(state.form_team(EntityKind::Player, 1), Some(2));
        // One player and no goalie left: not enough for another team.
        assert_eq!(state.form_team(EntityKind::Player, 2), None);
        assert_eq!(state.player_status(2), FieldStatus::Late);
        assert_eq!(state.free_players(), 1);
        assert_eq!(state.free_goalies(), 0);
    }

    #[test]
    fn test_late_when_goalies_short() {
        let mut state = MatchState::new(8, 1, quota(2, 1));

        assert_eq!(state.form_team(EntityKind::Goalie, 0), Some(1));
        assert_eq!(state.form_team(EntityKind::Player, 0), None);
        assert_eq!(state.player_status(0), FieldStatus::Late);
    }

    #[test]
    fn test_conservation_across_formations() {
        let mut state = MatchState::new(10, 3, quota(4, 1));

        for id in 0..5 {
            state.form_team(EntityKind::Player, id);
            let reserved = state.teams_formed() * state.quota().players_per_team;
            assert_eq!(state.free_players() + reserved, state.initial_players());
            let reserved = state.teams_formed() * state.quota().goalies_per_team;
            assert_eq!(state.free_goalies() + reserved, state.initial_goalies());
        }
    }

    #[test]
    fn test_teams_ready_threshold() {
        let mut state = MatchState::new(4, 2, quota(2, 1));

        assert!(!state.teams_ready(2));
        state.form_team(EntityKind::Player, 0);
        assert!(!state.teams_ready(2));
        state.form_team(EntityKind::Player, 1);
        assert!(state.teams_ready(2));
    }

    #[test]
    fn test_snapshot_round_trips_through_json() {
        let mut state = MatchState::new(4, 2, quota(2, 1));
        state.form_team(EntityKind::Player, 1);
        state.mark_referee(RefereeStatus::WaitingTeams);

        let json = serde_json::to_string(&state).unwrap();
        let back: MatchState = serde_json::from_str(&json).unwrap();

        assert_eq!(back.team_counter(), state.team_counter());
        assert_eq!(back.free_players(), state.free_players());
        assert_eq!(back.player_status(1), FieldStatus::FormingTeam);
        assert_eq!(back.referee_status(), RefereeStatus::WaitingTeams);
    }
}
