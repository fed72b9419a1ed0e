//! Publication log replay verification
//!
//! Replays a JSON-lines publication log and checks the protocol invariants
//! a correct run must leave behind. Because every snapshot was appended
//! inside the critical section that performed the transition, record order
//! is the serialization order of the critical sections, and the checks can
//! be stated record by record:
//!
//! - the team counter never decreases, and never jumps by more than one
//! - the free counts never increase and never go negative
//! - conservation: free count plus quota x teams formed equals the initial
//!   population, for players and goalies alike
//! - per-entity statuses only advance, and late entities stay late
//! - no player or goalie is playing before the referee has started the
//!   game, and none is ending the game before the referee has

use crate::state::{FieldStatus, MatchState, RefereeStatus};
use crate::Result;
use anyhow::bail;
use std::path::Path;

/// Outcome of a successful replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayReport {
    /// Snapshots examined
    pub records: usize,
    /// Teams formed by the end of the log
    pub teams_formed: u32,
    /// Players that ended late
    pub late_players: u32,
    /// Goalies that ended late
    pub late_goalies: u32,
}

/// Verify a JSON-lines publication log on disk
pub fn verify_log(path: &Path) -> Result<ReplayReport> {
    let records = super::json::read_log(path)?;
    verify_records(&records)
}

/// Verify an ordered snapshot sequence
pub fn verify_records(records: &[MatchState]) -> Result<ReplayReport> {
    let Some(first) = records.first() else {
        bail!("publication log is empty");
    };

    let mut prev: Option<&MatchState> = None;
    for (index, state) in records.iter().enumerate() {
        check_shape(first, state, index)?;
        check_counters(state, index)?;
        if let Some(prev) = prev {
            check_progression(prev, state, index)?;
        }
        check_barrier_ordering(state, index)?;
        prev = Some(state);
    }

    let last = records.last().unwrap_or(first);
    Ok(ReplayReport {
        records: records.len(),
        teams_formed: last.teams_formed(),
        late_players: count_late(last.player_statuses()),
        late_goalies: count_late(last.goalie_statuses()),
    })
}

fn count_late(statuses: &[FieldStatus]) -> u32 {
    statuses.iter().filter(|s| **s == FieldStatus::Late).count() as u32
}

/// Populations and quota are fixed for the whole match
fn check_shape(first: &MatchState, state: &MatchState, index: usize) -> Result<()> {
    if state.initial_players() != first.initial_players()
        || state.initial_goalies() != first.initial_goalies()
        || state.quota() != first.quota()
    {
        bail!("record {}: scenario parameters changed mid-log", index);
    }
    Ok(())
}

/// Conservation of players and goalies at a single snapshot
fn check_counters(state: &MatchState, index: usize) -> Result<()> {
    let teams = state.teams_formed();
    let reserved_players = teams * state.quota().players_per_team;
    if state.free_players() + reserved_players != state.initial_players() {
        bail!(
            "record {}: player conservation violated ({} free + {} reserved != {} initial)",
            index,
            state.free_players(),
            reserved_players,
            state.initial_players()
        );
    }
    let reserved_goalies = teams * state.quota().goalies_per_team;
    if state.free_goalies() + reserved_goalies != state.initial_goalies() {
        bail!(
            "record {}: goalie conservation violated ({} free + {} reserved != {} initial)",
            index,
            state.free_goalies(),
            reserved_goalies,
            state.initial_goalies()
        );
    }
    Ok(())
}

/// Counter monotonicity and per-entity status advancement between records
fn check_progression(prev: &MatchState, state: &MatchState, index: usize) -> Result<()> {
    if state.team_counter() < prev.team_counter() {
        bail!(
            "record {}: team counter regressed from {} to {}",
            index,
            prev.team_counter(),
            state.team_counter()
        );
    }
    if state.team_counter() > prev.team_counter() + 1 {
        bail!(
            "record {}: team counter jumped from {} to {}",
            index,
            prev.team_counter(),
            state.team_counter()
        );
    }
    if state.free_players() > prev.free_players() || state.free_goalies() > prev.free_goalies() {
        bail!("record {}: free counts increased", index);
    }

    for (id, (before, after)) in prev
        .player_statuses()
        .iter()
        .zip(state.player_statuses())
        .enumerate()
    {
        check_field_advance("player", id, *before, *after, index)?;
    }
    for (id, (before, after)) in prev
        .goalie_statuses()
        .iter()
        .zip(state.goalie_statuses())
        .enumerate()
    {
        check_field_advance("goalie", id, *before, *after, index)?;
    }

    if referee_rank(state.referee_status()) < referee_rank(prev.referee_status()) {
        bail!(
            "record {}: referee regressed from {} to {}",
            index,
            prev.referee_status(),
            state.referee_status()
        );
    }
    Ok(())
}

fn check_field_advance(
    kind: &str,
    id: usize,
    before: FieldStatus,
    after: FieldStatus,
    index: usize,
) -> Result<()> {
    if before == FieldStatus::Late && after != FieldStatus::Late {
        bail!(
            "record {}: late {} {} advanced to {}",
            index,
            kind,
            id,
            after
        );
    }
    if field_rank(after) < field_rank(before) {
        bail!(
            "record {}: {} {} regressed from {} to {}",
            index,
            kind,
            id,
            before,
            after
        );
    }
    Ok(())
}

/// No worker plays before the referee has started, or ends before the
/// referee has ended
fn check_barrier_ordering(state: &MatchState, index: usize) -> Result<()> {
    let referee = state.referee_status();
    let statuses = state
        .player_statuses()
        .iter()
        .chain(state.goalie_statuses());

    for status in statuses {
        match status {
            FieldStatus::Playing
                if referee_rank(referee) < referee_rank(RefereeStatus::StartingGame) =>
            {
                bail!(
                    "record {}: a worker is playing but the referee is {}",
                    index,
                    referee
                );
            }
            FieldStatus::EndingGame if referee != RefereeStatus::EndingGame => {
                bail!(
                    "record {}: a worker is ending the game but the referee is {}",
                    index,
                    referee
                );
            }
            _ => {}
        }
    }
    Ok(())
}

fn field_rank(status: FieldStatus) -> u8 {
    match status {
        FieldStatus::Arriving => 0,
        FieldStatus::FormingTeam | FieldStatus::Late => 1,
        FieldStatus::Playing => 2,
        FieldStatus::EndingGame => 3,
    }
}

fn referee_rank(status: RefereeStatus) -> u8 {
    match status {
        RefereeStatus::Arriving => 0,
        RefereeStatus::WaitingTeams => 1,
        RefereeStatus::StartingGame => 2,
        RefereeStatus::Refereeing => 3,
        RefereeStatus::EndingGame => 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{EntityKind, TeamQuota};

    fn quota() -> TeamQuota {
        TeamQuota {
            players_per_team: 2,
            goalies_per_team: 1,
        }
    }

    /// A well-formed publication sequence for 4 players / 2 goalies
    fn valid_run() -> Vec<MatchState> {
        let mut records = Vec::new();
        let mut state = MatchState::new(4, 2, quota());

        state.mark_arriving(EntityKind::Player, 0);
        records.push(state.clone());
        state.mark_referee(RefereeStatus::WaitingTeams);
        records.push(state.clone());

        state.form_team(EntityKind::Player, 0);
        records.push(state.clone());
        state.form_team(EntityKind::Player, 1);
        records.push(state.clone());
        state.form_team(EntityKind::Goalie, 0);
        records.push(state.clone());

        state.mark_referee(RefereeStatus::StartingGame);
        records.push(state.clone());
        state.mark_playing(EntityKind::Player, 0);
        records.push(state.clone());
        state.mark_referee(RefereeStatus::Refereeing);
        records.push(state.clone());

        state.mark_referee(RefereeStatus::EndingGame);
        records.push(state.clone());
        state.mark_ending(EntityKind::Player, 0);
        records.push(state.clone());

        records
    }

    #[test]
    fn test_valid_run_passes() {
        let records = valid_run();
        let report = verify_records(&records).unwrap();

        assert_eq!(report.records, records.len());
        assert_eq!(report.teams_formed, 2);
        assert_eq!(report.late_players, 0);
        assert_eq!(report.late_goalies, 1);
    }

    #[test]
    fn test_empty_log_is_rejected() {
        assert!(verify_records(&[]).is_err());
    }

    #[test]
    fn test_reordered_records_fail_monotonicity() {
        let mut records = valid_run();
        records.swap(2, 4);

        let err = verify_records(&records).unwrap_err();
        assert!(err.to_string().contains("team counter"));
    }

    #[test]
    fn test_playing_before_referee_start_is_caught() {
        let mut records = Vec::new();
        let mut state = MatchState::new(4, 2, quota());
        state.form_team(EntityKind::Player, 0);
        records.push(state.clone());
        state.mark_playing(EntityKind::Player, 0);
        records.push(state.clone());

        let err = verify_records(&records).unwrap_err();
        assert!(err.to_string().contains("playing"));
    }

    #[test]
    fn test_late_worker_never_plays() {
        let mut records = Vec::new();
        let mut state = MatchState::new(2, 1, quota());
        state.form_team(EntityKind::Player, 0);
        state.form_team(EntityKind::Player, 1);
        assert_eq!(state.player_status(1), FieldStatus::Late);
        records.push(state.clone());

        state.mark_referee(RefereeStatus::StartingGame);
        state.mark_playing(EntityKind::Player, 1);
        records.push(state.clone());

        let err = verify_records(&records).unwrap_err();
        assert!(err.to_string().contains("late"));
    }

    #[test]
    fn test_tampered_free_count_fails_conservation() {
        let records = valid_run();
        let mut value = serde_json::to_value(&records[4]).unwrap();
        value["free_players"] = serde_json::json!(3);
        let tampered: MatchState = serde_json::from_value(value).unwrap();

        let err = verify_records(&[tampered]).unwrap_err();
        assert!(err.to_string().contains("conservation"));
    }
}
