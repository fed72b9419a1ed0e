//! Configuration module
//!
//! Handles CLI argument parsing, TOML scenario files, and validation.
//!
//! A scenario is fully described by four groups: the roster (populations
//! and team composition), timing perturbation, output (publication log),
//! and runtime behavior. Every group has usable defaults, so a scenario
//! file or CLI invocation only needs to name what it changes.

pub mod cli;
pub mod toml;

use crate::output::SinkFormat;
use crate::state::TeamQuota;
use crate::util::delay::JitterUs;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Largest supported population per entity kind
///
/// Keeps per-entity status columns and thread counts bounded.
pub const MAX_POPULATION: usize = 128;

/// Complete scenario configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub roster: RosterConfig,
    #[serde(default)]
    pub timing: TimingConfig,
    #[serde(default)]
    pub output: OutputConfig,
    #[serde(default)]
    pub runtime: RuntimeConfig,
}

/// Populations and team composition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterConfig {
    /// Player population
    #[serde(default = "default_players")]
    pub players: usize,
    /// Goalie population
    #[serde(default = "default_goalies")]
    pub goalies: usize,
    /// Players reserved per formed team
    #[serde(default = "default_players_per_team")]
    pub players_per_team: u32,
    /// Goalies reserved per formed team
    #[serde(default = "default_goalies_per_team")]
    pub goalies_per_team: u32,
    /// Teams that must form before the referee starts the game
    #[serde(default = "default_teams")]
    pub teams: u32,
}

fn default_players() -> usize {
    10
}

fn default_goalies() -> usize {
    3
}

fn default_players_per_team() -> u32 {
    4
}

fn default_goalies_per_team() -> u32 {
    1
}

fn default_teams() -> u32 {
    2
}

impl Default for RosterConfig {
    fn default() -> Self {
        Self {
            players: default_players(),
            goalies: default_goalies(),
            players_per_team: default_players_per_team(),
            goalies_per_team: default_goalies_per_team(),
            teams: default_teams(),
        }
    }
}

impl RosterConfig {
    /// Team composition as used by the allocator
    pub fn quota(&self) -> TeamQuota {
        TeamQuota {
            players_per_team: self.players_per_team,
            goalies_per_team: self.goalies_per_team,
        }
    }

    /// Permits the referee posts per gate: one per seat across all teams
    pub fn gate_seats(&self) -> u32 {
        self.teams * self.quota().seats()
    }
}

/// Timing perturbation for entity delays
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Player arrival delay
    #[serde(default = "default_field_arrival")]
    pub player_arrival: JitterUs,
    /// Goalie arrival delay
    #[serde(default = "default_field_arrival")]
    pub goalie_arrival: JitterUs,
    /// Referee arrival delay
    #[serde(default = "default_referee_arrival")]
    pub referee_arrival: JitterUs,
    /// Duration of the referee's play phase
    #[serde(default = "default_referee_play")]
    pub referee_play: JitterUs,
    /// Upper bound on how long the referee stays parked between re-checks
    /// of the team counter while waiting for teams, in microseconds
    #[serde(default = "default_poll_interval_us")]
    pub poll_interval_us: u64,
}

fn default_field_arrival() -> JitterUs {
    JitterUs::new(50, 200)
}

fn default_referee_arrival() -> JitterUs {
    JitterUs::new(10, 100)
}

fn default_referee_play() -> JitterUs {
    JitterUs::new(900, 100)
}

fn default_poll_interval_us() -> u64 {
    1000
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            player_arrival: default_field_arrival(),
            goalie_arrival: default_field_arrival(),
            referee_arrival: default_referee_arrival(),
            referee_play: default_referee_play(),
            poll_interval_us: default_poll_interval_us(),
        }
    }
}

impl TimingConfig {
    /// Zero every delay; used by tests and `--fast`
    pub fn instant() -> Self {
        Self {
            player_arrival: JitterUs::zero(),
            goalie_arrival: JitterUs::zero(),
            referee_arrival: JitterUs::zero(),
            referee_play: JitterUs::zero(),
            poll_interval_us: default_poll_interval_us(),
        }
    }
}

/// Publication log configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Where the publication log is written
    #[serde(default = "default_log_path")]
    pub log_path: PathBuf,
    /// Log format
    #[serde(default = "default_log_format")]
    pub format: SinkFormat,
}

fn default_log_path() -> PathBuf {
    PathBuf::from("match.log")
}

fn default_log_format() -> SinkFormat {
    SinkFormat::Text
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            log_path: default_log_path(),
            format: default_log_format(),
        }
    }
}

/// Runtime configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Seed for the delay samplers; omit for OS entropy
    #[serde(default)]
    pub seed: Option<u64>,
    /// Validate and print the configuration without running
    #[serde(default)]
    pub dry_run: bool,
    /// Enable debug output on stderr
    #[serde(default)]
    pub debug: bool,
}

// Display trait implementations

impl fmt::Display for RosterConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} players, {} goalies; {} team(s) of {}p+{}g",
            self.players, self.goalies, self.teams, self.players_per_team, self.goalies_per_team
        )
    }
}

impl fmt::Display for TimingConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arrival player={} goalie={} referee={}, play={}, poll={}us",
            self.player_arrival,
            self.goalie_arrival,
            self.referee_arrival,
            self.referee_play,
            self.poll_interval_us
        )
    }
}

impl fmt::Display for OutputConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.log_path.display(), self.format)
    }
}

// Validation methods

impl Config {
    /// Validate the complete configuration
    pub fn validate(&self) -> Result<(), String> {
        self.roster.validate()?;
        self.timing.validate()?;
        Ok(())
    }
}

impl RosterConfig {
    /// Validate the roster configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.players == 0 || self.players > MAX_POPULATION {
            return Err(format!(
                "players must be 1-{}, got {}",
                MAX_POPULATION, self.players
            ));
        }
        if self.goalies == 0 || self.goalies > MAX_POPULATION {
            return Err(format!(
                "goalies must be 1-{}, got {}",
                MAX_POPULATION, self.goalies
            ));
        }
        if self.teams == 0 || self.teams as usize > MAX_POPULATION {
            return Err(format!(
                "teams must be 1-{}, got {}",
                MAX_POPULATION, self.teams
            ));
        }
        if self.quota().seats() == 0 {
            return Err("a team must have at least one seat".to_string());
        }
        if self.players_per_team as usize > MAX_POPULATION
            || self.goalies_per_team as usize > MAX_POPULATION
        {
            return Err(format!(
                "team composition must stay within 0-{} per kind",
                MAX_POPULATION
            ));
        }

        let needed_players = (self.teams * self.players_per_team) as usize;
        let needed_goalies = (self.teams * self.goalies_per_team) as usize;
        if self.players < needed_players {
            return Err(format!(
                "{} team(s) of {} players need {} players, got {}",
                self.teams, self.players_per_team, needed_players, self.players
            ));
        }
        if self.goalies < needed_goalies {
            return Err(format!(
                "{} team(s) of {} goalies need {} goalies, got {}",
                self.teams, self.goalies_per_team, needed_goalies, self.goalies
            ));
        }

        // The surplus after the configured teams must not be able to form
        // another team: a surplus team's members would wait on gates the
        // referee never opens for them.
        let surplus_players = (self.players - needed_players) as u32;
        let surplus_goalies = (self.goalies - needed_goalies) as u32;
        if surplus_players >= self.players_per_team && surplus_goalies >= self.goalies_per_team {
            return Err(format!(
                "surplus of {} players and {} goalies could form a team beyond the configured {}",
                surplus_players, surplus_goalies, self.teams
            ));
        }

        Ok(())
    }
}

impl TimingConfig {
    /// Validate the timing configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.poll_interval_us == 0 {
            return Err("poll_interval_us must be greater than 0".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.roster.gate_seats(), 10);
    }

    #[test]
    fn test_exact_roster_is_valid() {
        let roster = RosterConfig {
            players: 4,
            goalies: 2,
            players_per_team: 2,
            goalies_per_team: 1,
            teams: 2,
        };
        assert!(roster.validate().is_ok());
        assert_eq!(roster.gate_seats(), 6);
    }

    #[test]
    fn test_one_surplus_player_is_valid() {
        let roster = RosterConfig {
            players: 5,
            goalies: 2,
            players_per_team: 2,
            goalies_per_team: 1,
            teams: 2,
        };
        assert!(roster.validate().is_ok());
    }

    #[test]
    fn test_insufficient_population_rejected() {
        let roster = RosterConfig {
            players: 3,
            goalies: 2,
            players_per_team: 2,
            goalies_per_team: 1,
            teams: 2,
        };
        let err = roster.validate().unwrap_err();
        assert!(err.contains("need 4 players"));
    }

    #[test]
    fn test_surplus_team_rejected() {
        // Enough left over for a third team the referee would never start.
        let roster = RosterConfig {
            players: 6,
            goalies: 3,
            players_per_team: 2,
            goalies_per_team: 1,
            teams: 2,
        };
        let err = roster.validate().unwrap_err();
        assert!(err.contains("surplus"));
    }

    #[test]
    fn test_zero_teams_rejected() {
        let roster = RosterConfig {
            teams: 0,
            ..RosterConfig::default()
        };
        assert!(roster.validate().is_err());
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let timing = TimingConfig {
            poll_interval_us: 0,
            ..TimingConfig::default()
        };
        assert!(timing.validate().is_err());
    }
}
