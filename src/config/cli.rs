//! CLI argument parsing using clap

use crate::output::SinkFormat;
use clap::Parser;
use std::path::PathBuf;

/// matchsync - Soccer-match rendezvous simulator
#[derive(Parser, Debug)]
#[command(name = "matchsync")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// TOML scenario file; explicit flags override its values
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // === Roster Options ===
    /// Player population
    #[arg(short = 'p', long)]
    pub players: Option<usize>,

    /// Goalie population
    #[arg(short = 'g', long)]
    pub goalies: Option<usize>,

    /// Players reserved per team
    #[arg(long)]
    pub players_per_team: Option<u32>,

    /// Goalies reserved per team
    #[arg(long)]
    pub goalies_per_team: Option<u32>,

    /// Teams that must form before the game starts
    #[arg(short = 't', long)]
    pub teams: Option<u32>,

    // === Timing Options ===
    /// Zero all entity delays (deterministic-length runs)
    #[arg(long)]
    pub fast: bool,

    /// Seed for the delay samplers; omit for OS entropy
    #[arg(long)]
    pub seed: Option<u64>,

    // === Output Options ===
    /// Publication log path
    #[arg(short = 'l', long)]
    pub log: Option<PathBuf>,

    /// Publication log format
    #[arg(long, value_enum)]
    pub log_format: Option<SinkFormat>,

    // === Runtime Options ===
    /// Validate and print the configuration without running a match
    #[arg(long)]
    pub dry_run: bool,

    /// Enable debug output on stderr
    #[arg(long, env = "MATCHSYNC_DEBUG")]
    pub debug: bool,

    /// Verify a JSON-lines publication log and exit
    #[arg(long, value_name = "PATH")]
    pub verify_log: Option<PathBuf>,
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate CLI arguments
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.verify_log.is_some() && self.dry_run {
            anyhow::bail!("--verify-log and --dry-run are mutually exclusive");
        }
        if let Some(players) = self.players {
            if players == 0 {
                anyhow::bail!("players must be at least 1");
            }
        }
        if let Some(goalies) = self.goalies {
            if goalies == 0 {
                anyhow::bail!("goalies must be at least 1");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_parse() {
        let cli = Cli::parse_from(["matchsync"]);
        assert!(cli.players.is_none());
        assert!(!cli.fast);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_roster_flags_parse() {
        let cli = Cli::parse_from([
            "matchsync",
            "--players",
            "4",
            "--goalies",
            "2",
            "--players-per-team",
            "2",
            "--goalies-per-team",
            "1",
            "--teams",
            "2",
        ]);
        assert_eq!(cli.players, Some(4));
        assert_eq!(cli.goalies, Some(2));
        assert_eq!(cli.players_per_team, Some(2));
        assert_eq!(cli.teams, Some(2));
    }

    #[test]
    fn test_zero_players_rejected() {
        let cli = Cli::parse_from(["matchsync", "--players", "0"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_verify_log_excludes_dry_run() {
        let cli = Cli::parse_from(["matchsync", "--verify-log", "m.jsonl", "--dry-run"]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_log_format_parses() {
        let cli = Cli::parse_from(["matchsync", "--log-format", "json"]);
        assert_eq!(cli.log_format, Some(SinkFormat::Json));
    }
}
