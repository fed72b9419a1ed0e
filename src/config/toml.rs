//! TOML scenario file parsing

use super::Config;
use crate::config::cli::Cli;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Parse a TOML scenario file
pub fn parse_toml_file(path: &Path) -> Result<Config> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    parse_toml_string(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Parse a TOML scenario from a string
pub fn parse_toml_string(contents: &str) -> Result<Config> {
    let config: Config =
        ::toml::from_str(contents).context("Failed to parse TOML configuration")?;

    Ok(config)
}

/// Merge CLI arguments with a scenario (CLI takes precedence)
pub fn merge_cli_with_config(cli: &Cli, mut config: Config) -> Config {
    if let Some(players) = cli.players {
        config.roster.players = players;
    }
    if let Some(goalies) = cli.goalies {
        config.roster.goalies = goalies;
    }
    if let Some(players_per_team) = cli.players_per_team {
        config.roster.players_per_team = players_per_team;
    }
    if let Some(goalies_per_team) = cli.goalies_per_team {
        config.roster.goalies_per_team = goalies_per_team;
    }
    if let Some(teams) = cli.teams {
        config.roster.teams = teams;
    }

    if cli.fast {
        config.timing = super::TimingConfig::instant();
    }
    if let Some(seed) = cli.seed {
        config.runtime.seed = Some(seed);
    }

    if let Some(ref log) = cli.log {
        config.output.log_path = log.clone();
    }
    if let Some(format) = cli.log_format {
        config.output.format = format;
    }

    config.runtime.dry_run |= cli.dry_run;
    config.runtime.debug |= cli.debug;

    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::output::SinkFormat;
    use clap::Parser;

    #[test]
    fn test_parse_full_scenario() {
        let toml = r#"
            [roster]
            players = 4
            goalies = 2
            players_per_team = 2
            goalies_per_team = 1
            teams = 2

            [timing]
            poll_interval_us = 500

            [output]
            log_path = "scenario.jsonl"
            format = "json"

            [runtime]
            seed = 7
        "#;

        let config = parse_toml_string(toml).unwrap();
        assert_eq!(config.roster.players, 4);
        assert_eq!(config.roster.goalies, 2);
        assert_eq!(config.timing.poll_interval_us, 500);
        assert_eq!(config.output.format, SinkFormat::Json);
        assert_eq!(config.runtime.seed, Some(7));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_scenario_uses_defaults() {
        let config = parse_toml_string("[roster]\nplayers = 9\n").unwrap();
        assert_eq!(config.roster.players, 9);
        assert_eq!(config.roster.goalies, 3);
        assert_eq!(config.timing.poll_interval_us, 1000);
    }

    #[test]
    fn test_malformed_toml_is_rejected() {
        assert!(parse_toml_string("players = ").is_err());
    }

    #[test]
    fn test_cli_overrides_scenario() {
        let config = parse_toml_string("[roster]\nplayers = 9\ngoalies = 4\n").unwrap();
        let cli = Cli::parse_from(["matchsync", "--players", "6", "--fast", "--seed", "3"]);

        let merged = merge_cli_with_config(&cli, config);
        assert_eq!(merged.roster.players, 6);
        assert_eq!(merged.roster.goalies, 4);
        assert!(merged.timing.player_arrival.is_zero());
        assert_eq!(merged.runtime.seed, Some(3));
    }
}
