//! matchsync CLI entry point

use anyhow::{Context, Result};
use matchsync::config::{cli::Cli, toml, Config};
use matchsync::output;
use matchsync::sim::{self, MatchReport};
use matchsync::state::EntityKind;

fn main() -> Result<()> {
    println!("matchsync v{}", env!("CARGO_PKG_VERSION"));
    println!("Soccer-match rendezvous simulator");
    println!();

    let cli = Cli::parse_args();
    cli.validate()?;

    // Standalone log verification needs no scenario at all.
    if let Some(ref path) = cli.verify_log {
        return verify_log(path);
    }

    let config = build_config(&cli)?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!(e))
        .context("Configuration validation failed")?;

    print_configuration(&config);

    if config.runtime.dry_run {
        println!();
        println!("Dry run mode - configuration validated successfully");
        return Ok(());
    }

    println!();
    println!("Starting match...");
    println!();

    let sink = output::create_sink(&config.output.log_path, config.output.format)?;
    let report = sim::run_match(&config, sink)?;

    print_report(&report, &config);

    if !report.is_clean() {
        anyhow::bail!("{} entity failure(s)", report.failures.len());
    }
    Ok(())
}

/// Build the scenario from a TOML file (if given) plus CLI overrides
fn build_config(cli: &Cli) -> Result<Config> {
    let base = match cli.config {
        Some(ref path) => toml::parse_toml_file(path)?,
        None => Config::default(),
    };
    Ok(toml::merge_cli_with_config(cli, base))
}

/// Print configuration summary
fn print_configuration(config: &Config) {
    println!("Configuration:");
    println!("  Roster:  {}", config.roster);
    println!("  Timing:  {}", config.timing);
    println!("  Log:     {}", config.output);
    match config.runtime.seed {
        Some(seed) => println!("  Seed:    {}", seed),
        None => println!("  Seed:    (from entropy)"),
    }
}

/// Print match results
fn print_report(report: &MatchReport, config: &Config) {
    println!("═══════════════════════════════════════════════════════════");
    println!("                    MATCH RESULTS");
    println!("═══════════════════════════════════════════════════════════");
    println!();
    println!("Elapsed Time: {:.3}s", report.elapsed.as_secs_f64());
    println!();

    println!("Teams formed: {}", report.final_state.teams_formed());
    println!(
        "  Forming workers: {} player(s), {} goalie(s)",
        report.teamed(EntityKind::Player),
        report.teamed(EntityKind::Goalie)
    );
    println!(
        "  Late workers:    {} player(s), {} goalie(s)",
        report.late(EntityKind::Player),
        report.late(EntityKind::Goalie)
    );
    println!(
        "  Unreserved:      {} player(s), {} goalie(s)",
        report.final_state.free_players(),
        report.final_state.free_goalies()
    );
    println!();

    println!("Outcomes:");
    for outcome in &report.outcomes {
        match outcome.team {
            Some(team) => println!("  {} {}: team {}", outcome.kind, outcome.id, team),
            None => println!("  {} {}: late", outcome.kind, outcome.id),
        }
    }
    println!();
    println!("Publication log: {}", config.output.log_path.display());

    if !report.failures.is_empty() {
        println!();
        println!("Failures:");
        for failure in &report.failures {
            println!("  {}", failure);
        }
    }

    println!("═══════════════════════════════════════════════════════════");
}

/// Verify a JSON-lines publication log and report the outcome
fn verify_log(path: &std::path::Path) -> Result<()> {
    let report = output::replay::verify_log(path)
        .with_context(|| format!("Log verification failed for {}", path.display()))?;

    println!("Log verified: {}", path.display());
    println!("  Records:      {}", report.records);
    println!("  Teams formed: {}", report.teams_formed);
    println!(
        "  Late workers: {} player(s), {} goalie(s)",
        report.late_players, report.late_goalies
    );
    Ok(())
}
