//! # Replay Analyzer
//!
//! Command-line tool that replays a scenario file through the detector.

use std::process::ExitCode;

use tracing_subscriber::EnvFilter;
use uuid::Uuid;
use vigil_core::SubjectId;
use vigil_security::Scenario;

fn init_logging(verbose: bool) {
    let base_level = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(base_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .init();
}

fn main() -> ExitCode {
    println!("╔══════════════════════════════════════════════════════════════════╗");
    println!("║         VIGIL REPLAY ANALYZER                                    ║");
    println!("║         WATCH THE PHYSICS                                        ║");
    println!("╚══════════════════════════════════════════════════════════════════╝");
    println!();

    let args: Vec<String> = std::env::args().collect();

    if args.len() < 2 {
        println!("Usage: replay_analyzer <scenario.toml>");
        println!();
        println!("Options:");
        println!("  --verbose        Enable detector debug output");
        println!("  --player <uuid>  Only report verdicts for one player");
        return ExitCode::FAILURE;
    }

    let scenario_path = &args[1];
    let verbose = args.iter().any(|a| a == "--verbose");
    let player_filter: Option<SubjectId> = args
        .iter()
        .position(|a| a == "--player")
        .and_then(|i| args.get(i + 1))
        .and_then(|s| s.parse::<Uuid>().ok())
        .map(SubjectId::new);

    init_logging(verbose);

    println!("Loading scenario: {scenario_path}");

    let mut scenario = match Scenario::from_path(scenario_path) {
        Ok(s) => s,
        Err(e) => {
            println!("Error: Could not load scenario: {e}");
            return ExitCode::FAILURE;
        }
    };
    if verbose {
        scenario.config.debug_enabled = true;
    }

    println!();
    println!("┌─ SCENARIO INFO ────────────────────────────────────────────────┐");
    println!("│ Players:            {}", scenario.players.len());
    println!("│ Blocks:             {}", scenario.blocks.len());
    println!("│ Steps:              {}", scenario.steps.len());
    println!("│ Strike Limit:       {}", scenario.config.strike_limit);
    println!("│ Max Blackmarks:     {}", scenario.config.max_blackmarks);
    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    let outcome = scenario.run();

    let verdicts: Vec<_> = outcome
        .verdicts
        .iter()
        .filter(|v| player_filter.map_or(true, |id| v.subject == id))
        .collect();

    println!();
    println!("┌─ ANALYSIS RESULTS ────────────────────────────────────────────┐");
    println!("│ Events Replayed:    {}", outcome.events);
    println!("│ Ticks Run:          {}", outcome.ticks);
    println!("│ Verdicts:           {}", verdicts.len());
    println!("│ Alerts:             {}", outcome.alerts.len());
    println!("│ Vitals Changes:     {}", outcome.vitals.len());

    if !verdicts.is_empty() {
        println!("│                                                                │");
        println!("│ VERDICTS:                                                      │");
        for verdict in &verdicts {
            println!(
                "│  - {} ({}): {} [{}]",
                verdict.player_name,
                verdict.subject,
                verdict.reason,
                if verdict.certain { "certain" } else { "uncertain" }
            );
            println!("│    At: {} ms", verdict.at);
        }
    }

    if !outcome.commands.is_empty() {
        println!("│                                                                │");
        println!("│ COMMANDS:                                                      │");
        for command in &outcome.commands {
            println!("│  > {command}");
        }
    }

    println!("└──────────────────────────────────────────────────────────────────┘");
    println!();

    if verdicts.is_empty() {
        println!("✓ No cheating detected");
    } else {
        println!("⚠ {} verdicts issued - manual review recommended", verdicts.len());
    }

    ExitCode::SUCCESS
}
