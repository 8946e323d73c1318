//! tactsim - Real-time tactical simulation core
//!
//! Runs a scenario headless and prints the outcome.

use std::path::PathBuf;
use std::process::ExitCode;

use tactsim::cli;
use tactsim::headless::{run_headless, ScenarioConfig};
use tactsim::sim::spell_config::{load_spell_definitions, DEFAULT_SPELLS_PATH};

fn main() -> ExitCode {
    let args = cli::parse_args();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: cli::Args) -> Result<(), String> {
    let mut config = ScenarioConfig::load_from_file(&args.headless)?;

    // CLI overrides
    if let Some(output) = args.output {
        config.output_path = Some(output.to_string_lossy().to_string());
    }
    if let Some(max_duration) = args.max_duration {
        if max_duration <= 0.0 {
            return Err("--max-duration must be positive".to_string());
        }
        config.max_duration_secs = max_duration;
    }
    if args.seed.is_some() {
        config.random_seed = args.seed;
    }

    let spells_path = args
        .spells
        .or_else(|| config.spells_path.as_ref().map(PathBuf::from))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SPELLS_PATH));
    let spells = load_spell_definitions(&spells_path)?;

    for actor in config.party.iter().chain(config.hostiles.iter()) {
        if let Some(unknown) = actor.spells.iter().find(|s| spells.get(&s.as_str().into()).is_none()) {
            return Err(format!("{} knows unknown spell '{}'", actor.name, unknown));
        }
    }

    run_headless(config, spells).map(|_| ())
}
