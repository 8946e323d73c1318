//! Command-line interface for tactsim

use clap::Parser;
use std::path::PathBuf;

/// Real-time tactical simulation core
#[derive(Parser, Debug)]
#[command(name = "tactsim")]
#[command(about = "Runs tactical combat scenarios headless")]
#[command(version)]
pub struct Args {
    /// Scenario JSON file to run
    #[arg(long, value_name = "CONFIG_FILE")]
    pub headless: PathBuf,

    /// Spell table (overrides the scenario's `spells_path`)
    #[arg(long, value_name = "SPELLS_FILE")]
    pub spells: Option<PathBuf>,

    /// Output path for the combat log
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Maximum scenario duration in seconds (overrides the scenario)
    #[arg(long)]
    pub max_duration: Option<f32>,

    /// Random seed (overrides the scenario)
    #[arg(long)]
    pub seed: Option<u64>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
