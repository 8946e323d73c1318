//! Headless mode for automated runs
//!
//! Runs a scenario (level, party, hostiles) without any front end on a fixed
//! time step, suitable for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! cargo run --release -- --headless scenarios/crypt_ambush.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "party": [{ "name": "Hero", "position": [2.5, 2.5], "spells": ["fireball"], "mana": 50 }],
//!   "hostiles": [{ "name": "Ghoul", "position": [8.5, 2.5] }],
//!   "max_duration_secs": 60,
//!   "random_seed": 7
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ActorConfig, ScenarioConfig};
pub use runner::{run_headless, run_scenario, HeadlessPlugin, Outcome, ScenarioResult};
