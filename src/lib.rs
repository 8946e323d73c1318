//! tactsim - Real-time tactical simulation core
//!
//! Creatures on a tile grid fight, cast spells and carry status effects under
//! hostile and ally AI, ticked by a phased Bevy schedule. Outcomes are
//! published on a synchronous event channel.
//!
//! This library exposes the simulation for the headless runner and tests.

pub mod cli;
pub mod combat;
pub mod headless;
pub mod sim;

// Re-export commonly used types
pub use combat::channel::EventChannel;
pub use combat::events::{DamageSource, DamageType, SimEvent, SimEventKind};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use headless::{ScenarioConfig, ScenarioResult};
pub use sim::spell_config::{SpellDefinitions, SpellId};
pub use sim::SimPlugin;
