//! Tactical simulation
//!
//! Everything that decides what creatures do each tick and resolves the
//! consequences. [`SimPlugin`] wires the resources and the phased systems into
//! an app; the spell table comes from [`spell_config::SpellConfigPlugin`] or
//! is inserted directly by the caller.

use bevy::prelude::*;

pub mod ai;
pub mod cleanup;
pub mod combat;
pub mod components;
pub mod constants;
pub mod damage;
pub mod formulas;
pub mod magic;
pub mod movement;
pub mod position_validator;
pub mod progression;
pub mod resources;
pub mod spatial;
pub mod spawn;
pub mod spell_config;
pub mod status;
pub mod systems;
pub mod utils;

use crate::combat::EventChannelPlugin;
use components::{GameRng, LastValidPositions, PartyWipeState};
use magic::PendingCasts;
use spatial::Spatial;
use spell_config::SpellDefinitions;

/// Plugin for the whole simulation.
///
/// Resources already present in the app (a level's `Spatial`, a custom spell
/// table, a seeded `GameRng`) are kept.
#[derive(Default)]
pub struct SimPlugin {
    /// Seed for deterministic runs; system entropy when None
    pub seed: Option<u64>,
}

impl Plugin for SimPlugin {
    fn build(&self, app: &mut App) {
        if !app.world().contains_resource::<GameRng>() {
            let rng = match self.seed {
                Some(seed) => GameRng::from_seed(seed),
                None => GameRng::from_entropy(),
            };
            app.insert_resource(rng);
        }

        app.add_plugins(EventChannelPlugin)
            .init_resource::<Spatial>()
            .init_resource::<SpellDefinitions>()
            .init_resource::<PartyWipeState>()
            .init_resource::<LastValidPositions>()
            .init_resource::<PendingCasts>();

        systems::configure_sim_system_ordering(app);
        systems::add_core_sim_systems(app, || true);
    }
}
