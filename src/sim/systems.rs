//! Simulation Systems API
//!
//! Stable entry point for the simulation systems. The headless runner, the
//! integration tests and any future front end import from here rather than
//! directly from internal modules.
//!
//! ## System Phases
//!
//! Simulation systems run in six ordered phases each tick:
//!
//! 1. **Timers** - cooldowns, combat timers, regeneration, status effects
//! 2. **Ai** - hostile and ally decisions (intents only)
//! 3. **Movement** - click-to-move and collision-checked movement
//! 4. **Combat** - weapon attacks, Downed/Dead, party wipe, revival
//! 5. **Magic** - cast acceptance, cast times, resolution, multi-frame effects
//! 6. **Cleanup** - progression, position repair, despawns
//!
//! Deferred commands are flushed between phases, so a component inserted by
//! one phase (an `AttackIntent`, a `Casting`) is visible to the next one in
//! the same tick. Events are delivered afterwards, in `Last`.
//!
//! ## Usage
//!
//! ```ignore
//! use tactsim::sim::systems;
//!
//! systems::configure_sim_system_ordering(&mut app);
//! systems::add_core_sim_systems(&mut app, || true);
//! ```

use bevy::prelude::*;

// === Phase 1: Timers ===
pub use super::resources::{regenerate_resources, tick_cooldowns, update_combat_timers};
pub use super::status::process_status_effects;

// === Phase 2: AI ===
pub use super::ai::{update_ally_ai, update_hostile_ai};

// === Phase 3: Movement ===
pub use super::movement::{apply_click_to_move, move_entities};

// === Phase 4: Combat ===
pub use super::combat::{resolve_attacks, resolve_life_states, revive_party};

// === Phase 5: Magic ===
pub use super::magic::{
    process_cast_intents, process_casting, resolve_spells, update_active_abilities, update_area_effects,
    update_leaps, update_projectiles,
};

// === Phase 6: Cleanup ===
pub use super::cleanup::cleanup_entities;
pub use super::position_validator::validate_positions;
pub use super::progression::apply_experience;

/// System set labels for simulation ordering.
///
/// Use these to order custom systems (input translation, scripted events)
/// relative to the simulation.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum SimPhase {
    /// Cooldowns, combat timers, regeneration, status ticks
    Timers,
    /// Hostile and ally decisions
    Ai,
    /// Intent to velocity to position
    Movement,
    /// Weapon attacks and life states
    Combat,
    /// Spellcasting pipeline
    Magic,
    /// Progression, position repair, despawns
    Cleanup,
}

/// Configures the ordering between simulation phases.
///
/// Call this once during app setup before adding simulation systems.
pub fn configure_sim_system_ordering(app: &mut App) {
    app.configure_sets(
        Update,
        (
            SimPhase::Timers,
            SimPhase::Ai,
            SimPhase::Movement,
            SimPhase::Combat,
            SimPhase::Magic,
            SimPhase::Cleanup,
        )
            .chain(),
    );
}

/// Adds the core simulation systems to the app.
///
/// # Arguments
/// * `app` - The Bevy App to add systems to
/// * `run_condition` - Gate for the whole simulation (e.g. a pause flag)
///
/// # Example
/// ```ignore
/// // Always run (headless)
/// add_core_sim_systems(&mut app, || true);
/// ```
pub fn add_core_sim_systems<M>(app: &mut App, run_condition: impl Condition<M> + Clone)
where
    M: 'static,
{
    const PHASES: [SimPhase; 6] = [
        SimPhase::Timers,
        SimPhase::Ai,
        SimPhase::Movement,
        SimPhase::Combat,
        SimPhase::Magic,
        SimPhase::Cleanup,
    ];

    // Phase 1: Timers
    app.add_systems(
        Update,
        (
            tick_cooldowns,
            update_combat_timers,
            regenerate_resources,
            process_status_effects,
        )
            .chain()
            .in_set(SimPhase::Timers)
            .run_if(run_condition.clone()),
    );

    // Phase 2: AI
    app.add_systems(
        Update,
        (update_hostile_ai, update_ally_ai)
            .chain()
            .in_set(SimPhase::Ai)
            .run_if(run_condition.clone()),
    );

    // Phase 3: Movement
    app.add_systems(
        Update,
        (apply_click_to_move, move_entities)
            .chain()
            .in_set(SimPhase::Movement)
            .run_if(run_condition.clone()),
    );

    // Phase 4: Combat
    app.add_systems(
        Update,
        (resolve_attacks, resolve_life_states, revive_party)
            .chain()
            .in_set(SimPhase::Combat)
            .run_if(run_condition.clone()),
    );

    // Phase 5: Magic
    app.add_systems(
        Update,
        (
            process_cast_intents,
            process_casting,
            resolve_spells,
            update_projectiles,
            update_area_effects,
            update_active_abilities,
            update_leaps,
            resolve_life_states, // Spell kills resolve in the same tick
        )
            .chain()
            .in_set(SimPhase::Magic)
            .run_if(run_condition.clone()),
    );

    // Phase 6: Cleanup
    app.add_systems(
        Update,
        (apply_experience, validate_positions, cleanup_entities)
            .chain()
            .in_set(SimPhase::Cleanup)
            .run_if(run_condition.clone()),
    );

    // Flush deferred commands between phases
    for pair in PHASES.windows(2) {
        app.add_systems(
            Update,
            apply_deferred
                .after(pair[0].clone())
                .before(pair[1].clone())
                .run_if(run_condition.clone()),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::components::*;
    use crate::sim::constants::FIXED_TIMESTEP;
    use crate::sim::spawn::{hostile, party_leader};
    use bevy::time::TimeUpdateStrategy;
    use std::time::Duration;

    fn test_app() -> App {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                FIXED_TIMESTEP,
            )))
            .add_plugins(crate::sim::SimPlugin { seed: Some(1) });
        app
    }

    #[test]
    fn test_ai_attack_resolves_in_the_same_tick() {
        let mut app = test_app();
        let hero = app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0)).id();
        let monster = app.world_mut().spawn(hostile(Vec2::new(1.0, 0.0), 50.0)).id();

        for _ in 0..60 {
            app.update();
            let state = app.world().get::<AiController>(monster).unwrap().state;
            let health = app.world().get::<Health>(hero).unwrap().current;
            if state == AiState::Attack {
                // The intent written in the Ai phase was consumed by Combat
                assert!(health < 100.0);
                return;
            }
            assert_eq!(health, 100.0, "no damage before the hostile attacks");
        }
        panic!("hostile never reached the attack state");
    }
}
