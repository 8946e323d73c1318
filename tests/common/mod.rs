//! Shared harness for simulation integration tests
//!
//! Builds a minimal app on the fixed step with a hand-made spell table and
//! records every delivered event.

#![allow(dead_code)]

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tactsim::combat::channel::EventChannel;
use tactsim::combat::events::SimEvent;
use tactsim::sim::components::{AggroRange, Attributes, SpellBook, Weapon};
use tactsim::sim::constants::FIXED_TIMESTEP;
use tactsim::sim::spawn::{hostile, party_leader, CasterBundle};
use tactsim::sim::spell_config::{parse_spell_definitions, SpellDefinitions};
use tactsim::sim::SimPlugin;

/// Everything delivered on the event channel, in order.
#[derive(Clone, Default)]
pub struct Recorded(Arc<Mutex<Vec<SimEvent>>>);

impl Recorded {
    pub fn events(&self) -> Vec<SimEvent> {
        self.0.lock().unwrap().clone()
    }

    pub fn count<F: Fn(&SimEvent) -> bool>(&self, filter: F) -> usize {
        self.0.lock().unwrap().iter().filter(|e| filter(e)).count()
    }
}

/// App with the simulation, the given spell table and a fixed seed.
///
/// The first `update` has a zero delta; every later one advances one step.
pub fn sim_app(spells: SpellDefinitions) -> (App, Recorded) {
    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
            FIXED_TIMESTEP,
        )))
        .insert_resource(spells)
        .add_plugins(SimPlugin { seed: Some(7) });

    let recorded = Recorded::default();
    let sink = recorded.0.clone();
    app.world_mut()
        .resource_mut::<EventChannel>()
        .subscribe_all(move |event| sink.lock().unwrap().push(event.clone()));

    (app, recorded)
}

/// Parse a RON spell table, panicking on errors.
pub fn spells(ron: &str) -> SpellDefinitions {
    parse_spell_definitions(ron).unwrap()
}

pub fn step(app: &mut App, ticks: usize) {
    for _ in 0..ticks {
        app.update();
    }
}

/// Ticks covering `seconds` of simulated time (plus the zero-delta first tick).
pub fn ticks_for(seconds: f32) -> usize {
    (seconds / FIXED_TIMESTEP).ceil() as usize + 1
}

pub fn get<C: Component + Clone>(app: &App, entity: Entity) -> C {
    app.world().get::<C>(entity).cloned().unwrap()
}

pub fn has<C: Component>(app: &App, entity: Entity) -> bool {
    app.world().get::<C>(entity).is_some()
}

/// Party leader with a spell book, a 10-damage sword and zero intelligence,
/// so spell numbers are unscaled.
pub fn spawn_caster(app: &mut App, position: Vec2, mana: f32, known: &[&str]) -> Entity {
    let entity = app
        .world_mut()
        .spawn((
            party_leader(position, 100.0),
            CasterBundle::new(mana, SpellBook::new(known.iter().copied())),
            Weapon {
                damage: 10.0,
                range: 1.5,
                speed: 1.0,
                ..Default::default()
            },
        ))
        .id();
    app.world_mut().entity_mut(entity).insert(Attributes {
        strength: 10,
        dexterity: 10,
        intelligence: 0,
    });
    entity
}

/// Hostile that never aggroes, so it stays where it was put.
pub fn spawn_dummy(app: &mut App, position: Vec2, health: f32) -> Entity {
    let entity = app.world_mut().spawn(hostile(position, health)).id();
    app.world_mut().entity_mut(entity).insert(AggroRange(0.0));
    entity
}
