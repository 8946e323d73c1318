//! Integration tests for skill progression
//!
//! These tests verify that:
//! - Experience events level skills up with their stat bonuses
//! - Weapon hits train the matching skill

mod common;

use bevy::prelude::*;
use common::*;
use tactsim::combat::channel::EventChannel;
use tactsim::combat::events::SimEvent;
use tactsim::sim::components::{Attributes, AttackIntent, Health, Skill, SkillLevels, SkillXp};
use tactsim::sim::constants::XP_MELEE_HIT;
use tactsim::sim::spell_config::SpellDefinitions;

fn grant(app: &mut App, entity: Entity, skill: Skill, amount: u32) {
    app.world_mut()
        .resource_mut::<EventChannel>()
        .emit(SimEvent::SkillXpGained { entity, skill, amount });
}

#[test]
fn test_experience_levels_up_melee() {
    let (mut app, recorded) = sim_app(SpellDefinitions::default());
    let hero = spawn_caster(&mut app, Vec2::ZERO, 50.0, &[]);
    app.update();

    grant(&mut app, hero, Skill::Melee, 150);
    step(&mut app, 3);

    let levels: SkillLevels = get(&app, hero);
    let xp: SkillXp = get(&app, hero);
    assert_eq!(levels.get(Skill::Melee), 2);
    assert_eq!(xp.get(Skill::Melee), 50);

    let attributes: Attributes = get(&app, hero);
    assert_eq!(attributes.strength, 11);
    let health: Health = get(&app, hero);
    assert_eq!(health.maximum, 105.0);

    let level_ups = recorded.count(|e| {
        matches!(
            e,
            SimEvent::LevelUp { skill: Skill::Melee, new_level: 2, .. }
        )
    });
    assert_eq!(level_ups, 1);
}

#[test]
fn test_small_grants_accumulate() {
    let (mut app, recorded) = sim_app(SpellDefinitions::default());
    let hero = spawn_caster(&mut app, Vec2::ZERO, 50.0, &[]);
    app.update();

    grant(&mut app, hero, Skill::CombatMagic, 60);
    step(&mut app, 3);
    assert_eq!(get::<SkillLevels>(&app, hero).get(Skill::CombatMagic), 1);

    grant(&mut app, hero, Skill::CombatMagic, 60);
    step(&mut app, 3);
    assert_eq!(get::<SkillLevels>(&app, hero).get(Skill::CombatMagic), 2);
    assert_eq!(get::<SkillXp>(&app, hero).get(Skill::CombatMagic), 20);
    assert_eq!(recorded.count(|e| matches!(e, SimEvent::LevelUp { .. })), 1);
}

#[test]
fn test_weapon_hit_trains_melee() {
    let (mut app, recorded) = sim_app(SpellDefinitions::default());
    let hero = spawn_caster(&mut app, Vec2::ZERO, 50.0, &[]);
    let dummy = spawn_dummy(&mut app, Vec2::new(1.0, 0.0), 500.0);
    app.world_mut().entity_mut(hero).insert(AttackIntent { target: dummy });

    step(&mut app, 4);

    let xp_events = recorded.count(|e| {
        matches!(
            e,
            SimEvent::SkillXpGained { entity, skill: Skill::Melee, amount }
                if *entity == hero && *amount == XP_MELEE_HIT
        )
    });
    assert_eq!(xp_events, 1);
    assert_eq!(get::<SkillXp>(&app, hero).get(Skill::Melee), XP_MELEE_HIT);
}
