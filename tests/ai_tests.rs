//! Integration tests for hostile and ally AI
//!
//! These tests verify that:
//! - Hostiles aggro inside their aggro range and chase, then attack
//! - The leash sends a hostile home regardless of state
//! - Allies follow the leader and auto-cast heals on hurt party members

mod common;

use bevy::prelude::*;
use common::*;
use tactsim::combat::events::SimEvent;
use tactsim::sim::components::*;
use tactsim::sim::spawn::{hostile, party_ally, party_leader, CasterBundle};
use tactsim::sim::spell_config::SpellId;

const HEAL_TABLE: &str = r#"(
    spells: {
        "mend": (
            name: "Mend",
            mana_cost: 10.0,
            range: 6.0,
            cooldown: 1.0,
            targeting: Ally,
            school: NatureMagic,
            damage_type: Holy,
            archetype: Instant(heal: 25.0),
        ),
    },
)"#;

// =============================================================================
// Hostile AI
// =============================================================================

#[test]
fn test_hostile_chases_party_member_inside_aggro_range() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let monster = app.world_mut().spawn(hostile(Vec2::new(5.0, 0.0), 50.0)).id();

    step(&mut app, 1);

    let ai: AiController = get(&app, monster);
    assert_eq!(ai.state, AiState::Chase);
    assert!(ai.target.is_some());
}

#[test]
fn test_hostile_ignores_party_outside_aggro_range() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let monster = app.world_mut().spawn(hostile(Vec2::new(8.0, 0.0), 50.0)).id();

    step(&mut app, ticks_for(1.0));

    let ai: AiController = get(&app, monster);
    assert_eq!(ai.state, AiState::Idle);
    assert_eq!(get::<Position>(&app, monster).0, Vec2::new(8.0, 0.0));
}

#[test]
fn test_hostile_closes_in_and_attacks() {
    let (mut app, recorded) = sim_app(Default::default());
    let hero = app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0)).id();
    let monster = app.world_mut().spawn(hostile(Vec2::new(5.0, 0.0), 50.0)).id();

    step(&mut app, ticks_for(2.0));

    let ai: AiController = get(&app, monster);
    assert_eq!(ai.state, AiState::Attack);
    assert!(get::<Health>(&app, hero).current < 100.0);
    assert!(recorded.count(|e| matches!(
        e,
        SimEvent::DamageDealt { attacker: Some(a), target, .. } if *a == monster && *target == hero
    )) >= 1);
}

#[test]
fn test_leash_sends_hostile_home() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::new(20.0, 0.0), 100.0));
    let monster = app.world_mut().spawn(hostile(Vec2::ZERO, 50.0)).id();

    // Dragged past the leash while chasing
    {
        let mut entity = app.world_mut().entity_mut(monster);
        entity.get_mut::<Position>().unwrap().0 = Vec2::new(19.0, 0.0);
        entity.get_mut::<AiController>().unwrap().state = AiState::Chase;
    }

    step(&mut app, 1);

    let ai: AiController = get(&app, monster);
    assert_eq!(ai.state, AiState::Return);
    assert!(ai.target.is_none());
    let intent: MoveIntent = get(&app, monster);
    assert!(intent.direction.x < 0.0, "should head back toward home");
}

#[test]
fn test_dead_hostile_does_not_act() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let monster = app
        .world_mut()
        .spawn((hostile(Vec2::new(3.0, 0.0), 50.0), Dead::default()))
        .id();

    step(&mut app, ticks_for(0.5));

    assert_eq!(get::<AiController>(&app, monster).state, AiState::Idle);
    assert_eq!(get::<Position>(&app, monster).0, Vec2::new(3.0, 0.0));
}

// =============================================================================
// Ally AI
// =============================================================================

#[test]
fn test_ally_follows_leader() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let ally = app
        .world_mut()
        .spawn(party_ally(1, Vec2::new(10.0, 0.0), 100.0, Vec2::new(-1.0, 0.0)))
        .id();

    step(&mut app, ticks_for(0.5));

    let x = get::<Position>(&app, ally).0.x;
    assert!(x < 10.0, "ally should move toward the leader, at {}", x);
    assert_eq!(get::<AllyAi>(&app, ally).state, AllyState::Follow);
}

#[test]
fn test_ally_engages_nearby_hostile() {
    let (mut app, _) = sim_app(Default::default());
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let ally = app
        .world_mut()
        .spawn(party_ally(1, Vec2::new(1.0, 0.0), 100.0, Vec2::new(1.0, 0.0)))
        .id();
    let monster = app.world_mut().spawn(hostile(Vec2::new(5.0, 0.0), 50.0)).id();

    step(&mut app, 1);

    let ai: AllyAi = get(&app, ally);
    assert_eq!(ai.state, AllyState::Engage);
    assert_eq!(ai.target, Some(monster));
    assert_eq!(get::<AttackIntent>(&app, ally).target, monster);
}

#[test]
fn test_ally_auto_heals_hurt_leader() {
    let (mut app, recorded) = sim_app(spells(HEAL_TABLE));
    let hero = app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0)).id();
    app.world_mut().get_mut::<Health>(hero).unwrap().current = 30.0;
    let healer = app
        .world_mut()
        .spawn((
            party_ally(1, Vec2::new(2.0, 0.0), 100.0, Vec2::new(2.0, 0.0)),
            CasterBundle::new(50.0, SpellBook::new(["mend"])),
        ))
        .id();

    step(&mut app, 1);

    // 25 base scaled by intelligence 10, truncated once
    assert_eq!(get::<Health>(&app, hero).current, 62.0);
    assert_eq!(get::<Mana>(&app, healer).current, 40.0);
    assert_eq!(
        recorded.count(|e| matches!(e, SimEvent::HealthRestored { target, .. } if *target == hero)),
        1
    );

    // AI readiness is armed at three times the cooldown
    let ai: AllyAi = get(&app, healer);
    assert!(!ai.is_spell_ready(&SpellId::from("mend")));
}

#[test]
fn test_ally_does_not_heal_healthy_party() {
    let (mut app, recorded) = sim_app(spells(HEAL_TABLE));
    app.world_mut().spawn(party_leader(Vec2::ZERO, 100.0));
    let healer = app
        .world_mut()
        .spawn((
            party_ally(1, Vec2::new(2.0, 0.0), 100.0, Vec2::new(2.0, 0.0)),
            CasterBundle::new(50.0, SpellBook::new(["mend"])),
        ))
        .id();

    step(&mut app, ticks_for(0.5));

    assert_eq!(get::<Mana>(&app, healer).current, 50.0);
    assert_eq!(recorded.count(|e| matches!(e, SimEvent::SpellCast { .. })), 0);
}
