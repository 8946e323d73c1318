//! Integration tests for position validation on a tile level
//!
//! These tests verify that actors pushed into walls are repaired:
//! - back to their last valid position
//! - to the nearest walkable tile
//! - party members stranded off the map go to the spawn point
//! - anyone else stranded off the map is removed

mod common;

use bevy::prelude::*;
use common::*;
use tactsim::combat::events::SimEvent;
use tactsim::sim::components::Position;
use tactsim::sim::spatial::{Spatial, TileGrid};
use tactsim::sim::spell_config::SpellDefinitions;

fn crypt_app() -> (App, Recorded) {
    let (mut app, recorded) = sim_app(SpellDefinitions::default());
    let grid = TileGrid::from_rows(&["#######", "#S....#", "#.....#", "#######"]).unwrap();
    app.insert_resource(Spatial::new(grid));
    (app, recorded)
}

fn set_position(app: &mut App, entity: Entity, to: Vec2) {
    app.world_mut().get_mut::<Position>(entity).unwrap().0 = to;
}

#[test]
fn test_actor_in_wall_returns_to_last_valid_position() {
    let (mut app, _) = crypt_app();
    let goblin = spawn_dummy(&mut app, Vec2::new(3.5, 2.5), 50.0);
    step(&mut app, 2);

    set_position(&mut app, goblin, Vec2::new(3.5, 0.5));
    app.update();

    assert_eq!(get::<Position>(&app, goblin).0, Vec2::new(3.5, 2.5));
}

#[test]
fn test_actor_never_seen_valid_moves_to_nearest_floor() {
    let (mut app, _) = crypt_app();
    let goblin = spawn_dummy(&mut app, Vec2::new(3.5, 3.5), 50.0);
    app.update();

    let repaired = get::<Position>(&app, goblin).0;
    assert_eq!(repaired, Vec2::new(2.5, 2.5), "first hit in the ring search");
}

#[test]
fn test_stranded_party_member_teleports_to_spawn() {
    let (mut app, recorded) = crypt_app();
    let hero = spawn_caster(&mut app, Vec2::new(100.0, 100.0), 0.0, &[]);
    step(&mut app, 2);

    assert_eq!(get::<Position>(&app, hero).0, Vec2::new(1.5, 1.5));
    let teleports = recorded.count(|e| matches!(e, SimEvent::EntityTeleported { entity, .. } if *entity == hero));
    assert_eq!(teleports, 1);
}

#[test]
fn test_stranded_hostile_is_removed() {
    let (mut app, _) = crypt_app();
    let goblin = spawn_dummy(&mut app, Vec2::new(100.0, 100.0), 50.0);
    step(&mut app, 2);

    assert!(!app.world().entities().contains(goblin));
}
