//! Projectile Systems
//!
//! Spell projectiles live on their own entity (`Position` + [`Projectile`]).
//! Each tick a projectile:
//! - expires when its lifetime runs out
//! - re-aims at a homing target, or flies on toward its ground point
//! - is destroyed on entering a non-walkable tile
//! - hits when close enough: a homing projectile damages its target, a
//!   ground projectile detonates on every opposing actor around the point

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use crate::sim::components::*;
use crate::sim::constants::*;
use crate::sim::spatial::Spatial;
use crate::sim::spell_config::SpellDefinitions;

use super::{afflict, deal_spell_damage, snapshot_actors, Mitigation, SpellActors, SpellHit};

/// Advance one step toward `goal` without overshooting.
fn step_toward(from: Vec2, goal: Vec2, max_step: f32) -> Vec2 {
    let offset = goal - from;
    let distance = offset.length();
    if distance <= max_step || distance == 0.0 {
        goal
    } else {
        from + offset / distance * max_step
    }
}

/// Move projectiles and apply their hits.
pub fn update_projectiles(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    spells: Res<SpellDefinitions>,
    spatial: Res<Spatial>,
    mut projectiles: Query<(Entity, &mut Position, &mut Projectile), Without<Health>>,
    mut actors: SpellActors,
) {
    let dt = time.delta_secs();
    let snapshot = snapshot_actors(&actors);

    for (entity, mut position, mut projectile) in projectiles.iter_mut() {
        projectile.lifetime -= dt;
        if projectile.lifetime <= 0.0 {
            commands.entity(entity).despawn();
            continue;
        }

        let (goal, hit_distance) = match projectile.target {
            ProjectileTarget::Homing(target) => match snapshot.get(target).filter(|t| t.is_alive()) {
                Some(info) => (info.position, PROJECTILE_HIT_DISTANCE),
                None => {
                    // Nothing left to home in on
                    commands.entity(entity).despawn();
                    continue;
                }
            },
            ProjectileTarget::Ground(point) => (point, PROJECTILE_GROUND_ARRIVAL),
        };

        let next = step_toward(position.0, goal, projectile.speed * dt);
        if !spatial.is_walkable(next) {
            debug!("{} projectile {:?} hit a wall", projectile.spell, entity);
            commands.entity(entity).despawn();
            continue;
        }
        position.0 = next;

        if next.distance(goal) >= hit_distance {
            continue;
        }

        let victims = match projectile.target {
            ProjectileTarget::Homing(target) => vec![target],
            ProjectileTarget::Ground(point) => {
                snapshot.opposing_in_radius(projectile.from_party, point, PROJECTILE_HIT_DISTANCE)
            }
        };
        let school = spells
            .get(&projectile.spell)
            .map(|def| def.school)
            .unwrap_or(Skill::CombatMagic);

        for victim in victims {
            channel.emit(SimEvent::ProjectileHit {
                projectile: entity,
                target: victim,
            });
            let dealt = deal_spell_damage(
                &mut commands,
                &mut channel,
                &mut actors,
                SpellHit {
                    caster: projectile.caster,
                    target: victim,
                    amount: projectile.damage,
                    damage_type: projectile.damage_type,
                    mitigation: Mitigation::Resistance,
                    spell: projectile.spell.clone(),
                    school,
                },
            );
            if let (Some(_), Some(spec)) = (dealt, projectile.on_hit.as_ref()) {
                afflict(
                    &mut commands,
                    &mut channel,
                    &mut actors,
                    victim,
                    StatusEffect::from_spec(spec, Some(projectile.caster)),
                );
            }
        }

        commands.entity(entity).despawn();
    }
}
