//! Status Effect Engine
//!
//! Ticks every entity's [`StatusEffects`]:
//! 1. Damage- and heal-over-time contribute `per_second × dt` every tick;
//!    damage is published as `DamageDealt` once whole points accumulate
//! 2. Durations decay
//! 3. Effects at or below zero are pruned (after their final contribution)
//!
//! Application goes through [`apply_status`] so `StatusApplied` is always
//! published and the (kind, source) replacement rule always holds.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::{DamageSource, SimEvent};
use super::components::*;
use super::damage::LastDamagedBy;
use super::formulas::finalize_hit;

/// Attach (or replace) an effect on `target`.
///
/// Entities spawned without a `StatusEffects` list get one; several
/// applications in the same tick all land in it.
pub fn apply_status(
    commands: &mut Commands,
    channel: &mut EventChannel,
    target: Entity,
    statuses: Option<&mut StatusEffects>,
    effect: StatusEffect,
) {
    channel.emit(SimEvent::StatusApplied {
        target,
        kind: effect.kind,
        source: effect.source,
        duration: effect.duration,
    });

    match statuses {
        Some(statuses) => {
            statuses.add(effect);
        }
        None => {
            // Deferred: earlier commands this tick may already have attached a list
            if let Some(mut entity) = commands.get_entity(target) {
                entity.queue(move |id: Entity, world: &mut World| {
                    let Ok(mut entity) = world.get_entity_mut(id) else {
                        return;
                    };
                    match entity.get_mut::<StatusEffects>() {
                        Some(mut statuses) => {
                            statuses.add(effect);
                        }
                        None => {
                            entity.insert(StatusEffects {
                                effects: vec![effect],
                            });
                        }
                    }
                });
            }
        }
    }
}

/// Apply over-time effects, decay durations and prune expired effects.
pub fn process_status_effects(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut affected: Query<(Entity, &mut StatusEffects, Option<&mut Health>, Has<Dead>, Has<Downed>)>,
) {
    let dt = time.delta_secs();

    for (entity, mut statuses, health, dead, downed) in affected.iter_mut() {
        if statuses.effects.is_empty() {
            continue;
        }

        // Corpses and downed members don't burn or regenerate
        if let (Some(mut health), false, false) = (health, dead, downed) {
            let mut kill_credit = None;
            for effect in statuses.effects.iter_mut() {
                if effect.heal_per_second > 0.0 {
                    health.heal(effect.heal_per_second * dt);
                }
                if effect.damage_per_second > 0.0 && effect.kind.is_harmful() {
                    effect.unreported_damage += health.apply_damage(effect.damage_per_second * dt);
                    kill_credit = effect.source.or(kill_credit);

                    let amount = finalize_hit(effect.unreported_damage);
                    if amount >= 1.0 {
                        effect.unreported_damage -= amount;
                        let attacker = effect
                            .source
                            .filter(|&source| commands.get_entity(source).is_some());
                        channel.emit(SimEvent::DamageDealt {
                            attacker,
                            target: entity,
                            amount,
                            damage_type: effect.kind.damage_type(),
                            is_critical: false,
                            source: DamageSource::Status(effect.kind),
                        });
                    }
                }
            }
            if let Some(attacker) = kill_credit {
                commands.entity(entity).try_insert(LastDamagedBy {
                    attacker,
                    skill: Skill::CombatMagic,
                });
            }
        }

        for effect in statuses.effects.iter_mut() {
            effect.duration -= dt;
        }

        for expired in statuses.remove_expired() {
            channel.emit(SimEvent::StatusExpired {
                target: entity,
                kind: expired.kind,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::combat::events::DamageType;
    use bevy::ecs::system::RunSystemOnce;
    use std::time::Duration;

    fn world_with_time(dt: f32) -> World {
        let mut world = World::new();
        let mut time = Time::<()>::default();
        time.advance_by(Duration::from_secs_f32(dt));
        world.insert_resource(time);
        world.init_resource::<EventChannel>();
        world
    }

    fn burn(dps: f32, duration: f32) -> StatusEffect {
        let mut effect = StatusEffect::new(StatusKind::Burn, duration, None);
        effect.damage_per_second = dps;
        effect
    }

    #[test]
    fn test_damage_over_time_applies_every_tick() {
        let mut world = world_with_time(0.5);
        let entity = world
            .spawn((
                Health::new(100.0),
                StatusEffects {
                    effects: vec![burn(10.0, 3.0)],
                },
            ))
            .id();

        world.run_system_once(process_status_effects).unwrap();
        world.run_system_once(process_status_effects).unwrap();

        assert_eq!(world.get::<Health>(entity).unwrap().current, 90.0);
        let statuses = world.get::<StatusEffects>(entity).unwrap();
        assert!((statuses.effects[0].duration - 2.0).abs() < 1e-5);
    }

    #[test]
    fn test_final_contribution_before_prune() {
        let mut world = world_with_time(0.5);
        let entity = world
            .spawn((
                Health::new(100.0),
                StatusEffects {
                    effects: vec![burn(10.0, 0.25)],
                },
            ))
            .id();

        world.run_system_once(process_status_effects).unwrap();

        assert_eq!(world.get::<Health>(entity).unwrap().current, 95.0);
        assert!(world.get::<StatusEffects>(entity).unwrap().effects.is_empty());
        let channel = world.resource::<EventChannel>();
        assert_eq!(
            channel.pending(),
            &[
                SimEvent::DamageDealt {
                    attacker: None,
                    target: entity,
                    amount: 5.0,
                    damage_type: DamageType::Fire,
                    is_critical: false,
                    source: DamageSource::Status(StatusKind::Burn),
                },
                SimEvent::StatusExpired {
                    target: entity,
                    kind: StatusKind::Burn
                }
            ]
        );
    }

    #[test]
    fn test_fractional_ticks_are_reported_in_whole_points() {
        let mut world = world_with_time(0.1);
        let caster = world.spawn_empty().id();
        let mut poison = StatusEffect::new(StatusKind::Poison, 3.0, Some(caster));
        poison.damage_per_second = 4.0;
        let entity = world
            .spawn((Health::new(100.0), StatusEffects { effects: vec![poison] }))
            .id();

        for _ in 0..10 {
            world.run_system_once(process_status_effects).unwrap();
        }

        let reported: Vec<SimEvent> = world.resource::<EventChannel>().pending().to_vec();
        let total: f32 = reported
            .iter()
            .map(|e| match e {
                SimEvent::DamageDealt { amount, attacker, damage_type, source, .. } => {
                    assert_eq!(*attacker, Some(caster));
                    assert_eq!(*damage_type, DamageType::Poison);
                    assert_eq!(*source, DamageSource::Status(StatusKind::Poison));
                    assert!(*amount >= 1.0);
                    *amount
                }
                other => panic!("unexpected event {:?}", other),
            })
            .sum();
        // 0.4 per tick: one point every third tick at best
        assert!(reported.len() < 10);
        assert_eq!(total, 4.0);
        assert!((world.get::<Health>(entity).unwrap().current - 96.0).abs() < 1e-3);
    }

    #[test]
    fn test_dead_entities_do_not_burn() {
        let mut world = world_with_time(1.0);
        let mut health = Health::new(100.0);
        health.current = 0.0;
        let entity = world
            .spawn((
                health,
                Dead::default(),
                StatusEffects {
                    effects: vec![burn(10.0, 3.0)],
                },
            ))
            .id();

        world.run_system_once(process_status_effects).unwrap();

        assert_eq!(world.get::<Health>(entity).unwrap().current, 0.0);
    }

    #[test]
    fn test_apply_status_inserts_list_when_missing() {
        let mut world = world_with_time(0.0);
        let target = world.spawn(Health::new(10.0)).id();

        world
            .run_system_once(move |mut commands: Commands, mut channel: ResMut<EventChannel>| {
                let stun = StatusEffect::new(StatusKind::Stun, 1.0, None);
                apply_status(&mut commands, &mut channel, target, None, stun);
            })
            .unwrap();

        let statuses = world.get::<StatusEffects>(target).unwrap();
        assert!(statuses.is_stunned());
    }

    #[test]
    fn test_same_tick_applications_all_land_on_missing_list() {
        let mut world = world_with_time(0.0);
        let target = world.spawn(Health::new(10.0)).id();

        world
            .run_system_once(move |mut commands: Commands, mut channel: ResMut<EventChannel>| {
                let stun = StatusEffect::new(StatusKind::Stun, 1.0, None);
                let mut burn = StatusEffect::new(StatusKind::Burn, 2.0, None);
                burn.damage_per_second = 3.0;
                apply_status(&mut commands, &mut channel, target, None, stun);
                apply_status(&mut commands, &mut channel, target, None, burn);
            })
            .unwrap();

        let statuses = world.get::<StatusEffects>(target).unwrap();
        assert_eq!(statuses.effects.len(), 2);
        assert!(statuses.is_stunned());
        assert!(statuses.has(StatusKind::Burn));
        assert_eq!(world.resource::<EventChannel>().pending().len(), 2);
    }
}
