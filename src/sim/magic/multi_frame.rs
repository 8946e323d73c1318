//! Multi-Frame Abilities
//!
//! Effects that outlive the tick they were cast on, each advanced by the
//! frame delta until its completion predicate holds:
//! - [`AreaEffect`]: lingering ground damage, removed when `remaining <= 0`
//! - [`ActiveAbility`]: channeled hits around the caster, removed when no
//!   hits remain
//! - [`LeapingAbility`]: arc toward a target, lands once at `p >= 1`,
//!   removed after the recovery pose

use bevy::prelude::*;
use std::f32::consts::{FRAC_PI_2, PI};

use crate::combat::channel::EventChannel;
use crate::combat::events::DamageType;
use crate::sim::components::*;
use crate::sim::constants::*;
use crate::sim::spatial::Spatial;
use crate::sim::spell_config::{SpellDefinitions, SpellId};

use super::{
    afflict, deal_spell_damage, impact_blast, snapshot_actors, Mitigation, SpellActors, SpellHit,
};

fn school_of(spells: &SpellDefinitions, spell: &SpellId, fallback: Skill) -> Skill {
    spells.get(spell).map(|def| def.school).unwrap_or(fallback)
}

/// Tick lingering ground effects.
pub fn update_area_effects(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    spells: Res<SpellDefinitions>,
    mut effects: Query<(Entity, &Position, &mut AreaEffect), Without<Health>>,
    mut actors: SpellActors,
) {
    let dt = time.delta_secs();

    for (entity, position, mut effect) in effects.iter_mut() {
        effect.next_tick -= dt;
        if effect.next_tick <= 0.0 {
            effect.next_tick += effect.tick_interval;

            let school = school_of(&spells, &effect.spell, Skill::CombatMagic);
            let victims = snapshot_actors(&actors).opposing_in_radius(effect.from_party, position.0, effect.radius);
            for victim in victims {
                deal_spell_damage(
                    &mut commands,
                    &mut channel,
                    &mut actors,
                    SpellHit {
                        caster: effect.caster,
                        target: victim,
                        amount: effect.damage_per_tick,
                        damage_type: effect.damage_type,
                        mitigation: Mitigation::Resistance,
                        spell: effect.spell.clone(),
                        school,
                    },
                );
            }
        }

        effect.remaining -= dt;
        if effect.remaining <= 0.0 {
            commands.entity(entity).despawn();
        }
    }
}

/// Re-hit everything around the channeling caster's current position.
pub fn update_active_abilities(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    spells: Res<SpellDefinitions>,
    mut channels: Query<(Entity, &mut ActiveAbility)>,
    mut actors: SpellActors,
) {
    let dt = time.delta_secs();

    for (entity, mut ability) in channels.iter_mut() {
        let snapshot = snapshot_actors(&actors);
        let Some(caster) = snapshot.get(entity).filter(|c| c.is_alive()).copied() else {
            commands.entity(entity).remove::<ActiveAbility>();
            continue;
        };

        ability.elapsed += dt;
        ability.next_hit_timer -= dt;
        if ability.next_hit_timer > 0.0 {
            continue;
        }
        ability.next_hit_timer += ability.hit_interval;
        ability.hits_remaining = ability.hits_remaining.saturating_sub(1);

        let school = school_of(&spells, &ability.spell, Skill::Melee);
        let damage_type = spells
            .get(&ability.spell)
            .map(|def| def.damage_type)
            .unwrap_or(DamageType::Physical);
        for victim in snapshot.opposing_in_radius(caster.party, caster.position, ability.radius) {
            deal_spell_damage(
                &mut commands,
                &mut channel,
                &mut actors,
                SpellHit {
                    caster: entity,
                    target: victim,
                    amount: ability.damage_per_hit,
                    damage_type,
                    mitigation: Mitigation::Unmitigated,
                    spell: ability.spell.clone(),
                    school,
                },
            );
        }

        if ability.hits_remaining == 0 {
            commands.entity(entity).remove::<ActiveAbility>();
        }
    }
}

/// Horizontal progress along a leap: fast launch, soft landing.
pub fn leap_ease(p: f32) -> f32 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        (p * FRAC_PI_2).sin()
    } else {
        1.0 - ((1.0 - p) * FRAC_PI_2).sin() * 0.3
    }
}

/// Arc height in pixels, taller for longer leaps.
pub fn leap_arc_height(p: f32, distance: f32) -> f32 {
    (p.clamp(0.0, 1.0) * PI).sin() * LEAP_ARC_HEIGHT * (0.5 + distance * 0.25).min(2.0)
}

/// Advance leaps; land exactly once, then hold the recovery pose.
pub fn update_leaps(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    spells: Res<SpellDefinitions>,
    spatial: Res<Spatial>,
    mut leapers: Query<(Entity, &mut LeapingAbility, Option<&mut RenderOffset>)>,
    mut actors: SpellActors,
) {
    let dt = time.delta_secs();

    for (entity, mut leap, mut offset) in leapers.iter_mut() {
        leap.elapsed += dt;

        if !leap.has_landed {
            let p = (leap.elapsed / leap.duration).min(1.0);
            let distance = leap.start.distance(leap.end);
            let mut at = leap.start.lerp(leap.end, leap_ease(p));

            if p >= 1.0 {
                leap.has_landed = true;
                at = if spatial.is_walkable(leap.end) {
                    leap.end
                } else {
                    spatial.clamp_position(leap.end)
                };
            }

            if let Ok((_, mut position, ..)) = actors.get_mut(entity) {
                position.0 = at;
            }
            if let Some(offset) = offset.as_mut() {
                offset.y = RENDER_OFFSET_BASE_Y - leap_arc_height(p, distance);
            }

            if leap.has_landed {
                land(&mut commands, &mut channel, &spells, &mut actors, entity, &leap, at);
            }
        }

        if leap.elapsed >= leap.duration + LEAP_RECOVERY {
            commands.entity(entity).remove::<LeapingAbility>();
            if let Some(offset) = offset.as_mut() {
                **offset = RenderOffset::default();
            }
        }
    }
}

fn land(
    commands: &mut Commands,
    channel: &mut EventChannel,
    spells: &SpellDefinitions,
    actors: &mut SpellActors,
    caster: Entity,
    leap: &LeapingAbility,
    at: Vec2,
) {
    let snapshot = snapshot_actors(actors);
    let Some(caster_info) = snapshot.get(caster).copied() else {
        return;
    };
    let school = school_of(spells, &leap.spell, Skill::Melee);

    if snapshot.is_alive(leap.target) {
        deal_spell_damage(
            commands,
            channel,
            actors,
            SpellHit {
                caster,
                target: leap.target,
                amount: leap.damage,
                damage_type: DamageType::Physical,
                mitigation: Mitigation::Unmitigated,
                spell: leap.spell.clone(),
                school,
            },
        );
        if leap.stun > 0.0 {
            afflict(
                commands,
                channel,
                actors,
                leap.target,
                StatusEffect::new(StatusKind::Stun, leap.stun, Some(caster)),
            );
        }
    }

    if let Some(blast) = &leap.impact {
        impact_blast(
            commands,
            channel,
            actors,
            &caster_info,
            leap.target,
            at,
            leap.damage,
            blast,
            &leap.spell,
            school,
        );
    }
}
