//! Spell Resolution
//!
//! Drains [`PendingCasts`] and resolves each cast by archetype. The frozen
//! target is re-validated first: a target that died (or, for friendly spells,
//! is gone) makes the cast fizzle with no effect.
//!
//! Every resolved cast then faces the caster toward the point, grants school
//! experience and publishes `SpellCast`.

use bevy::prelude::*;
use smallvec::SmallVec;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use crate::sim::components::*;
use crate::sim::constants::*;
use crate::sim::damage::award_experience;
use crate::sim::formulas::{finalize_hit, scaled_heal, scaled_spell_damage};
use crate::sim::spatial::{Spatial, SpatialQuery};
use crate::sim::spell_config::{Archetype, ImpactBlast, SpellDefinition, SpellDefinitions, StatusSpec, Targeting};
use crate::sim::utils::{is_opposing, within_cone, ActorInfo, ActorSnapshot};

use super::{
    afflict, deal_spell_damage, face_toward, heal_actor, impact_blast, melee_special_damage, snapshot_actors,
    Mitigation, PendingCasts, ResolvedCast, SpellActors, SpellHit,
};

/// Knockback tries the full distance first, then shorter fractions.
const KNOCKBACK_STEPS: [f32; 4] = [1.0, 0.75, 0.5, 0.25];

/// Everything one archetype needs about the cast being resolved.
struct CastContext<'a> {
    def: &'a SpellDefinition,
    cast: &'a ResolvedCast,
    caster: ActorInfo,
    target: Option<Entity>,
    point: Vec2,
    attributes: Option<&'a Attributes>,
    skills: Option<&'a SkillLevels>,
}

impl CastContext<'_> {
    fn spell_damage(&self, base: f32) -> f32 {
        scaled_spell_damage(base, self.attributes, self.skills, self.def.school)
    }

    fn heal_amount(&self, base: f32) -> f32 {
        finalize_hit(scaled_heal(base, self.attributes, self.skills))
    }

    fn hit(&self, target: Entity, amount: f32, mitigation: Mitigation) -> SpellHit {
        SpellHit {
            caster: self.caster.entity,
            target,
            amount,
            damage_type: self.def.damage_type,
            mitigation,
            spell: self.cast.spell.clone(),
            school: self.def.school,
        }
    }
}

/// Re-validate the frozen target. Returns the refreshed (target, point), or
/// None if the cast fizzles.
fn revalidate_target(
    def: &SpellDefinition,
    cast: &ResolvedCast,
    caster: &ActorInfo,
    snapshot: &ActorSnapshot,
) -> Option<(Option<Entity>, Vec2)> {
    match (def.targeting, cast.target) {
        (Targeting::Enemy, Some(target)) => snapshot
            .get(target)
            .filter(|t| t.is_alive())
            .map(|t| (Some(t.entity), t.position)),
        (Targeting::Ally, Some(target)) => snapshot
            .get(target)
            .filter(|t| !t.dead)
            .map(|t| (Some(t.entity), t.position)),
        (Targeting::Caster, _) => Some((Some(caster.entity), caster.position)),
        (_, target) => Some((target, cast.point)),
    }
}

/// Resolve every pending cast, in acceptance order.
pub fn resolve_spells(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut pending: ResMut<PendingCasts>,
    spells: Res<SpellDefinitions>,
    spatial: Res<Spatial>,
    casters: Query<(Option<&Attributes>, Option<&SkillLevels>, Option<&Weapon>)>,
    mut actors: SpellActors,
) {
    for cast in std::mem::take(&mut pending.0) {
        let Some(def) = spells.get(&cast.spell) else {
            continue;
        };
        // Earlier casts this tick may have changed who is standing
        let snapshot = snapshot_actors(&actors);
        let Some(caster) = snapshot.get(cast.caster).filter(|c| c.is_alive()).copied() else {
            continue;
        };
        let Some((target, point)) = revalidate_target(def, &cast, &caster, &snapshot) else {
            debug!("{} from {:?} fizzled: target no longer valid", cast.spell, cast.caster);
            continue;
        };
        let (attributes, skills, weapon) = casters.get(cast.caster).unwrap_or((None, None, None));

        let ctx = CastContext {
            def,
            cast: &cast,
            caster,
            target,
            point,
            attributes,
            skills,
        };

        // Face first so cones aim where the caster now looks
        if point != caster.position {
            face_toward(&mut actors, caster.entity, point);
        }

        match &def.archetype {
            Archetype::Projectile { damage, speed, on_hit } => {
                launch_projectile(&mut commands, &mut channel, &ctx, *damage, *speed, on_hit.as_ref());
            }
            Archetype::Instant { damage, heal } => {
                resolve_instant(&mut commands, &mut channel, &mut actors, &ctx, *damage, *heal);
            }
            Archetype::Area { damage, radius, lingering } => {
                let amount = ctx.spell_damage(*damage);
                for victim in snapshot.opposing_in_radius(caster.party, point, *radius) {
                    deal_spell_damage(
                        &mut commands,
                        &mut channel,
                        &mut actors,
                        ctx.hit(victim, amount, Mitigation::Resistance),
                    );
                }
                if let Some(lingering) = lingering.as_ref().filter(|l| l.duration > 0.0) {
                    let per_tick = lingering
                        .tick_damage
                        .map(|d| ctx.spell_damage(d))
                        .unwrap_or(amount / 2.0);
                    commands.spawn((
                        Position(point),
                        AreaEffect {
                            spell: cast.spell.clone(),
                            caster: caster.entity,
                            from_party: caster.party,
                            radius: *radius,
                            remaining: lingering.duration,
                            tick_interval: lingering.tick_interval,
                            next_tick: lingering.tick_interval,
                            damage_per_tick: per_tick,
                            damage_type: def.damage_type,
                        },
                    ));
                }
            }
            Archetype::Chain { damage, targets, jump_range, falloff } => {
                resolve_chain(
                    &mut commands,
                    &mut channel,
                    &mut actors,
                    &snapshot,
                    &ctx,
                    ChainShape {
                        damage: *damage,
                        targets: *targets,
                        jump_range: *jump_range,
                        falloff: *falloff,
                    },
                );
            }
            Archetype::Buff { status } => {
                let recipient = target.unwrap_or(caster.entity);
                afflict(
                    &mut commands,
                    &mut channel,
                    &mut actors,
                    recipient,
                    StatusEffect::from_spec(status, Some(caster.entity)),
                );
            }
            Archetype::Cone { damage, range, angle, damage_multiplier } => {
                let facing = actors
                    .get(caster.entity)
                    .ok()
                    .and_then(|(_, _, _, facing, ..)| facing.copied())
                    .unwrap_or_default();
                let direction = if target.is_some() && point != caster.position {
                    point - caster.position
                } else {
                    facing.to_vector()
                };
                let (amount, mitigation) = match damage_multiplier {
                    Some(multiplier) => (
                        melee_special_damage(&actors, caster.entity, weapon, *multiplier, 0.0),
                        Mitigation::Unmitigated,
                    ),
                    None => (ctx.spell_damage(*damage), Mitigation::Resistance),
                };
                let victims: Vec<Entity> = snapshot
                    .iter()
                    .filter(|a| a.is_alive() && is_opposing(caster.party, a.party))
                    .filter(|a| a.position.distance(caster.position) <= *range)
                    .filter(|a| within_cone(caster.position, direction, a.position, angle / 2.0))
                    .map(|a| a.entity)
                    .collect();
                for victim in victims {
                    deal_spell_damage(
                        &mut commands,
                        &mut channel,
                        &mut actors,
                        ctx.hit(victim, amount, mitigation),
                    );
                }
            }
            Archetype::PartyHeal { heal } => {
                let amount = ctx.heal_amount(*heal);
                let members: Vec<Entity> = snapshot
                    .iter()
                    .filter(|a| a.is_alive() && !is_opposing(caster.party, a.party))
                    .map(|a| a.entity)
                    .collect();
                for member in members {
                    heal_actor(&mut channel, &mut actors, caster.entity, member, amount);
                }
            }
            Archetype::Strike { damage_multiplier, flat_damage, status, knockback, impact } => {
                let Some(victim) = target.filter(|t| snapshot.is_alive(*t)) else {
                    debug!("{} from {:?} fizzled: no target", cast.spell, cast.caster);
                    continue;
                };
                let base = melee_special_damage(&actors, caster.entity, weapon, *damage_multiplier, *flat_damage);
                resolve_strike(
                    &mut commands,
                    &mut channel,
                    &mut actors,
                    &**spatial,
                    &ctx,
                    victim,
                    base,
                    StrikeExtras {
                        status: status.as_ref(),
                        knockback: *knockback,
                        impact: impact.as_ref(),
                    },
                );
            }
            Archetype::Leap { damage_multiplier, flat_damage, duration, stun, impact } => {
                let Some(victim) = target.and_then(|t| snapshot.get(t)).filter(|t| t.is_alive()) else {
                    debug!("{} from {:?} fizzled: no target", cast.spell, cast.caster);
                    continue;
                };
                if !spatial.has_line_of_sight(caster.position, victim.position) {
                    debug!("{} from {:?} fizzled: no line of sight", cast.spell, cast.caster);
                    continue;
                }
                let base = melee_special_damage(&actors, caster.entity, weapon, *damage_multiplier, *flat_damage);
                commands.entity(caster.entity).insert((
                    MoveIntent::stop(),
                    LeapingAbility {
                        spell: cast.spell.clone(),
                        target: victim.entity,
                        start: caster.position,
                        end: leap_landing(caster.position, victim.position),
                        duration: *duration,
                        elapsed: 0.0,
                        damage: base,
                        stun: *stun,
                        impact: impact.clone(),
                        has_landed: false,
                    },
                ));
            }
            Archetype::Channel { damage_multiplier, flat_damage, radius, hits, hit_interval } => {
                let base = melee_special_damage(&actors, caster.entity, weapon, *damage_multiplier, *flat_damage);
                for victim in snapshot.opposing_in_radius(caster.party, caster.position, *radius) {
                    deal_spell_damage(
                        &mut commands,
                        &mut channel,
                        &mut actors,
                        ctx.hit(victim, base, Mitigation::Unmitigated),
                    );
                }
                if *hits > 1 {
                    commands.entity(caster.entity).insert(ActiveAbility {
                        spell: cast.spell.clone(),
                        hits_remaining: hits - 1,
                        hit_interval: *hit_interval,
                        next_hit_timer: *hit_interval,
                        radius: *radius,
                        damage_per_hit: base,
                        elapsed: 0.0,
                        total_duration: *hits as f32 * hit_interval,
                    });
                }
            }
        }

        award_experience(&mut channel, caster.entity, def.school, def.cast_experience());
        channel.emit(SimEvent::SpellCast {
            caster: caster.entity,
            spell: cast.spell.clone(),
            target,
            point,
        });
        debug!("{:?} cast {}", caster.entity, cast.spell);
    }
}

fn launch_projectile(
    commands: &mut Commands,
    channel: &mut EventChannel,
    ctx: &CastContext,
    damage: f32,
    speed: f32,
    on_hit: Option<&StatusSpec>,
) {
    let target = match ctx.target {
        Some(target) if ctx.def.targeting != Targeting::Ground => ProjectileTarget::Homing(target),
        _ => ProjectileTarget::Ground(ctx.point),
    };
    let projectile = commands
        .spawn((
            Position(ctx.caster.position),
            Projectile {
                spell: ctx.cast.spell.clone(),
                caster: ctx.caster.entity,
                target,
                speed,
                damage: ctx.spell_damage(damage),
                damage_type: ctx.def.damage_type,
                from_party: ctx.caster.party,
                on_hit: on_hit.cloned(),
                lifetime: PROJECTILE_LIFETIME,
            },
        ))
        .id();

    channel.emit(SimEvent::ProjectileCreated {
        projectile,
        caster: ctx.caster.entity,
        spell: ctx.cast.spell.clone(),
    });
}

fn resolve_instant(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    ctx: &CastContext,
    damage: f32,
    heal: f32,
) {
    let recipient = ctx.target.unwrap_or(ctx.caster.entity);
    if heal > 0.0 {
        heal_actor(channel, actors, ctx.caster.entity, recipient, ctx.heal_amount(heal));
    }
    if damage > 0.0 {
        let opposing = actors
            .get(recipient)
            .map(|(.., party, _, _, _)| is_opposing(ctx.caster.party, party))
            .unwrap_or(false);
        if opposing {
            deal_spell_damage(
                commands,
                channel,
                actors,
                ctx.hit(recipient, ctx.spell_damage(damage), Mitigation::Resistance),
            );
        }
    }
}

struct ChainShape {
    damage: f32,
    targets: u32,
    jump_range: f32,
    falloff: f32,
}

/// Primary target, then the nearest unhit opposing actor within jump range of
/// the previous one, losing `falloff` of the damage per jump. Jumps ignore walls.
fn resolve_chain(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    snapshot: &ActorSnapshot,
    ctx: &CastContext,
    shape: ChainShape,
) {
    let party = ctx.caster.party;
    let eligible = |a: &ActorInfo| a.is_alive() && is_opposing(party, a.party);

    let first = match ctx.target {
        Some(target) => snapshot.get(target).filter(|a| eligible(*a)),
        None => snapshot.nearest(ctx.point, shape.jump_range, eligible),
    };
    let Some(mut current) = first.copied() else {
        return;
    };

    let mut struck: SmallVec<[Entity; 8]> = SmallVec::new();
    let mut amount = ctx.spell_damage(shape.damage);

    for _ in 0..shape.targets {
        deal_spell_damage(commands, channel, actors, ctx.hit(current.entity, amount, Mitigation::Resistance));
        struck.push(current.entity);
        amount *= shape.falloff;

        let from = current.position;
        let next = snapshot.nearest(from, shape.jump_range, |a| {
            eligible(a) && !struck.contains(&a.entity)
        });
        match next {
            Some(next) => current = *next,
            None => break,
        }
    }
}

struct StrikeExtras<'a> {
    status: Option<&'a StatusSpec>,
    knockback: f32,
    impact: Option<&'a ImpactBlast>,
}

#[allow(clippy::too_many_arguments)]
fn resolve_strike(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    spatial: &dyn SpatialQuery,
    ctx: &CastContext,
    victim: Entity,
    base: f32,
    extras: StrikeExtras,
) {
    let Ok((_, victim_pos, ..)) = actors.get(victim) else {
        return;
    };
    let victim_pos = victim_pos.0;

    deal_spell_damage(commands, channel, actors, ctx.hit(victim, base, Mitigation::Unmitigated));

    if let Some(spec) = extras.status {
        afflict(commands, channel, actors, victim, StatusEffect::from_spec(spec, Some(ctx.caster.entity)));
    }

    if extras.knockback > 0.0 {
        if let Some(landing) = knockback_destination(spatial, ctx.caster.position, victim_pos, extras.knockback) {
            if let Ok((_, mut position, ..)) = actors.get_mut(victim) {
                position.0 = landing;
            }
        }
    }

    if let Some(blast) = extras.impact {
        impact_blast(
            commands,
            channel,
            actors,
            &ctx.caster,
            victim,
            victim_pos,
            base,
            blast,
            &ctx.cast.spell,
            ctx.def.school,
        );
    }
}

/// Where a knocked-back target ends up: the farthest of the stepped
/// distances that is walkable and in sight of where it stood.
pub fn knockback_destination(spatial: &dyn SpatialQuery, from: Vec2, target: Vec2, distance: f32) -> Option<Vec2> {
    let direction = (target - from).normalize_or_zero();
    if direction == Vec2::ZERO {
        return None;
    }
    KNOCKBACK_STEPS
        .iter()
        .map(|step| target + direction * distance * step)
        .find(|candidate| spatial.is_walkable(*candidate) && spatial.has_line_of_sight(target, *candidate))
}

/// Landing point of a leap: just short of the target, or on it when already
/// adjacent.
pub fn leap_landing(start: Vec2, target: Vec2) -> Vec2 {
    let offset = target - start;
    let distance = offset.length();
    if distance > LEAP_MIN_TRAVEL {
        start + offset / distance * (distance - LEAP_LANDING_OFFSET).max(0.0)
    } else {
        target
    }
}
