//! Cast acceptance and cast-time countdown.
//!
//! A cast intent is accepted only if, in order:
//! - the caster is standing, not stunned and not already casting
//! - the spell is known, off cooldown and present in the spell table
//! - the global cooldown has elapsed
//! - mana covers the cost
//! - a target resolves (in range and in sight) for enemy/ally spells
//!
//! Any failure clears the intent; nothing is queued. On acceptance mana is
//! spent, the spell cooldown and the global cooldown are armed, and the
//! spell either resolves this tick or starts a `Casting` countdown.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use crate::sim::components::*;
use crate::sim::spatial::{Spatial, SpatialQuery};
use crate::sim::spell_config::{SpellDefinition, SpellDefinitions, Targeting};
use crate::sim::utils::{is_opposing, ActorInfo, ActorSnapshot, ActorView};

use super::{PendingCasts, ResolvedCast};

/// Why a cast intent was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CastRejection {
    Incapacitated,
    AlreadyCasting,
    NotReady,
    UnknownSpell,
    GlobalCooldown,
    NotEnoughMana,
    NoTarget,
}

/// Resolve the target entity and point for a cast, or None if nothing valid
/// is in range and sight.
pub fn resolve_cast_target(
    def: &SpellDefinition,
    intent: &CastIntent,
    caster: &ActorInfo,
    snapshot: &ActorSnapshot,
    spatial: &dyn SpatialQuery,
) -> Option<(Option<Entity>, Vec2)> {
    let from = caster.position;
    let reachable = |info: &ActorInfo| {
        info.position.distance(from) <= def.range && spatial.has_line_of_sight(from, info.position)
    };

    match def.targeting {
        Targeting::Enemy => {
            let target = match intent.target {
                Some(explicit) => snapshot
                    .get(explicit)
                    .filter(|t| t.is_alive() && is_opposing(caster.party, t.party)),
                None => snapshot.nearest(from, def.range, |t| {
                    t.is_alive() && is_opposing(caster.party, t.party) && reachable(t)
                }),
            }?;
            reachable(target).then_some((Some(target.entity), target.position))
        }
        Targeting::Ally => {
            let target = match intent.target {
                // Downed allies may still be targeted by friendly spells
                Some(explicit) => snapshot
                    .get(explicit)
                    .filter(|t| !t.dead && !is_opposing(caster.party, t.party)),
                None => snapshot
                    .iter()
                    .filter(|t| t.is_alive() && !is_opposing(caster.party, t.party) && reachable(t))
                    .min_by(|a, b| a.health_fraction.total_cmp(&b.health_fraction))
                    .or(Some(caster)),
            }?;
            reachable(target).then_some((Some(target.entity), target.position))
        }
        Targeting::Ground => {
            let point = intent
                .point
                .or_else(|| intent.target.and_then(|t| snapshot.get(t)).map(|t| t.position))
                .unwrap_or(from);
            (point.distance(from) <= def.range).then_some((intent.target, point))
        }
        Targeting::Caster => Some((Some(caster.entity), from)),
    }
}

/// Caster state that gates acceptance.
#[derive(Debug, Clone, Copy)]
struct CasterReadiness {
    stunned: bool,
    casting: bool,
    gcd_ready: bool,
    mana: f32,
}

fn check_cast<'a>(
    spells: &'a SpellDefinitions,
    snapshot: &ActorSnapshot,
    spatial: &dyn SpatialQuery,
    entity: Entity,
    intent: &CastIntent,
    book: &SpellBook,
    readiness: CasterReadiness,
) -> Result<(&'a SpellDefinition, Option<Entity>, Vec2), CastRejection> {
    let caster = snapshot
        .get(entity)
        .filter(|c| c.is_alive())
        .ok_or(CastRejection::Incapacitated)?;
    if readiness.stunned {
        return Err(CastRejection::Incapacitated);
    }
    if readiness.casting {
        return Err(CastRejection::AlreadyCasting);
    }
    if !book.can_cast(&intent.spell) {
        return Err(CastRejection::NotReady);
    }
    let def = spells.get(&intent.spell).ok_or(CastRejection::UnknownSpell)?;
    if !readiness.gcd_ready {
        return Err(CastRejection::GlobalCooldown);
    }
    if readiness.mana + f32::EPSILON < def.mana_cost {
        return Err(CastRejection::NotEnoughMana);
    }
    let (target, point) =
        resolve_cast_target(def, intent, caster, snapshot, spatial).ok_or(CastRejection::NoTarget)?;
    Ok((def, target, point))
}

/// Check and accept cast intents.
pub fn process_cast_intents(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut pending: ResMut<PendingCasts>,
    spells: Res<SpellDefinitions>,
    spatial: Res<Spatial>,
    actors: Query<ActorView>,
    mut casters: Query<(
        Entity,
        &CastIntent,
        &mut SpellBook,
        Option<&mut Mana>,
        Option<&mut GlobalCooldown>,
        Option<&mut AllyAi>,
        Option<&StatusEffects>,
        Has<Casting>,
    )>,
) {
    let snapshot = ActorSnapshot::from_query(&actors);

    for (entity, intent, mut book, mana, gcd, ally, statuses, casting) in casters.iter_mut() {
        // Intents live one tick whatever the outcome
        commands.entity(entity).remove::<CastIntent>();

        let readiness = CasterReadiness {
            stunned: statuses.map(|s| s.is_stunned()).unwrap_or(false),
            casting,
            gcd_ready: gcd.as_ref().map(|g| g.is_ready()).unwrap_or(true),
            mana: mana.as_ref().map(|m| m.current).unwrap_or(0.0),
        };
        let result = check_cast(&spells, &snapshot, &**spatial, entity, intent, &book, readiness);

        let (def, target, point) = match result {
            Ok(accepted) => accepted,
            Err(CastRejection::NotEnoughMana) => {
                channel.emit(SimEvent::Notification {
                    entity: Some(entity),
                    message: "Not enough mana".to_string(),
                });
                continue;
            }
            Err(reason) => {
                debug!("{:?} cast of {} rejected: {:?}", entity, intent.spell, reason);
                continue;
            }
        };

        if let Some(mut mana) = mana {
            mana.try_spend(def.mana_cost);
        }
        book.start_cooldown(&intent.spell, def.cooldown);
        if let Some(mut gcd) = gcd {
            gcd.remaining = def.animation_duration;
        }
        // Player- and AI-issued casts arm AI readiness the same way
        if let Some(mut ally) = ally {
            ally.arm_spell(&intent.spell, def.cooldown);
        }

        let cast = ResolvedCast {
            caster: entity,
            spell: intent.spell.clone(),
            target,
            point,
        };
        if def.cast_time > 0.0 {
            commands.entity(entity).insert(Casting {
                spell: cast.spell,
                target: cast.target,
                point: cast.point,
                remaining: def.cast_time,
            });
        } else {
            pending.0.push(cast);
        }
    }
}

/// Count down cast times; finished casts move to resolution.
///
/// A caster that goes down mid-cast loses the cast.
pub fn process_casting(
    time: Res<Time>,
    mut commands: Commands,
    mut pending: ResMut<PendingCasts>,
    mut casters: Query<(Entity, &mut Casting, Has<Dead>, Has<Downed>)>,
) {
    let dt = time.delta_secs();

    for (entity, mut casting, dead, downed) in casters.iter_mut() {
        if dead || downed {
            commands.entity(entity).remove::<Casting>();
            continue;
        }

        casting.remaining -= dt;
        if casting.remaining > 0.0 {
            continue;
        }

        commands.entity(entity).remove::<Casting>();
        pending.0.push(ResolvedCast {
            caster: entity,
            spell: casting.spell.clone(),
            target: casting.target,
            point: casting.point,
        });
    }
}
