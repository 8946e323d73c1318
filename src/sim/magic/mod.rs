//! Spellcasting Pipeline
//!
//! A `CastIntent` travels through:
//! 1. `cast::process_cast_intents` - acceptance checks, costs, cooldowns
//! 2. `cast::process_casting` - cast-time countdown (`Casting`)
//! 3. `archetypes::resolve_spells` - per-archetype resolution
//! 4. `projectiles` and `multi_frame` - effects that outlive the cast tick
//!
//! Accepted casts wait in [`PendingCasts`] between steps 1/2 and 3, so
//! resolution happens in one place with mutable access to every actor.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::{DamageSource, DamageType};
use super::components::*;
use super::combat::base_weapon_damage;
use super::damage::{apply_heal, apply_hit, Hit};
use super::formulas::{apply_resistance, finalize_hit};
use super::spell_config::{ImpactBlast, SpellId};
use super::status::apply_status;
use super::utils::{ActorInfo, ActorSnapshot};

pub mod archetypes;
pub mod cast;
pub mod multi_frame;
pub mod projectiles;

pub use archetypes::resolve_spells;
pub use cast::{process_cast_intents, process_casting};
pub use multi_frame::{update_active_abilities, update_area_effects, update_leaps};
pub use projectiles::update_projectiles;

/// A cast that passed acceptance and finished casting.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedCast {
    pub caster: Entity,
    pub spell: SpellId,
    /// Frozen target, re-validated on resolution
    pub target: Option<Entity>,
    pub point: Vec2,
}

/// Casts waiting for resolution this tick, in acceptance order.
#[derive(Resource, Debug, Default)]
pub struct PendingCasts(pub Vec<ResolvedCast>);

/// Mutable access to everything a spell can touch.
pub type SpellActors<'w, 's> = Query<
    'w,
    's,
    (
        Entity,
        &'static mut Position,
        &'static mut Health,
        Option<&'static mut Facing>,
        Option<&'static mut StatusEffects>,
        Option<&'static Resistances>,
        Option<&'static CombatStats>,
        Has<PartyMember>,
        Has<Enemy>,
        Has<Dead>,
        Has<Downed>,
    ),
>;

/// Freeze the actors into a snapshot for target selection.
pub fn snapshot_actors(actors: &SpellActors) -> ActorSnapshot {
    ActorSnapshot::new(actors.iter().map(
        |(entity, position, health, _, _, _, _, party, enemy, dead, downed)| ActorInfo {
            entity,
            position: position.0,
            party,
            enemy,
            dead,
            downed,
            health_fraction: health.fraction(),
        },
    ))
}

/// How spell damage is mitigated on the receiving end.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mitigation {
    /// Elemental: target resistance, at least 1 point if anything was dealt
    Resistance,
    /// Weapon-based specials: dealt as rolled, armor ignored
    Unmitigated,
}

/// Scaled, unmitigated damage headed for one target.
#[derive(Debug, Clone)]
pub struct SpellHit {
    pub caster: Entity,
    pub target: Entity,
    pub amount: f32,
    pub damage_type: DamageType,
    pub mitigation: Mitigation,
    pub spell: SpellId,
    pub school: Skill,
}

/// Mitigate, truncate once and apply a spell hit. Returns the damage dealt,
/// or None if the target is gone, dead or downed.
pub fn deal_spell_damage(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    hit: SpellHit,
) -> Option<f32> {
    let Ok((_, _, mut health, _, _, resistances, _, _, _, dead, downed)) = actors.get_mut(hit.target)
    else {
        return None;
    };
    if dead || downed {
        return None;
    }

    let amount = match hit.mitigation {
        Mitigation::Resistance => {
            let resistance = resistances.map(|r| r.get(hit.damage_type)).unwrap_or(0.0);
            let dealt = finalize_hit(apply_resistance(hit.amount, resistance));
            if hit.amount > 0.0 && resistance < 1.0 {
                dealt.max(1.0)
            } else {
                dealt
            }
        }
        Mitigation::Unmitigated => finalize_hit(hit.amount),
    };

    apply_hit(
        commands,
        channel,
        &mut health,
        Hit {
            attacker: Some(hit.caster),
            target: hit.target,
            amount,
            damage_type: hit.damage_type,
            is_critical: false,
            source: DamageSource::Spell(hit.spell),
            skill: hit.school,
        },
    );
    Some(amount)
}

/// Turn `entity` to face `point`, if it is somewhere else.
pub fn face_toward(actors: &mut SpellActors, entity: Entity, point: Vec2) {
    let Ok((_, position, _, facing, ..)) = actors.get_mut(entity) else {
        return;
    };
    if let (Some(mut facing), Some(toward)) = (facing, Facing::from_vector(point - position.0)) {
        *facing = toward;
    }
}

/// Heal a standing actor. Returns the amount restored.
pub fn heal_actor(
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    source: Entity,
    target: Entity,
    amount: f32,
) -> f32 {
    let Ok((_, _, mut health, _, _, _, _, _, _, dead, downed)) = actors.get_mut(target) else {
        return 0.0;
    };
    if dead || downed {
        return 0.0;
    }
    apply_heal(channel, source, target, &mut health, amount)
}

/// Attach a status effect to a standing actor.
pub fn afflict(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    target: Entity,
    effect: StatusEffect,
) {
    let Ok((_, _, health, _, mut statuses, _, _, _, _, dead, downed)) = actors.get_mut(target) else {
        return;
    };
    if dead || downed || health.is_depleted() {
        return;
    }
    apply_status(commands, channel, target, statuses.as_deref_mut(), effect);
}

/// Base damage of a weapon-driven special for `caster`.
pub fn melee_special_damage(
    actors: &SpellActors,
    caster: Entity,
    weapon: Option<&Weapon>,
    multiplier: f32,
    flat: f32,
) -> f32 {
    let stats = actors.get(caster).ok().and_then(|(.., stats, _, _, _, _)| stats);
    base_weapon_damage(weapon, stats) * multiplier + flat
}

/// Secondary weapon damage around `center`, sparing `exclude`.
#[allow(clippy::too_many_arguments)]
pub fn impact_blast(
    commands: &mut Commands,
    channel: &mut EventChannel,
    actors: &mut SpellActors,
    caster: &ActorInfo,
    exclude: Entity,
    center: Vec2,
    base_damage: f32,
    blast: &ImpactBlast,
    spell: &SpellId,
    school: Skill,
) {
    let victims = snapshot_actors(actors).opposing_in_radius(caster.party, center, blast.radius);
    for victim in victims.into_iter().filter(|v| *v != exclude) {
        deal_spell_damage(
            commands,
            channel,
            actors,
            SpellHit {
                caster: caster.entity,
                target: victim,
                amount: base_damage * blast.damage_multiplier,
                damage_type: DamageType::Physical,
                mitigation: Mitigation::Unmitigated,
                spell: spell.clone(),
                school,
            },
        );
    }
}
