//! Damage & Healing Application
//!
//! Every source of damage (weapon swings, spells, projectiles, ground effects,
//! channels, leaps) funnels through [`apply_hit`], so health, the combat flag,
//! kill credit and the `DamageDealt` event stay consistent. Life-state changes
//! are not made here; `combat::resolve_life_states` picks up depleted health.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::{DamageSource, DamageType, SimEvent};
use super::components::{Health, InCombat, Skill};

/// Who last hurt this entity, for kill credit.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct LastDamagedBy {
    pub attacker: Entity,
    /// Skill credited with the kill bonus
    pub skill: Skill,
}

/// A finished hit, already reduced by armor/resistance and truncated.
#[derive(Debug, Clone, PartialEq)]
pub struct Hit {
    pub attacker: Option<Entity>,
    pub target: Entity,
    pub amount: f32,
    pub damage_type: DamageType,
    pub is_critical: bool,
    pub source: DamageSource,
    pub skill: Skill,
}

/// Subtract a hit from `health` and publish it. Returns the health removed.
pub fn apply_hit(
    commands: &mut Commands,
    channel: &mut EventChannel,
    health: &mut Health,
    hit: Hit,
) -> f32 {
    let removed = health.apply_damage(hit.amount);

    enter_combat(commands, hit.target);
    if let Some(attacker) = hit.attacker {
        enter_combat(commands, attacker);
        if let Some(mut target) = commands.get_entity(hit.target) {
            target.try_insert(LastDamagedBy {
                attacker,
                skill: hit.skill,
            });
        }
    }

    channel.emit(SimEvent::DamageDealt {
        attacker: hit.attacker,
        target: hit.target,
        amount: hit.amount,
        damage_type: hit.damage_type,
        is_critical: hit.is_critical,
        source: hit.source,
    });

    removed
}

/// Heal `health`, publishing `HealthRestored` only when something was restored.
pub fn apply_heal(
    channel: &mut EventChannel,
    source: Entity,
    target: Entity,
    health: &mut Health,
    amount: f32,
) -> f32 {
    let restored = health.heal(amount);
    if restored > 0.0 {
        channel.emit(SimEvent::HealthRestored {
            source,
            target,
            amount: restored,
        });
    }
    restored
}

/// Put an entity in combat, or refresh its timer if it already is.
///
/// `CombatStarted` is published by the timer system when the flag first appears.
pub fn enter_combat(commands: &mut Commands, entity: Entity) {
    if let Some(mut entity) = commands.get_entity(entity) {
        entity.try_insert(InCombat::default());
    }
}

/// Grant skill experience. Progression applies it when the event is delivered.
pub fn award_experience(channel: &mut EventChannel, entity: Entity, skill: Skill, amount: u32) {
    if amount == 0 {
        return;
    }
    channel.emit(SimEvent::SkillXpGained {
        entity,
        skill,
        amount,
    });
}
