//! Simulation events
//!
//! Typed facts emitted by the simulation systems. They are queued in the
//! [`EventChannel`](super::channel::EventChannel) during a tick and delivered
//! after every system has run.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::sim::components::{Skill, StatusKind};
use crate::sim::spell_config::SpellId;

/// Types of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Fire,
    Ice,
    Lightning,
    Poison,
    Holy,
}

impl DamageType {
    pub fn name(&self) -> &'static str {
        match self {
            DamageType::Physical => "physical",
            DamageType::Fire => "fire",
            DamageType::Ice => "ice",
            DamageType::Lightning => "lightning",
            DamageType::Poison => "poison",
            DamageType::Holy => "holy",
        }
    }
}

/// What dealt a hit
#[derive(Debug, Clone, PartialEq)]
pub enum DamageSource {
    /// Weapon swing or shot from an attack intent
    Attack,
    /// Spell, projectile, area, channel or leap
    Spell(SpellId),
    /// Damage-over-time status
    Status(StatusKind),
}

/// One fact produced by the simulation.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SimEvent {
    DamageDealt {
        /// None when the source no longer exists (e.g. a burn outliving its caster)
        attacker: Option<Entity>,
        target: Entity,
        amount: f32,
        damage_type: DamageType,
        is_critical: bool,
        source: DamageSource,
    },
    EntityDied {
        entity: Entity,
        killer: Option<Entity>,
    },
    EntityDowned {
        entity: Entity,
    },
    EntityRevived {
        entity: Entity,
        health: f32,
    },
    CombatStarted {
        entity: Entity,
    },
    CombatEnded {
        entity: Entity,
    },
    SpellCast {
        caster: Entity,
        spell: SpellId,
        target: Option<Entity>,
        point: Vec2,
    },
    ProjectileCreated {
        projectile: Entity,
        caster: Entity,
        spell: SpellId,
    },
    ProjectileHit {
        projectile: Entity,
        target: Entity,
    },
    HealthRestored {
        source: Entity,
        target: Entity,
        amount: f32,
    },
    SkillXpGained {
        entity: Entity,
        skill: Skill,
        amount: u32,
    },
    LevelUp {
        entity: Entity,
        skill: Skill,
        new_level: u32,
    },
    StatusApplied {
        target: Entity,
        kind: StatusKind,
        source: Option<Entity>,
        duration: f32,
    },
    StatusExpired {
        target: Entity,
        kind: StatusKind,
    },
    EntityTeleported {
        entity: Entity,
        to: Vec2,
    },
    PartyWiped,
    /// Passive user-facing message ("Not enough mana")
    Notification {
        entity: Option<Entity>,
        message: String,
    },
}

/// Subscription key for [`SimEvent`] variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SimEventKind {
    DamageDealt,
    EntityDied,
    EntityDowned,
    EntityRevived,
    CombatStarted,
    CombatEnded,
    SpellCast,
    ProjectileCreated,
    ProjectileHit,
    HealthRestored,
    SkillXpGained,
    LevelUp,
    StatusApplied,
    StatusExpired,
    EntityTeleported,
    PartyWiped,
    Notification,
}

impl SimEvent {
    pub fn kind(&self) -> SimEventKind {
        match self {
            SimEvent::DamageDealt { .. } => SimEventKind::DamageDealt,
            SimEvent::EntityDied { .. } => SimEventKind::EntityDied,
            SimEvent::EntityDowned { .. } => SimEventKind::EntityDowned,
            SimEvent::EntityRevived { .. } => SimEventKind::EntityRevived,
            SimEvent::CombatStarted { .. } => SimEventKind::CombatStarted,
            SimEvent::CombatEnded { .. } => SimEventKind::CombatEnded,
            SimEvent::SpellCast { .. } => SimEventKind::SpellCast,
            SimEvent::ProjectileCreated { .. } => SimEventKind::ProjectileCreated,
            SimEvent::ProjectileHit { .. } => SimEventKind::ProjectileHit,
            SimEvent::HealthRestored { .. } => SimEventKind::HealthRestored,
            SimEvent::SkillXpGained { .. } => SimEventKind::SkillXpGained,
            SimEvent::LevelUp { .. } => SimEventKind::LevelUp,
            SimEvent::StatusApplied { .. } => SimEventKind::StatusApplied,
            SimEvent::StatusExpired { .. } => SimEventKind::StatusExpired,
            SimEvent::EntityTeleported { .. } => SimEventKind::EntityTeleported,
            SimEvent::PartyWiped => SimEventKind::PartyWiped,
            SimEvent::Notification { .. } => SimEventKind::Notification,
        }
    }
}
