//! Status effect types
//!
//! Timed buffs and debuffs carried in an entity's [`StatusEffects`] list.
//!
//! Rules:
//! - A new effect replaces any existing effect with the same kind and source.
//! - Stun or root on an entity zeroes its movement regardless of slows.
//! - Slows combine multiplicatively; stagger counts as a 50% slow.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use crate::combat::events::DamageType;
use crate::sim::spell_config::StatusSpec;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StatusKind {
    Slow,
    Stun,
    /// Brief stumble, half speed
    Stagger,
    /// Roots in place without preventing actions
    Root,
    Burn,
    Poison,
    Regen,
}

impl StatusKind {
    /// Effects that hurt the carrier.
    pub fn is_harmful(&self) -> bool {
        !matches!(self, StatusKind::Regen)
    }

    /// Damage type of the ticks this effect deals.
    pub fn damage_type(&self) -> DamageType {
        match self {
            StatusKind::Burn => DamageType::Fire,
            StatusKind::Poison => DamageType::Poison,
            _ => DamageType::Physical,
        }
    }
}

/// Speed fraction removed by a stagger.
const STAGGER_SLOW: f32 = 0.5;

#[derive(Debug, Clone, PartialEq)]
pub struct StatusEffect {
    pub kind: StatusKind,
    /// Seconds remaining
    pub duration: f32,
    /// Weak reference to whoever applied it
    pub source: Option<Entity>,
    pub slow_amount: f32,
    pub damage_per_second: f32,
    pub heal_per_second: f32,
    /// Damage already taken from health but not yet published
    pub unreported_damage: f32,
}

impl StatusEffect {
    pub fn new(kind: StatusKind, duration: f32, source: Option<Entity>) -> Self {
        Self {
            kind,
            duration,
            source,
            slow_amount: 0.0,
            damage_per_second: 0.0,
            heal_per_second: 0.0,
            unreported_damage: 0.0,
        }
    }

    /// Build from a spell's status spec, routing the magnitude by kind.
    pub fn from_spec(spec: &StatusSpec, source: Option<Entity>) -> Self {
        let mut effect = Self::new(spec.kind, spec.duration, source);
        match spec.kind {
            StatusKind::Slow => effect.slow_amount = spec.magnitude.clamp(0.0, 1.0),
            StatusKind::Burn | StatusKind::Poison => effect.damage_per_second = spec.magnitude,
            StatusKind::Regen => effect.heal_per_second = spec.magnitude,
            StatusKind::Stun | StatusKind::Stagger | StatusKind::Root => {}
        }
        effect
    }

    pub fn is_expired(&self) -> bool {
        self.duration <= 0.0
    }
}

#[derive(Component, Debug, Clone, Default)]
pub struct StatusEffects {
    pub effects: Vec<StatusEffect>,
}

impl StatusEffects {
    /// Add an effect, replacing one with the same kind and source.
    /// Returns true if an existing effect was replaced.
    pub fn add(&mut self, effect: StatusEffect) -> bool {
        if let Some(existing) = self
            .effects
            .iter_mut()
            .find(|e| e.kind == effect.kind && e.source == effect.source)
        {
            *existing = effect;
            return true;
        }
        self.effects.push(effect);
        false
    }

    pub fn has(&self, kind: StatusKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    pub fn is_stunned(&self) -> bool {
        self.has(StatusKind::Stun)
    }

    /// Movement speed multiplier: 0 when stunned or rooted.
    pub fn slow_multiplier(&self) -> f32 {
        if self.has(StatusKind::Stun) || self.has(StatusKind::Root) {
            return 0.0;
        }
        self.effects
            .iter()
            .map(|e| match e.kind {
                StatusKind::Slow => 1.0 - e.slow_amount.clamp(0.0, 1.0),
                StatusKind::Stagger => 1.0 - STAGGER_SLOW,
                _ => 1.0,
            })
            .product()
    }

    /// Remove expired effects, returning them.
    pub fn remove_expired(&mut self) -> Vec<StatusEffect> {
        let (expired, active): (Vec<_>, Vec<_>) =
            self.effects.drain(..).partition(|e| e.is_expired());
        self.effects = active;
        expired
    }
}
