//! Combat logging
//!
//! Records every delivered simulation event for display and post-run analysis.

use bevy::prelude::*;
use std::path::Path;

use super::events::{DamageSource, SimEvent};

/// A single entry in the combat log
#[derive(Debug, Clone)]
pub struct CombatLogEntry {
    /// Simulation time in seconds when the event was delivered
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CombatLogEventType {
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Spell resolved
    SpellCast,
    /// Status effect applied
    StatusApplied,
    /// Status effect expired
    StatusExpired,
    /// Downed, died, revived
    LifeState,
    /// Combat started or ended for an entity
    CombatState,
    /// Experience and level-ups
    Progression,
    /// Projectile spawned or hit
    Projectile,
    /// Passive notifications and session events
    MatchEvent,
}

/// The combat log resource storing all events
#[derive(Resource, Default)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time
    pub match_time: f32,
}

impl CombatLog {
    /// Clear the log for a new session
    pub fn clear(&mut self) {
        self.entries.clear();
        self.match_time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.entries.push(CombatLogEntry {
            timestamp: self.match_time,
            event_type,
            message,
        });
    }

    /// Describe a simulation event and append it.
    pub fn record(&mut self, event: &SimEvent) {
        let (event_type, message) = match event {
            SimEvent::DamageDealt { attacker, target, amount, damage_type, is_critical, source } => {
                let by = match source {
                    DamageSource::Attack => "attack".to_string(),
                    DamageSource::Spell(spell) => spell.to_string(),
                    DamageSource::Status(kind) => format!("{:?}", kind).to_lowercase(),
                };
                let who = attacker
                    .map(|a| format!("{:?}", a))
                    .unwrap_or_else(|| "unknown".to_string());
                let crit = if *is_critical { " (critical)" } else { "" };
                (
                    CombatLogEventType::Damage,
                    format!(
                        "{} hits {:?} with {} for {:.0} {} damage{}",
                        who, target, by, amount, damage_type.name(), crit
                    ),
                )
            }
            SimEvent::HealthRestored { source, target, amount } => (
                CombatLogEventType::Healing,
                format!("{:?} heals {:?} for {:.0}", source, target, amount),
            ),
            SimEvent::EntityDied { entity, killer } => (
                CombatLogEventType::LifeState,
                match killer {
                    Some(killer) => format!("{:?} was slain by {:?}", entity, killer),
                    None => format!("{:?} died", entity),
                },
            ),
            SimEvent::EntityDowned { entity } => (
                CombatLogEventType::LifeState,
                format!("{:?} is downed", entity),
            ),
            SimEvent::EntityRevived { entity, health } => (
                CombatLogEventType::LifeState,
                format!("{:?} revived with {:.0} health", entity, health),
            ),
            SimEvent::CombatStarted { entity } => (
                CombatLogEventType::CombatState,
                format!("{:?} entered combat", entity),
            ),
            SimEvent::CombatEnded { entity } => (
                CombatLogEventType::CombatState,
                format!("{:?} left combat", entity),
            ),
            SimEvent::SpellCast { caster, spell, target, .. } => (
                CombatLogEventType::SpellCast,
                match target {
                    Some(target) => format!("{:?} casts {} on {:?}", caster, spell, target),
                    None => format!("{:?} casts {}", caster, spell),
                },
            ),
            SimEvent::ProjectileCreated { caster, spell, .. } => (
                CombatLogEventType::Projectile,
                format!("{:?} launches {}", caster, spell),
            ),
            SimEvent::ProjectileHit { target, .. } => (
                CombatLogEventType::Projectile,
                format!("projectile hits {:?}", target),
            ),
            SimEvent::SkillXpGained { entity, skill, amount } => (
                CombatLogEventType::Progression,
                format!("{:?} gains {} {} xp", entity, amount, skill.name()),
            ),
            SimEvent::LevelUp { entity, skill, new_level } => (
                CombatLogEventType::Progression,
                format!("{:?} reached {} level {}", entity, skill.name(), new_level),
            ),
            SimEvent::StatusApplied { target, kind, duration, .. } => (
                CombatLogEventType::StatusApplied,
                format!("{:?} is affected by {:?} ({:.1}s)", target, kind, duration),
            ),
            SimEvent::StatusExpired { target, kind } => (
                CombatLogEventType::StatusExpired,
                format!("{:?} is no longer affected by {:?}", target, kind),
            ),
            SimEvent::EntityTeleported { entity, to } => (
                CombatLogEventType::MatchEvent,
                format!("{:?} teleported to ({:.1}, {:.1})", entity, to.x, to.y),
            ),
            SimEvent::PartyWiped => (
                CombatLogEventType::MatchEvent,
                "The party has been wiped out".to_string(),
            ),
            SimEvent::Notification { message, .. } => {
                (CombatLogEventType::MatchEvent, message.clone())
            }
        };
        self.log(event_type, message);
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// Render the log as `[  12.34] message` lines.
    pub fn to_lines(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| format!("[{:>8.2}] {}", e.timestamp, e.message))
            .collect()
    }

    /// Write the rendered log to a text file
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        let mut contents = self.to_lines().join("\n");
        contents.push('\n');
        std::fs::write(path, contents)
            .map_err(|e| format!("Failed to write combat log to {}: {}", path.display(), e))
    }
}
