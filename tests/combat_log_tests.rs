//! Unit tests for combat log recording and queries
//!
//! These tests verify that the CombatLog correctly:
//! - Describes every kind of simulation event
//! - Filters by event type and HP changes
//! - Renders timestamped lines

use bevy::prelude::*;
use regex::Regex;
use tactsim::combat::events::{DamageSource, DamageType, SimEvent};
use tactsim::combat::log::{CombatLog, CombatLogEventType};
use tactsim::sim::components::{Skill, StatusKind};
use tactsim::sim::spell_config::SpellId;

fn hero() -> Entity {
    Entity::from_raw(1)
}

fn goblin() -> Entity {
    Entity::from_raw(2)
}

fn hit(amount: f32, source: DamageSource, is_critical: bool) -> SimEvent {
    SimEvent::DamageDealt {
        attacker: Some(hero()),
        target: goblin(),
        amount,
        damage_type: DamageType::Fire,
        is_critical,
        source,
    }
}

fn sample_log() -> CombatLog {
    let mut log = CombatLog::default();
    log.record(&SimEvent::CombatStarted { entity: hero() });
    log.match_time = 1.0;
    log.record(&hit(35.0, DamageSource::Spell(SpellId::from("fireball")), false));
    log.match_time = 1.5;
    log.record(&SimEvent::HealthRestored {
        source: hero(),
        target: hero(),
        amount: 25.0,
    });
    log.match_time = 2.0;
    log.record(&SimEvent::StatusApplied {
        target: goblin(),
        kind: StatusKind::Burn,
        source: Some(hero()),
        duration: 3.0,
    });
    log.match_time = 5.0;
    log.record(&SimEvent::StatusExpired {
        target: goblin(),
        kind: StatusKind::Burn,
    });
    log.record(&SimEvent::EntityDied {
        entity: goblin(),
        killer: Some(hero()),
    });
    log.record(&SimEvent::LevelUp {
        entity: hero(),
        skill: Skill::CombatMagic,
        new_level: 2,
    });
    log
}

// =============================================================================
// Recording
// =============================================================================

#[test]
fn test_damage_message_names_source_amount_and_type() {
    let mut log = CombatLog::default();
    log.record(&hit(35.0, DamageSource::Spell(SpellId::from("fireball")), false));

    let entry = &log.entries[0];
    assert_eq!(entry.event_type, CombatLogEventType::Damage);
    let pattern = Regex::new(r"hits .+ with fireball for 35 fire damage$").unwrap();
    assert!(pattern.is_match(&entry.message), "{}", entry.message);
}

#[test]
fn test_critical_and_status_damage_are_labelled() {
    let mut log = CombatLog::default();
    log.record(&hit(52.0, DamageSource::Attack, true));
    log.record(&hit(4.0, DamageSource::Status(StatusKind::Poison), false));

    assert!(log.entries[0].message.ends_with("(critical)"));
    assert!(log.entries[0].message.contains("with attack"));
    assert!(log.entries[1].message.contains("with poison"));
}

#[test]
fn test_damage_without_attacker_is_unknown() {
    let mut log = CombatLog::default();
    log.record(&SimEvent::DamageDealt {
        attacker: None,
        target: goblin(),
        amount: 5.0,
        damage_type: DamageType::Poison,
        is_critical: false,
        source: DamageSource::Status(StatusKind::Poison),
    });
    assert!(log.entries[0].message.starts_with("unknown hits"));
}

#[test]
fn test_life_state_events_share_a_type() {
    let mut log = CombatLog::default();
    log.record(&SimEvent::EntityDowned { entity: hero() });
    log.record(&SimEvent::EntityRevived {
        entity: hero(),
        health: 25.0,
    });
    log.record(&SimEvent::EntityDied {
        entity: goblin(),
        killer: None,
    });

    let life = log.filter_by_type(CombatLogEventType::LifeState);
    assert_eq!(life.len(), 3);
    assert!(life[1].message.contains("revived with 25 health"));
    assert!(life[2].message.ends_with("died"));
}

#[test]
fn test_notifications_and_wipes_are_match_events() {
    let mut log = CombatLog::default();
    log.record(&SimEvent::Notification {
        entity: Some(hero()),
        message: "Not enough mana".to_string(),
    });
    log.record(&SimEvent::PartyWiped);

    let events = log.filter_by_type(CombatLogEventType::MatchEvent);
    assert_eq!(events.len(), 2);
    assert_eq!(events[0].message, "Not enough mana");
    assert!(events[1].message.contains("wiped"));
}

// =============================================================================
// Queries
// =============================================================================

#[test]
fn test_hp_changes_only() {
    let log = sample_log();
    let hp = log.hp_changes_only();
    assert_eq!(hp.len(), 2);
    assert_eq!(hp[0].event_type, CombatLogEventType::Damage);
    assert_eq!(hp[1].event_type, CombatLogEventType::Healing);
}

#[test]
fn test_filter_by_type_keeps_order() {
    let log = sample_log();
    let statuses = log.filter_by_type(CombatLogEventType::StatusApplied);
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].timestamp, 2.0);
    assert_eq!(log.filter_by_type(CombatLogEventType::StatusExpired).len(), 1);
    assert_eq!(log.filter_by_type(CombatLogEventType::Progression).len(), 1);
    assert!(log.filter_by_type(CombatLogEventType::Projectile).is_empty());
}

#[test]
fn test_recent_returns_tail_in_order() {
    let log = sample_log();
    let recent = log.recent(2);
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].event_type, CombatLogEventType::LifeState);
    assert_eq!(recent[1].event_type, CombatLogEventType::Progression);

    assert_eq!(log.recent(100).len(), log.entries.len());
}

#[test]
fn test_clear_resets_entries_and_time() {
    let mut log = sample_log();
    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.match_time, 0.0);
}

// =============================================================================
// Rendering
// =============================================================================

#[test]
fn test_lines_are_timestamped() {
    let log = sample_log();
    let lines = log.to_lines();
    let pattern = Regex::new(r"^\[\s*(\d+\.\d{2})\] (.+)$").unwrap();

    let stamps: Vec<f32> = lines
        .iter()
        .map(|line| {
            let caps = pattern.captures(line).unwrap_or_else(|| panic!("bad line {:?}", line));
            caps[1].parse().unwrap()
        })
        .collect();

    assert_eq!(stamps.first(), Some(&0.0));
    assert_eq!(stamps.last(), Some(&5.0));
    assert!(stamps.windows(2).all(|w| w[0] <= w[1]));
    assert!(lines[1].ends_with("for 35 fire damage"));
}
