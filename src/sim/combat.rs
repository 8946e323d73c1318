//! Combat Resolution
//!
//! Turns attack intents into damage and resolves what happens when health
//! runs out:
//! - `resolve_attacks`: range, line-of-sight and cooldown gating, then
//!   physical + elemental damage
//! - `resolve_life_states`: party members go Downed, everyone else Dead;
//!   a debounced party wipe when the whole party is down
//! - `revive_party`: downed members get back up once no hostile is near

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::{DamageSource, DamageType, SimEvent};
use super::components::*;
use super::constants::*;
use super::damage::{apply_hit, award_experience, Hit, LastDamagedBy};
use super::formulas::{apply_armor, apply_resistance, crit_chance, finalize_hit, physical_damage};
use super::spatial::Spatial;

/// Reach of an attacker: the weapon's range if one is equipped.
pub fn attack_range(weapon: Option<&Weapon>, stats: Option<&CombatStats>) -> f32 {
    match (weapon, stats) {
        (Some(weapon), _) => weapon.range,
        (None, Some(stats)) => stats.attack_range,
        (None, None) => CombatStats::default().attack_range,
    }
}

/// Base weapon damage before strength, crit and armor.
pub fn base_weapon_damage(weapon: Option<&Weapon>, stats: Option<&CombatStats>) -> f32 {
    match (weapon, stats) {
        (Some(weapon), _) => weapon.damage,
        (None, Some(stats)) => stats.damage,
        (None, None) => UNARMED_BASE_DAMAGE,
    }
}

/// Total damage of one swing: armor-reduced physical plus each elemental
/// component reduced by the matching resistance, truncated once.
pub fn weapon_hit_damage(
    weapon: Option<&Weapon>,
    stats: Option<&CombatStats>,
    strength: u32,
    is_crit: bool,
    target_armor: f32,
    target_resistances: Option<&Resistances>,
) -> f32 {
    let physical = physical_damage(base_weapon_damage(weapon, stats), strength, is_crit);
    let mut total = apply_armor(physical, target_armor);

    if let Some(weapon) = weapon {
        let resistances = target_resistances.copied().unwrap_or_default();
        for (damage_type, amount) in weapon.elemental() {
            if amount > 0.0 {
                total += apply_resistance(amount, resistances.get(damage_type));
            }
        }
    }

    finalize_hit(total)
}

struct PendingAttack {
    attacker: Entity,
    hit: Hit,
    xp_skill: Skill,
}

/// Resolve every attack intent.
///
/// Dead or downed attackers and invalid targets lose their intent. Out of
/// range, no line of sight, cooldown or stun keep the intent for a later tick.
pub fn resolve_attacks(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut rng: ResMut<GameRng>,
    spatial: Res<Spatial>,
    mut attackers: Query<(
        Entity,
        &AttackIntent,
        &mut AttackCooldown,
        Option<&CombatStats>,
        Option<&Weapon>,
        Option<&Attributes>,
        Option<&StatusEffects>,
        Option<&mut Facing>,
        Has<Enemy>,
    )>,
    mut targets: Query<(
        &Position,
        &mut Health,
        Option<&CombatStats>,
        Option<&Resistances>,
        Has<Dead>,
        Has<Downed>,
    )>,
) {
    let mut pending = Vec::new();

    for (entity, intent, mut cooldown, stats, weapon, attributes, statuses, facing, is_enemy) in
        attackers.iter_mut()
    {
        let Ok((attacker_pos, _, _, _, attacker_dead, attacker_downed)) = targets.get(entity) else {
            commands.entity(entity).remove::<AttackIntent>();
            continue;
        };
        if attacker_dead || attacker_downed {
            commands.entity(entity).remove::<AttackIntent>();
            continue;
        }
        let attacker_pos = attacker_pos.0;

        let Ok((target_pos, _, target_stats, resistances, target_dead, target_downed)) =
            targets.get(intent.target)
        else {
            commands.entity(entity).remove::<AttackIntent>();
            continue;
        };
        if target_dead || (target_downed && !is_enemy) {
            commands.entity(entity).remove::<AttackIntent>();
            continue;
        }
        // Hostiles may stand over a downed hero but can't hurt it
        if target_downed {
            continue;
        }

        let target_pos = target_pos.0;
        if attacker_pos.distance(target_pos) > attack_range(weapon, stats) {
            continue;
        }
        if !spatial.has_line_of_sight(attacker_pos, target_pos) {
            continue;
        }
        if cooldown.remaining > 0.0 {
            continue;
        }
        if statuses.map(|s| s.is_stunned()).unwrap_or(false) {
            continue;
        }

        let attributes = attributes.copied().unwrap_or_default();
        let is_crit = rng.roll(crit_chance(attributes.dexterity));
        let armor = target_stats.map(|s| s.armor).unwrap_or(0.0);
        let amount = weapon_hit_damage(weapon, stats, attributes.strength, is_crit, armor, resistances);

        let speed = match (weapon, stats) {
            (Some(weapon), _) => weapon.speed,
            (None, Some(stats)) => stats.attack_speed,
            (None, None) => CombatStats::default().attack_speed,
        };
        cooldown.remaining = if speed > 0.0 { 1.0 / speed } else { 1.0 };

        if let (Some(mut facing), Some(toward)) = (facing, Facing::from_vector(target_pos - attacker_pos)) {
            *facing = toward;
        }

        let skill = Skill::for_weapon(weapon.map(|w| w.kind).unwrap_or_default());
        pending.push(PendingAttack {
            attacker: entity,
            xp_skill: skill,
            hit: Hit {
                attacker: Some(entity),
                target: intent.target,
                amount,
                damage_type: DamageType::Physical,
                is_critical: is_crit,
                source: DamageSource::Attack,
                skill,
            },
        });
    }

    for attack in pending {
        let Ok((_, mut health, _, _, dead, downed)) = targets.get_mut(attack.hit.target) else {
            continue;
        };
        // An earlier swing this tick may have dropped the target already
        if dead || downed || health.is_depleted() {
            continue;
        }
        let amount = attack.hit.amount;
        apply_hit(&mut commands, &mut channel, &mut health, attack.hit);

        let xp = match attack.xp_skill {
            Skill::Ranged => XP_RANGED_HIT,
            _ => XP_MELEE_HIT,
        };
        award_experience(&mut channel, attack.attacker, attack.xp_skill, xp);
        debug!("{:?} hits for {}", attack.attacker, amount);
    }
}

/// Mark depleted entities Downed (party) or Dead (everyone else).
///
/// Runs after every phase that can deal damage. Publishes a single
/// `PartyWiped` when the whole party is down, then holds further wipes off
/// for the debounce window.
pub fn resolve_life_states(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut wipe: ResMut<PartyWipeState>,
    depleted: Query<
        (Entity, &Health, Has<PartyMember>, Option<&LastDamagedBy>),
        (Without<Dead>, Without<Downed>, Without<DeathExempt>),
    >,
    party: Query<(Entity, Has<Downed>), With<PartyMember>>,
    killers: Query<(), Without<Dead>>,
) {
    let mut newly_downed = Vec::new();

    for (entity, health, is_party, last_hit) in depleted.iter() {
        if !health.is_depleted() {
            continue;
        }

        let mut entity_commands = commands.entity(entity);
        entity_commands.remove::<(
            AttackIntent,
            CastIntent,
            Casting,
            ActiveAbility,
            LeapingAbility,
            TargetPosition,
        )>();
        entity_commands.insert(MoveIntent::stop());

        if is_party {
            entity_commands.insert(Downed::default());
            channel.emit(SimEvent::EntityDowned { entity });
            info!("{:?} is downed", entity);
            newly_downed.push(entity);
        } else {
            entity_commands.insert(Dead::default());
            let killer = last_hit
                .map(|hit| hit.attacker)
                .filter(|attacker| killers.get(*attacker).is_ok());
            channel.emit(SimEvent::EntityDied { entity, killer });
            info!("{:?} died (killer: {:?})", entity, killer);

            if let (Some(killer), Some(hit)) = (killer, last_hit) {
                award_experience(&mut channel, killer, hit.skill, XP_KILL_BONUS);
            }
        }
    }

    if newly_downed.is_empty() {
        return;
    }

    let mut members = 0;
    let mut all_down = true;
    for (entity, downed) in party.iter() {
        members += 1;
        if !downed && !newly_downed.contains(&entity) {
            all_down = false;
        }
    }

    if members > 0 && all_down && wipe.cooldown <= 0.0 {
        wipe.cooldown = WIPE_DEBOUNCE;
        channel.emit(SimEvent::PartyWiped);
        warn!("Party wiped");
    }
}

/// Revive downed party members once no hostile is near any standing member.
pub fn revive_party(
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut downed: Query<(Entity, &mut Health), (With<PartyMember>, With<Downed>)>,
    standing: Query<&Position, (With<PartyMember>, Without<Downed>, Without<Dead>)>,
    hostiles: Query<&Position, (With<Health>, Without<PartyMember>, Without<Dead>)>,
) {
    if downed.is_empty() || standing.is_empty() {
        return;
    }

    let threatened = standing.iter().any(|member| {
        hostiles
            .iter()
            .any(|hostile| member.distance(hostile) <= REVIVE_SAFE_RADIUS)
    });
    if threatened {
        return;
    }

    for (entity, mut health) in downed.iter_mut() {
        health.current = (health.maximum * REVIVE_HEALTH_FRACTION).max(1.0).min(health.maximum);
        commands.entity(entity).remove::<Downed>();
        channel.emit(SimEvent::EntityRevived {
            entity,
            health: health.current,
        });
        info!("{:?} revived with {:.0} health", entity, health.current);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_armor_reduces_weapon_hit() {
        let weapon = Weapon {
            damage: 10.0,
            range: 1.5,
            speed: 1.0,
            ..default()
        };
        let damage = weapon_hit_damage(Some(&weapon), None, 0, false, 20.0, None);
        assert!(damage < 10.0 && damage >= 0.0, "got {}", damage);
    }

    #[test]
    fn test_elemental_component_uses_resistance() {
        let weapon = Weapon {
            damage: 10.0,
            range: 1.5,
            speed: 1.0,
            fire: 10.0,
            ..default()
        };
        let resistances = Resistances {
            fire: 0.5,
            ..default()
        };
        let damage = weapon_hit_damage(Some(&weapon), None, 0, false, 0.0, Some(&resistances));
        assert_eq!(damage, 15.0);
    }

    #[test]
    fn test_weapon_overrides_stat_range() {
        let weapon = Weapon {
            damage: 5.0,
            range: 6.0,
            speed: 1.0,
            kind: WeaponKind::Ranged,
            ..default()
        };
        let stats = CombatStats::default();
        assert_eq!(attack_range(Some(&weapon), Some(&stats)), 6.0);
        assert_eq!(attack_range(None, Some(&stats)), 1.5);
    }
}
