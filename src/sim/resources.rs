//! Resource & Cooldown Model
//!
//! Timers that every other phase reads: spell cooldowns, the global cooldown,
//! attack cooldowns, ally AI readiness, the in-combat flag and the wipe
//! debounce. Also mana and health regeneration.
//!
//! All timers decay linearly by the tick delta and clamp at zero. Nothing is
//! queued: a cast or attack arriving while a timer is above zero is rejected
//! by the consuming system.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use super::components::*;
use super::formulas::mana_regen_rate;

/// Decay a timer, clamping at zero.
fn decay(timer: &mut f32, dt: f32) {
    *timer = (*timer - dt).max(0.0);
}

/// Tick spell, global and attack cooldowns plus AI spell readiness.
pub fn tick_cooldowns(
    time: Res<Time>,
    mut wipe: ResMut<PartyWipeState>,
    mut spell_books: Query<&mut SpellBook>,
    mut global_cooldowns: Query<&mut GlobalCooldown>,
    mut attack_cooldowns: Query<&mut AttackCooldown>,
    mut allies: Query<&mut AllyAi>,
) {
    let dt = time.delta_secs();

    for mut book in spell_books.iter_mut() {
        if book.cooldowns.is_empty() {
            continue;
        }
        for remaining in book.cooldowns.values_mut() {
            decay(remaining, dt);
        }
        // Absent means ready
        book.cooldowns.retain(|_, remaining| *remaining > 0.0);
    }

    for mut gcd in global_cooldowns.iter_mut() {
        if gcd.remaining > 0.0 {
            decay(&mut gcd.remaining, dt);
        }
    }

    for mut cooldown in attack_cooldowns.iter_mut() {
        if cooldown.remaining > 0.0 {
            decay(&mut cooldown.remaining, dt);
        }
    }

    for mut ally in allies.iter_mut() {
        if ally.spell_ready_timers.is_empty() {
            continue;
        }
        for remaining in ally.spell_ready_timers.values_mut() {
            decay(remaining, dt);
        }
        ally.spell_ready_timers.retain(|_, remaining| *remaining > 0.0);
    }

    decay(&mut wipe.cooldown, dt);
}

/// Publish combat entry and expire the in-combat flag after the timeout.
pub fn update_combat_timers(
    time: Res<Time>,
    mut commands: Commands,
    mut channel: ResMut<EventChannel>,
    mut flagged: Query<(Entity, &mut InCombat)>,
) {
    let dt = time.delta_secs();

    for (entity, mut in_combat) in flagged.iter_mut() {
        // Re-inserting to refresh the timer doesn't count as added
        if in_combat.is_added() {
            channel.emit(SimEvent::CombatStarted { entity });
        }
        in_combat.timer -= dt;
        if in_combat.timer <= 0.0 {
            commands.entity(entity).remove::<InCombat>();
            channel.emit(SimEvent::CombatEnded { entity });
        }
    }
}

/// Regenerate mana and (out of combat only) health.
///
/// Mana regen is halved while in combat. Dead and downed entities don't
/// regenerate.
pub fn regenerate_resources(
    time: Res<Time>,
    mut regenerating: Query<
        (
            &Regeneration,
            Option<&mut Health>,
            Option<&mut Mana>,
            Option<&Attributes>,
            Has<InCombat>,
        ),
        (Without<Dead>, Without<Downed>),
    >,
) {
    let dt = time.delta_secs();

    for (regen, health, mana, attributes, in_combat) in regenerating.iter_mut() {
        if let Some(mut mana) = mana {
            if mana.current < mana.maximum {
                let intelligence = attributes.map(|a| a.intelligence).unwrap_or(0);
                let rate = mana_regen_rate(regen.mana_per_second, intelligence, in_combat);
                mana.restore(rate * dt);
            }
        }

        if in_combat || regen.health_per_second <= 0.0 {
            continue;
        }
        if let Some(mut health) = health {
            if health.current < health.maximum {
                health.heal(regen.health_per_second * dt);
            }
        }
    }
}
