//! Damage, healing and experience formulas.
//!
//! Pure functions shared by combat, magic and progression. All math is f32;
//! callers truncate once per hit with [`finalize_hit`].

use super::components::{Attributes, Skill, SkillLevels};
use super::constants::*;

/// Truncate a hit to whole points, never below zero.
///
/// A small tolerance keeps products like `25 × 0.8 × 0.8` from landing one
/// point low on float error.
pub fn finalize_hit(amount: f32) -> f32 {
    (amount.max(0.0) + HIT_ROUNDING_TOLERANCE).trunc()
}

const HIT_ROUNDING_TOLERANCE: f32 = 1e-3;

/// Crit chance from dexterity.
pub fn crit_chance(dexterity: u32) -> f32 {
    CRIT_CHANCE_BASE + dexterity as f32 * CRIT_CHANCE_PER_DEX
}

/// Weapon hit before armor: strength bonus and optional crit.
pub fn physical_damage(weapon_damage: f32, strength: u32, is_crit: bool) -> f32 {
    let mut damage = weapon_damage * (1.0 + strength as f32 * STRENGTH_DAMAGE_BONUS);
    if is_crit {
        damage *= CRIT_MULTIPLIER;
    }
    damage
}

/// Armor reduction: `100 / (100 + armor)`.
pub fn apply_armor(damage: f32, armor: f32) -> f32 {
    damage * ARMOR_CONSTANT / (ARMOR_CONSTANT + armor.max(0.0))
}

/// Resistance reduction, resistance clamped to [-1, 1].
pub fn apply_resistance(damage: f32, resistance: f32) -> f32 {
    damage * (1.0 - resistance.clamp(-1.0, 1.0))
}

/// Intelligence and school-skill scaling for spell damage and healing.
pub fn spell_power(base: f32, intelligence: u32, skill_level: u32) -> f32 {
    base * (1.0 + intelligence as f32 * INT_SPELL_SCALING)
        * (1.0 + skill_level.saturating_sub(1) as f32 * SKILL_SPELL_SCALING)
}

/// Spell damage for a caster (missing components use the defaults).
pub fn scaled_spell_damage(
    base: f32,
    attributes: Option<&Attributes>,
    skills: Option<&SkillLevels>,
    school: Skill,
) -> f32 {
    let intelligence = attributes.copied().unwrap_or_default().intelligence;
    let level = skills.map(|s| s.get(school)).unwrap_or(1);
    spell_power(base, intelligence, level)
}

/// Healing always scales with nature magic.
pub fn scaled_heal(base: f32, attributes: Option<&Attributes>, skills: Option<&SkillLevels>) -> f32 {
    scaled_spell_damage(base, attributes, skills, Skill::NatureMagic)
}

/// Experience needed to advance from `level` to `level + 1`.
pub fn xp_for_skill_level(level: u32) -> u32 {
    (100.0 * (level as f32).powf(1.5)) as u32
}

/// Character level from the sum of skill levels.
pub fn character_level(skills: &SkillLevels) -> u32 {
    (skills.total() / 2).max(1)
}

/// Mana regenerated per second.
pub fn mana_regen_rate(base_per_second: f32, intelligence: u32, in_combat: bool) -> f32 {
    let rate = base_per_second + intelligence as f32 * MANA_REGEN_PER_INT;
    if in_combat {
        rate * IN_COMBAT_MANA_REGEN_MULT
    } else {
        rate
    }
}
