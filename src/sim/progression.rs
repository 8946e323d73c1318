//! Skill Progression
//!
//! Experience is granted through `SkillXpGained` events and applied here when
//! they are delivered (the tick after they were emitted). A skill levels up
//! while its unspent experience covers `100 × level^1.5`, up to level 99.
//! Each level grants that skill's stat bonus; the character level follows the
//! skill total.

use bevy::prelude::*;

use crate::combat::channel::EventChannel;
use crate::combat::events::SimEvent;
use super::components::*;
use super::constants::MAX_SKILL_LEVEL;
use super::formulas::{character_level, xp_for_skill_level};

/// Stat gains for one level in a skill.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LevelBonus {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
    pub max_health: f32,
    pub max_mana: f32,
}

impl LevelBonus {
    pub fn for_skill(skill: Skill) -> Self {
        match skill {
            Skill::Melee => Self {
                strength: 1,
                max_health: 5.0,
                ..default()
            },
            Skill::Ranged => Self {
                dexterity: 1,
                max_health: 3.0,
                ..default()
            },
            Skill::CombatMagic => Self {
                intelligence: 1,
                max_mana: 5.0,
                ..default()
            },
            Skill::NatureMagic => Self {
                intelligence: 1,
                max_mana: 3.0,
                max_health: 2.0,
                ..default()
            },
        }
    }
}

/// Spend experience on as many levels as it covers. Returns the levels gained.
pub fn level_up_skill(levels: &mut SkillLevels, xp: &mut SkillXp, skill: Skill) -> u32 {
    let mut gained = 0;
    loop {
        let level = levels.get(skill);
        let needed = xp_for_skill_level(level);
        if level >= MAX_SKILL_LEVEL || xp.get(skill) < needed {
            break;
        }
        *xp.get_mut(skill) -= needed;
        *levels.get_mut(skill) += 1;
        gained += 1;
    }
    gained
}

/// Apply delivered experience events.
pub fn apply_experience(
    mut events: EventReader<SimEvent>,
    mut channel: ResMut<EventChannel>,
    mut learners: Query<(
        &mut SkillXp,
        &mut SkillLevels,
        Option<&mut Attributes>,
        Option<&mut Health>,
        Option<&mut Mana>,
        Option<&mut CharacterLevel>,
    )>,
) {
    for event in events.read() {
        let SimEvent::SkillXpGained { entity, skill, amount } = event else {
            continue;
        };
        let Ok((mut xp, mut levels, attributes, health, mana, character)) = learners.get_mut(*entity) else {
            continue;
        };

        *xp.get_mut(*skill) += *amount;
        let gained = level_up_skill(&mut levels, &mut xp, *skill);
        if gained == 0 {
            continue;
        }

        let bonus = LevelBonus::for_skill(*skill);
        if let Some(mut attributes) = attributes {
            attributes.strength += bonus.strength * gained;
            attributes.dexterity += bonus.dexterity * gained;
            attributes.intelligence += bonus.intelligence * gained;
        }
        if let Some(mut health) = health {
            let extra = bonus.max_health * gained as f32;
            health.maximum += extra;
            health.current = (health.current + extra).min(health.maximum);
        }
        if let Some(mut mana) = mana {
            let extra = bonus.max_mana * gained as f32;
            mana.maximum += extra;
            mana.current = (mana.current + extra).min(mana.maximum);
        }
        if let Some(mut character) = character {
            character.0 = character_level(&levels);
        }

        let new_level = levels.get(*skill);
        channel.emit(SimEvent::LevelUp {
            entity: *entity,
            skill: *skill,
            new_level,
        });
        info!("{:?} reached {} level {}", entity, skill.name(), new_level);
    }
}
