//! Spawn bundles
//!
//! Component sets for the actors the simulation drives. The headless runner
//! and the tests spawn through these so every actor carries the components
//! the systems query for (intents, status list, cooldowns).

use bevy::prelude::*;

use super::components::*;

/// Anything with health that can move and fight.
#[derive(Bundle)]
pub struct ActorBundle {
    pub position: Position,
    pub velocity: Velocity,
    pub speed: Speed,
    pub collision_radius: CollisionRadius,
    pub facing: Facing,
    pub render_offset: RenderOffset,
    pub health: Health,
    pub combat_stats: CombatStats,
    pub attack_cooldown: AttackCooldown,
    pub move_intent: MoveIntent,
    pub statuses: StatusEffects,
    pub attributes: Attributes,
    pub skill_levels: SkillLevels,
    pub skill_xp: SkillXp,
    pub character_level: CharacterLevel,
}

impl ActorBundle {
    pub fn new(position: Vec2, max_health: f32) -> Self {
        Self {
            position: Position(position),
            velocity: Velocity::default(),
            speed: Speed::default(),
            collision_radius: CollisionRadius::default(),
            facing: Facing::default(),
            render_offset: RenderOffset::default(),
            health: Health::new(max_health),
            combat_stats: CombatStats::default(),
            attack_cooldown: AttackCooldown::default(),
            move_intent: MoveIntent::default(),
            statuses: StatusEffects::default(),
            attributes: Attributes::default(),
            skill_levels: SkillLevels::default(),
            skill_xp: SkillXp::default(),
            character_level: CharacterLevel::default(),
        }
    }
}

/// Mana pool, spell book and the cooldowns that gate casting.
#[derive(Bundle)]
pub struct CasterBundle {
    pub mana: Mana,
    pub regeneration: Regeneration,
    pub spell_book: SpellBook,
    pub global_cooldown: GlobalCooldown,
}

impl CasterBundle {
    pub fn new(max_mana: f32, spell_book: SpellBook) -> Self {
        Self {
            mana: Mana::new(max_mana),
            regeneration: Regeneration::default(),
            spell_book,
            global_cooldown: GlobalCooldown::default(),
        }
    }
}

/// A hostile guarding `position`.
pub fn hostile(position: Vec2, max_health: f32) -> impl Bundle {
    (
        ActorBundle::new(position, max_health),
        Enemy,
        AiController::new(position),
        AggroRange::default(),
        LeashRange::default(),
    )
}

/// The player's character: driven by intents from outside the core.
pub fn party_leader(position: Vec2, max_health: f32) -> impl Bundle {
    (
        ActorBundle::new(position, max_health),
        PartyMember { index: 0 },
        PlayerControlled,
        Selected,
    )
}

/// A party member following the leader under ally AI.
pub fn party_ally(index: usize, position: Vec2, max_health: f32, formation_offset: Vec2) -> impl Bundle {
    (
        ActorBundle::new(position, max_health),
        PartyMember { index },
        Ally,
        AllyAi::new(formation_offset),
    )
}
