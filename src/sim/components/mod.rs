//! Component Definitions
//!
//! All ECS components and resources used by the simulation. Entities have no
//! intrinsic type; what an entity does is decided by which of these it carries.
//!
//! ## Module Structure
//! - `status`: status effect types (StatusKind, StatusEffect, StatusEffects)
//!
//! Everything else is defined here, grouped by concern.

pub mod status;

pub use status::{StatusEffect, StatusEffects, StatusKind};

use bevy::prelude::*;
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::combat::events::DamageType;
use super::constants::*;
use super::spell_config::{ImpactBlast, SpellId, StatusSpec};

// ============================================================================
// Resources
// ============================================================================

/// Seeded random number generator for deterministic simulation.
///
/// When a seed is provided (e.g., via a headless scenario), the same seed will
/// always produce the same outcome. Without a seed, uses system entropy.
#[derive(Resource)]
pub struct GameRng {
    rng: StdRng,
    /// The seed used to initialize this RNG (if deterministic)
    pub seed: Option<u64>,
}

impl GameRng {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            seed: Some(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            seed: None,
        }
    }

    /// Generate a random f32 in the range [0.0, 1.0)
    pub fn random_f32(&mut self) -> f32 {
        self.rng.gen()
    }

    /// True with the given probability
    pub fn roll(&mut self, chance: f32) -> bool {
        self.random_f32() < chance
    }
}

impl Default for GameRng {
    fn default() -> Self {
        Self::from_entropy()
    }
}

/// Debounce state for party-wipe detection.
#[derive(Resource, Default)]
pub struct PartyWipeState {
    /// Seconds until another wipe may be reported
    pub cooldown: f32,
}

/// Last walkable position seen for each entity, used to repair bad positions.
#[derive(Resource, Default)]
pub struct LastValidPositions(pub HashMap<Entity, Vec2>);

// ============================================================================
// Transform
// ============================================================================

/// World position in tile units. Tile (x, y) covers [x, x+1) x [y, y+1).
#[derive(Component, Debug, Clone, Copy, PartialEq, Default)]
pub struct Position(pub Vec2);

impl Position {
    pub fn new(x: f32, y: f32) -> Self {
        Self(Vec2::new(x, y))
    }

    pub fn distance(&self, other: &Position) -> f32 {
        self.0.distance(other.0)
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Velocity(pub Vec2);

/// Movement speed in tiles per second
#[derive(Component, Debug, Clone, Copy)]
pub struct Speed(pub f32);

impl Default for Speed {
    fn default() -> Self {
        Self(DEFAULT_MOVE_SPEED)
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct CollisionRadius(pub f32);

impl Default for CollisionRadius {
    fn default() -> Self {
        Self(DEFAULT_COLLISION_RADIUS)
    }
}

/// Four-way facing. Screen coordinates: +y is down.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Facing {
    Up,
    #[default]
    Down,
    Left,
    Right,
}

impl Facing {
    /// Facing along the dominant axis of `v`, or None for a zero vector.
    pub fn from_vector(v: Vec2) -> Option<Facing> {
        if v == Vec2::ZERO {
            return None;
        }
        Some(if v.x.abs() > v.y.abs() {
            if v.x > 0.0 { Facing::Right } else { Facing::Left }
        } else if v.y > 0.0 {
            Facing::Down
        } else {
            Facing::Up
        })
    }

    pub fn to_vector(self) -> Vec2 {
        match self {
            Facing::Up => Vec2::new(0.0, -1.0),
            Facing::Down => Vec2::new(0.0, 1.0),
            Facing::Left => Vec2::new(-1.0, 0.0),
            Facing::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Sprite offset in pixels, driven by leap arcs.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct RenderOffset {
    pub x: f32,
    pub y: f32,
}

impl Default for RenderOffset {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: RENDER_OFFSET_BASE_Y,
        }
    }
}

// ============================================================================
// Health, Mana & Life State
// ============================================================================

/// Invariant: `0 <= current <= maximum`.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Health {
    pub current: f32,
    pub maximum: f32,
}

impl Health {
    pub fn new(maximum: f32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    pub fn is_depleted(&self) -> bool {
        self.current <= 0.0
    }

    pub fn fraction(&self) -> f32 {
        if self.maximum <= 0.0 {
            0.0
        } else {
            self.current / self.maximum
        }
    }

    /// Subtract damage, clamping at zero. Returns the amount actually removed.
    pub fn apply_damage(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current - amount.max(0.0)).max(0.0);
        before - self.current
    }

    /// Add healing, clamping at maximum. Returns the amount actually restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.maximum);
        self.current - before
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Mana {
    pub current: f32,
    pub maximum: f32,
}

impl Mana {
    pub fn new(maximum: f32) -> Self {
        Self {
            current: maximum,
            maximum,
        }
    }

    /// Spend `cost` if affordable. Leaves mana untouched otherwise.
    pub fn try_spend(&mut self, cost: f32) -> bool {
        if self.current + f32::EPSILON < cost {
            return false;
        }
        self.current = (self.current - cost).max(0.0);
        true
    }

    pub fn restore(&mut self, amount: f32) {
        self.current = (self.current + amount).min(self.maximum);
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct Regeneration {
    pub health_per_second: f32,
    pub mana_per_second: f32,
}

impl Default for Regeneration {
    fn default() -> Self {
        Self {
            health_per_second: 0.0,
            mana_per_second: 2.0,
        }
    }
}

/// Revivable incapacitation (party members only).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Downed {
    /// Seconds spent downed
    pub timer: f32,
}

/// Permanent incapacitation pending corpse cleanup (hostiles only).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Dead {
    /// Seconds since death
    pub timer: f32,
}

/// Never marked Downed or Dead, e.g. a scripted hero that cannot fall.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct DeathExempt;

// ============================================================================
// Combat Stats
// ============================================================================

#[derive(Component, Debug, Clone, Copy)]
pub struct CombatStats {
    pub damage: f32,
    pub armor: f32,
    /// Attacks per second
    pub attack_speed: f32,
    pub attack_range: f32,
}

impl Default for CombatStats {
    fn default() -> Self {
        Self {
            damage: 10.0,
            armor: 0.0,
            attack_speed: 1.0,
            attack_range: 1.5,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct AttackCooldown {
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WeaponKind {
    #[default]
    Melee,
    Ranged,
    Magic,
}

/// Equipped weapon. Overrides `CombatStats` damage, range and speed.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Weapon {
    pub damage: f32,
    pub range: f32,
    /// Attacks per second
    pub speed: f32,
    #[serde(default)]
    pub kind: WeaponKind,
    #[serde(default)]
    pub fire: f32,
    #[serde(default)]
    pub ice: f32,
    #[serde(default)]
    pub lightning: f32,
    #[serde(default)]
    pub poison: f32,
}

impl Weapon {
    /// Elemental damage components carried by this weapon.
    pub fn elemental(&self) -> [(DamageType, f32); 4] {
        [
            (DamageType::Fire, self.fire),
            (DamageType::Ice, self.ice),
            (DamageType::Lightning, self.lightning),
            (DamageType::Poison, self.poison),
        ]
    }
}

/// Fractional resistances; 0.25 = 25% less damage, negative = weakness.
#[derive(Component, Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Resistances {
    #[serde(default)]
    pub fire: f32,
    #[serde(default)]
    pub ice: f32,
    #[serde(default)]
    pub lightning: f32,
    #[serde(default)]
    pub poison: f32,
    #[serde(default)]
    pub holy: f32,
}

impl Resistances {
    pub fn get(&self, damage_type: DamageType) -> f32 {
        match damage_type {
            DamageType::Physical => 0.0,
            DamageType::Fire => self.fire,
            DamageType::Ice => self.ice,
            DamageType::Lightning => self.lightning,
            DamageType::Poison => self.poison,
            DamageType::Holy => self.holy,
        }
    }
}

/// Timed "in combat" flag. Refreshed by every combat action.
#[derive(Component, Debug, Clone, Copy)]
pub struct InCombat {
    pub timer: f32,
}

impl Default for InCombat {
    fn default() -> Self {
        Self {
            timer: COMBAT_TIMEOUT,
        }
    }
}

// ============================================================================
// Attributes & Skills
// ============================================================================

#[derive(Component, Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Attributes {
    pub strength: u32,
    pub dexterity: u32,
    pub intelligence: u32,
}

impl Default for Attributes {
    fn default() -> Self {
        Self {
            strength: 10,
            dexterity: 10,
            intelligence: 10,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Skill {
    Melee,
    Ranged,
    CombatMagic,
    NatureMagic,
}

impl Skill {
    pub const ALL: [Skill; 4] = [
        Skill::Melee,
        Skill::Ranged,
        Skill::CombatMagic,
        Skill::NatureMagic,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Skill::Melee => "melee",
            Skill::Ranged => "ranged",
            Skill::CombatMagic => "combat magic",
            Skill::NatureMagic => "nature magic",
        }
    }

    /// Skill trained by attacking with a weapon of this kind.
    pub fn for_weapon(kind: WeaponKind) -> Skill {
        match kind {
            WeaponKind::Ranged => Skill::Ranged,
            WeaponKind::Melee | WeaponKind::Magic => Skill::Melee,
        }
    }
}

#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkillLevels {
    pub melee: u32,
    pub ranged: u32,
    pub combat_magic: u32,
    pub nature_magic: u32,
}

impl Default for SkillLevels {
    fn default() -> Self {
        Self {
            melee: 1,
            ranged: 1,
            combat_magic: 1,
            nature_magic: 1,
        }
    }
}

impl SkillLevels {
    pub fn get(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Melee => self.melee,
            Skill::Ranged => self.ranged,
            Skill::CombatMagic => self.combat_magic,
            Skill::NatureMagic => self.nature_magic,
        }
    }

    pub fn get_mut(&mut self, skill: Skill) -> &mut u32 {
        match skill {
            Skill::Melee => &mut self.melee,
            Skill::Ranged => &mut self.ranged,
            Skill::CombatMagic => &mut self.combat_magic,
            Skill::NatureMagic => &mut self.nature_magic,
        }
    }

    pub fn total(&self) -> u32 {
        Skill::ALL.iter().map(|s| self.get(*s)).sum()
    }
}

/// Unspent experience per skill.
#[derive(Component, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SkillXp {
    pub melee: u32,
    pub ranged: u32,
    pub combat_magic: u32,
    pub nature_magic: u32,
}

impl SkillXp {
    pub fn get(&self, skill: Skill) -> u32 {
        match skill {
            Skill::Melee => self.melee,
            Skill::Ranged => self.ranged,
            Skill::CombatMagic => self.combat_magic,
            Skill::NatureMagic => self.nature_magic,
        }
    }

    pub fn get_mut(&mut self, skill: Skill) -> &mut u32 {
        match skill {
            Skill::Melee => &mut self.melee,
            Skill::Ranged => &mut self.ranged,
            Skill::CombatMagic => &mut self.combat_magic,
            Skill::NatureMagic => &mut self.nature_magic,
        }
    }
}

/// Overall level derived from skill levels.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct CharacterLevel(pub u32);

impl Default for CharacterLevel {
    fn default() -> Self {
        Self(1)
    }
}

// ============================================================================
// Spells & Cooldowns
// ============================================================================

#[derive(Component, Debug, Clone, Default)]
pub struct SpellBook {
    /// Known spells in hotbar order
    pub known: Vec<SpellId>,
    /// Remaining cooldown per spell; absent means ready
    pub cooldowns: HashMap<SpellId, f32>,
}

impl SpellBook {
    pub fn new<I, S>(spells: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SpellId>,
    {
        Self {
            known: spells.into_iter().map(Into::into).collect(),
            cooldowns: HashMap::new(),
        }
    }

    pub fn knows(&self, spell: &SpellId) -> bool {
        self.known.contains(spell)
    }

    pub fn cooldown_remaining(&self, spell: &SpellId) -> f32 {
        self.cooldowns.get(spell).copied().unwrap_or(0.0)
    }

    /// Known and off cooldown.
    pub fn can_cast(&self, spell: &SpellId) -> bool {
        self.knows(spell) && self.cooldown_remaining(spell) <= 0.0
    }

    pub fn start_cooldown(&mut self, spell: &SpellId, duration: f32) {
        if duration > 0.0 {
            self.cooldowns.insert(spell.clone(), duration);
        }
    }
}

/// Shared cooldown gating every cast.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct GlobalCooldown {
    pub remaining: f32,
}

impl GlobalCooldown {
    pub fn is_ready(&self) -> bool {
        self.remaining <= 0.0
    }
}

// ============================================================================
// Intents
// ============================================================================

/// Requested movement direction (from input or AI). Zero means stand still.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct MoveIntent {
    /// Normalized direction (or zero)
    pub direction: Vec2,
    pub speed_mult: f32,
}

impl Default for MoveIntent {
    fn default() -> Self {
        Self::stop()
    }
}

impl MoveIntent {
    pub fn stop() -> Self {
        Self {
            direction: Vec2::ZERO,
            speed_mult: 1.0,
        }
    }

    pub fn toward(from: Vec2, to: Vec2, speed_mult: f32) -> Self {
        Self {
            direction: (to - from).normalize_or_zero(),
            speed_mult,
        }
    }

    pub fn away_from(from: Vec2, threat: Vec2) -> Self {
        Self {
            direction: (from - threat).normalize_or_zero(),
            speed_mult: 1.0,
        }
    }

    pub fn is_stopped(&self) -> bool {
        self.direction == Vec2::ZERO || self.speed_mult <= 0.0
    }
}

/// Click-to-move destination.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct TargetPosition(pub Vec2);

/// Request to attack `target` with the equipped weapon.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttackIntent {
    pub target: Entity,
}

/// Request to cast a spell at an entity and/or a ground point.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct CastIntent {
    pub spell: SpellId,
    pub target: Option<Entity>,
    pub point: Option<Vec2>,
}

impl CastIntent {
    /// Cast with no explicit target (auto-target or self).
    pub fn new(spell: impl Into<SpellId>) -> Self {
        Self {
            spell: spell.into(),
            target: None,
            point: None,
        }
    }

    pub fn on(spell: impl Into<SpellId>, target: Entity) -> Self {
        Self {
            spell: spell.into(),
            target: Some(target),
            point: None,
        }
    }

    pub fn at(spell: impl Into<SpellId>, point: Vec2) -> Self {
        Self {
            spell: spell.into(),
            target: None,
            point: Some(point),
        }
    }
}

/// Present while a cast-time spell is resolving.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct Casting {
    pub spell: SpellId,
    /// Frozen target, re-validated when the cast completes
    pub target: Option<Entity>,
    pub point: Vec2,
    pub remaining: f32,
}

// ============================================================================
// Multi-Frame Abilities
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectileTarget {
    /// Re-aims at the entity every tick
    Homing(Entity),
    /// Flies to a fixed point
    Ground(Vec2),
}

/// A spell projectile in flight. Lives on its own entity with a `Position`.
#[derive(Component, Debug, Clone)]
pub struct Projectile {
    pub spell: SpellId,
    pub caster: Entity,
    pub target: ProjectileTarget,
    pub speed: f32,
    /// Scaled damage, before the target's resistance
    pub damage: f32,
    pub damage_type: DamageType,
    /// Whether the caster fights for the party; decides who a ground hit can damage
    pub from_party: bool,
    pub on_hit: Option<StatusSpec>,
    pub lifetime: f32,
}

/// Persistent ground effect. Lives on its own entity with a `Position`.
#[derive(Component, Debug, Clone)]
pub struct AreaEffect {
    pub spell: SpellId,
    pub caster: Entity,
    pub from_party: bool,
    pub radius: f32,
    pub remaining: f32,
    pub tick_interval: f32,
    pub next_tick: f32,
    pub damage_per_tick: f32,
    pub damage_type: DamageType,
}

/// Repeating-hit channel centered on the caster (e.g. a whirlwind).
#[derive(Component, Debug, Clone)]
pub struct ActiveAbility {
    pub spell: SpellId,
    pub hits_remaining: u32,
    pub hit_interval: f32,
    pub next_hit_timer: f32,
    pub radius: f32,
    pub damage_per_hit: f32,
    pub elapsed: f32,
    /// Animation length, for presentation
    pub total_duration: f32,
}

/// The caster is mid-air on a leap.
#[derive(Component, Debug, Clone)]
pub struct LeapingAbility {
    pub spell: SpellId,
    pub target: Entity,
    pub start: Vec2,
    pub end: Vec2,
    pub duration: f32,
    pub elapsed: f32,
    pub damage: f32,
    pub stun: f32,
    pub impact: Option<ImpactBlast>,
    pub has_landed: bool,
}

// ============================================================================
// AI
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AiState {
    #[default]
    Idle,
    Patrol,
    Chase,
    Attack,
    Return,
    Flee,
}

/// Hostile state machine.
#[derive(Component, Debug, Clone)]
pub struct AiController {
    pub state: AiState,
    /// Weak reference: re-validated before every use
    pub target: Option<Entity>,
    pub home: Vec2,
    /// Counts down to the next evaluation
    pub decision_timer: f32,
}

impl AiController {
    pub fn new(home: Vec2) -> Self {
        Self {
            state: AiState::Idle,
            target: None,
            home,
            decision_timer: 0.0,
        }
    }

    /// Drop the target and head home.
    pub fn give_up(&mut self) {
        self.state = AiState::Return;
        self.target = None;
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct AggroRange(pub f32);

impl Default for AggroRange {
    fn default() -> Self {
        Self(AGGRO_RANGE_DEFAULT)
    }
}

#[derive(Component, Debug, Clone, Copy)]
pub struct LeashRange(pub f32);

impl Default for LeashRange {
    fn default() -> Self {
        Self(LEASH_RANGE_DEFAULT)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AllyState {
    #[default]
    Follow,
    Engage,
}

/// Allied party member driven by AI while not the leader.
#[derive(Component, Debug, Clone, Default)]
pub struct AllyAi {
    pub state: AllyState,
    /// Weak reference: re-validated before every use
    pub target: Option<Entity>,
    pub formation_offset: Vec2,
    pub decision_timer: f32,
    /// AI-only readiness per spell, separate from the spell book cooldown
    pub spell_ready_timers: HashMap<SpellId, f32>,
}

impl AllyAi {
    pub fn new(formation_offset: Vec2) -> Self {
        Self {
            formation_offset,
            ..default()
        }
    }

    pub fn is_spell_ready(&self, spell: &SpellId) -> bool {
        self.spell_ready_timers.get(spell).copied().unwrap_or(0.0) <= 0.0
    }

    /// Throttle AI use of a spell to a multiple of its cooldown.
    pub fn arm_spell(&mut self, spell: &SpellId, cooldown: f32) {
        let base = if cooldown > 0.0 { cooldown } else { AI_DEFAULT_SPELL_COOLDOWN };
        self.spell_ready_timers
            .insert(spell.clone(), base * AI_SPELL_DELAY_MULT);
    }
}

// ============================================================================
// Tags
// ============================================================================

/// Driven by external input rather than AI.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PlayerControlled;

/// The party member currently selected by the player (the leader).
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Selected;

#[derive(Component, Debug, Clone, Copy, Default)]
pub struct PartyMember {
    pub index: usize,
}

/// Hostile to the party.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Enemy;

/// Party member controlled by ally AI.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct Ally;

/// Despawned by the cleanup phase.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ToRemove;
