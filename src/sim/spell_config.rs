//! Data-Driven Spell Configuration
//!
//! Spells are defined in `assets/config/spells.ron` rather than in code. Each
//! definition carries the fields every cast needs (cost, range, cooldown,
//! timing, targeting) plus an [`Archetype`] that picks the resolution strategy
//! and holds only the fields that strategy uses. The archetype is decided once
//! when the file is parsed; nothing re-inspects strings at cast time.
//!
//! Missing fields fall back to the defaults documented on each field.
//!
//! ## Usage
//! ```ignore
//! fn my_system(spells: Res<SpellDefinitions>) {
//!     if let Some(def) = spells.get(&SpellId::from("fireball")) {
//!         println!("Fireball costs {}", def.mana_cost);
//!     }
//! }
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use crate::combat::events::DamageType;
use super::components::{Skill, StatusKind};

/// Default location of the spell table, relative to the working directory.
pub const DEFAULT_SPELLS_PATH: &str = "assets/config/spells.ron";

/// Identifier of a spell in the table (e.g. `"chain_lightning"`).
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpellId(pub String);

impl SpellId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SpellId {
    fn from(value: &str) -> Self {
        SpellId(value.to_string())
    }
}

impl From<String> for SpellId {
    fn from(value: String) -> Self {
        SpellId(value)
    }
}

impl fmt::Display for SpellId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who or what a spell is aimed at.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Targeting {
    /// An opposing entity. Auto-targets the nearest visible one if none is given.
    #[default]
    Enemy,
    /// A friendly entity. Auto-targets the most injured party member, else self.
    Ally,
    /// A point on the ground within range.
    Ground,
    /// The caster's own position.
    Caster,
}

/// Status effect attached by a spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StatusSpec {
    pub kind: StatusKind,
    /// Seconds the effect lasts
    #[serde(default = "default_status_duration")]
    pub duration: f32,
    /// Meaning depends on kind:
    /// - Slow: fraction of speed removed (0.3 = 30% slower)
    /// - Burn/Poison: damage per second
    /// - Regen: healing per second
    /// - Stun/Stagger/Root: unused
    #[serde(default)]
    pub magnitude: f32,
}

fn default_status_duration() -> f32 {
    1.0
}

/// Secondary blast around the primary target of a melee special.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactBlast {
    #[serde(default = "default_impact_radius")]
    pub radius: f32,
    /// Fraction of the primary hit's base damage
    #[serde(default = "default_impact_multiplier")]
    pub damage_multiplier: f32,
}

fn default_impact_radius() -> f32 {
    1.5
}

fn default_impact_multiplier() -> f32 {
    0.4
}

/// Persistent ground effect left behind by an area spell.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Lingering {
    pub duration: f32,
    #[serde(default = "default_tick_interval")]
    pub tick_interval: f32,
    /// Damage per tick; `None` means half the initial blast.
    #[serde(default)]
    pub tick_damage: Option<f32>,
}

fn default_tick_interval() -> f32 {
    0.5
}

/// How a spell resolves once it has been accepted and finished casting.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Archetype {
    /// Moving entity that homes toward a target or flies to a ground point.
    Projectile {
        #[serde(default = "default_spell_damage")]
        damage: f32,
        #[serde(default = "default_projectile_speed")]
        speed: f32,
        #[serde(default)]
        on_hit: Option<StatusSpec>,
    },
    /// Direct heal and/or damage on the resolved target.
    Instant {
        #[serde(default)]
        damage: f32,
        #[serde(default)]
        heal: f32,
    },
    /// One-shot blast around the target point, optionally lingering.
    Area {
        #[serde(default = "default_spell_damage")]
        damage: f32,
        #[serde(default = "default_area_radius")]
        radius: f32,
        #[serde(default)]
        lingering: Option<Lingering>,
    },
    /// Jumps from target to target, losing power on each jump.
    Chain {
        #[serde(default = "default_chain_damage")]
        damage: f32,
        #[serde(default = "default_chain_targets")]
        targets: u32,
        #[serde(default = "default_chain_range")]
        jump_range: f32,
        #[serde(default = "default_chain_falloff")]
        falloff: f32,
    },
    /// Attaches (or refreshes) a status effect.
    Buff { status: StatusSpec },
    /// Hits everything in front of the caster.
    Cone {
        #[serde(default = "default_spell_damage")]
        damage: f32,
        #[serde(default = "default_melee_reach")]
        range: f32,
        /// Full opening angle in degrees
        #[serde(default = "default_cone_angle")]
        angle: f32,
        /// Makes the cone a weapon cleave: `weapon × multiplier`, unmitigated,
        /// in place of `damage`
        #[serde(default)]
        damage_multiplier: Option<f32>,
    },
    /// Heals every living party member regardless of distance.
    PartyHeal { heal: f32 },
    /// Weapon-based melee special on a single target.
    Strike {
        #[serde(default = "default_damage_multiplier")]
        damage_multiplier: f32,
        #[serde(default)]
        flat_damage: f32,
        #[serde(default)]
        status: Option<StatusSpec>,
        /// Distance the target is pushed away from the caster
        #[serde(default)]
        knockback: f32,
        #[serde(default)]
        impact: Option<ImpactBlast>,
    },
    /// Jump to the target along an arc, hitting on landing.
    Leap {
        #[serde(default = "default_damage_multiplier")]
        damage_multiplier: f32,
        #[serde(default)]
        flat_damage: f32,
        #[serde(default = "default_leap_duration")]
        duration: f32,
        /// Stun applied to the primary target on landing (0 = none)
        #[serde(default)]
        stun: f32,
        #[serde(default)]
        impact: Option<ImpactBlast>,
    },
    /// Repeated weapon hits on everything around the caster.
    Channel {
        #[serde(default = "default_damage_multiplier")]
        damage_multiplier: f32,
        #[serde(default)]
        flat_damage: f32,
        #[serde(default = "default_melee_reach")]
        radius: f32,
        #[serde(default = "default_channel_hits")]
        hits: u32,
        #[serde(default = "default_tick_interval")]
        hit_interval: f32,
    },
}

fn default_spell_damage() -> f32 {
    20.0
}

fn default_projectile_speed() -> f32 {
    super::constants::PROJECTILE_DEFAULT_SPEED
}

fn default_area_radius() -> f32 {
    3.0
}

fn default_chain_damage() -> f32 {
    25.0
}

fn default_chain_targets() -> u32 {
    3
}

fn default_chain_range() -> f32 {
    5.0
}

fn default_chain_falloff() -> f32 {
    0.8
}

fn default_melee_reach() -> f32 {
    2.5
}

fn default_cone_angle() -> f32 {
    90.0
}

fn default_damage_multiplier() -> f32 {
    1.0
}

fn default_leap_duration() -> f32 {
    0.8
}

fn default_channel_hits() -> u32 {
    1
}

/// Complete spell definition loaded from RON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpellDefinition {
    /// Display name
    pub name: String,

    // === Costs & Timing ===
    #[serde(default = "default_mana_cost")]
    pub mana_cost: f32,
    /// Maximum distance to the target or ground point
    #[serde(default = "default_range")]
    pub range: f32,
    /// Per-spell cooldown in seconds
    #[serde(default = "default_cooldown")]
    pub cooldown: f32,
    /// Cast time in seconds (0.0 = resolves the tick it is accepted)
    #[serde(default)]
    pub cast_time: f32,
    /// Animation length; also the global cooldown this spell arms
    #[serde(default = "default_animation_duration")]
    pub animation_duration: f32,

    // === Targeting & Scaling ===
    #[serde(default)]
    pub targeting: Targeting,
    /// Skill that scales this spell and receives its experience
    #[serde(default = "default_school")]
    pub school: Skill,
    #[serde(default = "default_damage_type")]
    pub damage_type: DamageType,

    pub archetype: Archetype,
}

fn default_mana_cost() -> f32 {
    10.0
}

fn default_range() -> f32 {
    8.0
}

fn default_cooldown() -> f32 {
    1.0
}

fn default_animation_duration() -> f32 {
    super::constants::DEFAULT_GCD
}

fn default_school() -> Skill {
    Skill::CombatMagic
}

fn default_damage_type() -> DamageType {
    DamageType::Fire
}

impl SpellDefinition {
    /// Heals a single target or the whole party.
    pub fn is_heal(&self) -> bool {
        match &self.archetype {
            Archetype::Instant { heal, .. } => *heal > 0.0,
            Archetype::PartyHeal { heal } => *heal > 0.0,
            Archetype::Buff { status } => status.kind == StatusKind::Regen,
            _ => false,
        }
    }

    /// Deals damage to opposing entities.
    pub fn is_offensive(&self) -> bool {
        match &self.archetype {
            Archetype::Instant { damage, .. } => *damage > 0.0,
            Archetype::PartyHeal { .. } => false,
            Archetype::Buff { status } => status.kind.is_harmful(),
            _ => true,
        }
    }

    /// Experience granted to the school skill when this spell resolves.
    pub fn cast_experience(&self) -> u32 {
        use super::constants::{XP_BUFF_CAST, XP_HEAL_CAST, XP_SPELL_HIT};
        match &self.archetype {
            Archetype::Buff { .. } => XP_BUFF_CAST,
            _ if self.is_heal() && !self.is_offensive() => XP_HEAL_CAST,
            _ => XP_SPELL_HIT,
        }
    }

    fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() {
            return Err("name must not be empty".to_string());
        }
        for (field, value) in [
            ("mana_cost", self.mana_cost),
            ("range", self.range),
            ("cooldown", self.cooldown),
            ("cast_time", self.cast_time),
            ("animation_duration", self.animation_duration),
        ] {
            if value < 0.0 {
                return Err(format!("{} must be non-negative, got {}", field, value));
            }
        }

        match &self.archetype {
            Archetype::Projectile { speed, .. } if *speed <= 0.0 => {
                Err("projectile speed must be positive".to_string())
            }
            Archetype::Area { radius, lingering, .. } => {
                if *radius <= 0.0 {
                    return Err("area radius must be positive".to_string());
                }
                match lingering {
                    Some(l) if l.tick_interval <= 0.0 => {
                        Err("lingering tick_interval must be positive".to_string())
                    }
                    _ => Ok(()),
                }
            }
            Archetype::Chain { targets, falloff, jump_range, .. } => {
                if *targets == 0 {
                    Err("chain must hit at least one target".to_string())
                } else if *falloff <= 0.0 || *falloff > 1.0 {
                    Err(format!("chain falloff must be in (0, 1], got {}", falloff))
                } else if *jump_range <= 0.0 {
                    Err("chain jump_range must be positive".to_string())
                } else {
                    Ok(())
                }
            }
            Archetype::Cone { angle, .. } if *angle <= 0.0 || *angle > 360.0 => {
                Err(format!("cone angle must be in (0, 360], got {}", angle))
            }
            Archetype::Cone { damage_multiplier: Some(m), .. } if *m <= 0.0 => {
                Err(format!("cone damage_multiplier must be positive, got {}", m))
            }
            Archetype::Leap { duration, .. } if *duration <= 0.0 => {
                Err("leap duration must be positive".to_string())
            }
            Archetype::Channel { hits, hit_interval, .. } => {
                if *hits == 0 {
                    Err("channel must hit at least once".to_string())
                } else if *hit_interval <= 0.0 {
                    Err("channel hit_interval must be positive".to_string())
                } else {
                    Ok(())
                }
            }
            _ => Ok(()),
        }
    }
}

/// Root structure of spells.ron
#[derive(Debug, Serialize, Deserialize)]
pub struct SpellsConfig {
    pub spells: HashMap<SpellId, SpellDefinition>,
}

/// Resource containing all spell definitions.
#[derive(Resource, Debug, Default, Clone)]
pub struct SpellDefinitions {
    definitions: HashMap<SpellId, SpellDefinition>,
}

impl SpellDefinitions {
    pub fn new(config: SpellsConfig) -> Self {
        Self {
            definitions: config.spells,
        }
    }

    /// Build a table from (id, definition) pairs. Used by scenarios and tests.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (SpellId, SpellDefinition)>,
    {
        Self {
            definitions: pairs.into_iter().collect(),
        }
    }

    pub fn get(&self, id: &SpellId) -> Option<&SpellDefinition> {
        self.definitions.get(id)
    }

    pub fn insert(&mut self, id: SpellId, definition: SpellDefinition) {
        self.definitions.insert(id, definition);
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &SpellId> {
        self.definitions.keys()
    }

    /// Check every definition, collecting all problems rather than the first.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut problems: Vec<String> = self
            .definitions
            .iter()
            .filter_map(|(id, def)| def.validate().err().map(|e| format!("{}: {}", id, e)))
            .collect();
        problems.sort();

        if problems.is_empty() {
            Ok(())
        } else {
            Err(problems)
        }
    }
}

/// Parse and validate a spell table from RON text.
pub fn parse_spell_definitions(contents: &str) -> Result<SpellDefinitions, String> {
    let config: SpellsConfig =
        ron::from_str(contents).map_err(|e| format!("Failed to parse spell table: {}", e))?;

    let definitions = SpellDefinitions::new(config);
    definitions
        .validate()
        .map_err(|problems| format!("Invalid spell definitions: {}", problems.join("; ")))?;

    Ok(definitions)
}

/// Load spell definitions from a RON file.
pub fn load_spell_definitions(path: &Path) -> Result<SpellDefinitions, String> {
    let contents = std::fs::read_to_string(path)
        .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;

    let definitions = parse_spell_definitions(&contents)
        .map_err(|e| format!("{}: {}", path.display(), e))?;

    info!(
        "Loaded {} spell definitions from {}",
        definitions.len(),
        path.display()
    );

    Ok(definitions)
}

/// Bevy plugin that loads the spell table at startup.
///
/// An app that already has a `SpellDefinitions` resource keeps it, so tests
/// and scenarios can supply their own table.
pub struct SpellConfigPlugin {
    pub path: std::path::PathBuf,
}

impl Default for SpellConfigPlugin {
    fn default() -> Self {
        Self {
            path: DEFAULT_SPELLS_PATH.into(),
        }
    }
}

impl Plugin for SpellConfigPlugin {
    fn build(&self, app: &mut App) {
        if app.world().contains_resource::<SpellDefinitions>() {
            return;
        }
        match load_spell_definitions(&self.path) {
            Ok(definitions) => {
                app.insert_resource(definitions);
            }
            Err(e) => {
                // A broken table would silently reject every cast; refuse to start instead
                panic!("Failed to load spell definitions: {}", e);
            }
        }
    }
}
