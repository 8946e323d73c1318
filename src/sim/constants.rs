//! Simulation Constants
//!
//! Centralized location for magic numbers used throughout the simulation.
//! Per-spell numbers live in `assets/config/spells.ron`; these are the
//! engine-wide tuning values and the fallbacks for missing spell fields.

// ============================================================================
// Timing
// ============================================================================

/// Fixed simulation step used by the headless runner (60 ticks per second).
pub const FIXED_TIMESTEP: f32 = 1.0 / 60.0;

/// Global cooldown armed when a spell doesn't declare an animation duration.
pub const DEFAULT_GCD: f32 = 0.5;

/// Seconds without combat action before the in-combat flag expires.
pub const COMBAT_TIMEOUT: f32 = 5.0;

/// Minimum spacing between two party-wipe events.
pub const WIPE_DEBOUNCE: f32 = 2.0;

/// Corpses are despawned this long after death.
pub const CORPSE_LIFETIME: f32 = 15.0;

// ============================================================================
// AI
// ============================================================================

/// Hostile re-evaluation interval.
pub const HOSTILE_DECISION_INTERVAL: f32 = 0.2;

/// Ally re-evaluation interval. Tighter so following feels responsive.
pub const ALLY_DECISION_INTERVAL: f32 = 0.1;

pub const AGGRO_RANGE_DEFAULT: f32 = 6.0;
pub const LEASH_RANGE_DEFAULT: f32 = 12.0;

/// A hostile in ATTACK keeps attacking until the target is this much farther
/// than its attack range.
pub const ATTACK_HYSTERESIS: f32 = 1.2;

/// RETURN completes within this distance of home.
pub const HOME_ARRIVAL_DISTANCE: f32 = 1.0;

pub const ALLY_FOLLOW_DISTANCE: f32 = 2.0;
pub const ALLY_STOP_DISTANCE: f32 = 1.0;
pub const ALLY_ENGAGE_RANGE: f32 = 6.0;

/// Speed multiplier inside the follow "sweet spot" band.
pub const ALLY_SLOW_FOLLOW_MULT: f32 = 0.5;

/// Party members below this health fraction are heal candidates.
pub const ALLY_HEAL_THRESHOLD: f32 = 0.5;
pub const ALLY_HEAL_RANGE: f32 = 8.0;
pub const ALLY_ATTACK_SPELL_RANGE: f32 = 6.0;

/// AI readiness timer = cooldown * this.
pub const AI_SPELL_DELAY_MULT: f32 = 3.0;

/// Cooldown assumed for AI readiness when a spell has none.
pub const AI_DEFAULT_SPELL_COOLDOWN: f32 = 2.0;

// ============================================================================
// Combat
// ============================================================================

pub const CRIT_CHANCE_BASE: f32 = 0.05;
pub const CRIT_CHANCE_PER_DEX: f32 = 0.005;
pub const CRIT_MULTIPLIER: f32 = 1.5;
pub const STRENGTH_DAMAGE_BONUS: f32 = 0.05;
pub const ARMOR_CONSTANT: f32 = 100.0;

/// No living enemy within this distance of a living party member means the
/// party is out of combat and downed members get back up.
pub const REVIVE_SAFE_RADIUS: f32 = 10.0;

/// Fraction of maximum health restored on auto-revive.
pub const REVIVE_HEALTH_FRACTION: f32 = 0.25;

// ============================================================================
// Magic
// ============================================================================

pub const INT_SPELL_SCALING: f32 = 0.03;
pub const SKILL_SPELL_SCALING: f32 = 0.05;

pub const PROJECTILE_DEFAULT_SPEED: f32 = 12.0;
pub const PROJECTILE_LIFETIME: f32 = 5.0;
pub const PROJECTILE_HIT_DISTANCE: f32 = 0.6;
pub const PROJECTILE_GROUND_ARRIVAL: f32 = 0.5;

/// Leaps shorter than this land on the target itself.
pub const LEAP_MIN_TRAVEL: f32 = 0.5;

/// A leap lands this far short of its target.
pub const LEAP_LANDING_OFFSET: f32 = 0.8;

/// The leap component lingers this long after landing for the recovery pose.
pub const LEAP_RECOVERY: f32 = 0.3;

pub const LEAP_ARC_HEIGHT: f32 = 80.0;

/// Resting render offset for actors (sprite feet sit 16px above the tile).
pub const RENDER_OFFSET_BASE_Y: f32 = -16.0;

/// Unarmed damage when an actor has neither a weapon nor combat stats.
pub const UNARMED_BASE_DAMAGE: f32 = 10.0;

// ============================================================================
// Regeneration
// ============================================================================

pub const MANA_REGEN_PER_INT: f32 = 0.1;
pub const IN_COMBAT_MANA_REGEN_MULT: f32 = 0.5;

// ============================================================================
// Experience
// ============================================================================

pub const XP_MELEE_HIT: u32 = 10;
pub const XP_RANGED_HIT: u32 = 10;
pub const XP_SPELL_HIT: u32 = 15;
pub const XP_HEAL_CAST: u32 = 12;
pub const XP_BUFF_CAST: u32 = 8;
pub const XP_KILL_BONUS: u32 = 25;
pub const MAX_SKILL_LEVEL: u32 = 99;

// ============================================================================
// Movement & positions
// ============================================================================

pub const DEFAULT_MOVE_SPEED: f32 = 5.0;
pub const DEFAULT_COLLISION_RADIUS: f32 = 0.3;
pub const CLICK_MOVE_ARRIVAL: f32 = 0.2;

/// Collision corners are checked at this fraction of the radius.
pub const CORNER_CHECK_FACTOR: f32 = 0.8;

/// Ring search limit for the nearest walkable tile.
pub const NEAREST_WALKABLE_SEARCH_RADIUS: i32 = 14;

/// Per-corner nudge applied to party members wedged against a wall.
pub const UNSTICK_NUDGE: f32 = 0.05;
