//! JSON configuration parsing for headless mode
//!
//! A scenario describes the level, the party and the hostiles to spawn, and
//! how long to run before calling it a timeout.

use bevy::math::Vec2;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::sim::components::{Attributes, Resistances, Weapon};
use crate::sim::spatial::{SpatialQuery, TileGrid};

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Level rows (`#` wall, `.` floor, `S` spawn). Omitted = open field.
    #[serde(default)]
    pub level: Option<Vec<String>>,
    /// Party members; the first one is the leader
    pub party: Vec<ActorConfig>,
    #[serde(default)]
    pub hostiles: Vec<ActorConfig>,
    /// Spell table path (default: `assets/config/spells.ron`)
    #[serde(default)]
    pub spells_path: Option<String>,
    /// Custom output path for the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
    /// Maximum scenario duration in seconds (default: 120)
    #[serde(default = "default_max_duration")]
    pub max_duration_secs: f32,
    /// Random seed for deterministic reproduction
    #[serde(default)]
    pub random_seed: Option<u64>,
}

/// One actor to spawn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActorConfig {
    pub name: String,
    pub position: [f32; 2],
    #[serde(default = "default_health")]
    pub health: f32,
    /// Mana pool; 0 = not a caster
    #[serde(default)]
    pub mana: f32,
    #[serde(default)]
    pub spells: Vec<String>,
    #[serde(default)]
    pub weapon: Option<Weapon>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
    #[serde(default)]
    pub armor: f32,
    #[serde(default)]
    pub resistances: Option<Resistances>,
    /// Hostiles only
    #[serde(default)]
    pub aggro_range: Option<f32>,
    /// Hostiles only
    #[serde(default)]
    pub leash_range: Option<f32>,
}

fn default_max_duration() -> f32 {
    120.0
}

fn default_health() -> f32 {
    100.0
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json(&contents)
    }

    /// Parse and validate configuration from JSON text
    pub fn from_json(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig =
            serde_json::from_str(contents).map_err(|e| format!("Failed to parse JSON: {}", e))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.party.is_empty() {
            return Err("party must have at least one member".to_string());
        }
        if self.max_duration_secs <= 0.0 {
            return Err("max_duration_secs must be positive".to_string());
        }

        for actor in self.party.iter().chain(self.hostiles.iter()) {
            if actor.health <= 0.0 {
                return Err(format!("{}: health must be positive", actor.name));
            }
            if actor.mana < 0.0 {
                return Err(format!("{}: mana must be non-negative", actor.name));
            }
        }

        if let Some(grid) = self.tile_grid()? {
            for actor in self.party.iter().chain(self.hostiles.iter()) {
                let [x, y] = actor.position;
                if !grid.is_walkable(Vec2::new(x, y)) {
                    return Err(format!("{} starts inside a wall at ({}, {})", actor.name, x, y));
                }
            }
        }

        Ok(())
    }

    /// The level, if one is configured.
    pub fn tile_grid(&self) -> Result<Option<TileGrid>, String> {
        self.level
            .as_ref()
            .map(|rows| TileGrid::from_rows(rows).map_err(|e| format!("Invalid level: {}", e)))
            .transpose()
    }
}
