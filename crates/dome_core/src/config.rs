//! World configuration and its JSON file format.
//!
//! # Example
//!
//! ```ignore
//! use dome_core::{load_config, save_config, DomeWorldConfig};
//!
//! let mut config = DomeWorldConfig::default();
//! config.obstacles.count = 40;
//! save_config(&config, "dome.json")?;
//!
//! let loaded = load_config("dome.json")?;
//! ```
//!
//! Every field has a default, so a file only has to list what it changes.

use bevy::prelude::*;
use dome_physics::SimulationConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// Errors that can occur while loading or saving a config.
#[derive(Debug)]
pub enum ConfigError {
    /// File system error
    Io(std::io::Error),
    /// JSON serialization error
    Json(String),
    /// A value is outside its valid range
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Json(e) => write!(f, "JSON error: {}", e),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<std::io::Error> for ConfigError {
    fn from(e: std::io::Error) -> Self {
        ConfigError::Io(e)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(e: serde_json::Error) -> Self {
        ConfigError::Json(e.to_string())
    }
}

/// Result type for config operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Cone-shaped floor under the dome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomeFloorConfig {
    /// Rim radius
    pub radius: f32,
    /// Triangles in the fan
    pub segments: u32,
    /// Height of the center above the rim
    pub height: f32,
    /// World Y of the rim
    pub base_y: f32,
}

impl Default for DomeFloorConfig {
    fn default() -> Self {
        Self {
            radius: 80.0,
            segments: 150,
            height: 3.0,
            base_y: -1.0,
        }
    }
}

/// Random box props scattered over the floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleConfig {
    pub count: u32,
    pub seed: u64,
    /// Props are placed between these distances from the center
    pub inner_radius: f32,
    pub outer_radius: f32,
    /// Range of box half extents
    pub min_half_extent: f32,
    pub max_half_extent: f32,
}

impl Default for ObstacleConfig {
    fn default() -> Self {
        Self {
            count: 24,
            seed: 7,
            inner_radius: 10.0,
            outer_radius: 45.0,
            min_half_extent: 0.5,
            max_half_extent: 2.5,
        }
    }
}

/// Everything the dome world reads at startup.
#[derive(Resource, Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DomeWorldConfig {
    pub simulation: SimulationConfig,
    pub floor: DomeFloorConfig,
    pub obstacles: ObstacleConfig,
    /// Camera height above the capsule's upper endpoint
    pub eye_height: f32,
    /// Draw cheap colliders and the player capsule
    pub debug_gizmos: bool,
}

impl Default for DomeWorldConfig {
    fn default() -> Self {
        Self {
            simulation: SimulationConfig::default(),
            floor: DomeFloorConfig::default(),
            obstacles: ObstacleConfig::default(),
            eye_height: 0.0,
            debug_gizmos: false,
        }
    }
}

impl DomeWorldConfig {
    /// Reject values the simulation cannot run with.
    pub fn validate(&self) -> ConfigResult<()> {
        let sim = &self.simulation;
        let positive = [
            ("simulation.fixed_step.tick", sim.fixed_step.tick),
            ("simulation.fixed_step.max_frame_delta", sim.fixed_step.max_frame_delta),
            ("simulation.movement.max_step", sim.movement.max_step),
            ("simulation.spawn.radius", sim.spawn.radius),
            ("floor.radius", self.floor.radius),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "{} must be positive, got {}",
                    name, value
                )));
            }
        }
        if sim.fixed_step.max_ticks_per_frame == 0 {
            return Err(ConfigError::Invalid(
                "simulation.fixed_step.max_ticks_per_frame must be at least 1".to_string(),
            ));
        }
        if self.floor.segments < 3 {
            return Err(ConfigError::Invalid(format!(
                "floor.segments must be at least 3, got {}",
                self.floor.segments
            )));
        }
        let o = &self.obstacles;
        if o.inner_radius > o.outer_radius || o.min_half_extent > o.max_half_extent {
            return Err(ConfigError::Invalid(
                "obstacle ranges must have min <= max".to_string(),
            ));
        }
        Ok(())
    }
}

/// Save a config as pretty-printed JSON.
pub fn save_config<P: AsRef<Path>>(config: &DomeWorldConfig, path: P) -> ConfigResult<()> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, config)?;
    writer.flush()?;
    Ok(())
}

/// Load and validate a config.
pub fn load_config<P: AsRef<Path>>(path: P) -> ConfigResult<DomeWorldConfig> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let config: DomeWorldConfig = serde_json::from_reader(reader)?;
    config.validate()?;
    Ok(config)
}
