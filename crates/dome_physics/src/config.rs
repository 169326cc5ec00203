//! Tunables for the player simulation.
//!
//! Every struct is `Default`-constructed with the values the dome world ships
//! with and derives serde with `#[serde(default)]`, so a config file only
//! needs to list the fields it overrides. Vectors are stored as `[f32; 3]` to
//! keep the file format independent of the math library.

use bevy::math::Vec3;
use serde::{Deserialize, Serialize};

use crate::mesh_bvh::DEFAULT_LEAF_SIZE;

/// Horizontal motion, gravity and contact thresholds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovementConfig {
    /// Horizontal walking speed (units/sec)
    pub speed: f32,
    /// Vertical acceleration (units/sec^2, negative = down)
    pub gravity: f32,
    /// Longest horizontal sub-step applied before resolving contacts
    pub max_step: f32,
    /// Height of the floor plane used by the fall-through backstop.
    /// `None` disables the backstop.
    pub floor_height: Option<f32>,
    /// Penetration below the floor plane tolerated before the backstop kicks in
    pub floor_epsilon: f32,
    /// Upward correction needed before a contact counts as landing
    pub landing_epsilon: f32,
    /// Maximum distance to the triangle used for slope following
    pub ground_probe_range: f32,
}

impl Default for MovementConfig {
    fn default() -> Self {
        Self {
            speed: 6.0,
            gravity: -9.8,
            max_step: 0.25,
            floor_height: Some(-1.0),
            floor_epsilon: 0.001,
            landing_epsilon: 1e-4,
            ground_probe_range: 2.0,
        }
    }
}

/// Fixed-timestep stepping.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FixedStepConfig {
    /// Duration of one physics tick (seconds)
    pub tick: f32,
    /// Most ticks run in a single frame before leftover time is dropped
    pub max_ticks_per_frame: u32,
    /// Frame deltas are clamped to this before accumulating (seconds)
    pub max_frame_delta: f32,
}

impl Default for FixedStepConfig {
    fn default() -> Self {
        Self {
            tick: 1.0 / 60.0,
            max_ticks_per_frame: 10,
            max_frame_delta: 0.05,
        }
    }
}

/// Where and how big the player is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpawnConfig {
    /// Lower endpoint of the capsule at spawn
    pub position: [f32; 3],
    /// Distance between the capsule endpoints
    pub axis_length: f32,
    pub radius: f32,
    /// Falling below this height triggers a respawn
    pub respawn_height: f32,
}

impl Default for SpawnConfig {
    fn default() -> Self {
        Self {
            position: [0.0, 7.0, 6.0],
            axis_length: 1.0,
            radius: 0.35,
            respawn_height: -10.0,
        }
    }
}

impl SpawnConfig {
    pub fn position(&self) -> Vec3 {
        Vec3::from_array(self.position)
    }
}

/// Mouse look sensitivity and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LookConfig {
    /// Radians of yaw per unit of horizontal mouse motion
    pub yaw_sensitivity: f32,
    /// Radians of pitch per unit of vertical mouse motion
    pub pitch_sensitivity: f32,
    /// Pitch is clamped to `[-max_pitch, max_pitch]`
    pub max_pitch: f32,
}

impl Default for LookConfig {
    fn default() -> Self {
        Self {
            yaw_sensitivity: 0.0025,
            pitch_sensitivity: 0.0025,
            max_pitch: std::f32::consts::FRAC_PI_2 - 0.01,
        }
    }
}

/// Registry construction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollisionConfig {
    /// Outward margin added to every cheap collider box
    pub cheap_margin: f32,
    /// Maximum triangles per BVH leaf
    pub bvh_leaf_size: usize,
}

impl Default for CollisionConfig {
    fn default() -> Self {
        Self {
            cheap_margin: 0.05,
            bvh_leaf_size: DEFAULT_LEAF_SIZE,
        }
    }
}

/// Everything the simulation context needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub movement: MovementConfig,
    pub fixed_step: FixedStepConfig,
    pub spawn: SpawnConfig,
    pub look: LookConfig,
    pub collision: CollisionConfig,
}
