//! Bevy integration for the dome world.
//!
//! This crate provides:
//! - World configuration with JSON load/save
//! - Procedural dome floor and scattered box props
//! - Asynchronous collision mesh intake into the physics registry
//! - First-person input and camera driven by the fixed-step simulation
//! - Debug gizmos for cheap colliders and the player capsule
//!
//! The physics itself lives in `dome_physics` and is re-exported here.

pub mod collision_intake;
pub mod config;
pub mod debug_gizmos;
pub mod dome_floor;
pub mod first_person;
pub mod obstacles;
pub mod world_plugin;

pub use collision_intake::{
    collision_channel, drain_collision_meshes, CollisionMeshReceiver, CollisionMeshSender,
};
pub use config::{
    load_config, save_config, ConfigError, ConfigResult, DomeFloorConfig, DomeWorldConfig,
    ObstacleConfig,
};
pub use debug_gizmos::{draw_collision_gizmos, toggle_debug_gizmos};
pub use dome_floor::DomeFloor;
pub use first_person::{FirstPersonCamera, PlayerInputState};
pub use obstacles::{scatter_obstacles, Obstacle};
pub use world_plugin::{
    queue_collision_geometry, DomeSimulation, DomeSimulationPlugin, DomeSystems, DomeWorldPlugin,
};

pub use dome_physics;
