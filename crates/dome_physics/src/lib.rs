//! Capsule collision and first-person movement for the dome world.
//!
//! Engine-agnostic: only `bevy::math` and `bevy::log` are used, so everything
//! here runs in plain unit tests without an `App`.
//!
//! - [`geometry`]: boxes, spheres, segments, triangles and their distance queries
//! - [`mesh_bvh`]: per-mesh triangle BVH with explicit traversal
//! - [`collision_registry`]: static surfaces plus cheap colliders for decorations
//! - [`collision_resolver`]: capsule push-out
//! - [`ground_slope`]: slope-following move projection
//! - [`player_controller`]: one fixed tick of player movement
//! - [`fixed_step`]: accumulator scheduler with interpolation
//! - [`simulation`]: the context that owns all of the above

pub mod capsule;
pub mod collision_registry;
pub mod collision_resolver;
pub mod config;
pub mod error;
pub mod fixed_step;
pub mod geometry;
pub mod ground_slope;
pub mod mesh_bvh;
pub mod player_controller;
pub mod simulation;

pub use capsule::Capsule;
pub use collision_registry::{
    CheapCollider, CollisionMesh, CollisionRegistry, CollisionSurface, SphereContact, SurfaceId,
};
pub use collision_resolver::{CapsuleResolver, ContactCorrection, ResolveReport};
pub use config::{
    CollisionConfig, FixedStepConfig, LookConfig, MovementConfig, SimulationConfig, SpawnConfig,
};
pub use error::{CollisionError, CollisionResult};
pub use fixed_step::{FixedStepScheduler, FrameStep};
pub use geometry::{Aabb, BoundingSphere, Segment, Triangle};
pub use ground_slope::{probe_ground, project_on_plane, project_onto_ground, GroundHit};
pub use mesh_bvh::{TriangleBvh, DEFAULT_LEAF_SIZE};
pub use player_controller::{KinematicState, LookState, PlayerController, PlayerInput, TickReport};
pub use simulation::{FrameReport, SimulationContext};
