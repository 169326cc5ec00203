//! Plugins that put the dome world into a Bevy `App`.
//!
//! - [`DomeSimulationPlugin`]: simulation resource, collision intake and the
//!   per-frame step. Needs only `MinimalPlugins`, so it runs headless.
//! - [`DomeWorldPlugin`]: everything above plus the visible scene, keyboard
//!   and mouse input, the first-person camera and debug gizmos.
//!
//! # Example
//!
//! ```ignore
//! use bevy::prelude::*;
//! use dome_core::{DomeWorldConfig, DomeWorldPlugin};
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(DefaultPlugins)
//!         .add_plugins(DomeWorldPlugin::new(DomeWorldConfig::default()))
//!         .run();
//! }
//! ```

use bevy::prelude::*;
use dome_physics::{SimulationConfig, SimulationContext};

use crate::collision_intake::{collision_channel, drain_collision_meshes, CollisionMeshSender};
use crate::config::DomeWorldConfig;
use crate::debug_gizmos::{draw_collision_gizmos, toggle_debug_gizmos};
use crate::dome_floor::DomeFloor;
use crate::first_person::{
    advance_simulation, gather_player_input, sync_first_person_camera, FirstPersonCamera,
    PlayerInputState,
};
use crate::obstacles::scatter_obstacles;

/// The player simulation as a Bevy resource.
#[derive(Resource, Deref, DerefMut)]
pub struct DomeSimulation(pub SimulationContext);

impl DomeSimulation {
    pub fn new(config: SimulationConfig) -> Self {
        Self(SimulationContext::new(config))
    }
}

/// System sets for ordering against the dome world.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum DomeSystems {
    /// Register streamed collision meshes
    Intake,
    /// Sample keyboard and mouse
    Input,
    /// Run fixed ticks for this frame
    Simulate,
    /// Camera and gizmos
    Present,
}

/// Headless core of the dome world.
pub struct DomeSimulationPlugin {
    pub config: DomeWorldConfig,
}

impl Plugin for DomeSimulationPlugin {
    fn build(&self, app: &mut App) {
        let (sender, receiver) = collision_channel();
        app.insert_resource(self.config.clone())
            .insert_resource(DomeSimulation::new(self.config.simulation.clone()))
            .insert_resource(sender)
            .insert_resource(receiver)
            .init_resource::<PlayerInputState>()
            .configure_sets(
                Update,
                (
                    DomeSystems::Intake,
                    DomeSystems::Input,
                    DomeSystems::Simulate,
                    DomeSystems::Present,
                )
                    .chain(),
            )
            .add_systems(Startup, queue_collision_geometry)
            .add_systems(Update, drain_collision_meshes.in_set(DomeSystems::Intake))
            .add_systems(Update, advance_simulation.in_set(DomeSystems::Simulate));
    }
}

/// Full interactive dome world.
pub struct DomeWorldPlugin {
    pub config: DomeWorldConfig,
}

impl DomeWorldPlugin {
    pub fn new(config: DomeWorldConfig) -> Self {
        Self { config }
    }
}

impl Default for DomeWorldPlugin {
    fn default() -> Self {
        Self::new(DomeWorldConfig::default())
    }
}

impl Plugin for DomeWorldPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins(DomeSimulationPlugin {
            config: self.config.clone(),
        })
        .add_systems(Startup, spawn_dome_scene)
        .add_systems(Update, gather_player_input.in_set(DomeSystems::Input))
        .add_systems(
            Update,
            (
                sync_first_person_camera,
                (toggle_debug_gizmos, draw_collision_gizmos).chain(),
            )
                .in_set(DomeSystems::Present),
        );
    }
}

/// Build the floor and props off-thread and stream them into the registry.
pub fn queue_collision_geometry(config: Res<DomeWorldConfig>, sender: Res<CollisionMeshSender>) {
    let floor = DomeFloor::new(config.floor.clone());
    let obstacles = config.obstacles.clone();

    let floor_for_task = floor.clone();
    sender.spawn_build(move || floor_for_task.collision_mesh());
    for obstacle in scatter_obstacles(&obstacles, &floor) {
        sender.spawn_build(move || obstacle.collision_mesh());
    }
    info!(
        "Queued dome floor and {} obstacles for collision",
        config.obstacles.count
    );
}

/// Visible floor, props and the first-person camera.
fn spawn_dome_scene(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
    config: Res<DomeWorldConfig>,
    simulation: Res<DomeSimulation>,
) {
    let floor = DomeFloor::new(config.floor.clone());
    commands.spawn((
        Mesh3d(meshes.add(floor.render_mesh())),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::srgb(0.32, 0.55, 0.28),
            perceptual_roughness: 0.9,
            ..default()
        })),
        floor.transform(),
        Name::new("dome_floor"),
    ));

    let prop_material = materials.add(StandardMaterial {
        base_color: Color::srgb(0.55, 0.5, 0.45),
        perceptual_roughness: 0.8,
        ..default()
    });
    for obstacle in scatter_obstacles(&config.obstacles, &floor) {
        commands.spawn((
            Mesh3d(meshes.add(obstacle.render_mesh())),
            MeshMaterial3d(prop_material.clone()),
            obstacle.transform,
            Name::new(obstacle.name),
        ));
    }

    let look = simulation.look();
    commands.spawn((
        Camera3d::default(),
        Transform::from_translation(simulation.camera_anchor() + Vec3::Y * config.eye_height)
            .with_rotation(look.rotation()),
        FirstPersonCamera,
    ));
}
