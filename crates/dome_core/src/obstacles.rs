//! Seeded scatter of box props over the dome floor.
//!
//! Props stand on the floor profile with a random yaw. The same seed always
//! produces the same layout.

use bevy::prelude::*;
use dome_physics::CollisionMesh;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

use crate::config::ObstacleConfig;
use crate::dome_floor::DomeFloor;

/// How far props are sunk into the floor so no gap shows on the slope.
const SINK_DEPTH: f32 = 0.1;

/// One box prop.
#[derive(Debug, Clone, PartialEq)]
pub struct Obstacle {
    pub name: String,
    pub transform: Transform,
    pub half_extents: Vec3,
}

impl Obstacle {
    pub fn collision_mesh(&self) -> CollisionMesh {
        CollisionMesh::cuboid(self.name.clone(), self.half_extents, self.transform.to_matrix())
    }

    pub fn render_mesh(&self) -> Mesh {
        Cuboid::from_size(self.half_extents * 2.0).into()
    }
}

/// Place `config.count` props inside the configured ring.
pub fn scatter_obstacles(config: &ObstacleConfig, floor: &DomeFloor) -> Vec<Obstacle> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let (inner, outer) = (config.inner_radius, config.outer_radius.max(config.inner_radius));
    let (min_half, max_half) = (
        config.min_half_extent,
        config.max_half_extent.max(config.min_half_extent),
    );

    (0..config.count)
        .map(|i| {
            let angle = rng.gen_range(0.0..TAU);
            // Uniform over the ring's area, not its radius.
            let t: f32 = rng.gen();
            let distance = (inner * inner + t * (outer * outer - inner * inner)).sqrt();
            let half_extents = Vec3::new(
                rng.gen_range(min_half..=max_half),
                rng.gen_range(min_half..=max_half),
                rng.gen_range(min_half..=max_half),
            );
            let yaw = rng.gen_range(0.0..TAU);

            let ground = floor.height_at(distance);
            let translation = Vec3::new(
                distance * angle.cos(),
                ground + half_extents.y - SINK_DEPTH,
                distance * angle.sin(),
            );
            Obstacle {
                name: format!("obstacle_{}", i),
                transform: Transform::from_translation(translation)
                    .with_rotation(Quat::from_rotation_y(yaw)),
                half_extents,
            }
        })
        .collect()
}
