//! Procedural cone floor under the dome.
//!
//! A triangle fan: the apex sits `height` above the rim at the center and the
//! surface falls linearly to the rim. The same vertices feed both the render
//! mesh and the collision surface.

use bevy::asset::RenderAssetUsages;
use bevy::mesh::{Indices, PrimitiveTopology};
use bevy::prelude::*;
use dome_physics::CollisionMesh;
use std::f32::consts::TAU;

use crate::config::DomeFloorConfig;

/// Geometry of the dome floor.
#[derive(Debug, Clone)]
pub struct DomeFloor {
    config: DomeFloorConfig,
}

impl DomeFloor {
    pub fn new(config: DomeFloorConfig) -> Self {
        Self { config }
    }

    /// World height of the floor at horizontal distance `d` from the center.
    /// Beyond the rim the floor is at the rim height.
    pub fn height_at(&self, d: f32) -> f32 {
        let t = (d / self.config.radius).clamp(0.0, 1.0);
        self.config.base_y + self.config.height * (1.0 - t)
    }

    /// Local-to-world transform shared by the render and collision meshes.
    pub fn transform(&self) -> Transform {
        Transform::from_xyz(0.0, self.config.base_y, 0.0)
    }

    /// Fan vertices in local space: apex first, then `segments + 1` rim points
    /// (the last one closes the ring).
    fn positions(&self) -> Vec<Vec3> {
        let segments = self.config.segments.max(3);
        let r = self.config.radius;
        let mut positions = Vec::with_capacity(segments as usize + 2);
        positions.push(Vec3::new(0.0, self.config.height, 0.0));
        for i in 0..=segments {
            let theta = TAU * i as f32 / segments as f32;
            positions.push(Vec3::new(r * theta.cos(), 0.0, -r * theta.sin()));
        }
        positions
    }

    /// Counter-clockwise seen from above, so faces point up.
    fn indices(&self) -> Vec<u32> {
        let segments = self.config.segments.max(3);
        (1..=segments).flat_map(|i| [0, i, i + 1]).collect()
    }

    pub fn collision_mesh(&self) -> CollisionMesh {
        CollisionMesh::new(
            "dome_floor",
            self.positions(),
            self.indices(),
            self.transform().to_matrix(),
        )
    }

    pub fn render_mesh(&self) -> Mesh {
        let positions = self.positions();
        let slope = self.config.height / self.config.radius;
        let normals: Vec<[f32; 3]> = positions
            .iter()
            .enumerate()
            .map(|(i, p)| {
                if i == 0 {
                    [0.0, 1.0, 0.0]
                } else {
                    let outward = Vec3::new(p.x, 0.0, p.z).normalize_or_zero();
                    (outward * slope + Vec3::Y).normalize().to_array()
                }
            })
            .collect();
        let uvs: Vec<[f32; 2]> = positions
            .iter()
            .map(|p| {
                [
                    0.5 + p.x / (2.0 * self.config.radius),
                    0.5 + p.z / (2.0 * self.config.radius),
                ]
            })
            .collect();
        let positions: Vec<[f32; 3]> = positions.iter().map(|p| p.to_array()).collect();

        Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
            .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
            .with_inserted_attribute(Mesh::ATTRIBUTE_NORMAL, normals)
            .with_inserted_attribute(Mesh::ATTRIBUTE_UV_0, uvs)
            .with_inserted_indices(Indices::U32(self.indices()))
    }
}

impl Default for DomeFloor {
    fn default() -> Self {
        Self::new(DomeFloorConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dome_physics::{probe_ground, Capsule, CollisionRegistry};

    #[test]
    fn test_fan_faces_up() {
        let floor = DomeFloor::default();
        let tris = floor.collision_mesh().triangles().unwrap();
        assert_eq!(tris.len(), 150);
        for tri in tris {
            assert!(tri.normal().y > 0.9, "Floor triangle faces {:?}", tri.normal());
        }
    }

    #[test]
    fn test_height_profile() {
        let floor = DomeFloor::default();
        assert_eq!(floor.height_at(0.0), 2.0);
        assert_eq!(floor.height_at(80.0), -1.0);
        assert_eq!(floor.height_at(200.0), -1.0);
        assert!((floor.height_at(40.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_collision_surface_matches_profile() {
        let floor = DomeFloor::default();
        let mut registry = CollisionRegistry::default();
        registry.register(floor.collision_mesh()).unwrap();

        // Along +X the probe sits on the edge of the first fan triangle. The
        // closest point drifts slightly downhill on the gentle slope.
        for d in [5.0f32, 20.0, 60.0] {
            let expected = floor.height_at(d);
            let capsule = Capsule::upright(Vec3::new(d, expected + 0.5, 0.0), 1.0, 0.35);
            let hit = probe_ground(&capsule, &registry, 2.0).expect("Floor under the probe");
            assert!(
                (hit.point.y - expected).abs() < 2e-3,
                "At d={} floor is {} but expected {}",
                d,
                hit.point.y,
                expected
            );
        }
    }

    #[test]
    fn test_render_mesh_has_all_vertices() {
        let floor = DomeFloor::default();
        let mesh = floor.render_mesh();
        assert_eq!(mesh.count_vertices(), 152);
        assert_eq!(mesh.indices().map(|i| i.len()), Some(450));
    }
}
