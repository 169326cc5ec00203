//! Slope following for grounded movement.
//!
//! A short probe under the capsule finds the closest triangle beneath the
//! player across every surface. The desired move is then projected onto that
//! triangle's plane so walking over a slope follows it instead of stair-stepping
//! through resolver corrections.

use bevy::math::Vec3;

use crate::capsule::Capsule;
use crate::collision_registry::{CollisionRegistry, SurfaceId};
use crate::geometry::Aabb;

/// Half width (X and Z) of the local probe box.
const PROBE_HALF_WIDTH: f32 = 0.1;
/// Depth of the probe box below the origin.
const PROBE_DEPTH: f32 = 2.0;
/// Height of the probe box above the origin.
const PROBE_HEADROOM: f32 = 0.1;

/// Closest ground triangle found by [`probe_ground`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroundHit {
    pub surface: SurfaceId,
    /// Unit face normal in world space
    pub normal: Vec3,
    /// World distance from the probe origin to the triangle
    pub distance: f32,
    /// Closest point on the triangle in world space
    pub point: Vec3,
}

/// Find the triangle closest to the capsule's lower endpoint within `range`.
pub fn probe_ground(capsule: &Capsule, registry: &CollisionRegistry, range: f32) -> Option<GroundHit> {
    let origin = capsule.lower_endpoint();
    let mut best: Option<GroundHit> = None;

    for surface in registry.surfaces() {
        let Some(bvh) = surface.bvh() else {
            continue;
        };
        let local = surface.to_local(origin);
        let probe = Aabb::new(
            local - Vec3::new(PROBE_HALF_WIDTH, PROBE_DEPTH, PROBE_HALF_WIDTH),
            local + Vec3::new(PROBE_HALF_WIDTH, PROBE_HEADROOM, PROBE_HALF_WIDTH),
        );

        let mut walk = bvh.traverse();
        while let Some((_, triangle)) = walk.next_candidate(&probe) {
            let point = surface.to_world(triangle.closest_point(local));
            let distance = origin.distance(point);
            let closer = best.map_or(true, |hit| distance < hit.distance);
            if closer && distance <= range {
                best = Some(GroundHit {
                    surface: surface.id(),
                    normal: surface.normal_to_world(triangle.normal()),
                    distance,
                    point,
                });
            }
        }
    }

    best
}

/// Remove the component of `desired` along `normal`.
pub fn project_on_plane(desired: Vec3, normal: Vec3) -> Vec3 {
    let n = normal.normalize_or_zero();
    desired - n * desired.dot(n)
}

/// `desired` projected onto the ground under `capsule`, or `desired`
/// unchanged when no ground lies within `range`.
pub fn project_onto_ground(
    capsule: &Capsule,
    registry: &CollisionRegistry,
    desired: Vec3,
    range: f32,
) -> Vec3 {
    match probe_ground(capsule, registry, range) {
        Some(hit) => project_on_plane(desired, hit.normal),
        None => desired,
    }
}
