//! Capsule push-out against every registered surface.
//!
//! # Pipeline (per surface, in registration order)
//!
//! 1. Move the capsule segment into the surface's local space
//! 2. Broad phase: segment bounds grown by the radius
//! 3. Walk the BVH; for each candidate closer than the radius, translate the
//!    local segment out along the contact direction and grow the query box
//! 4. Map the corrected start back to world space and split the difference
//!    into vertical and horizontal parts
//! 5. Apply both parts; an upward vertical part counts as landing when
//!    grounding is allowed
//!
//! Corrections relax one surface at a time. There is no fixed-point iteration
//! across surfaces, so two overlapping surfaces can leave a small residual
//! penetration that the next tick cleans up.

use bevy::math::Vec3;

use crate::capsule::Capsule;
use crate::collision_registry::{CollisionRegistry, CollisionSurface, SurfaceId};
use crate::error::{CollisionError, CollisionResult};
use crate::geometry::{Aabb, Segment};
use crate::player_controller::KinematicState;

/// Vertical corrections smaller than this are ignored.
const VERTICAL_THRESHOLD: f32 = 1e-6;

/// Correction produced by one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContactCorrection {
    pub surface: SurfaceId,
    /// Y part of the correction (world space)
    pub vertical: f32,
    /// XZ part of the correction (world space, `y == 0`)
    pub horizontal: Vec3,
    /// Upward correction past the landing threshold while grounding was allowed
    pub upward: bool,
}

impl ContactCorrection {
    pub fn translation(&self) -> Vec3 {
        self.horizontal + Vec3::Y * self.vertical
    }
}

/// Summary of a [`CapsuleResolver::resolve`] call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolveReport {
    /// Some surface produced a grounding correction
    pub landed: bool,
    /// Total translation applied to the capsule
    pub displacement: Vec3,
    pub contacts: Vec<ContactCorrection>,
}

/// Resolves capsule interpenetration against a [`CollisionRegistry`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CapsuleResolver {
    /// Upward correction needed before a contact counts as landing
    pub landing_epsilon: f32,
}

impl Default for CapsuleResolver {
    fn default() -> Self {
        Self {
            landing_epsilon: 1e-4,
        }
    }
}

impl CapsuleResolver {
    pub fn new(landing_epsilon: f32) -> Self {
        Self { landing_epsilon }
    }

    /// Push `capsule` out of every surface it overlaps.
    ///
    /// When `allow_grounding` is set and a surface pushes the capsule up by
    /// more than `landing_epsilon`, `kinematics.vertical_velocity` is zeroed
    /// and the report is marked `landed`. `kinematics.on_ground` is never
    /// written here; the caller decides what the report means.
    ///
    /// Surfaces without a BVH are skipped. A non-finite capsule is rejected
    /// before anything moves. On error the capsule keeps the
    /// corrections from surfaces processed before the failing one.
    pub fn resolve(
        &self,
        capsule: &mut Capsule,
        registry: &CollisionRegistry,
        kinematics: &mut KinematicState,
        allow_grounding: bool,
    ) -> CollisionResult<ResolveReport> {
        if !capsule.is_finite() {
            return Err(CollisionError::NonFiniteCapsule);
        }
        let mut report = ResolveReport::default();

        for surface in registry.surfaces() {
            let Some(delta) = push_out_of_surface(capsule, surface) else {
                continue;
            };
            if !delta.is_finite() {
                return Err(CollisionError::NonFinite {
                    surface: surface.name().to_string(),
                });
            }

            let mut correction = ContactCorrection {
                surface: surface.id(),
                vertical: 0.0,
                horizontal: Vec3::new(delta.x, 0.0, delta.z),
                upward: false,
            };

            // Vertical is always applied so floors hold regardless of grounding.
            if delta.y.abs() > VERTICAL_THRESHOLD {
                correction.vertical = delta.y;
                capsule.translate(Vec3::Y * delta.y);
                if allow_grounding && delta.y > self.landing_epsilon {
                    correction.upward = true;
                    report.landed = true;
                    kinematics.vertical_velocity = 0.0;
                }
            }
            if correction.horizontal.length_squared() > 0.0 {
                capsule.translate(correction.horizontal);
            }

            report.displacement += correction.translation();
            report.contacts.push(correction);
        }

        Ok(report)
    }
}

/// World-space translation that moves `capsule` out of `surface`, or `None`
/// when nothing was touched.
fn push_out_of_surface(capsule: &Capsule, surface: &CollisionSurface) -> Option<Vec3> {
    let bvh = surface.bvh()?;
    let radius = capsule.radius();

    let mut segment = Segment::new(surface.to_local(capsule.start), surface.to_local(capsule.end));
    let mut query = Aabb::from_points([segment.start, segment.end]);
    query.expand_by_scalar(radius);

    let mut touched = false;
    let mut walk = bvh.traverse();
    while let Some((_, triangle)) = walk.next_candidate(&query) {
        let proximity = triangle.closest_points_to_segment(&segment);
        if proximity.distance >= radius {
            continue;
        }
        let depth = radius - proximity.distance;
        let mut direction = proximity.segment_point - proximity.triangle_point;
        direction = if direction.length_squared() == 0.0 {
            triangle.normal()
        } else {
            direction.normalize()
        };

        segment.translate(direction * depth);
        query.expand_by_point(segment.start);
        query.expand_by_point(segment.end);
        touched = true;
    }

    touched.then(|| surface.to_world(segment.start) - capsule.start)
}
