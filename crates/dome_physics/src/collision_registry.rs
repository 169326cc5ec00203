//! Static collision surfaces and the cheap bounding volumes derived from them.
//!
//! Each registered [`CollisionMesh`] becomes a [`CollisionSurface`] holding:
//!
//! - a [`TriangleBvh`] over its triangles in mesh-local space, used by the
//!   capsule resolver and the ground probe for exact queries
//! - the mesh transform and its inverse, so queries can move into local space
//!   instead of rebuilding the tree in world space
//!
//! Alongside the surfaces the registry keeps one [`CheapCollider`] per
//! non-empty surface: a world-space box grown by a small margin plus the box's
//! bounding sphere. Decorative actors (bubbles, fish, butterflies) only ever
//! read these.
//!
//! Surfaces are static. The only mutation after registration is
//! [`CollisionRegistry::place_surface`], used while a batch of streamed assets
//! is still being positioned; call [`CollisionRegistry::rebuild_cheap_colliders`]
//! afterwards so the cheap volumes reflect the final placement.

use bevy::log::{debug, info};
use bevy::math::{Mat3, Mat4, Vec3};

use crate::config::CollisionConfig;
use crate::error::{CollisionError, CollisionResult};
use crate::geometry::{Aabb, BoundingSphere, Triangle};
use crate::mesh_bvh::TriangleBvh;

/// Handle to a registered surface. Ids follow registration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SurfaceId(pub usize);

/// Raw triangle mesh handed to the registry by asset loading.
#[derive(Debug, Clone)]
pub struct CollisionMesh {
    pub name: String,
    /// Vertex positions in mesh-local space
    pub positions: Vec<Vec3>,
    /// Triangle list indices. `None` means every three positions form a triangle.
    pub indices: Option<Vec<u32>>,
    /// Local-to-world transform
    pub transform: Mat4,
}

impl CollisionMesh {
    pub fn new(
        name: impl Into<String>,
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        transform: Mat4,
    ) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: Some(indices),
            transform,
        }
    }

    /// Mesh whose positions are consumed three at a time.
    pub fn non_indexed(name: impl Into<String>, positions: Vec<Vec3>, transform: Mat4) -> Self {
        Self {
            name: name.into(),
            positions,
            indices: None,
            transform,
        }
    }

    /// Closed box centered on the local origin with outward-facing triangles.
    pub fn cuboid(name: impl Into<String>, half_extents: Vec3, transform: Mat4) -> Self {
        // (normal, u, v) with u x v == normal so corners wind counter-clockwise.
        let faces = [
            (Vec3::X, Vec3::Y, Vec3::Z),
            (Vec3::NEG_X, Vec3::Z, Vec3::Y),
            (Vec3::Y, Vec3::Z, Vec3::X),
            (Vec3::NEG_Y, Vec3::X, Vec3::Z),
            (Vec3::Z, Vec3::X, Vec3::Y),
            (Vec3::NEG_Z, Vec3::Y, Vec3::X),
        ];

        let mut positions = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for (normal, u, v) in faces {
            let center = normal * half_extents;
            let u = u * half_extents;
            let v = v * half_extents;
            let base = positions.len() as u32;
            positions.extend([
                center - u - v,
                center + u - v,
                center + u + v,
                center - u + v,
            ]);
            indices.extend([base, base + 1, base + 2, base, base + 2, base + 3]);
        }

        Self::new(name, positions, indices, transform)
    }

    /// Horizontal square facing +Y, centered on the local origin.
    pub fn quad(name: impl Into<String>, half_size: f32, transform: Mat4) -> Self {
        let h = half_size;
        let positions = vec![
            Vec3::new(-h, 0.0, -h),
            Vec3::new(-h, 0.0, h),
            Vec3::new(h, 0.0, h),
            Vec3::new(h, 0.0, -h),
        ];
        Self::new(name, positions, vec![0, 1, 2, 0, 2, 3], transform)
    }

    /// Assemble local-space triangles, validating the index list.
    pub fn triangles(&self) -> CollisionResult<Vec<Triangle>> {
        let vertex_count = self.positions.len();
        match &self.indices {
            Some(indices) => {
                if indices.len() % 3 != 0 {
                    return Err(CollisionError::IndicesNotTriangles {
                        surface: self.name.clone(),
                        len: indices.len(),
                    });
                }
                let fetch = |index: u32| {
                    self.positions.get(index as usize).copied().ok_or_else(|| {
                        CollisionError::IndexOutOfRange {
                            surface: self.name.clone(),
                            index,
                            vertex_count,
                        }
                    })
                };
                indices
                    .chunks_exact(3)
                    .map(|tri| Ok(Triangle::new(fetch(tri[0])?, fetch(tri[1])?, fetch(tri[2])?)))
                    .collect()
            }
            None => {
                if vertex_count % 3 != 0 {
                    return Err(CollisionError::IndicesNotTriangles {
                        surface: self.name.clone(),
                        len: vertex_count,
                    });
                }
                Ok(self
                    .positions
                    .chunks_exact(3)
                    .map(|p| Triangle::new(p[0], p[1], p[2]))
                    .collect())
            }
        }
    }
}

/// A registered static surface.
#[derive(Debug, Clone)]
pub struct CollisionSurface {
    id: SurfaceId,
    name: String,
    transform: Mat4,
    inverse: Mat4,
    normal_matrix: Mat3,
    bvh: Option<TriangleBvh>,
}

impl CollisionSurface {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn transform(&self) -> &Mat4 {
        &self.transform
    }

    /// The precise index. `None` for a surface registered without triangles;
    /// such surfaces are treated as non-solid.
    pub fn bvh(&self) -> Option<&TriangleBvh> {
        self.bvh.as_ref()
    }

    pub fn to_local(&self, world: Vec3) -> Vec3 {
        self.inverse.transform_point3(world)
    }

    pub fn to_world(&self, local: Vec3) -> Vec3 {
        self.transform.transform_point3(local)
    }

    /// Map a local face normal to a unit world normal.
    pub fn normal_to_world(&self, local_normal: Vec3) -> Vec3 {
        (self.normal_matrix * local_normal).normalize_or_zero()
    }

    /// World-space bounds of the surface triangles, or empty.
    pub fn world_bounds(&self) -> Aabb {
        let Some(bvh) = &self.bvh else {
            return Aabb::EMPTY;
        };
        Aabb::from_points(
            bvh.triangles()
                .iter()
                .flat_map(|t| [t.a, t.b, t.c])
                .map(|p| self.transform.transform_point3(p)),
        )
    }

    fn set_transform(&mut self, transform: Mat4) -> CollisionResult<()> {
        let (inverse, normal_matrix) = invert_transform(&self.name, &transform)?;
        self.transform = transform;
        self.inverse = inverse;
        self.normal_matrix = normal_matrix;
        Ok(())
    }
}

fn invert_transform(name: &str, transform: &Mat4) -> CollisionResult<(Mat4, Mat3)> {
    let det = transform.determinant();
    if !det.is_finite() || det.abs() < 1e-12 {
        return Err(CollisionError::SingularTransform {
            surface: name.to_string(),
        });
    }
    let normal_matrix = Mat3::from_mat4(*transform).inverse().transpose();
    Ok((transform.inverse(), normal_matrix))
}

/// Result of testing a sphere against a [`CheapCollider`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereContact {
    /// Unit direction from the box toward the sphere center
    pub normal: Vec3,
    /// Closest point on the box
    pub point: Vec3,
    pub depth: f32,
}

/// Coarse world-space volume of one surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CheapCollider {
    pub surface: SurfaceId,
    pub aabb: Aabb,
    pub sphere: BoundingSphere,
}

impl CheapCollider {
    fn from_surface(surface: &CollisionSurface, margin: f32) -> Option<Self> {
        let mut aabb = surface.world_bounds();
        if aabb.is_empty() {
            return None;
        }
        aabb.expand_by_scalar(margin);
        Some(Self {
            surface: surface.id,
            aabb,
            sphere: aabb.bounding_sphere(),
        })
    }

    /// Sphere test against the box: bounding-sphere rejection first, then a
    /// clamp into the box. A center inside the box reports a +Y normal.
    pub fn sphere_contact(&self, center: Vec3, radius: f32) -> Option<SphereContact> {
        if !self.sphere.intersects_sphere(center, radius) {
            return None;
        }
        let point = self.aabb.closest_point(center);
        let offset = center - point;
        let dist_sq = offset.length_squared();
        if dist_sq > radius * radius {
            return None;
        }
        let dist = dist_sq.sqrt();
        let normal = if dist_sq == 0.0 { Vec3::Y } else { offset / dist };
        Some(SphereContact {
            normal,
            point,
            depth: radius - dist,
        })
    }
}

/// Every static collidable surface in the world.
#[derive(Debug, Clone, Default)]
pub struct CollisionRegistry {
    config: CollisionConfig,
    surfaces: Vec<CollisionSurface>,
    cheap: Vec<CheapCollider>,
}

impl CollisionRegistry {
    pub fn new(config: CollisionConfig) -> Self {
        Self {
            config,
            surfaces: Vec::new(),
            cheap: Vec::new(),
        }
    }

    /// Build the BVH and cheap volume for `mesh` and append it.
    ///
    /// Safe to call repeatedly as assets stream in. A mesh without triangles
    /// is registered without an index.
    pub fn register(&mut self, mesh: CollisionMesh) -> CollisionResult<SurfaceId> {
        let triangles = mesh.triangles()?;
        let (inverse, normal_matrix) = invert_transform(&mesh.name, &mesh.transform)?;
        let bvh = TriangleBvh::build(triangles, self.config.bvh_leaf_size);

        let id = SurfaceId(self.surfaces.len());
        let surface = CollisionSurface {
            id,
            name: mesh.name,
            transform: mesh.transform,
            inverse,
            normal_matrix,
            bvh,
        };

        match &surface.bvh {
            Some(bvh) => info!(
                "Registered collision surface '{}' ({} triangles, {} BVH nodes)",
                surface.name,
                bvh.triangle_count(),
                bvh.node_count()
            ),
            None => debug!(
                "Registered collision surface '{}' without triangles",
                surface.name
            ),
        }

        if let Some(cheap) = CheapCollider::from_surface(&surface, self.config.cheap_margin) {
            self.cheap.push(cheap);
        }
        self.surfaces.push(surface);
        Ok(id)
    }

    /// Move a surface before the world is finalized. The precise index is in
    /// local space and stays valid; cheap colliders are stale until
    /// [`CollisionRegistry::rebuild_cheap_colliders`].
    pub fn place_surface(&mut self, id: SurfaceId, transform: Mat4) -> CollisionResult<()> {
        self.surfaces
            .get_mut(id.0)
            .ok_or(CollisionError::UnknownSurface(id))?
            .set_transform(transform)
    }

    /// Recompute every cheap collider from the current surface transforms.
    pub fn rebuild_cheap_colliders(&mut self) {
        let margin = self.config.cheap_margin;
        self.cheap = self
            .surfaces
            .iter()
            .filter_map(|s| CheapCollider::from_surface(s, margin))
            .collect();
        info!("Rebuilt {} cheap colliders", self.cheap.len());
    }

    /// Read-only view for decorative actors.
    pub fn cheap_colliders(&self) -> &[CheapCollider] {
        &self.cheap
    }

    /// First cheap collider touching the sphere, in registration order.
    pub fn first_sphere_contact(&self, center: Vec3, radius: f32) -> Option<SphereContact> {
        self.cheap
            .iter()
            .find_map(|c| c.sphere_contact(center, radius))
    }

    pub fn surfaces(&self) -> &[CollisionSurface] {
        &self.surfaces
    }

    pub fn surface(&self, id: SurfaceId) -> Option<&CollisionSurface> {
        self.surfaces.get(id.0)
    }

    pub fn len(&self) -> usize {
        self.surfaces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.surfaces.is_empty()
    }
}
