//! Geometric primitives and closest-point queries used by the collision code.
//!
//! Everything here is plain math over `bevy::math` types: no ECS, no assets.
//! The triangle/segment distance query is the narrow phase of the capsule
//! resolver, so it follows the usual decomposition:
//!
//! 1. If the segment pierces the triangle the distance is zero.
//! 2. Otherwise the minimum is found among the three edge/segment pairs and
//!    the two segment endpoints projected onto the triangle.

use bevy::math::Vec3;

/// Squared lengths below this are treated as zero.
const DEGENERATE_EPSILON: f32 = 1e-12;

/// Axis-aligned bounding box.
///
/// An "empty" box has `min > max` on every axis so that expanding it by any
/// point yields a box containing exactly that point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    pub min: Vec3,
    pub max: Vec3,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl Aabb {
    /// Box that contains nothing.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point. Empty input gives [`Aabb::EMPTY`].
    pub fn from_points<I: IntoIterator<Item = Vec3>>(points: I) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.expand_by_point(p);
        }
        aabb
    }

    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    pub fn expand_by_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grow the box outward by `margin` on every side.
    pub fn expand_by_scalar(&mut self, margin: f32) {
        self.min -= Vec3::splat(margin);
        self.max += Vec3::splat(margin);
    }

    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Overlap test, inclusive on faces.
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z).
    pub fn longest_axis(&self) -> usize {
        let size = self.size();
        if size.x >= size.y && size.x >= size.z {
            0
        } else if size.y >= size.z {
            1
        } else {
            2
        }
    }

    /// Clamp a point into the box.
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        p.clamp(self.min, self.max)
    }

    /// Sphere through the box corners, centered on the box.
    pub fn bounding_sphere(&self) -> BoundingSphere {
        if self.is_empty() {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: -1.0,
            };
        }
        BoundingSphere {
            center: self.center(),
            radius: self.size().length() * 0.5,
        }
    }
}

/// Sphere used as the cheapest possible broad-phase volume.
///
/// A negative radius marks an empty sphere.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    pub center: Vec3,
    pub radius: f32,
}

impl BoundingSphere {
    pub fn is_empty(&self) -> bool {
        self.radius < 0.0
    }

    pub fn intersects_sphere(&self, center: Vec3, radius: f32) -> bool {
        if self.is_empty() {
            return false;
        }
        let reach = self.radius + radius;
        self.center.distance_squared(center) <= reach * reach
    }
}

/// Line segment between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    pub fn delta(&self) -> Vec3 {
        self.end - self.start
    }

    pub fn translate(&mut self, offset: Vec3) {
        self.start += offset;
        self.end += offset;
    }

    /// Parameter in `[0, 1]` of the closest point to `p`.
    pub fn closest_parameter(&self, p: Vec3) -> f32 {
        let d = self.delta();
        let len_sq = d.length_squared();
        if len_sq <= DEGENERATE_EPSILON {
            return 0.0;
        }
        ((p - self.start).dot(d) / len_sq).clamp(0.0, 1.0)
    }

    pub fn at(&self, t: f32) -> Vec3 {
        self.start + self.delta() * t
    }

    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        self.at(self.closest_parameter(p))
    }

    /// Closest points between two segments, returned as `(on_self, on_other)`.
    ///
    /// Ericson, *Real-Time Collision Detection*, section 5.1.9.
    pub fn closest_points_to_segment(&self, other: &Segment) -> (Vec3, Vec3) {
        let d1 = self.delta();
        let d2 = other.delta();
        let r = self.start - other.start;
        let a = d1.length_squared();
        let e = d2.length_squared();
        let f = d2.dot(r);

        if a <= DEGENERATE_EPSILON && e <= DEGENERATE_EPSILON {
            return (self.start, other.start);
        }

        let (s, t);
        if a <= DEGENERATE_EPSILON {
            s = 0.0;
            t = (f / e).clamp(0.0, 1.0);
        } else {
            let c = d1.dot(r);
            if e <= DEGENERATE_EPSILON {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else {
                let b = d1.dot(d2);
                let denom = a * e - b * b;
                let mut s0 = if denom > DEGENERATE_EPSILON {
                    ((b * f - c * e) / denom).clamp(0.0, 1.0)
                } else {
                    0.0
                };
                let mut t0 = (b * s0 + f) / e;
                if t0 < 0.0 {
                    t0 = 0.0;
                    s0 = (-c / a).clamp(0.0, 1.0);
                } else if t0 > 1.0 {
                    t0 = 1.0;
                    s0 = ((b - c) / a).clamp(0.0, 1.0);
                }
                s = s0;
                t = t0;
            }
        }

        (self.start + d1 * s, other.start + d2 * t)
    }
}

/// Result of a triangle/segment proximity query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SegmentProximity {
    pub distance: f32,
    /// Closest point on the triangle.
    pub triangle_point: Vec3,
    /// Closest point on the segment.
    pub segment_point: Vec3,
}

/// A single triangle with counter-clockwise winding defining its face normal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::from_points([self.a, self.b, self.c])
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Unit face normal, or zero for a degenerate triangle.
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalize_or_zero()
    }

    fn edges(&self) -> [Segment; 3] {
        [
            Segment::new(self.a, self.b),
            Segment::new(self.b, self.c),
            Segment::new(self.c, self.a),
        ]
    }

    /// Closest point on the triangle to `p` (Voronoi region walk).
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = va + vb + vc;
        if denom.abs() <= DEGENERATE_EPSILON {
            // Collinear vertices: fall back to the closest edge point.
            return self
                .edges()
                .iter()
                .map(|e| e.closest_point(p))
                .min_by(|x, y| x.distance_squared(p).total_cmp(&y.distance_squared(p)))
                .unwrap_or(a);
        }
        let v = vb / denom;
        let w = vc / denom;
        a + ab * v + ac * w
    }

    /// Point where the segment pierces the triangle, if it does.
    ///
    /// Möller–Trumbore restricted to `t` in `[0, 1]`. Segments parallel to the
    /// plane report no intersection; the edge and endpoint tests in
    /// [`Triangle::closest_points_to_segment`] cover that case.
    pub fn intersect_segment(&self, segment: &Segment) -> Option<Vec3> {
        let dir = segment.delta();
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let h = dir.cross(e2);
        let det = e1.dot(h);
        if det.abs() <= DEGENERATE_EPSILON {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = segment.start - self.a;
        let u = s.dot(h) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        if !(0.0..=1.0).contains(&t) {
            return None;
        }
        Some(segment.start + dir * t)
    }

    /// Minimum distance between the triangle and a segment, with the closest
    /// point on each.
    pub fn closest_points_to_segment(&self, segment: &Segment) -> SegmentProximity {
        if let Some(hit) = self.intersect_segment(segment) {
            return SegmentProximity {
                distance: 0.0,
                triangle_point: hit,
                segment_point: hit,
            };
        }

        let mut best = SegmentProximity {
            distance: f32::INFINITY,
            triangle_point: self.a,
            segment_point: segment.start,
        };
        let mut consider = |triangle_point: Vec3, segment_point: Vec3| {
            let distance = triangle_point.distance(segment_point);
            if distance < best.distance {
                best = SegmentProximity {
                    distance,
                    triangle_point,
                    segment_point,
                };
            }
        };

        for edge in self.edges() {
            let (on_edge, on_segment) = edge.closest_points_to_segment(segment);
            consider(on_edge, on_segment);
        }
        for endpoint in [segment.start, segment.end] {
            consider(self.closest_point(endpoint), endpoint);
        }

        best
    }
}
