//! Bounding-volume hierarchy over the triangles of a static mesh.
//!
//! The tree is built once, top-down, by splitting triangle centroids at the
//! median of the longest axis. Nodes live in a flat `Vec` and leaves refer to
//! a contiguous range of the reordered triangle array, so a query never
//! allocates beyond its traversal stack.
//!
//! ```text
//! node 0 (root bounds)
//!   ├── node 1 ── leaf: triangles[0..4]
//!   └── node 2
//!         ├── leaf: triangles[4..8]
//!         └── leaf: triangles[8..11]
//! ```
//!
//! Queries are explicit traversals: [`BvhTraversal`] hands out candidate
//! triangles one at a time and re-tests node bounds against whatever query box
//! the caller passes on each step, so a caller that grows its box mid-walk
//! (the capsule resolver does) still reaches the newly overlapped nodes.

use std::ops::Range;

use bevy::math::Vec3;

use crate::geometry::{Aabb, Triangle};

/// Default maximum triangle count stored in one leaf.
pub const DEFAULT_LEAF_SIZE: usize = 4;

#[derive(Debug, Clone)]
enum NodeKind {
    Leaf { triangles: Range<usize> },
    Branch { left: usize, right: usize },
}

#[derive(Debug, Clone)]
struct BvhNode {
    bounds: Aabb,
    kind: NodeKind,
}

/// Static triangle BVH. Triangles are stored in the mesh's local space.
#[derive(Debug, Clone)]
pub struct TriangleBvh {
    nodes: Vec<BvhNode>,
    triangles: Vec<Triangle>,
}

impl TriangleBvh {
    /// Build a tree over `triangles`. Returns `None` for an empty mesh.
    pub fn build(triangles: Vec<Triangle>, leaf_size: usize) -> Option<Self> {
        if triangles.is_empty() {
            return None;
        }
        let leaf_size = leaf_size.max(1);

        // Centroids are computed once and travel with their triangle.
        let mut items: Vec<(Triangle, Vec3)> =
            triangles.into_iter().map(|t| (t, t.centroid())).collect();
        let mut nodes = Vec::new();
        let len = items.len();
        build_recursive(&mut items, 0..len, leaf_size, &mut nodes);

        Some(Self {
            nodes,
            triangles: items.into_iter().map(|(t, _)| t).collect(),
        })
    }

    /// Bounds of the whole mesh in local space.
    pub fn bounds(&self) -> Aabb {
        self.nodes[0].bounds
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Start a traversal at the root.
    pub fn traverse(&self) -> BvhTraversal<'_> {
        BvhTraversal {
            bvh: self,
            stack: vec![0],
            pending: 0..0,
        }
    }

    /// Indices of every triangle in a leaf whose bounds overlap `query`.
    pub fn query(&self, query: &Aabb) -> Vec<usize> {
        let mut out = Vec::new();
        let mut walk = self.traverse();
        while let Some((index, _)) = walk.next_candidate(query) {
            out.push(index);
        }
        out
    }
}

fn build_recursive(
    items: &mut [(Triangle, Vec3)],
    range: Range<usize>,
    leaf_size: usize,
    nodes: &mut Vec<BvhNode>,
) -> usize {
    let slice = &mut items[range.clone()];
    let bounds = slice
        .iter()
        .fold(Aabb::EMPTY, |acc, (tri, _)| acc.union(&tri.aabb()));

    let index = nodes.len();
    nodes.push(BvhNode {
        bounds,
        kind: NodeKind::Leaf {
            triangles: range.clone(),
        },
    });

    if slice.len() <= leaf_size {
        return index;
    }

    let centroid_bounds = Aabb::from_points(slice.iter().map(|(_, c)| *c));
    let axis = centroid_bounds.longest_axis();
    if centroid_bounds.size()[axis] <= f32::EPSILON {
        // All centroids coincide; splitting would not separate anything.
        return index;
    }

    let mid = slice.len() / 2;
    slice.select_nth_unstable_by(mid, |(_, a), (_, b)| a[axis].total_cmp(&b[axis]));

    let split = range.start + mid;
    let left = build_recursive(items, range.start..split, leaf_size, nodes);
    let right = build_recursive(items, split..range.end, leaf_size, nodes);
    nodes[index].kind = NodeKind::Branch { left, right };
    index
}

/// Depth-first walk over a [`TriangleBvh`].
pub struct BvhTraversal<'a> {
    bvh: &'a TriangleBvh,
    stack: Vec<usize>,
    pending: Range<usize>,
}

impl<'a> BvhTraversal<'a> {
    /// Next triangle from a leaf whose bounds overlap `query`.
    ///
    /// Node bounds are tested lazily against the `query` passed to this call,
    /// not the one passed when the traversal started.
    pub fn next_candidate(&mut self, query: &Aabb) -> Option<(usize, &'a Triangle)> {
        let bvh = self.bvh;
        loop {
            if let Some(i) = self.pending.next() {
                return Some((i, &bvh.triangles[i]));
            }

            let node = &bvh.nodes[self.stack.pop()?];
            if !node.bounds.intersects(query) {
                continue;
            }
            match &node.kind {
                NodeKind::Leaf { triangles } => self.pending = triangles.clone(),
                NodeKind::Branch { left, right } => {
                    // Left is visited first.
                    self.stack.push(*right);
                    self.stack.push(*left);
                }
            }
        }
    }
}
