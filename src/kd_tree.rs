//! Kd-tree over photon positions.
//!
//! Built once per photon pool after emission and immutable afterwards.
//! Nodes split at the median along the axis of largest extent, which keeps
//! the tree balanced even for the tight clusters a caustic produces.

use glam::Vec3A;
use smallvec::SmallVec;

use crate::aabb::Aabb;
use crate::photon_map::Photon;

/// Sentinel child index for "no subtree".
const NONE: i32 = -1;

#[derive(Debug, Clone, Copy)]
struct KdNode {
    /// Index of this node's photon in the arena.
    photon: u32,
    /// Split axis (0=X, 1=Y, 2=Z).
    axis: u8,
    left: i32,
    right: i32,
}

/// Immutable kd-tree supporting radius queries.
#[derive(Debug)]
pub struct KdTree {
    photons: Vec<Photon>,
    nodes: Vec<KdNode>,
    root: i32,
}

impl Default for KdTree {
    fn default() -> Self {
        Self::build(Vec::new())
    }
}

impl KdTree {
    /// Build a tree owning the given photons.
    pub fn build(photons: Vec<Photon>) -> Self {
        let mut indices: Vec<u32> = (0..photons.len() as u32).collect();
        let mut nodes = Vec::with_capacity(photons.len());
        let root = Self::build_node(&photons, &mut indices, &mut nodes);
        Self {
            photons,
            nodes,
            root,
        }
    }

    fn build_node(photons: &[Photon], indices: &mut [u32], nodes: &mut Vec<KdNode>) -> i32 {
        if indices.is_empty() {
            return NONE;
        }

        let mut bounds = Aabb::EMPTY;
        for &index in indices.iter() {
            bounds.grow(photons[index as usize].position);
        }
        let axis = bounds.longest_axis();

        let median = indices.len() / 2;
        indices.select_nth_unstable_by(median, |&a, &b| {
            photons[a as usize].position[axis].total_cmp(&photons[b as usize].position[axis])
        });
        let photon = indices[median];

        // Reserve the slot before recursing so parents precede children.
        let node_index = nodes.len();
        nodes.push(KdNode {
            photon,
            axis: axis as u8,
            left: NONE,
            right: NONE,
        });

        let (below, rest) = indices.split_at_mut(median);
        let left = Self::build_node(photons, below, nodes);
        let right = Self::build_node(photons, &mut rest[1..], nodes);
        nodes[node_index].left = left;
        nodes[node_index].right = right;
        node_index as i32
    }

    /// Number of photons in the tree.
    pub fn len(&self) -> usize {
        self.photons.len()
    }

    /// Whether the tree holds no photons.
    pub fn is_empty(&self) -> bool {
        self.photons.is_empty()
    }

    /// All photons, in arena order.
    pub fn photons(&self) -> &[Photon] {
        &self.photons
    }

    /// Append every photon within `radius` of `point` to `out`.
    ///
    /// `out` is caller-provided so shading loops can reuse one buffer
    /// across queries instead of reallocating.
    pub fn within_radius(&self, point: Vec3A, radius: f32, out: &mut Vec<Photon>) {
        debug_assert!(radius >= 0.0);
        if !(radius >= 0.0) || self.root == NONE {
            return;
        }
        let radius_sq = radius * radius;

        let mut stack: SmallVec<[i32; 64]> = SmallVec::new();
        stack.push(self.root);
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index as usize];
            let photon = &self.photons[node.photon as usize];

            if (photon.position - point).length_squared() <= radius_sq {
                out.push(*photon);
            }

            let delta = point[node.axis as usize] - photon.position[node.axis as usize];
            let (near, far) = if delta < 0.0 {
                (node.left, node.right)
            } else {
                (node.right, node.left)
            };
            if near != NONE {
                stack.push(near);
            }
            if far != NONE && delta.abs() <= radius {
                stack.push(far);
            }
        }
    }
}
