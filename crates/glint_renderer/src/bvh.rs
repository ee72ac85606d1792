//! Bounding Volume Hierarchy (BVH) acceleration structure.
//!
//! Median-split build over an arena: the spheres are copied once into a
//! flat array that gets sorted in place by index range, and nodes refer to
//! each other and to their objects by index. The tree is immutable once
//! built; scene edits rebuild it from scratch.

use crate::intersect::{intersect_objects, nearer, Hit};
use glint_core::{SceneError, SceneResult, Sphere};
use glint_math::{Aabb, Ray};
use rand::RngCore;

/// Maximum primitives per leaf node before splitting.
pub const LEAF_MAX_SIZE: usize = 2;

/// BVH node - either a branch with two children or a leaf with primitives.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BvhNode {
    /// Internal node; children are indices into the node arena.
    Branch {
        left: usize,
        right: usize,
        bbox: Aabb,
    },
    /// Leaf owning `objects[start..start + count]`.
    Leaf {
        start: usize,
        count: usize,
        bbox: Aabb,
    },
}

impl BvhNode {
    pub fn bounding_box(&self) -> Aabb {
        match self {
            BvhNode::Branch { bbox, .. } | BvhNode::Leaf { bbox, .. } => *bbox,
        }
    }
}

/// Arena-backed BVH over spheres.
#[derive(Debug, Clone)]
pub struct Bvh {
    nodes: Vec<BvhNode>,
    objects: Vec<Sphere>,
    root: usize,
}

impl Bvh {
    /// Build a BVH from the current object list.
    ///
    /// Objects are sorted by center along x, y, z in turn with depth and
    /// split at the median. Fails with `InvalidScene` on an empty list.
    pub fn build(objects: &[Sphere]) -> SceneResult<Self> {
        if objects.is_empty() {
            return Err(SceneError::InvalidScene(
                "cannot build a BVH over zero objects".to_string(),
            ));
        }

        let mut objects = objects.to_vec();
        let mut nodes = Vec::with_capacity(2 * objects.len());
        let n = objects.len();
        let root = Self::build_range(&mut objects, &mut nodes, 0, n, 0);

        Ok(Self {
            nodes,
            objects,
            root,
        })
    }

    /// Recursive construction over `objects[start..end]`. Returns the node index.
    fn build_range(
        objects: &mut [Sphere],
        nodes: &mut Vec<BvhNode>,
        start: usize,
        end: usize,
        depth: usize,
    ) -> usize {
        let count = end - start;

        if count <= LEAF_MAX_SIZE {
            let bbox = objects[start..end]
                .iter()
                .fold(Aabb::EMPTY, |acc, o| Aabb::surrounding(&acc, &o.bounding_box()));
            nodes.push(BvhNode::Leaf { start, count, bbox });
            return nodes.len() - 1;
        }

        let axis = depth % 3;
        objects[start..end].sort_by(|a, b| a.position[axis].total_cmp(&b.position[axis]));

        let mid = start + count / 2;
        let left = Self::build_range(objects, nodes, start, mid, depth + 1);
        let right = Self::build_range(objects, nodes, mid, end, depth + 1);

        let bbox = Aabb::surrounding(&nodes[left].bounding_box(), &nodes[right].bounding_box());
        nodes.push(BvhNode::Branch { left, right, bbox });
        nodes.len() - 1
    }

    /// Find the nearest hit along `ray`.
    ///
    /// Both children of a branch are visited whenever its box is hit; only
    /// a box miss prunes a subtree.
    pub fn intersect<'a>(&'a self, ray: &Ray, rng: &mut dyn RngCore) -> Option<Hit<'a>> {
        self.intersect_node(self.root, ray, rng)
    }

    fn intersect_node<'a>(
        &'a self,
        index: usize,
        ray: &Ray,
        rng: &mut dyn RngCore,
    ) -> Option<Hit<'a>> {
        let node = &self.nodes[index];
        if !node.bounding_box().hit(ray) {
            return None;
        }

        match *node {
            BvhNode::Leaf { start, count, .. } => {
                intersect_objects(ray, &self.objects[start..start + count], rng)
            }
            BvhNode::Branch { left, right, .. } => {
                let left_hit = self.intersect_node(left, ray, rng);
                let right_hit = self.intersect_node(right, ray, rng);
                nearer(left_hit, right_hit)
            }
        }
    }

    pub fn root(&self) -> usize {
        self.root
    }

    pub fn nodes(&self) -> &[BvhNode] {
        &self.nodes
    }

    /// Objects in BVH order (not scene order).
    pub fn objects(&self) -> &[Sphere] {
        &self.objects
    }

    /// Number of edges on the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self.root, 0)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes[index] {
                BvhNode::Leaf { .. } => deepest = deepest.max(depth),
                BvhNode::Branch { left, right, .. } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        deepest
    }
}
