//! Scene-level object KD-tree.
//!
//! Shares the triangle tree's skeleton: index-median splits, tight
//! recomputed child boxes, both children visited on traversal. It differs
//! where the scales differ: the split axis is re-derived per node as the
//! box's largest extent instead of round-robin, and leaves stop at a single
//! object.

use std::time::Instant;

use crate::{HitRecord, Object, PointLight};
use glint_math::{Aabb, Ray};

/// A leaf stops splitting at this many objects or fewer.
const SPLIT_TERMINATION: usize = 1;

enum KdNode {
    Leaf {
        bounds: Aabb,
        objs: Vec<usize>,
    },
    Branch {
        bounds: Aabb,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

struct BuildStats {
    nodes: usize,
    leaves: usize,
    max_depth: usize,
}

/// The scene: all objects, all lights, and a KD-tree over object indices.
///
/// Objects are added first; `build` then freezes the set into a tree.
/// Rendering reads the world immutably, so a fully built world can serve
/// any number of concurrent queries.
#[derive(Default)]
pub struct World {
    objects: Vec<Object>,
    lights: Vec<PointLight>,
    fallback: Object,
    root: Option<KdNode>,
    node_count: usize,
    leaf_count: usize,
    max_depth: usize,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an object to the scene. The tree does not see it until the next
    /// `build`.
    pub fn add_object(&mut self, object: Object) {
        self.objects.push(object);
    }

    /// Add a light to the scene.
    pub fn add_light(&mut self, light: PointLight) {
        self.lights.push(light);
    }

    /// Drop the acceleration tree, keeping objects and lights.
    pub fn clear_accel(&mut self) {
        self.root = None;
        self.node_count = 0;
        self.leaf_count = 0;
        self.max_depth = 0;
    }

    /// Drop everything: tree, objects and lights.
    pub fn clear_objects(&mut self) {
        self.clear_accel();
        self.objects.clear();
        self.lights.clear();
    }

    /// Build the object tree over the current object set.
    pub fn build(&mut self) {
        self.clear_accel();

        if self.objects.is_empty() {
            return;
        }

        let start = Instant::now();
        let bounds = self
            .objects
            .iter()
            .fold(Aabb::EMPTY, |acc, obj| Aabb::surrounding(&acc, obj.bounding_box()));
        let objs: Vec<usize> = (0..self.objects.len()).collect();
        let mut stats = BuildStats {
            nodes: 0,
            leaves: 0,
            max_depth: 0,
        };
        let root = build_node(&self.objects, objs, bounds, 1, &mut stats);

        self.root = Some(root);
        self.node_count = stats.nodes;
        self.leaf_count = stats.leaves;
        self.max_depth = stats.max_depth;

        log::debug!(
            "world tree built over {} objects in {:?}: {} nodes, {} leaves, depth {}",
            self.objects.len(),
            start.elapsed(),
            self.node_count,
            self.leaf_count,
            self.max_depth
        );
    }

    /// Find the nearest hit across all objects, or any hit in shadow mode.
    ///
    /// On a hit the record carries the winning object's index alongside the
    /// triangle-level data. A world with zero objects always misses.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow: bool) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        hit_node(&self.objects, root, ray, rec, shadow)
    }

    /// Look up an object by index.
    ///
    /// An out-of-range index returns a shared default object instead of
    /// failing. Callers that hold indices from a stale build get misses,
    /// not panics.
    pub fn object(&self, index: usize) -> &Object {
        self.objects.get(index).unwrap_or(&self.fallback)
    }

    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    pub fn lights(&self) -> &[PointLight] {
        &self.lights
    }

    /// Diagnostics: node count of the last build.
    pub fn node_count(&self) -> usize {
        self.node_count
    }

    /// Diagnostics: leaf count of the last build.
    pub fn leaf_count(&self) -> usize {
        self.leaf_count
    }

    /// Diagnostics: maximum depth of the last build.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}

fn build_node(
    objects: &[Object],
    mut objs: Vec<usize>,
    bounds: Aabb,
    depth: usize,
    stats: &mut BuildStats,
) -> KdNode {
    stats.nodes += 1;
    stats.max_depth = stats.max_depth.max(depth);

    if objs.len() <= SPLIT_TERMINATION {
        stats.leaves += 1;
        return KdNode::Leaf { bounds, objs };
    }

    // Unlike the triangle tree there is no round-robin: each node picks the
    // axis its own box is widest on.
    let axis = bounds.longest_axis();
    objs.sort_unstable_by(|&l, &r| {
        let lc = objects[l].bounding_box().centroid()[axis];
        let rc = objects[r].bounding_box().centroid()[axis];
        lc.partial_cmp(&rc).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mid = objs.len() / 2;
    let right_objs = objs.split_off(mid);
    let left_objs = objs;

    let bounds_of = |members: &[usize]| {
        members.iter().fold(Aabb::EMPTY, |acc, &i| {
            Aabb::surrounding(&acc, objects[i].bounding_box())
        })
    };
    let left_bounds = bounds_of(&left_objs);
    let right_bounds = bounds_of(&right_objs);

    KdNode::Branch {
        bounds,
        left: Box::new(build_node(objects, left_objs, left_bounds, depth + 1, stats)),
        right: Box::new(build_node(
            objects,
            right_objs,
            right_bounds,
            depth + 1,
            stats,
        )),
    }
}

fn hit_node(
    objects: &[Object],
    node: &KdNode,
    ray: &Ray,
    rec: &mut HitRecord,
    shadow: bool,
) -> bool {
    match node {
        KdNode::Leaf { bounds, objs } => {
            if !bounds.hit(ray) {
                return false;
            }

            let mut hit = false;
            rec.t = f32::INFINITY;
            let mut tmp = HitRecord::default();
            for &idx in objs {
                if objects[idx].hit(ray, &mut tmp, shadow) {
                    if shadow {
                        return true;
                    }
                    if tmp.t < rec.t {
                        *rec = tmp;
                        rec.object = idx;
                    }
                    hit = true;
                }
            }
            hit
        }
        KdNode::Branch {
            bounds,
            left,
            right,
        } => {
            if !bounds.hit(ray) {
                return false;
            }

            // Same overlap caveat as the triangle tree: visit both children
            // whenever their boxes are hit.
            rec.t = f32::INFINITY;
            let mut tmp = HitRecord::default();

            let hit_left = hit_node(objects, left, ray, &mut tmp, shadow);
            if hit_left {
                if shadow {
                    return true;
                }
                *rec = tmp;
            }

            let hit_right = hit_node(objects, right, ray, &mut tmp, shadow);
            if hit_right {
                if shadow {
                    return true;
                }
                if tmp.t < rec.t {
                    *rec = tmp;
                }
            }

            hit_left || hit_right
        }
    }
}
