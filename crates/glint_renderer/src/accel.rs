//! Per-mesh triangle KD-tree.
//!
//! The tree recursively partitions triangle *indices* by sorting them on
//! their box-centroid coordinate and splitting at the middle index. This is
//! not a spatial-median KD-tree: sibling boxes may overlap, and traversal
//! therefore always descends into every child whose box the ray hits.

use std::sync::Arc;
use std::time::Instant;

use crate::HitRecord;
use glint_core::Mesh;
use glint_math::{Aabb, Ray, Vec3};

/// A leaf stops splitting below this many triangles.
const SPLIT_TERMINATION: usize = 5;

/// Tree node: either a leaf holding triangle indices or an internal node
/// with exactly two children. The partition axis is recorded on internal
/// nodes (round-robin X -> Y -> Z down the tree).
enum KdNode {
    Leaf {
        bounds: Aabb,
        tris: Vec<u32>,
    },
    Branch {
        bounds: Aabb,
        #[allow(dead_code)]
        axis: usize,
        left: Box<KdNode>,
        right: Box<KdNode>,
    },
}

struct BuildStats {
    nodes: usize,
    leaves: usize,
    max_depth: usize,
}

/// KD-tree acceleration structure over one mesh's triangles.
///
/// The mesh is shared, not owned: the same `Arc<Mesh>` handle the objects
/// hold. Queries run in mesh-local space.
pub struct Accel {
    mesh: Arc<Mesh>,
    root: Option<KdNode>,
    node_count: usize,
    leaf_count: usize,
    max_depth: usize,
}

impl Accel {
    /// Create an acceleration structure for a mesh. The tree is empty until
    /// [`build`](Self::build) is called.
    pub fn new(mesh: Arc<Mesh>) -> Self {
        Self {
            mesh,
            root: None,
            node_count: 0,
            leaf_count: 0,
            max_depth: 0,
        }
    }

    /// Create and immediately build.
    pub fn build_for(mesh: Arc<Mesh>) -> Self {
        let mut accel = Self::new(mesh);
        accel.build();
        accel
    }

    /// Drop the tree. The triangle set is frozen per build; any change to
    /// the mesh requires `clear` followed by a full `build`.
    pub fn clear(&mut self) {
        self.root = None;
        self.node_count = 0;
        self.leaf_count = 0;
        self.max_depth = 0;
    }

    /// Build the tree over all of the mesh's triangles.
    ///
    /// An empty mesh leaves the tree empty; every query then misses.
    pub fn build(&mut self) {
        self.clear();

        let nface = self.mesh.triangle_count();
        if nface == 0 {
            return;
        }

        let start = Instant::now();
        let tris: Vec<u32> = (0..nface as u32).collect();
        let mut stats = BuildStats {
            nodes: 0,
            leaves: 0,
            max_depth: 0,
        };
        let root = build_node(&self.mesh, tris, *self.mesh.bounds(), 0, 1, &mut stats);

        self.root = Some(root);
        self.node_count = stats.nodes;
        self.leaf_count = stats.leaves;
        self.max_depth = stats.max_depth;

        log::debug!(
            "accel built over {} tris in {:?}: {} nodes, {} leaves, depth {}",
            nface,
            start.elapsed(),
            self.node_count,
            self.leaf_count,
            self.max_depth
        );
    }

    /// Find the nearest triangle hit in mesh-local space.
    ///
    /// In shadow mode the query returns on the first hit found instead of
    /// the nearest one. On a hit the record carries the triangle index,
    /// barycentric weights, hit distance, resolved local-space point and
    /// the query ray.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow: bool) -> bool {
        let Some(root) = &self.root else {
            return false;
        };
        if hit_node(&self.mesh, root, ray, rec, shadow) {
            rec.ray = *ray;
            rec.point = ray.at(rec.t);
            true
        } else {
            false
        }
    }

    /// The mesh this tree indexes.
    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    /// Diagnostics: total node count of the last build.
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

    #[cfg(test)]
    fn collect_leaves<'a>(&'a self, out: &mut Vec<(&'a Aabb, &'a [u32])>) {
        fn walk<'a>(node: &'a KdNode, out: &mut Vec<(&'a Aabb, &'a [u32])>) {
            match node {
                KdNode::Leaf { bounds, tris } => out.push((bounds, tris)),
                KdNode::Branch { left, right, .. } => {
                    walk(left, out);
                    walk(right, out);
                }
            }
        }
        if let Some(root) = &self.root {
            walk(root, out);
        }
    }

    #[cfg(test)]
    fn root_bounds(&self) -> Option<&Aabb> {
        self.root.as_ref().map(|n| match n {
            KdNode::Leaf { bounds, .. } => bounds,
            KdNode::Branch { bounds, .. } => bounds,
        })
    }
}

fn build_node(
    mesh: &Mesh,
    mut tris: Vec<u32>,
    bounds: Aabb,
    axis: usize,
    depth: usize,
    stats: &mut BuildStats,
) -> KdNode {
    stats.nodes += 1;
    stats.max_depth = stats.max_depth.max(depth);

    if tris.len() < SPLIT_TERMINATION {
        stats.leaves += 1;
        return KdNode::Leaf { bounds, tris };
    }

    // Median split: sort by box centroid along this node's axis and cut at
    // the middle index. The halves' boxes are rebuilt tight from their own
    // members and may overlap each other.
    tris.sort_unstable_by(|&l, &r| {
        let lc = mesh.triangle_bounds(l as usize).centroid()[axis];
        let rc = mesh.triangle_bounds(r as usize).centroid()[axis];
        lc.partial_cmp(&rc).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mid = tris.len() / 2;
    let right_tris = tris.split_off(mid);
    let left_tris = tris;

    let bounds_of = |members: &[u32]| {
        members.iter().fold(Aabb::EMPTY, |acc, &tri| {
            Aabb::surrounding(&acc, mesh.triangle_bounds(tri as usize))
        })
    };
    let left_bounds = bounds_of(&left_tris);
    let right_bounds = bounds_of(&right_tris);

    let next_axis = (axis + 1) % 3;
    KdNode::Branch {
        bounds,
        axis,
        left: Box::new(build_node(
            mesh,
            left_tris,
            left_bounds,
            next_axis,
            depth + 1,
            stats,
        )),
        right: Box::new(build_node(
            mesh,
            right_tris,
            right_bounds,
            next_axis,
            depth + 1,
            stats,
        )),
    }
}

fn hit_node(mesh: &Mesh, node: &KdNode, ray: &Ray, rec: &mut HitRecord, shadow: bool) -> bool {
    match node {
        KdNode::Leaf { bounds, tris } => {
            if !bounds.hit(ray) {
                return false;
            }

            let mut hit = false;
            let mut t_min = f32::INFINITY;
            for &tri in tris {
                let mut bar = Vec3::ZERO;
                let mut t = 0.0;
                if mesh.intersect_triangle(tri as usize, ray, &mut bar, &mut t) && t < t_min {
                    // A shadow query only needs to know the ray is blocked
                    if shadow {
                        return true;
                    }
                    t_min = t;
                    rec.t = t;
                    rec.barycentric = bar;
                    rec.tri = tri;
                    hit = true;
                }
            }
            hit
        }
        KdNode::Branch {
            bounds,
            left,
            right,
            ..
        } => {
            if !bounds.hit(ray) {
                return false;
            }

            // Sibling boxes can overlap (index-median split), so both
            // children must be visited whenever their boxes are hit;
            // entry-order pruning would drop valid nearer hits.
            rec.t = f32::INFINITY;
            let mut tmp = HitRecord::default();

            let hit_left = hit_node(mesh, left, ray, &mut tmp, shadow);
            if hit_left {
                if shadow {
                    return true;
                }
                *rec = tmp;
            }

            let hit_right = hit_node(mesh, right, ray, &mut tmp, shadow);
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

#[cfg(test)]
mod tests {
    use super::*;

    /// A grid of `n x n` unit-ish triangles in the z=0 plane.
    fn triangle_grid(n: u32) -> Arc<Mesh> {
        let mut positions = Vec::new();
        let mut indices = Vec::new();
        for gy in 0..n {
            for gx in 0..n {
                let base = positions.len() as u32;
                let x = gx as f32 * 2.0;
                let y = gy as f32 * 2.0;
                positions.push(Vec3::new(x, y, 0.0));
                positions.push(Vec3::new(x + 1.0, y, 0.0));
                positions.push(Vec3::new(x, y + 1.0, 0.0));
                indices.extend_from_slice(&[base, base + 1, base + 2]);
            }
        }
        Arc::new(Mesh::new(positions, indices, None))
    }

    #[test]
    fn test_empty_mesh_always_misses() {
        let mesh = Arc::new(Mesh::new(vec![], vec![], None));
        let accel = Accel::build_for(mesh);

        assert_eq!(accel.node_count(), 0);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(!accel.hit(&ray, &mut rec, false));
        assert!(!accel.hit(&ray, &mut rec, true));
    }

    #[test]
    fn test_small_mesh_stays_a_single_leaf() {
        // Below the split threshold nothing splits
        let accel = Accel::build_for(triangle_grid(2));
        assert_eq!(accel.node_count(), 1);
        assert_eq!(accel.leaf_count(), 1);
        assert_eq!(accel.max_depth(), 1);
    }

    #[test]
    fn test_leaf_items_partition_the_input() {
        let accel = Accel::build_for(triangle_grid(8));
        assert!(accel.node_count() > 1);

        let mut leaves = Vec::new();
        accel.collect_leaves(&mut leaves);

        let mut seen: Vec<u32> = leaves.iter().flat_map(|(_, t)| t.iter().copied()).collect();
        seen.sort_unstable();
        let expected: Vec<u32> = (0..64).collect();
        assert_eq!(seen, expected, "leaves must cover every triangle exactly once");
    }

    #[test]
    fn test_leaf_bounds_contain_their_items() {
        let accel = Accel::build_for(triangle_grid(8));
        let root = *accel.root_bounds().unwrap();

        let mut leaves = Vec::new();
        accel.collect_leaves(&mut leaves);
        for (bounds, tris) in leaves {
            assert!(root.contains(bounds));
            for &tri in tris {
                assert!(bounds.contains(accel.mesh().triangle_bounds(tri as usize)));
            }
        }
    }

    #[test]
    fn test_nearest_hit_wins() {
        // Two parallel triangles stacked in z; the nearer one must be hit
        let mesh = Arc::new(Mesh::new(
            vec![
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 0.0, -3.0),
                Vec3::new(1.0, 0.0, -3.0),
                Vec3::new(0.0, 1.0, -3.0),
            ],
            vec![0, 1, 2, 3, 4, 5],
            None,
        ));
        let accel = Accel::build_for(mesh);

        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(accel.hit(&ray, &mut rec, false));
        assert_eq!(rec.tri, 0);
        assert!((rec.t - 1.0).abs() < 1e-5);
        assert!((rec.point - Vec3::new(0.25, 0.25, 0.0)).length() < 1e-5);
    }

    #[test]
    fn test_shadow_mode_reports_any_hit() {
        let accel = Accel::build_for(triangle_grid(8));

        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(accel.hit(&ray, &mut rec, true));
    }

    #[test]
    fn test_ray_missing_mesh_box_misses() {
        let accel = Accel::build_for(triangle_grid(8));

        // Well outside the grid's bounding box
        let ray = Ray::new(Vec3::new(100.0, 100.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(!accel.hit(&ray, &mut rec, false));
    }

    #[test]
    fn test_clear_then_rebuild() {
        let mut accel = Accel::build_for(triangle_grid(4));
        let nodes = accel.node_count();
        assert!(nodes > 0);

        accel.clear();
        let ray = Ray::new(Vec3::new(0.25, 0.25, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let mut rec = HitRecord::default();
        assert!(!accel.hit(&ray, &mut rec, false));

        accel.build();
        assert_eq!(accel.node_count(), nodes);
        assert!(accel.hit(&ray, &mut rec, false));
    }
}
