//! Mesh geometry representation.
//!
//! A mesh is an immutable triangle soup: vertex positions, optional normals
//! and UVs, and a triangle index buffer. The whole-mesh bounding box and one
//! box per triangle are computed once at construction so the acceleration
//! structures can query them without touching vertex data.

use glint_math::{Aabb, Ray, Vec3};

/// A mesh consisting of vertex positions, optional normals/UVs, and triangle
/// indices.
#[derive(Clone, Debug)]
pub struct Mesh {
    /// Vertex positions (one Vec3 per vertex)
    pub positions: Vec<Vec3>,

    /// Vertex normals (optional - will be computed if not provided)
    pub normals: Option<Vec<Vec3>>,

    /// UV coordinates (optional - one [u, v] per vertex)
    pub uvs: Option<Vec<[f32; 2]>>,

    /// Triangle indices (every 3 indices form a triangle)
    pub indices: Vec<u32>,

    /// Axis-aligned bounding box of the whole mesh
    bounds: Aabb,

    /// One bounding box per triangle, indexed by face
    triangle_bounds: Vec<Aabb>,
}

impl Mesh {
    /// Create a new mesh from positions and indices, optionally with normals.
    ///
    /// If normals are not provided, they will NOT be automatically computed.
    /// Call `compute_normals()` explicitly if you need them.
    pub fn new(positions: Vec<Vec3>, indices: Vec<u32>, normals: Option<Vec<Vec3>>) -> Self {
        Self::with_uvs(positions, indices, normals, None)
    }

    /// Create a new mesh with UV coordinates.
    pub fn with_uvs(
        positions: Vec<Vec3>,
        indices: Vec<u32>,
        normals: Option<Vec<Vec3>>,
        uvs: Option<Vec<[f32; 2]>>,
    ) -> Self {
        // Drop triangles referencing out-of-range vertices instead of
        // letting them poison every later lookup
        let mut valid = Vec::with_capacity(indices.len());
        for face in indices.chunks_exact(3) {
            if face.iter().any(|&i| i as usize >= positions.len()) {
                log::warn!(
                    "skipping triangle {:?}: out-of-range vertices (vertex count {})",
                    face,
                    positions.len()
                );
                continue;
            }
            valid.extend_from_slice(face);
        }

        let bounds = Self::compute_bounds(&positions);
        let triangle_bounds = Self::compute_triangle_bounds(&positions, &valid);
        Self {
            positions,
            normals,
            uvs,
            indices: valid,
            bounds,
            triangle_bounds,
        }
    }

    /// Compute axis-aligned bounding box from positions.
    fn compute_bounds(positions: &[Vec3]) -> Aabb {
        if positions.is_empty() {
            return Aabb::empty();
        }

        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);

        for pos in positions {
            min = min.min(*pos);
            max = max.max(*pos);
        }

        Aabb::from_points(min, max)
    }

    /// Compute one tight box per triangle.
    fn compute_triangle_bounds(positions: &[Vec3], indices: &[u32]) -> Vec<Aabb> {
        indices
            .chunks_exact(3)
            .map(|face| {
                let v0 = positions[face[0] as usize];
                let v1 = positions[face[1] as usize];
                let v2 = positions[face[2] as usize];
                Aabb::from_points(v0.min(v1).min(v2), v0.max(v1).max(v2))
            })
            .collect()
    }

    /// Compute smooth vertex normals by averaging face normals.
    ///
    /// Each vertex normal is the normalized, area-weighted average of the
    /// face normals of the triangles sharing that vertex (counter-clockwise
    /// winding).
    pub fn compute_normals(&mut self) {
        let vertex_count = self.positions.len();
        let mut normals = vec![Vec3::ZERO; vertex_count];

        for face in self.indices.chunks_exact(3) {
            let i0 = face[0] as usize;
            let i1 = face[1] as usize;
            let i2 = face[2] as usize;

            if i0 >= vertex_count || i1 >= vertex_count || i2 >= vertex_count {
                continue;
            }

            let p0 = self.positions[i0];
            let p1 = self.positions[i1];
            let p2 = self.positions[i2];

            let face_normal = (p1 - p0).cross(p2 - p0);

            normals[i0] += face_normal;
            normals[i1] += face_normal;
            normals[i2] += face_normal;
        }

        for normal in &mut normals {
            let len = normal.length();
            if len > 0.0 {
                *normal /= len;
            } else {
                *normal = Vec3::Y;
            }
        }

        self.normals = Some(normals);
    }

    /// Ensure the mesh has normals, computing them if necessary.
    pub fn ensure_normals(&mut self) {
        let should_compute = match &self.normals {
            None => true,
            Some(normals) => normals.len() != self.positions.len(),
        };
        if should_compute {
            self.compute_normals();
        }
    }

    /// Check if the mesh has normals.
    pub fn has_normals(&self) -> bool {
        self.normals.is_some()
    }

    /// Check if the mesh has UV coordinates.
    pub fn has_uvs(&self) -> bool {
        self.uvs.is_some()
    }

    /// Get the number of triangles in the mesh.
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Get the number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// The whole-mesh bounding box.
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// The bounding box of one triangle.
    pub fn triangle_bounds(&self, face: usize) -> &Aabb {
        &self.triangle_bounds[face]
    }

    /// Position of one corner (0..3) of a triangle.
    pub fn position(&self, face: usize, corner: usize) -> Vec3 {
        self.positions[self.indices[face * 3 + corner] as usize]
    }

    /// Normal of one corner of a triangle.
    ///
    /// Falls back to the geometric face normal when the mesh carries no
    /// vertex normals.
    pub fn corner_normal(&self, face: usize, corner: usize) -> Vec3 {
        match &self.normals {
            Some(normals) => normals[self.indices[face * 3 + corner] as usize],
            None => {
                let e1 = self.position(face, 1) - self.position(face, 0);
                let e2 = self.position(face, 2) - self.position(face, 0);
                e1.cross(e2).normalize_or_zero()
            }
        }
    }

    /// UV coordinates of one corner of a triangle, `[0, 0]` when absent.
    pub fn corner_uv(&self, face: usize, corner: usize) -> [f32; 2] {
        match &self.uvs {
            Some(uvs) => uvs[self.indices[face * 3 + corner] as usize],
            None => [0.0, 0.0],
        }
    }

    /// Closed-form ray/triangle intersection against one face.
    ///
    /// On a hit, writes the barycentric weights (x for corner 0, y for
    /// corner 1, z for corner 2) to `bar` and the hit distance to `t`, and
    /// returns true. A hit requires all three weights and `t` to be
    /// non-negative.
    ///
    /// The divisor `s1 . e1` is not guarded against zero: a degenerate
    /// triangle or a ray parallel to the triangle plane yields infinities
    /// or NaNs whose sign checks decide the result.
    pub fn intersect_triangle(&self, face: usize, ray: &Ray, bar: &mut Vec3, t: &mut f32) -> bool {
        let v0 = self.position(face, 0);
        let v1 = self.position(face, 1);
        let v2 = self.position(face, 2);

        let e1 = v1 - v0;
        let e2 = v2 - v0;
        let s = ray.origin - v0;
        let s1 = ray.direction.cross(e2);
        let s2 = s.cross(e1);

        let scale = 1.0 / s1.dot(e1);
        let v = scale * s1.dot(s);
        let w = scale * s2.dot(ray.direction);
        let u = 1.0 - v - w;
        let hit_t = scale * s2.dot(e2);

        if u < 0.0 || v < 0.0 || w < 0.0 || hit_t < 0.0 {
            return false;
        }

        *bar = Vec3::new(u, v, w);
        *t = hit_t;
        true
    }
}
