//! Hit record shared by every intersection query level.

use glint_math::{Ray, Vec3};

/// Record of a ray intersection.
///
/// The triangle tree fills `t`, `barycentric` and `tri`; the object layer
/// resolves `point` into world space and stamps `object`; the originating
/// ray travels along so shading can recover the incident direction.
#[derive(Debug, Clone, Copy)]
pub struct HitRecord {
    /// Hit distance along the query ray's direction
    pub t: f32,
    /// Barycentric weights of the hit (x for corner 0, y for 1, z for 2)
    pub barycentric: Vec3,
    /// Index of the hit triangle within its mesh
    pub tri: u32,
    /// Index of the hit object within the world
    pub object: usize,
    /// Resolved hit point
    pub point: Vec3,
    /// The originating ray
    pub ray: Ray,
}

impl Default for HitRecord {
    fn default() -> Self {
        Self {
            t: f32::INFINITY,
            barycentric: Vec3::ZERO,
            tri: 0,
            object: 0,
            point: Vec3::ZERO,
            ray: Ray::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_a_miss_distance() {
        let rec = HitRecord::default();
        assert_eq!(rec.t, f32::INFINITY);
    }
}
