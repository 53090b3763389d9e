// Transform utilities for Mat4
//
// Extends glam::Mat4 with the transforms ray tracing needs beyond
// transform_point3(): direction vectors (w=0) and whole bounding boxes.

use crate::Aabb;
use glam::{Mat4, Vec3, Vec4};

/// Extension trait for Mat4 to provide additional transform utilities
pub trait Mat4Ext {
    /// Transform a vector in 3D space (applies rotation and scale, but NOT
    /// translation). Vectors have an implicit w=0 component. The result is
    /// not renormalized.
    fn transform_vector3(&self, vector: Vec3) -> Vec3;

    /// Transform an axis-aligned bounding box.
    ///
    /// Computes the bounding box of all 8 transformed corners. This is a
    /// conservative bound: for rotated geometry it is looser than an
    /// oriented box would be.
    fn transform_aabb(&self, aabb: &Aabb) -> Aabb;
}

impl Mat4Ext for Mat4 {
    fn transform_vector3(&self, vector: Vec3) -> Vec3 {
        let v4 = Vec4::new(vector.x, vector.y, vector.z, 0.0);
        let transformed = *self * v4;
        Vec3::new(transformed.x, transformed.y, transformed.z)
    }

    fn transform_aabb(&self, aabb: &Aabb) -> Aabb {
        let lo = aabb.min_point();
        let hi = aabb.max_point();

        let corners = [
            Vec3::new(lo.x, lo.y, lo.z),
            Vec3::new(hi.x, lo.y, lo.z),
            Vec3::new(lo.x, hi.y, lo.z),
            Vec3::new(hi.x, hi.y, lo.z),
            Vec3::new(lo.x, lo.y, hi.z),
            Vec3::new(hi.x, lo.y, hi.z),
            Vec3::new(lo.x, hi.y, hi.z),
            Vec3::new(hi.x, hi.y, hi.z),
        ];

        let mut result_min = self.transform_point3(corners[0]);
        let mut result_max = result_min;

        for &corner in &corners[1..] {
            let p = self.transform_point3(corner);
            result_min = result_min.min(p);
            result_max = result_max.max(p);
        }

        Aabb::from_points(result_min, result_max)
    }
}
