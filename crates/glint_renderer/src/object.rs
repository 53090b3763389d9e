//! Scene object: a mesh instance with a transform and a material.

use std::sync::Arc;

use crate::{Accel, HitRecord, Material, Opaque};
use glint_core::Mesh;
use glint_math::{Aabb, Mat4, Mat4Ext, Quat, Ray, Vec3};

/// A renderable object: shared mesh + pre-built acceleration tree + model
/// transform + material.
///
/// The object never builds or tears down the mesh/tree it references; both
/// are shared handles constructed elsewhere. Its job is adapting spaces:
/// world-space query rays are taken into mesh-local space, hits are brought
/// back out.
pub struct Object {
    mesh: Arc<Mesh>,
    accel: Arc<Accel>,
    material: Arc<dyn Material>,

    translation: Vec3,
    rotation: Quat,
    scale: Vec3,

    /// Local-to-world model matrix (translate * rotate * scale)
    matrix: Mat4,
    /// Cached inverse, recomputed with the transform
    inverse: Mat4,
    /// Inverse-transpose, for taking normals to world space
    normal_matrix: Mat4,
    /// World-space bounding box of the transformed mesh
    bounds: Aabb,
}

impl Object {
    /// Create an object at the given transform.
    pub fn new(
        mesh: Arc<Mesh>,
        accel: Arc<Accel>,
        material: Arc<dyn Material>,
        translation: Vec3,
        rotation: Quat,
        scale: Vec3,
    ) -> Self {
        let mut object = Self {
            mesh,
            accel,
            material,
            translation,
            rotation,
            scale,
            matrix: Mat4::IDENTITY,
            inverse: Mat4::IDENTITY,
            normal_matrix: Mat4::IDENTITY,
            bounds: Aabb::EMPTY,
        };
        object.set_transform(translation, rotation, scale);
        object
    }

    /// Replace the transform and refresh every cached derivative: model
    /// matrix, inverse, normal matrix and the world-space bounding box
    /// (axis-aligned hull of the 8 transformed local box corners; looser
    /// than an oriented box, accepted).
    pub fn set_transform(&mut self, translation: Vec3, rotation: Quat, scale: Vec3) {
        self.translation = translation;
        self.rotation = rotation;
        self.scale = scale;

        self.matrix = Mat4::from_scale_rotation_translation(scale, rotation, translation);
        self.inverse = self.matrix.inverse();
        self.normal_matrix = self.inverse.transpose();
        self.bounds = self.matrix.transform_aabb(self.mesh.bounds());
    }

    /// Intersect a world-space ray against this object.
    ///
    /// The ray is transformed into mesh-local space with the cached
    /// inverse; the direction goes through as a vector (w = 0) and is not
    /// renormalized, so the `t` reported by the local tree is already a
    /// valid distance along the original world-space ray. On a hit the
    /// local point is mapped back through the model matrix and the original
    /// ray is attached to the record.
    pub fn hit(&self, ray: &Ray, rec: &mut HitRecord, shadow: bool) -> bool {
        let local_ray = Ray::new(
            self.inverse.transform_point3(ray.origin),
            self.inverse.transform_vector3(ray.direction),
        );

        if self.accel.hit(&local_ray, rec, shadow) {
            if shadow {
                return true;
            }
            rec.point = self.matrix.transform_point3(rec.point);
            rec.ray = *ray;
            true
        } else {
            false
        }
    }

    /// Take a mesh-local normal to world space (inverse-transpose transform,
    /// normalized).
    pub fn normal_to_world(&self, normal: Vec3) -> Vec3 {
        self.normal_matrix.transform_vector3(normal).normalize_or_zero()
    }

    /// World-space bounding box.
    pub fn bounding_box(&self) -> &Aabb {
        &self.bounds
    }

    pub fn mesh(&self) -> &Arc<Mesh> {
        &self.mesh
    }

    pub fn material(&self) -> &Arc<dyn Material> {
        &self.material
    }
}

impl Default for Object {
    /// An object around an empty mesh. Every query misses; used as the
    /// world's fallback for out-of-range lookups.
    fn default() -> Self {
        let mesh = Arc::new(Mesh::new(vec![], vec![], None));
        let accel = Arc::new(Accel::build_for(mesh.clone()));
        Self::new(
            mesh,
            accel,
            Arc::new(Opaque::default()),
            Vec3::ZERO,
            Quat::IDENTITY,
            Vec3::ONE,
        )
    }
}
