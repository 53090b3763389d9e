//! Recursive Whitted-style ray tracer.
//!
//! One deterministic primary ray per query; reflection, refraction and
//! binary shadow visibility recurse against the world's acceleration trees.

use crate::{Color, HitRecord, Skybox, World};
use glint_math::{Ray, Vec3};

/// Offset applied along the surface normal when spawning secondary rays,
/// keeping them from immediately re-hitting their own surface.
const RAY_OFFSET: f32 = 1e-3;

/// Integrator settings.
#[derive(Debug, Clone)]
pub struct RenderConfig {
    /// Maximum recursion depth for reflection/refraction rays
    pub max_depth: u32,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self { max_depth: 4 }
    }
}

/// Per-frame tracing context: the frozen world, the sky and the settings,
/// all borrowed immutably so any number of pixels can trace concurrently.
pub struct RayTracer<'a> {
    world: &'a World,
    sky: &'a dyn Skybox,
    config: &'a RenderConfig,
}

impl<'a> RayTracer<'a> {
    pub fn new(world: &'a World, sky: &'a dyn Skybox, config: &'a RenderConfig) -> Self {
        Self { world, sky, config }
    }

    /// Radiance arriving along `ray`. `depth` counts the recursion level of
    /// this ray, starting at 0 for primary rays.
    pub fn trace(&self, ray: &Ray, depth: u32) -> Color {
        if depth > self.config.max_depth {
            return self.sky.sample(ray.direction);
        }

        let mut rec = HitRecord::default();
        if !self.world.hit(ray, &mut rec, false) {
            return self.sky.sample(ray.direction);
        }

        let object = self.world.object(rec.object);
        let mesh = object.mesh();
        let face = rec.tri as usize;
        let bar = rec.barycentric;

        // Interpolate shading inputs from the triangle corners
        let local_normal = bar.x * mesh.corner_normal(face, 0)
            + bar.y * mesh.corner_normal(face, 1)
            + bar.z * mesh.corner_normal(face, 2);
        let normal = object.normal_to_world(local_normal);
        let point = rec.point;

        let material = object.material();
        let incident = ray.direction.normalize_or_zero();
        let wo = -incident;

        let mut color = material.emission(wo, rec.t);

        // Mirror reflection
        let kr = material.reflectance();
        if kr > 0.0 {
            let reflected = reflect(incident, normal);
            let origin = offset_origin(point, normal, reflected);
            color += kr * self.trace(&Ray::new(origin, reflected), depth + 1);
        }

        // Refraction; `refract` returns None on total internal reflection
        // and the transmitted branch is simply skipped then
        if let Some(ior) = material.ior() {
            if let Some(transmitted) = refract(incident, normal, ior) {
                let origin = offset_origin(point, normal, transmitted);
                color += (1.0 - kr) * self.trace(&Ray::new(origin, transmitted), depth + 1);
            }
        }

        // Direct lighting with binary shadow visibility
        for light in self.world.lights() {
            let to_light = light.position - point;
            let distance = to_light.length();
            if distance <= 0.0 {
                continue;
            }
            let wi = to_light / distance;

            let n_dot_l = normal.dot(wi);
            if n_dot_l <= 0.0 {
                continue;
            }

            let shadow_origin = offset_origin(point, normal, wi);
            let mut shadow_rec = HitRecord::default();
            if self.world.hit(&Ray::new(shadow_origin, wi), &mut shadow_rec, true) {
                continue;
            }

            color += material.brdf(wi, wo, normal) * light.radiance(distance) * n_dot_l;
        }

        color
    }
}

/// Mirror `v` about the unit normal `n`.
pub fn reflect(v: Vec3, n: Vec3) -> Vec3 {
    v - 2.0 * v.dot(n) * n
}

/// Refract a unit incident direction through a surface with unit normal `n`
/// and material index of refraction `ior`, via Snell's law.
///
/// Whether the ray enters or exits is decided by the sign of
/// `incident . n`; on exit the ratio swaps and the normal flips. Returns
/// `None` when the discriminant is negative (total internal reflection) --
/// callers must check before spawning the transmitted ray.
pub fn refract(incident: Vec3, n: Vec3, ior: f32) -> Option<Vec3> {
    let mut normal = n;
    let mut eta = 1.0 / ior;
    let mut cos_i = -incident.dot(normal);

    if cos_i < 0.0 {
        // Exiting the surface
        cos_i = -cos_i;
        normal = -normal;
        eta = ior;
    }

    let k = 1.0 - eta * eta * (1.0 - cos_i * cos_i);
    if k < 0.0 {
        return None;
    }
    Some(eta * incident + (eta * cos_i - k.sqrt()) * normal)
}

/// Nudge a secondary-ray origin off the surface, on whichever side of the
/// surface the new direction continues to.
fn offset_origin(point: Vec3, normal: Vec3, direction: Vec3) -> Vec3 {
    if direction.dot(normal) >= 0.0 {
        point + RAY_OFFSET * normal
    } else {
        point - RAY_OFFSET * normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Accel, Emissive, Object, Opaque, PointLight, SolidSky};
    use glint_core::Mesh;
    use glint_math::Quat;
    use std::sync::Arc;

    #[test]
    fn test_reflect_head_on() {
        let reflected = reflect(Vec3::new(0.0, 0.0, -1.0), Vec3::new(0.0, 0.0, 1.0));
        assert!((reflected - Vec3::new(0.0, 0.0, 1.0)).length() < 1e-6);
    }

    #[test]
    fn test_reflect_grazing() {
        let v = Vec3::new(1.0, -1.0, 0.0).normalize();
        let reflected = reflect(v, Vec3::Y);
        assert!((reflected - Vec3::new(1.0, 1.0, 0.0).normalize()).length() < 1e-6);
    }

    #[test]
    fn test_refract_parallel_to_normal_is_undeviated() {
        let incident = Vec3::new(0.0, 0.0, -1.0);
        let normal = Vec3::new(0.0, 0.0, 1.0);

        for ior in [1.0, 1.33, 1.5, 2.4] {
            let refracted = refract(incident, normal, ior).unwrap();
            assert!(
                (refracted - incident).length() < 1e-6,
                "ior {} deviated: {:?}",
                ior,
                refracted
            );
        }
    }

    #[test]
    fn test_refract_bends_toward_normal_on_entry() {
        let incident = Vec3::new(1.0, 0.0, -1.0).normalize();
        let normal = Vec3::Z;

        let refracted = refract(incident, normal, 1.5).unwrap();
        // Entering a denser medium: the transmitted ray makes a smaller
        // angle with the (negated) normal than the incident one did
        let cos_in = (-incident.z).abs();
        let cos_out = (-refracted.normalize().z).abs();
        assert!(cos_out > cos_in);
    }

    #[test]
    fn test_refract_total_internal_reflection() {
        // Exiting glass at a grazing angle: beyond the critical angle the
        // discriminant goes negative and the sentinel comes back
        let incident = Vec3::new(0.9, 0.0, -0.2).normalize();
        let normal = Vec3::Z; // incident . normal < 0 would be entering...
        let exiting = -incident; // flip so dot(incident, normal) > 0: exiting
        assert!(refract(exiting, normal, 1.5).is_none());
    }

    #[test]
    fn test_offset_origin_side() {
        let p = Vec3::ZERO;
        let n = Vec3::Z;

        let up = offset_origin(p, n, Vec3::new(0.3, 0.0, 0.8));
        assert!(up.z > 0.0);

        let down = offset_origin(p, n, Vec3::new(0.3, 0.0, -0.8));
        assert!(down.z < 0.0);
    }

    fn quad_mesh() -> Arc<Mesh> {
        let mut mesh = Mesh::new(
            vec![
                Vec3::new(-5.0, -5.0, 0.0),
                Vec3::new(5.0, -5.0, 0.0),
                Vec3::new(5.0, 5.0, 0.0),
                Vec3::new(-5.0, 5.0, 0.0),
            ],
            vec![0, 1, 2, 0, 2, 3],
            None,
        );
        mesh.compute_normals();
        Arc::new(mesh)
    }

    fn quad_object(translation: Vec3, material: Arc<dyn crate::Material>) -> Object {
        let mesh = quad_mesh();
        let accel = Arc::new(Accel::build_for(mesh.clone()));
        Object::new(mesh, accel, material, translation, Quat::IDENTITY, Vec3::ONE)
    }

    #[test]
    fn test_miss_returns_sky() {
        let mut world = World::new();
        world.build();
        let sky = SolidSky::new(Color::new(0.1, 0.2, 0.3));
        let config = RenderConfig::default();
        let tracer = RayTracer::new(&world, &sky, &config);

        let color = tracer.trace(&Ray::new(Vec3::ZERO, Vec3::Y), 0);
        assert_eq!(color, Color::new(0.1, 0.2, 0.3));
    }

    #[test]
    fn test_depth_cutoff_returns_sky() {
        let mut world = World::new();
        world.add_object(quad_object(Vec3::ZERO, Arc::new(Opaque::default())));
        world.build();
        let sky = SolidSky::new(Color::new(0.9, 0.9, 0.9));
        let config = RenderConfig { max_depth: 3 };
        let tracer = RayTracer::new(&world, &sky, &config);

        // Past the depth limit even a hitting ray returns the sky
        let ray = Ray::new(Vec3::new(0.0, 0.0, 2.0), Vec3::new(0.0, 0.0, -1.0));
        let color = tracer.trace(&ray, 4);
        assert_eq!(color, Color::new(0.9, 0.9, 0.9));
    }

    #[test]
    fn test_lit_surface_receives_light() {
        let mut world = World::new();
        world.add_object(quad_object(Vec3::ZERO, Arc::new(Opaque::default())));
        world.add_light(PointLight::new(
            Vec3::new(0.0, 0.0, 2.0),
            Color::ONE,
            2.0,
            20.0,
        ));
        world.build();

        let sky = SolidSky::black();
        let config = RenderConfig::default();
        let tracer = RayTracer::new(&world, &sky, &config);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 3.0), Vec3::new(0.0, 0.0, -1.0));
        let color = tracer.trace(&ray, 0);
        assert!(color.length() > 0.0, "lit surface came back black");
    }

    #[test]
    fn test_occluded_light_contributes_nothing() {
        // Floor at z=0, blocker at z=1, light at z=2: a floor point under
        // the blocker only sees the light through it, so its shadow ray
        // must report occlusion and the direct term must vanish. Fully
        // matte material keeps the mirror branch out of the picture.
        let matte: Arc<dyn crate::Material> = Arc::new(Opaque::new(Color::splat(0.8), 0.0, 0.0));
        let mut world = World::new();
        world.add_object(quad_object(Vec3::ZERO, matte.clone()));
        world.add_object(quad_object(Vec3::new(0.0, 0.0, 1.0), matte.clone()));
        world.add_light(PointLight::new(
            Vec3::new(0.0, 0.0, 2.0),
            Color::ONE,
            5.0,
            50.0,
        ));
        world.build();

        let sky = SolidSky::black();
        let config = RenderConfig::default();
        let tracer = RayTracer::new(&world, &sky, &config);

        // Primary ray starts between floor and blocker, straight down
        let shadowed_ray = Ray::new(Vec3::new(0.0, 0.0, 0.5), Vec3::new(0.0, 0.0, -1.0));
        let color = tracer.trace(&shadowed_ray, 0);
        assert_eq!(color, Color::ZERO, "shadowed point must be black");

        // Removing the blocker lets the same point light up
        let mut open_world = World::new();
        open_world.add_object(quad_object(Vec3::ZERO, matte));
        open_world.add_light(PointLight::new(
            Vec3::new(0.0, 0.0, 2.0),
            Color::ONE,
            5.0,
            50.0,
        ));
        open_world.build();
        let tracer = RayTracer::new(&open_world, &sky, &config);
        let color = tracer.trace(&shadowed_ray, 0);
        assert!(color.length() > 0.0);
    }

    #[test]
    fn test_emissive_surface_glows_without_lights() {
        let mut world = World::new();
        world.add_object(quad_object(
            Vec3::ZERO,
            Arc::new(Emissive::new(Color::new(1.0, 0.5, 0.25), 3.0, 100.0)),
        ));
        world.build();

        let sky = SolidSky::black();
        let config = RenderConfig::default();
        let tracer = RayTracer::new(&world, &sky, &config);

        let ray = Ray::new(Vec3::new(0.0, 0.0, 1.0), Vec3::new(0.0, 0.0, -1.0));
        let color = tracer.trace(&ray, 0);
        assert!(color.x > color.y && color.y > color.z);
        assert!(color.x > 0.0);
    }
}
