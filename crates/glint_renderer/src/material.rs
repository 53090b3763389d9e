//! Material trait and the BRDF evaluators shipped with the renderer.

use glint_math::{Vec3, Vec4};

/// Color type alias (RGB values typically 0-1)
pub type Color = Vec3;

/// How a surface responds to light.
///
/// All directions point away from the shaded point. The integrator consults
/// `reflectance` for the mirror-branch weight and `ior` for the refraction
/// branch; `None` means the material is opaque.
pub trait Material: Send + Sync {
    /// Evaluate the BRDF for light arriving along `wi` and leaving along
    /// `wo` at a surface with normal `n`.
    fn brdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color;

    /// Light emitted toward `wo` from `distance` away. Most materials emit
    /// nothing.
    fn emission(&self, _wo: Vec3, _distance: f32) -> Color {
        Color::ZERO
    }

    /// Weight of the mirror-reflected contribution.
    fn reflectance(&self) -> f32 {
        0.0
    }

    /// Index of refraction, or `None` for opaque materials.
    fn ior(&self) -> Option<f32> {
        None
    }
}

/// f0 of a dielectric at normal incidence; w holds 1 - 0.04 for the
/// diffuse-energy split.
const DIELECTRIC_SPEC: Vec4 = Vec4::new(0.04, 0.04, 0.04, 1.0 - 0.04);

/// Opaque microfacet material: GGX distribution, Schlick Fresnel,
/// Cook-Torrance geometry term and Disney diffuse, parameterized by
/// metallic/smoothness.
#[derive(Clone, Debug)]
pub struct Opaque {
    albedo: Color,
    metallic: f32,
    smoothness: f32,
    roughness: f32,
}

impl Opaque {
    /// Create an opaque material.
    ///
    /// - `albedo`: base color; specular and diffuse split depends on `metallic`
    /// - `metallic`: 0 = dielectric, 1 = metal
    /// - `smoothness`: 0 = rough, 1 = polished
    pub fn new(albedo: Color, metallic: f32, smoothness: f32) -> Self {
        Self {
            albedo,
            metallic: metallic.clamp(0.0, 1.0),
            smoothness: smoothness.clamp(0.0, 1.0),
            roughness: (1.0 - smoothness).powi(2),
        }
    }

    fn schlick_f(f0: Vec3, n_dot_v: f32) -> Vec3 {
        f0 + (Vec3::ONE - f0) * (1.0 - n_dot_v).powi(5)
    }

    fn ggx_d(roughness: f32, n_dot_h: f32) -> f32 {
        let a2 = roughness * roughness;
        let d = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
        a2 / (std::f32::consts::PI * (d * d + 1e-7))
    }

    fn cook_torrance_g(n_dot_l: f32, n_dot_v: f32, v_dot_h: f32, n_dot_h: f32) -> f32 {
        let g1 = 2.0 * n_dot_h * n_dot_v / v_dot_h;
        let g2 = 2.0 * n_dot_h * n_dot_l / v_dot_h;
        g1.min(g2).min(1.0)
    }

    fn disney_diffuse(n_dot_v: f32, n_dot_l: f32, l_dot_h: f32, perceptual_roughness: f32) -> f32 {
        let fd90 = 0.5 + 2.0 * l_dot_h * l_dot_h * perceptual_roughness;
        let light_scatter = 1.0 + (fd90 - 1.0) * (1.0 - n_dot_l).powi(5);
        let view_scatter = 1.0 + (fd90 - 1.0) * (1.0 - n_dot_v).powi(5);
        light_scatter * view_scatter
    }
}

impl Default for Opaque {
    fn default() -> Self {
        Self::new(Color::new(0.5, 0.5, 0.5), 0.0, 0.5)
    }
}

impl Material for Opaque {
    fn brdf(&self, wi: Vec3, wo: Vec3, n: Vec3) -> Color {
        let half_dir = (wi + wo).normalize_or_zero();
        let n_dot_l = n.dot(wi).clamp(0.0, 1.0);
        let n_dot_h = n.dot(half_dir).clamp(0.0, 1.0);
        let n_dot_v = n.dot(wo).clamp(0.0, 1.0);
        let v_dot_h = wo.dot(half_dir).clamp(0.0, 1.0);
        let l_dot_h = wi.dot(half_dir).clamp(0.0, 1.0);

        // Split albedo into specular and diffuse response by metalness
        let spec_color = DIELECTRIC_SPEC.truncate().lerp(self.albedo, self.metallic);
        let one_minus_reflectivity = DIELECTRIC_SPEC.w * (1.0 - self.metallic);
        let diff_color = one_minus_reflectivity * self.albedo;

        let diff = diff_color
            * Self::disney_diffuse(n_dot_v, n_dot_l, l_dot_h, 1.0 - self.smoothness);
        let d = Self::ggx_d(self.roughness, n_dot_h);
        let f = Self::schlick_f(spec_color, n_dot_v);
        let g = Self::cook_torrance_g(n_dot_l, n_dot_v, v_dot_h, n_dot_h);
        let spec = d * g * std::f32::consts::PI / (4.0 * n_dot_l * n_dot_v + 1e-7) * f;

        diff + spec
    }

    fn reflectance(&self) -> f32 {
        // Polished metals mirror their surroundings; rough dielectrics don't.
        self.smoothness * (0.04 + 0.96 * self.metallic)
    }
}

/// Light-emitting surface with quadratic falloff out to a zero-point range.
#[derive(Clone, Debug)]
pub struct Emissive {
    color: Color,
    intensity: f32,
    range: f32,
}

impl Emissive {
    pub fn new(color: Color, intensity: f32, range: f32) -> Self {
        Self {
            color,
            intensity,
            range,
        }
    }
}

impl Material for Emissive {
    fn brdf(&self, _wi: Vec3, _wo: Vec3, _n: Vec3) -> Color {
        Color::ZERO
    }

    fn emission(&self, _wo: Vec3, distance: f32) -> Color {
        if distance > self.range {
            return Color::ZERO;
        }
        let t = distance / self.range;
        (self.intensity * self.color).lerp(Color::ZERO, t * t)
    }
}

/// Transparent dielectric with an index of refraction.
#[derive(Clone, Debug)]
pub struct Glass {
    ior: f32,
    reflectance: f32,
}

impl Glass {
    /// - `ior`: index of refraction (1.5 = glass, 2.4 = diamond)
    /// - `reflectance`: fixed mirror weight; the remainder refracts
    pub fn new(ior: f32, reflectance: f32) -> Self {
        Self {
            ior,
            reflectance: reflectance.clamp(0.0, 1.0),
        }
    }
}

impl Material for Glass {
    fn brdf(&self, _wi: Vec3, _wo: Vec3, _n: Vec3) -> Color {
        Color::ZERO
    }

    fn reflectance(&self) -> f32 {
        self.reflectance
    }

    fn ior(&self) -> Option<f32> {
        Some(self.ior)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opaque_brdf_is_nonnegative() {
        let mat = Opaque::new(Color::new(0.8, 0.2, 0.2), 0.0, 0.7);
        let n = Vec3::Z;
        let wi = Vec3::new(0.3, 0.2, 0.9).normalize();
        let wo = Vec3::new(-0.4, 0.1, 0.9).normalize();

        let f = mat.brdf(wi, wo, n);
        assert!(f.x >= 0.0 && f.y >= 0.0 && f.z >= 0.0);
        assert!(f.is_finite());
    }

    #[test]
    fn test_opaque_metal_reflects_more_than_rough_dielectric() {
        let metal = Opaque::new(Color::ONE, 1.0, 1.0);
        let clay = Opaque::new(Color::ONE, 0.0, 0.1);
        assert!(metal.reflectance() > clay.reflectance());
    }

    #[test]
    fn test_emissive_falloff() {
        let light = Emissive::new(Color::ONE, 2.0, 5.0);
        let wo = Vec3::Z;

        // Full strength at the source, zero at and beyond the range
        assert_eq!(light.emission(wo, 0.0), Color::splat(2.0));
        assert_eq!(light.emission(wo, 6.0), Color::ZERO);

        // Monotone in between
        let near = light.emission(wo, 1.0);
        let far = light.emission(wo, 4.0);
        assert!(near.x > far.x);
    }

    #[test]
    fn test_glass_is_refractive() {
        let glass = Glass::new(1.5, 0.1);
        assert_eq!(glass.ior(), Some(1.5));
        assert_eq!(glass.brdf(Vec3::Z, Vec3::Z, Vec3::Z), Color::ZERO);

        let opaque = Opaque::default();
        assert_eq!(opaque.ior(), None);
    }
}
