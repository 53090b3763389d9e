//! Scene lights.

use crate::Color;
use glint_math::Vec3;

/// A point light with quadratic falloff out to a zero-point range.
#[derive(Clone, Debug)]
pub struct PointLight {
    /// World-space position
    pub position: Vec3,
    /// Light color
    pub color: Color,
    /// Intensity scale at zero distance
    pub intensity: f32,
    /// Distance at which the contribution reaches zero
    pub range: f32,
}

impl PointLight {
    pub fn new(position: Vec3, color: Color, intensity: f32, range: f32) -> Self {
        Self {
            position,
            color,
            intensity,
            range,
        }
    }

    /// Radiance arriving at a point `distance` away.
    pub fn radiance(&self, distance: f32) -> Color {
        if distance > self.range {
            return Color::ZERO;
        }
        let t = distance / self.range;
        (self.intensity * self.color).lerp(Color::ZERO, t * t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_radiance_falloff() {
        let light = PointLight::new(Vec3::ZERO, Color::ONE, 4.0, 10.0);

        assert_eq!(light.radiance(0.0), Color::splat(4.0));
        assert_eq!(light.radiance(10.0), Color::ZERO);
        assert_eq!(light.radiance(25.0), Color::ZERO);

        let near = light.radiance(2.0);
        let far = light.radiance(8.0);
        assert!(near.x > far.x);
        assert!(far.x > 0.0);
    }
}
