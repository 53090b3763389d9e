//! Background sampling for rays that escape the scene.

use crate::Color;
use glint_math::Vec3;

/// Samples a background color from a ray direction.
pub trait Skybox: Send + Sync {
    fn sample(&self, direction: Vec3) -> Color;
}

/// A single flat background color.
#[derive(Clone, Debug)]
pub struct SolidSky {
    pub color: Color,
}

impl SolidSky {
    pub fn new(color: Color) -> Self {
        Self { color }
    }

    /// Black background.
    pub fn black() -> Self {
        Self::new(Color::ZERO)
    }
}

impl Skybox for SolidSky {
    fn sample(&self, _direction: Vec3) -> Color {
        self.color
    }
}

/// Vertical gradient between a horizon and a zenith color.
#[derive(Clone, Debug)]
pub struct GradientSky {
    pub horizon: Color,
    pub zenith: Color,
}

impl GradientSky {
    pub fn new(horizon: Color, zenith: Color) -> Self {
        Self { horizon, zenith }
    }
}

impl Default for GradientSky {
    fn default() -> Self {
        Self {
            horizon: Color::new(1.0, 1.0, 1.0),
            zenith: Color::new(0.5, 0.7, 1.0),
        }
    }
}

impl Skybox for GradientSky {
    fn sample(&self, direction: Vec3) -> Color {
        let unit = direction.normalize_or_zero();
        let a = 0.5 * (unit.y + 1.0);
        self.horizon * (1.0 - a) + self.zenith * a
    }
}
