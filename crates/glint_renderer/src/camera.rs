//! Camera for primary ray generation.

use glint_math::{Ray, Vec3};

/// Pinhole camera generating one deterministic ray through the center of
/// each pixel.
#[derive(Clone, Debug)]
pub struct Camera {
    // Image settings
    pub image_width: u32,
    pub image_height: u32,

    // Camera positioning
    look_from: Vec3,
    look_at: Vec3,
    vup: Vec3,

    /// Vertical field of view in degrees
    vfov: f32,

    // Cached computed values (set by initialize())
    center: Vec3,
    pixel00_loc: Vec3,
    pixel_delta_u: Vec3,
    pixel_delta_v: Vec3,
}

impl Camera {
    /// Create a new camera with default settings.
    pub fn new() -> Self {
        Self {
            image_width: 800,
            image_height: 450,
            look_from: Vec3::ZERO,
            look_at: Vec3::new(0.0, 0.0, -1.0),
            vup: Vec3::Y,
            vfov: 90.0,
            center: Vec3::ZERO,
            pixel00_loc: Vec3::ZERO,
            pixel_delta_u: Vec3::ZERO,
            pixel_delta_v: Vec3::ZERO,
        }
    }

    /// Set image resolution.
    pub fn with_resolution(mut self, width: u32, height: u32) -> Self {
        self.image_width = width;
        self.image_height = height;
        self
    }

    /// Set camera position.
    pub fn with_position(mut self, look_from: Vec3, look_at: Vec3, vup: Vec3) -> Self {
        self.look_from = look_from;
        self.look_at = look_at;
        self.vup = vup;
        self
    }

    /// Set the vertical field of view in degrees.
    pub fn with_vfov(mut self, vfov: f32) -> Self {
        self.vfov = vfov;
        self
    }

    /// Initialize the camera (must be called before generating rays).
    pub fn initialize(&mut self) {
        self.center = self.look_from;

        // Viewport dimensions at unit distance
        let theta = self.vfov.to_radians();
        let h = (theta / 2.0).tan();
        let viewport_height = 2.0 * h;
        let viewport_width = viewport_height * (self.image_width as f32 / self.image_height as f32);

        // Camera basis vectors
        let w = (self.look_from - self.look_at).normalize();
        let u = self.vup.cross(w).normalize();
        let v = w.cross(u);

        // Viewport and pixel step vectors
        let viewport_u = viewport_width * u;
        let viewport_v = -viewport_height * v;
        self.pixel_delta_u = viewport_u / self.image_width as f32;
        self.pixel_delta_v = viewport_v / self.image_height as f32;

        let viewport_upper_left = self.center - w - viewport_u / 2.0 - viewport_v / 2.0;
        self.pixel00_loc = viewport_upper_left + 0.5 * (self.pixel_delta_u + self.pixel_delta_v);
    }

    /// Generate the ray through the center of pixel (i, j).
    pub fn get_ray(&self, i: u32, j: u32) -> Ray {
        let pixel = self.pixel00_loc
            + (i as f32) * self.pixel_delta_u
            + (j as f32) * self.pixel_delta_v;
        Ray::new(self.center, pixel - self.center)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_camera_center_ray_points_forward() {
        let mut camera = Camera::new()
            .with_resolution(101, 101)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_vfov(90.0);
        camera.initialize();

        // The center pixel's ray runs straight down the view axis
        let ray = camera.get_ray(50, 50);
        let dir = ray.direction.normalize();
        assert!((dir - Vec3::new(0.0, 0.0, -1.0)).length() < 0.001);
    }

    #[test]
    fn test_camera_rays_are_deterministic() {
        let mut camera = Camera::new().with_resolution(64, 64);
        camera.initialize();

        assert_eq!(camera.get_ray(10, 20), camera.get_ray(10, 20));
    }

    #[test]
    fn test_camera_image_orientation() {
        let mut camera = Camera::new()
            .with_resolution(100, 100)
            .with_position(Vec3::ZERO, Vec3::new(0.0, 0.0, -1.0), Vec3::Y)
            .with_vfov(90.0);
        camera.initialize();

        // Pixel row 0 is the top of the image, so its rays aim upward
        let top = camera.get_ray(50, 0);
        let bottom = camera.get_ray(50, 99);
        assert!(top.direction.y > 0.0);
        assert!(bottom.direction.y < 0.0);
    }
}
