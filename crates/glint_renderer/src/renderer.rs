//! Frame rendering: buckets fanned out over rayon, gamma conversion, and
//! PNG output.

use rayon::prelude::*;

use crate::bucket::{generate_buckets, render_bucket, DEFAULT_BUCKET_SIZE};
use crate::{Camera, Color, RayTracer, RenderError};

/// Apply gamma correction (gamma = 2.0).
#[inline]
pub fn linear_to_gamma(linear: f32) -> f32 {
    if linear > 0.0 {
        linear.sqrt()
    } else {
        0.0
    }
}

/// Convert a linear color to 8-bit RGBA, clamping to the displayable range.
pub fn color_to_rgba(color: Color) -> [u8; 4] {
    let r = (255.0 * linear_to_gamma(color.x).clamp(0.0, 1.0)) as u8;
    let g = (255.0 * linear_to_gamma(color.y).clamp(0.0, 1.0)) as u8;
    let b = (255.0 * linear_to_gamma(color.z).clamp(0.0, 1.0)) as u8;
    [r, g, b, 255]
}

/// Simple image buffer for storing render output.
pub struct ImageBuffer {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<Color>,
}

impl ImageBuffer {
    /// Create a new image buffer filled with black.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Color::ZERO; (width * height) as usize],
        }
    }

    /// Get the pixel at (x, y).
    pub fn get(&self, x: u32, y: u32) -> Color {
        self.pixels[(y * self.width + x) as usize]
    }

    /// Set the pixel at (x, y).
    pub fn set(&mut self, x: u32, y: u32, color: Color) {
        self.pixels[(y * self.width + x) as usize] = color;
    }

    /// Convert to RGBA bytes (for display or saving).
    pub fn to_rgba(&self) -> Vec<u8> {
        let mut bytes = Vec::with_capacity((self.width * self.height * 4) as usize);
        for color in &self.pixels {
            bytes.extend_from_slice(&color_to_rgba(*color));
        }
        bytes
    }

    /// Encode the buffer as a PNG file.
    pub fn save_png(&self, path: &str) -> Result<(), RenderError> {
        let rgba = image::RgbaImage::from_raw(self.width, self.height, self.to_rgba()).ok_or(
            RenderError::InvalidDimensions {
                width: self.width,
                height: self.height,
            },
        )?;
        rgba.save(path)?;
        Ok(())
    }
}

/// Render the full frame.
///
/// The image is cut into spiral-ordered buckets which render in parallel;
/// each bucket only reads the tracer's frozen world and writes its own
/// pixels, so no synchronization is needed beyond the final assembly.
pub fn render(camera: &Camera, tracer: &RayTracer) -> ImageBuffer {
    let buckets = generate_buckets(camera.image_width, camera.image_height, DEFAULT_BUCKET_SIZE);
    log::debug!(
        "rendering {}x{} in {} buckets",
        camera.image_width,
        camera.image_height,
        buckets.len()
    );

    let results: Vec<(crate::Bucket, Vec<Color>)> = buckets
        .par_iter()
        .map(|bucket| (*bucket, render_bucket(bucket, camera, tracer)))
        .collect();

    let mut image = ImageBuffer::new(camera.image_width, camera.image_height);
    for (bucket, pixels) in results {
        for local_y in 0..bucket.height {
            for local_x in 0..bucket.width {
                let color = pixels[(local_y * bucket.width + local_x) as usize];
                image.set(bucket.x + local_x, bucket.y + local_y, color);
            }
        }
    }

    image
}
