//! Glint renderer - CPU recursive ray tracing.
//!
//! A Whitted-style ray tracer built on two levels of KD-tree acceleration:
//! a per-mesh tree over triangles ([`Accel`]) and a per-scene tree over
//! objects ([`World`]). Both split by item-count median, so traversal
//! always visits every child whose box is hit.

mod accel;
mod bucket;
mod camera;
mod error;
mod hit;
mod integrator;
mod light;
mod material;
mod object;
mod renderer;
mod skybox;
mod world;

pub use accel::Accel;
pub use bucket::{generate_buckets, render_bucket, Bucket, DEFAULT_BUCKET_SIZE};
pub use camera::Camera;
pub use error::RenderError;
pub use hit::HitRecord;
pub use integrator::{reflect, refract, RayTracer, RenderConfig};
pub use light::PointLight;
pub use material::{Color, Emissive, Glass, Material, Opaque};
pub use object::Object;
pub use renderer::{color_to_rgba, linear_to_gamma, render, ImageBuffer};
pub use skybox::{GradientSky, Skybox, SolidSky};
pub use world::World;

/// Re-export Vec3 and common math types from glint_math
pub use glint_math::{Aabb, Interval, Ray, Vec3};
