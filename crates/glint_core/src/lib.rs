//! Glint Core - mesh geometry for the ray tracer.
//!
//! This crate provides:
//!
//! - **`Mesh`**: triangle-soup geometry with cached whole-mesh and
//!   per-triangle bounding boxes
//! - The closed-form ray/triangle intersection primitive used by the
//!   acceleration structures

pub mod mesh;

pub use mesh::Mesh;
