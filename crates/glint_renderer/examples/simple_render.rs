//! Simple ray tracing example.
//!
//! Renders a small scene (floor, cube, glass panel, one light) and saves a
//! PNG. Run with RUST_LOG=debug to see tree build diagnostics.

use std::sync::Arc;

use anyhow::Result;
use glint_core::Mesh;
use glint_math::{Quat, Vec3};
use glint_renderer::{
    render, Accel, Camera, Color, Glass, GradientSky, Material, Object, Opaque, PointLight,
    RayTracer, RenderConfig, World,
};

fn main() -> Result<()> {
    env_logger::init();

    let start = std::time::Instant::now();
    let world = build_scene();
    println!("Scene built in {:?}", start.elapsed());

    let mut camera = Camera::new()
        .with_resolution(800, 450)
        .with_position(
            Vec3::new(4.0, 3.0, 6.0),
            Vec3::new(0.0, 0.5, 0.0),
            Vec3::Y,
        )
        .with_vfov(40.0);
    camera.initialize();

    let sky = GradientSky::default();
    let config = RenderConfig { max_depth: 6 };
    let tracer = RayTracer::new(&world, &sky, &config);

    println!("Rendering {}x{}...", camera.image_width, camera.image_height);
    let start = std::time::Instant::now();
    let image = render(&camera, &tracer);
    println!("Rendered in {:?}", start.elapsed());

    let filename = "output.png";
    image.save_png(filename)?;
    println!("Saved to {}", filename);
    Ok(())
}

fn build_scene() -> World {
    let mut world = World::new();

    let floor = plane_mesh(20.0);
    world.add_object(make_object(
        floor,
        Arc::new(Opaque::new(Color::new(0.6, 0.6, 0.6), 0.0, 0.2)),
        Vec3::ZERO,
        Quat::IDENTITY,
        Vec3::ONE,
    ));

    let cube = cube_mesh();
    world.add_object(make_object(
        cube.clone(),
        Arc::new(Opaque::new(Color::new(0.8, 0.3, 0.2), 0.1, 0.6)),
        Vec3::new(-1.2, 0.5, 0.0),
        Quat::from_rotation_y(0.5),
        Vec3::ONE,
    ));
    world.add_object(make_object(
        cube.clone(),
        Arc::new(Opaque::new(Color::new(0.9, 0.8, 0.3), 1.0, 0.9)),
        Vec3::new(1.4, 0.4, -0.6),
        Quat::from_rotation_y(-0.3),
        Vec3::splat(0.8),
    ));
    world.add_object(make_object(
        cube,
        Arc::new(Glass::new(1.5, 0.1)),
        Vec3::new(0.2, 0.6, 1.5),
        Quat::IDENTITY,
        Vec3::new(1.2, 1.2, 0.1),
    ));

    world.add_light(PointLight::new(
        Vec3::new(3.0, 5.0, 3.0),
        Color::ONE,
        4.0,
        40.0,
    ));
    world.add_light(PointLight::new(
        Vec3::new(-4.0, 4.0, -2.0),
        Color::new(0.9, 0.9, 1.0),
        2.0,
        30.0,
    ));

    world.build();
    world
}

fn make_object(
    mesh: Arc<Mesh>,
    material: Arc<dyn Material>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
) -> Object {
    let accel = Arc::new(Accel::build_for(mesh.clone()));
    Object::new(mesh, accel, material, translation, rotation, scale)
}

/// A square in the XZ plane, normal up.
fn plane_mesh(half: f32) -> Arc<Mesh> {
    let mut mesh = Mesh::new(
        vec![
            Vec3::new(-half, 0.0, -half),
            Vec3::new(-half, 0.0, half),
            Vec3::new(half, 0.0, half),
            Vec3::new(half, 0.0, -half),
        ],
        vec![0, 1, 2, 0, 2, 3],
        None,
    );
    mesh.compute_normals();
    Arc::new(mesh)
}

/// A unit cube centered on the origin.
fn cube_mesh() -> Arc<Mesh> {
    let p = [
        Vec3::new(-0.5, -0.5, -0.5),
        Vec3::new(0.5, -0.5, -0.5),
        Vec3::new(0.5, 0.5, -0.5),
        Vec3::new(-0.5, 0.5, -0.5),
        Vec3::new(-0.5, -0.5, 0.5),
        Vec3::new(0.5, -0.5, 0.5),
        Vec3::new(0.5, 0.5, 0.5),
        Vec3::new(-0.5, 0.5, 0.5),
    ];
    let mut mesh = Mesh::new(
        p.to_vec(),
        vec![
            4, 5, 6, 4, 6, 7, // front (+z)
            1, 0, 3, 1, 3, 2, // back (-z)
            0, 4, 7, 0, 7, 3, // left (-x)
            5, 1, 2, 5, 2, 6, // right (+x)
            7, 6, 2, 7, 2, 3, // top (+y)
            0, 1, 5, 0, 5, 4, // bottom (-y)
        ],
        None,
    );
    mesh.compute_normals();
    Arc::new(mesh)
}
