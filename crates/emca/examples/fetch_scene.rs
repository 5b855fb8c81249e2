//! Connects to a running EMCA server and prints what it knows about the scene.
//!
//! Usage: `cargo run --example fetch_scene [options.json] [x y]`
//!
//! With pixel coordinates it also re-renders that pixel and lists its paths.

use emca::*;

fn main() -> Result<()> {
    init_logging();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let options = match args.first() {
        Some(path) => ClientOptions::load(path)?,
        None => ClientOptions::default(),
    };
    let pixel = match (args.get(1), args.get(2)) {
        (Some(x), Some(y)) => Some((x.parse().unwrap_or(0), y.parse().unwrap_or(0))),
        _ => None,
    };

    let mut client = Client::connect(&options)?;

    let info = client.request_render_info()?;
    println!(
        "renderer: {}, scene: {}, spp: {}",
        info.renderer_name, info.scene_name, info.sample_count
    );

    let camera = client.request_camera()?;
    println!(
        "camera: origin {} looking along {} (fov {})",
        camera.origin, camera.direction, camera.fov
    );

    let scene = client.request_scene()?;
    if let Some(heatmap) = &scene.info.heatmap {
        println!(
            "heatmap: colormap {}, label '{}'",
            heatmap.colormap, heatmap.colorbar_label
        );
    }
    let summary = scene.shapes.summary();
    println!(
        "{} shapes: {} meshes ({} vertices, {} triangles), {} spheres",
        summary.shape_count,
        summary.mesh_count,
        summary.vertex_count,
        summary.triangle_count,
        summary.sphere_count
    );
    if let Some((min, max)) = summary.bounds {
        println!("bounds: {min} .. {max}");
    }
    println!("plugins: {:?}", client.supported_plugins());

    if let Some((x, y)) = pixel {
        let data = client.request_render_pixel(x, y, info.sample_count)?;
        println!("pixel ({x}, {y}): {data}");
        for path in data.paths() {
            println!(
                "  sample {}: {} intersections, estimate {:?}",
                path.sample_idx,
                path.intersection_count(),
                path.final_estimate
            );
        }
    }

    client.disconnect()
}
