//! `ember` - render the demo scene to an image file.

mod args;
mod demo;

use anyhow::{Context, Result};
use args::Args;
use clap::Parser;
use demo::DemoSettings;
use ember_core::{FrameBuffer, ImageCache, PixelFormat, RenderOptions, Scene, ShaderMode};
use ember_renderer::{LocalCluster, Renderer};
use std::path::Path;

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    let options = args.render_options()?;
    let settings = DemoSettings {
        aa_samples: args.aa_samples,
        ao_samples: args.ao_samples,
        max_depth: args.max_depth,
        texture: args.texture.clone(),
    };
    if settings.ao_samples.is_some_and(|n| n > 0) && options.shader.resolve() != ShaderMode::Full {
        log::warn!("Ambient occlusion only runs with the full shader");
    }
    let mut images = ImageCache::new();

    log::info!(
        "Rendering {}x{} with {} node(s)",
        options.width,
        options.height,
        args.nodes
    );

    let mut frame = if args.nodes > 1 {
        render_cluster(&options, &settings, &mut images, args.nodes)?
    } else {
        let scene = demo::build(&options, &settings, &mut images)?;
        let mut renderer = Renderer::new(scene)
            .context("Failed to start renderer")?
            .with_progress(|percent| log::debug!("{percent:5.1}%"));
        renderer.render().context("Render failed")?
    };

    post_process(&mut frame, &options, args.flip);
    write_image(&frame, &args.output)?;
    log::info!("Wrote {}", args.output.display());
    Ok(())
}

/// Render every node of an in-process cluster in turn and gather the rows.
fn render_cluster(
    options: &RenderOptions,
    settings: &DemoSettings,
    images: &mut ImageCache,
    nodes: usize,
) -> Result<FrameBuffer> {
    let cluster = LocalCluster::new(nodes);
    for node in 0..nodes {
        let scene: Scene = demo::build(options, settings, images)?;
        let mut endpoint = cluster.endpoint(node)?;
        Renderer::new(scene)?
            .render_node(node, nodes, &mut endpoint)
            .with_context(|| format!("Node {node} failed"))?;
    }
    Ok(cluster.gather(options.width, options.height, options.format)?)
}

/// Normalize and gamma-correct float output, then flip if asked.
fn post_process(frame: &mut FrameBuffer, options: &RenderOptions, flip: bool) {
    if frame.format() == PixelFormat::Rgb96F {
        if options.normalize {
            frame.normalize();
        }
        frame.apply_gamma(options.gamma);
    }
    if flip {
        frame.flip_vertical();
    }
}

/// Write 8-bit RGB; the format follows the file extension (PNG, PPM, ...).
fn write_image(frame: &FrameBuffer, path: &Path) -> Result<()> {
    image::save_buffer(
        path,
        &frame.to_rgb8(),
        frame.width,
        frame.height,
        image::ColorType::Rgb8,
    )
    .with_context(|| format!("Failed to write {}", path.display()))
}
