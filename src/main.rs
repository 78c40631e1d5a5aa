//! Meadow - headless frame driver

use std::path::{Path, PathBuf};

use image::ImageEncoder;

use meadow::compute::Texture2D;
use meadow::core::error::Error;
use meadow::core::logging;
use meadow::core::types::{Result, Vec4};
use meadow::render::{CameraBuffer, GpuContext, GrassDrawBuffers};
use meadow::scene::{Scene, SceneConfig};

struct Args {
    config: Option<PathBuf>,
    frames: u32,
    dt: f32,
    preview: Option<PathBuf>,
    gpu: bool,
}

fn main() {
    logging::init();
    log::info!("Meadow starting...");

    let args: Vec<String> = std::env::args().collect();
    let args = parse_args(&args);

    if let Err(e) = run(&args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<()> {
    let config = match &args.config {
        Some(path) => {
            log::info!("Loading scene from: {}", path.display());
            SceneConfig::load(path)?
        }
        None => SceneConfig::default(),
    };

    let mut scene = Scene::new(&config)?;
    for frame in 0..args.frames {
        let stats = scene.step(args.dt);
        log::info!(
            "Frame {}: {} renderers, {} visible chunks, {} instances, max divergence {:.4}",
            frame,
            stats.rendered,
            stats.visible_chunks,
            stats.instances,
            scene.wind().fluid().max_divergence()
        );
    }

    if let Some(path) = &args.preview {
        save_preview(path, scene.wind().fluid().preview_map())?;
        log::info!("Fluid preview written to {}", path.display());
    }

    if args.gpu {
        upload_to_gpu(&scene)?;
    }
    Ok(())
}

/// Upload every renderer's last frame and read the draw arguments back.
fn upload_to_gpu(scene: &Scene) -> Result<()> {
    let ctx = pollster::block_on(GpuContext::new_headless())?;
    let camera = CameraBuffer::new(&ctx.device);
    camera.update(&ctx.queue, scene.camera(), scene.time());
    for (i, renderer) in scene.grass().renderers().iter().enumerate() {
        let emitter = renderer.emitter();
        let capacity = renderer.layout().blade_capacity() as u32;
        let buffers = GrassDrawBuffers::new(&ctx.device, emitter.mesh(), capacity)?;
        buffers.upload(&ctx.queue, emitter.instances(), emitter.args());
        let args = buffers.read_args(&ctx.device, &ctx.queue)?;
        log::info!(
            "Renderer {}: indirect args vertex_count={} instance_count={}",
            i,
            args[0],
            args[1]
        );
    }
    Ok(())
}

/// Write an RGBA texture as PNG, clamping channels to [0, 1].
fn save_preview(path: &Path, map: &Texture2D<Vec4>) -> Result<()> {
    let rgba8: Vec<u8> = map
        .data()
        .iter()
        .flat_map(|texel| {
            let c = texel.clamp(Vec4::ZERO, Vec4::ONE) * 255.0;
            [c.x as u8, c.y as u8, c.z as u8, 255]
        })
        .collect();

    let mut png_data = Vec::new();
    image::codecs::png::PngEncoder::new(&mut png_data).write_image(
        &rgba8,
        map.width(),
        map.height(),
        image::ExtendedColorType::Rgba8,
    )?;

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, png_data).map_err(Error::from)
}

fn parse_args(args: &[String]) -> Args {
    let mut parsed = Args {
        config: None,
        frames: 60,
        dt: 1.0 / 60.0,
        preview: None,
        gpu: false,
    };
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                parsed.config = args.get(i + 1).map(PathBuf::from);
                i += 1;
            }
            "--frames" | "-n" => {
                if let Some(n) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    parsed.frames = n;
                }
                i += 1;
            }
            "--dt" => {
                if let Some(dt) = args.get(i + 1).and_then(|s| s.parse().ok()) {
                    parsed.dt = dt;
                }
                i += 1;
            }
            "--preview" => {
                parsed.preview = args.get(i + 1).map(PathBuf::from);
                i += 1;
            }
            "--gpu" => parsed.gpu = true,
            other => log::warn!("Ignoring unknown argument: {}", other),
        }
        i += 1;
    }
    parsed
}
