use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use glint_core::Scene;
use glint_math::Vec3;
use glint_renderer::{AccumulationMode, FrameBuffer, RenderConfig, RenderSession};

/// Headless host for the Glint progressive path tracer.
#[derive(Parser, Debug)]
#[command(name = "glint", version, about)]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 250)]
    width: u32,

    /// Image height in pixels
    #[arg(long, default_value_t = 250)]
    height: u32,

    /// Frame budget before the render is considered converged
    #[arg(long, default_value_t = 500)]
    max_samples: u32,

    /// Base samples per pixel per frame
    #[arg(long, default_value_t = 2)]
    samples_per_frame: u32,

    /// Random seed
    #[arg(long, default_value_t = 0x5eed)]
    seed: u64,

    /// Light position as x,y,z
    #[arg(long, value_parser = parse_vec3, allow_hyphen_values = true)]
    light: Option<Vec3>,

    /// Normalize the running mean by samples cast instead of frames
    #[arg(long)]
    per_sample_mean: bool,

    /// Write an intermediate image every N frames (0 disables)
    #[arg(long, default_value_t = 0)]
    preview_every: u32,

    /// Output PNG path
    #[arg(short, long, default_value = "glint.png")]
    output: PathBuf,
}

fn parse_vec3(s: &str) -> Result<Vec3, String> {
    let parts: Vec<f32> = s
        .split(',')
        .map(|p| p.trim().parse::<f32>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in '{}': {}", s, e))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("expected x,y,z, got '{}'", s)),
    }
}

fn save_png(buffer: &FrameBuffer, path: &Path) -> Result<()> {
    image::save_buffer(
        path,
        &buffer.to_rgba8(),
        buffer.width(),
        buffer.height(),
        image::ColorType::Rgba8,
    )
    .with_context(|| format!("failed to write {}", path.display()))
}

fn preview_path(output: &Path, frame: u32) -> PathBuf {
    let stem = output
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("glint");
    output.with_file_name(format!("{}_{:04}.png", stem, frame))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let args = Args::parse();
    log::info!("Starting Glint");

    let accumulation = if args.per_sample_mean {
        AccumulationMode::SampleCount
    } else {
        AccumulationMode::FrameCount
    };
    let config = RenderConfig::default()
        .with_resolution(args.width, args.height)
        .with_quality(args.max_samples, args.samples_per_frame)
        .with_seed(args.seed)
        .with_accumulation(accumulation);

    let mut session = RenderSession::new(Scene::showcase(), config)?;
    if let Some(light) = args.light {
        session.move_light(light)?;
    }

    // Host-owned scheduler: one render_frame per tick until converged.
    let start = Instant::now();
    loop {
        let output = session.render_frame();
        let converged = output.converged;
        let frame = output.current_sample;

        if let Some(stats) = output.stats {
            if frame % 25 == 0 || converged {
                log::info!(
                    "Frame {}/{}: {:.2} ms ({} samples)",
                    frame,
                    args.max_samples,
                    stats.duration.as_secs_f64() * 1000.0,
                    stats.samples_cast
                );
            }
        }

        if args.preview_every > 0 && frame % args.preview_every == 0 && !converged {
            save_png(session.display(), &preview_path(&args.output, frame))?;
        }

        if converged {
            break;
        }
    }

    save_png(session.display(), &args.output)?;
    log::info!(
        "Wrote {} after {} frames in {:.2?}",
        args.output.display(),
        session.current_sample(),
        start.elapsed()
    );

    Ok(())
}
