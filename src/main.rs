use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use polyvolve::engine::Engine;
use polyvolve::engine_thread::{spawn_engine, EngineCommand};
use polyvolve::render::CpuRenderer;
use polyvolve::settings::Settings;

/// approximate a target image with a fixed population of translucent polygons
#[derive(Debug, Parser)]
#[command(name = "polyvolve", version)]
struct Args {
    /// target image (png, jpg, bmp, ...)
    target: PathBuf,

    /// where to write the final composite
    #[arg(short, long, default_value = "out.png")]
    output: PathBuf,

    /// JSON settings file; individual flags below override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// population size
    #[arg(long)]
    polygons: Option<usize>,

    /// vertices per polygon (>= 3)
    #[arg(long)]
    vertices: Option<usize>,

    /// PRNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// stop after this many rounds
    #[arg(long)]
    rounds: Option<u64>,

    /// stop once this match percentage is reached
    #[arg(long)]
    target_match: Option<f64>,

    /// stop after this many rounds without a breakthrough
    #[arg(long)]
    stagnation: Option<u64>,

    /// write the per-pixel similarity overlay here
    #[arg(long)]
    diff_out: Option<PathBuf>,

    /// dump the final genome as JSON here
    #[arg(long)]
    genome_out: Option<PathBuf>,
}

fn build_settings(args: &Args) -> anyhow::Result<Settings> {
    let mut settings = match &args.config {
        Some(path) => Settings::load(path)
            .with_context(|| format!("loading settings from {}", path.display()))?,
        None => Settings::default(),
    };

    if let Some(n) = args.polygons {
        settings.polygon_count = n;
    }
    if let Some(n) = args.vertices {
        settings.vertex_count = n;
    }
    if let Some(seed) = args.seed {
        settings.seed = seed;
    }
    if let Some(rounds) = args.rounds {
        settings.stop.max_rounds = Some(rounds);
    }
    if let Some(target) = args.target_match {
        settings.stop.target_match = Some(target);
    }
    if let Some(stagnation) = args.stagnation {
        settings.stop.stagnation_rounds = Some(stagnation);
    }

    // a CLI run has to terminate; without any stop condition fall back to a
    // round budget instead of spinning forever
    if settings.stop.is_unbounded() {
        log::info!("no stop condition given, defaulting to 100000 rounds");
        settings.stop.max_rounds = Some(100_000);
    }

    Ok(settings)
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    let args = Args::parse();
    let settings = build_settings(&args)?;

    let img = image::open(&args.target)
        .with_context(|| format!("loading target image {}", args.target.display()))?
        .to_rgba8();
    let (width, height) = (img.width(), img.height());
    log::info!(
        "target {}x{}, {} polygons x {} vertices, seed {:#x}",
        width,
        height,
        settings.polygon_count,
        settings.vertex_count,
        settings.seed
    );

    let renderer = Box::new(CpuRenderer::new(settings.anti_alias));
    let engine = Engine::new(img.into_raw(), width, height, settings, renderer)?;

    let handle = spawn_engine(engine);
    handle.send(EngineCommand::Start);

    // drain throttled stats until the worker exits
    for update in handle.updates.iter() {
        log::info!(
            "round {:>8}  match {:6.2}%  breakthroughs {}",
            update.mutations,
            update.match_percent,
            update.breakthroughs
        );
    }
    let engine = handle.join()?;

    image::save_buffer(
        &args.output,
        &engine.current_rgba,
        width,
        height,
        image::ExtendedColorType::Rgba8,
    )
    .with_context(|| format!("writing composite to {}", args.output.display()))?;
    log::info!(
        "done: {} rounds, {} breakthroughs, match {:.2}% -> {}",
        engine.mutations,
        engine.breakthroughs,
        engine.last_match,
        args.output.display()
    );

    if let Some(path) = &args.diff_out {
        let overlay = engine.diff_overlay()?;
        image::save_buffer(path, &overlay, width, height, image::ExtendedColorType::Rgba8)
            .with_context(|| format!("writing diff overlay to {}", path.display()))?;
    }

    if let Some(path) = &args.genome_out {
        let json = serde_json::to_string_pretty(&engine.genome)?;
        std::fs::write(path, json)
            .with_context(|| format!("writing genome to {}", path.display()))?;
    }

    Ok(())
}
