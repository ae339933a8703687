//! Replays a recorded pose stream through the try-on pipeline without a display.

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, warn};
use std::path::PathBuf;
use std::time::Duration;
use virtual_tryon::config::{Config, EXAMPLE_CONFIG};
use virtual_tryon::pipeline::{Pipeline, Scheduler};
use virtual_tryon::replay::{RecordingSurface, ReplaySource, StaticVideo};
use virtual_tryon::rig::{GarmentCatalog, RigConfig};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Recorded estimator results (YAML or JSON)
    #[arg(short, long, required_unless_present = "print_config")]
    poses: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Rig table; overrides the one named in the configuration
    #[arg(short, long)]
    rig: Option<String>,

    /// Part confidence threshold; overrides the configuration
    #[arg(short, long)]
    threshold: Option<f64>,

    /// Replay duration in milliseconds
    #[arg(long, default_value = "5000")]
    duration_ms: u64,

    /// Switch to the next garment of the rig table every this many milliseconds
    #[arg(long)]
    cycle_ms: Option<u64>,

    /// Estimation polls the pose source spends on each result
    #[arg(long, default_value = "0")]
    latency: u32,

    /// Restart the recording when it ends
    #[arg(long = "loop")]
    looping: bool,

    /// Pace the replay in wall-clock time
    #[arg(long)]
    realtime: bool,

    /// Print an example configuration file and exit
    #[arg(long)]
    print_config: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    if args.print_config {
        print!("{EXAMPLE_CONFIG}");
        return Ok(());
    }

    let mut config = match &args.config {
        Some(config_path) => {
            info!("Loading configuration from: {}", config_path);
            Config::from_file(config_path).unwrap_or_else(|e| {
                warn!("Failed to load config file: {}. Using defaults.", e);
                Config::default()
            })
        }
        None => Config::default(),
    };
    if let Some(threshold) = args.threshold {
        config.pipeline.part_confidence_threshold = threshold;
    }

    let rig_path = args.rig.as_deref().map(PathBuf::from).or_else(|| config.rig_path.clone());
    let rig = match rig_path {
        Some(path) => {
            info!("Loading rig table from: {}", path.display());
            RigConfig::from_file(&path).with_context(|| format!("loading rig table {}", path.display()))?
        }
        None => RigConfig::default(),
    };

    let poses = args.poses.as_deref().context("--poses is required")?;
    let mut source = ReplaySource::from_file(poses)
        .with_context(|| format!("loading recording {poses}"))?
        .with_latency(args.latency)
        .looping(args.looping);
    info!("Replaying {} estimator results from {}", source.len(), poses);

    let mut surface = RecordingSurface::for_rig(&rig);
    let mut catalog = GarmentCatalog::new(rig.garments.clone());
    let mut pipeline = Pipeline::from_config(&config, rig)?;

    let garment = catalog.current().cloned().context("rig table lists no garments")?;
    pipeline.swap_mesh(&mut surface, &garment.locator, &garment.file_name)?;

    let mut video = StaticVideo::ready(640, 480);
    let mut scheduler = Scheduler::new(&config.pipeline);
    let total = Duration::from_millis(args.duration_ms);
    let cycle = args.cycle_ms.filter(|ms| *ms > 0).map(Duration::from_millis);
    let segment = cycle.map_or(total, |c| c.min(total));
    let realtime = args.realtime;

    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        let chunk = segment.min(total - elapsed);
        let summary = scheduler.run(&mut pipeline, &mut video, &mut source, &mut surface, chunk, |wait| {
            if realtime {
                std::thread::sleep(wait);
            }
        });
        elapsed += chunk;
        info!(
            "{:>6} ms: {} estimation steps, {} signal updates, {} render ticks",
            elapsed.as_millis(),
            summary.estimation_steps,
            summary.signal_updates,
            summary.render_ticks
        );
        if summary.abandoned {
            warn!("Estimation abandoned; rendering continued with frozen signals");
        }

        if cycle.is_some() && elapsed < total {
            if let Some(next) = catalog.next().cloned() {
                if let Err(e) = pipeline.swap_mesh(&mut surface, &next.locator, &next.file_name) {
                    warn!("Garment swap failed: {}", e);
                }
            }
        }
    }

    println!("Final signals:");
    for (key, signal) in pipeline.bus().iter() {
        println!("  {key}: {signal:?}");
    }
    match surface.avatar_position() {
        Some(position) => println!("Avatar position: [{:.3}, {:.3}, {:.3}]", position.x, position.y, position.z),
        None => println!("Avatar position: unset"),
    }
    println!("Bone rotations applied: {}", surface.rotation_updates());

    Ok(())
}
