//! Headless flock runner.
//!
//! Spawns a flock, drives it for a number of frames and logs a summary every so often.
//! Set `RUST_LOG=debug` for per-step detail.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use maxboid::{Backend, CpuKernel, FlockConfig, FlockKernel, FrameDriver, GpuKernel, StepOutcome};

#[derive(Parser, Debug)]
#[command(name = "maxboid")]
#[command(about = "Run a boids flocking simulation without a window")]
struct Args {
    /// JSON config file; command-line flags override its values
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of agents
    #[arg(long)]
    agents: Option<usize>,

    /// Compute backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// RNG seed for a reproducible run
    #[arg(long)]
    seed: Option<u64>,

    /// Frames to simulate
    #[arg(long, default_value = "600")]
    frames: u64,

    /// Fixed delta time in seconds; wall-clock timing when absent
    #[arg(long)]
    dt: Option<f32>,

    /// Switch force mode every N frames (0 = never)
    #[arg(long, default_value = "0")]
    cycle_every: u64,

    /// Log flock statistics every N frames
    #[arg(long, default_value = "60")]
    report_every: u64,

    /// Write the effective config to this path and exit
    #[arg(long)]
    save_config: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => FlockConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
        None => FlockConfig::default(),
    };
    if let Some(agents) = args.agents {
        config.agent_count = agents;
    }
    if let Some(backend) = args.backend {
        config.backend = backend;
    }
    if args.seed.is_some() {
        config.seed = args.seed;
    }
    config.validate()?;

    if let Some(path) = &args.save_config {
        config.save(path).with_context(|| format!("saving {}", path.display()))?;
        log::info!("Wrote config to {}", path.display());
        return Ok(());
    }

    match config.backend {
        Backend::Gpu => match GpuKernel::new_blocking(config.frames_in_flight) {
            Ok(kernel) => run(FrameDriver::from_config(kernel, &config)?, &args),
            Err(e) => {
                log::warn!("GPU backend unavailable ({}), falling back to CPU", e);
                run(FrameDriver::from_config(CpuKernel::new(), &config)?, &args)
            }
        },
        Backend::Cpu => run(FrameDriver::from_config(CpuKernel::new(), &config)?, &args),
    }
}

fn run<K: FlockKernel>(mut driver: FrameDriver<K>, args: &Args) -> Result<()> {
    let start = Instant::now();
    let mut skipped = 0u64;
    let mut done = 0u64;

    while done < args.frames {
        let report = match args.dt {
            Some(dt) => driver.advance(dt)?,
            None => match driver.frame()? {
                Some(report) => report,
                None => continue,
            },
        };
        done = report.frame;

        if report.outcome == StepOutcome::Skipped {
            skipped += 1;
        }
        if args.cycle_every > 0 && done % args.cycle_every == 0 {
            driver.cycle_force_mode();
        }
        if args.report_every > 0 && done % args.report_every == 0 {
            let stats = driver.stats()?;
            log::info!(
                "Frame {}: centroid {:.2?}, mean speed {:.3}, extent {:.2?}, {} force(s)",
                done,
                stats.centroid,
                stats.mean_speed,
                stats.extent(),
                report.force_count
            );
        }
    }

    let elapsed = start.elapsed().as_secs_f32();
    log::info!(
        "Simulated {} frames of {} agents on {} in {:.2}s ({:.1} frames/s, {} skipped)",
        done,
        driver.engine().agent_count(),
        driver.engine().kernel().name(),
        elapsed,
        done as f32 / elapsed.max(f32::EPSILON),
        skipped
    );
    Ok(())
}
