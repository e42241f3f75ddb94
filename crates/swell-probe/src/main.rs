//! Offline harness: run an ocean configuration for a number of ticks from a
//! fixed viewer, sample a grid of surface heights and print a JSON report.

use anyhow::{Context, Result};
use clap::Parser;
use glam::Vec3;
use log::info;
use serde::Serialize;
use swell_core::cascade::BATCH_SIZE;
use swell_core::config::{OceanConfig, SpectrumSource};
use swell_core::{OceanSimulation, TickReport};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "swell-probe", about = "Run an ocean config and report surface statistics")]
struct Args {
    /// OceanConfig JSON file. Defaults are used when omitted.
    #[arg(short, long)]
    config: Option<String>,

    /// Override the spectrum source (manual, phillips, pierson-moskowitz, jonswap).
    #[arg(short, long)]
    source: Option<String>,

    /// Override the wind speed, m/s.
    #[arg(short, long)]
    wind: Option<f32>,

    /// Number of ticks to run before sampling.
    #[arg(short, long, default_value_t = 60)]
    ticks: usize,

    /// Seconds per tick.
    #[arg(long, default_value_t = 1.0 / 60.0)]
    dt: f32,

    /// Viewer height above sea level, metres.
    #[arg(short, long, default_value_t = 10.0)]
    altitude: f32,

    /// Samples per side of the height grid.
    #[arg(short, long, default_value_t = 32)]
    grid: usize,

    /// Grid spacing, metres.
    #[arg(long, default_value_t = 2.0)]
    spacing: f32,

    /// Pretty-print the JSON report.
    #[arg(long)]
    pretty: bool,
}

// ── Report ────────────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct BatchSummary {
    lod: usize,
    count: usize,
    dropped: usize,
    shortest: Option<f32>,
    longest: Option<f32>,
}

#[derive(Serialize)]
struct HeightStats {
    samples: usize,
    min: f32,
    max: f32,
    mean: f32,
    std: f32,
}

#[derive(Serialize)]
struct ProbeReport {
    config: OceanConfig,
    power_log: Vec<f32>,
    tick: TickReport,
    batch_capacity: usize,
    batches: Vec<BatchSummary>,
    transition: Option<BatchSummary>,
    heights: HeightStats,
    /// Worst horizontal miss of the inverse solve over the grid, metres.
    max_inversion_residual: f32,
}

fn summarize(batch: &swell_core::cascade::Batch) -> BatchSummary {
    BatchSummary {
        lod: batch.lod,
        count: batch.len(),
        dropped: batch.dropped,
        shortest: batch.entries.first().map(|e| e.wavelength),
        longest: batch.entries.last().map(|e| e.wavelength),
    }
}

fn parse_source(name: &str) -> Result<SpectrumSource> {
    serde_json::from_value(serde_json::Value::String(name.to_owned()))
        .with_context(|| format!("unknown spectrum source `{name}`"))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => OceanConfig::from_path(path).with_context(|| format!("loading {path}"))?,
        None => OceanConfig::default(),
    };
    if let Some(name) = &args.source {
        config.spectrum_source = parse_source(name)?;
    }
    if let Some(speed) = args.wind {
        config.wind.speed = speed;
    }

    let mut sim = OceanSimulation::new(config.clone()).context("building simulation")?;
    let viewer = Vec3::new(0.0, config.sea_level + args.altitude, 0.0);

    let mut tick = sim.report();
    for _ in 0..args.ticks {
        tick = sim.tick(args.dt, viewer)?;
    }
    info!(
        "ran {} ticks to t={:.2}s, LOD level {} blend {:.3}",
        args.ticks, tick.elapsed_time, tick.lod.level, tick.lod.blend
    );

    let half = args.grid as f32 * args.spacing / 2.0;
    let mut heights = Vec::with_capacity(args.grid * args.grid);
    let mut max_residual = 0.0f32;
    for j in 0..args.grid {
        for i in 0..args.grid {
            let world = Vec3::new(i as f32 * args.spacing - half, 0.0, j as f32 * args.spacing - half);
            heights.push(sim.height_at(world, 0.0));

            let reference = sim.invert_to_reference(world, 0.0);
            let landed = reference + sim.displacement(reference, 0.0);
            let miss = ((landed.x - world.x).powi(2) + (landed.z - world.z).powi(2)).sqrt();
            max_residual = max_residual.max(miss);
        }
    }

    let n = heights.len().max(1) as f32;
    let mean = heights.iter().sum::<f32>() / n;
    let var = heights.iter().map(|h| (h - mean).powi(2)).sum::<f32>() / n;
    let stats = HeightStats {
        samples: heights.len(),
        min: heights.iter().copied().fold(f32::INFINITY, f32::min),
        max: heights.iter().copied().fold(f32::NEG_INFINITY, f32::max),
        mean,
        std: var.sqrt(),
    };

    eprintln!(
        "heights over {} samples: min {:.3} max {:.3} std {:.3} | inversion residual {:.2e} m",
        stats.samples, stats.min, stats.max, stats.std, max_residual
    );

    let assignment = sim.assignment();
    let report = ProbeReport {
        power_log: sim.spectrum().power_log.to_vec(),
        tick,
        batch_capacity: BATCH_SIZE,
        batches: assignment.batches.iter().map(summarize).collect(),
        transition: assignment.transition.as_ref().map(summarize),
        heights: stats,
        max_inversion_residual: max_residual,
        config,
    };

    let json = if args.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}
