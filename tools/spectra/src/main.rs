//! Empirical spectrum tables: sweeps wind speeds and writes the per-octave
//! powerLog produced by Phillips, Pierson-Moskowitz and JONSWAP as JSON.
//! Output: data/spectra.json

use anyhow::{bail, Context, Result};
use clap::Parser;
use rayon::prelude::*;
use serde::Serialize;
use std::{fs, path::Path};
use swell_core::spectrum::{OctaveSpectrum, NUM_OCTAVES, STANDARD_GRAVITY};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(name = "spectra", about = "Tabulate empirical ocean spectra over a range of wind speeds")]
struct Args {
    /// Lowest wind speed, m/s.
    #[arg(long, default_value_t = 2.0)]
    min_wind: f32,

    /// Highest wind speed, m/s (inclusive).
    #[arg(long, default_value_t = 20.0)]
    max_wind: f32,

    /// Wind speed increment, m/s.
    #[arg(long, default_value_t = 2.0)]
    step: f32,

    /// JONSWAP fetch, metres.
    #[arg(short, long, default_value_t = 1000.0)]
    fetch: f32,

    /// Wind direction used by Phillips, degrees.
    #[arg(short, long, default_value_t = 0.0)]
    direction: f32,

    #[arg(long, default_value_t = STANDARD_GRAVITY)]
    gravity: f32,

    /// Output JSON file.
    #[arg(short, long, default_value = "data/spectra.json")]
    output: String,
}

// ── Output types ──────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct Table {
    power_log: [f32; NUM_OCTAVES],
    peak_octave: usize,
    /// Σ amplitude over one component per octave, metres.
    amplitude_sum: f32,
}

#[derive(Serialize)]
struct WindRow {
    wind_speed: f32,
    phillips: Table,
    pierson_moskowitz: Table,
    jonswap: Table,
}

#[derive(Serialize)]
struct Output {
    fetch: f32,
    direction_deg: f32,
    gravity: f32,
    octave_wavelengths: Vec<f32>,
    rows: Vec<WindRow>,
}

fn table(spectrum: &OctaveSpectrum) -> Table {
    let peak_octave = spectrum
        .power_log
        .iter()
        .enumerate()
        .max_by(|a, b| a.1.total_cmp(b.1))
        .map(|(i, _)| i)
        .unwrap_or(0);
    let amplitude_sum = (0..NUM_OCTAVES)
        .map(|i| spectrum.amplitude(OctaveSpectrum::representative_wavelength(i)))
        .sum();
    Table { power_log: spectrum.power_log, peak_octave, amplitude_sum }
}

fn row(args: &Args, wind_speed: f32) -> WindRow {
    let base = OctaveSpectrum { components_per_octave: 1, gravity: args.gravity, ..OctaveSpectrum::default() };

    let mut phillips = base.clone();
    phillips.apply_phillips(wind_speed, args.direction, args.gravity);
    let mut pm = base.clone();
    pm.apply_pierson_moskowitz(wind_speed, args.gravity);
    let mut jonswap = base;
    jonswap.apply_jonswap(wind_speed, args.fetch, args.gravity);

    WindRow {
        wind_speed,
        phillips: table(&phillips),
        pierson_moskowitz: table(&pm),
        jonswap: table(&jonswap),
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    if args.step <= 0.0 || args.max_wind < args.min_wind {
        bail!("need step > 0 and max_wind >= min_wind");
    }

    let count = ((args.max_wind - args.min_wind) / args.step).floor() as usize + 1;
    let speeds: Vec<f32> = (0..count).map(|i| args.min_wind + i as f32 * args.step).collect();
    eprintln!("Tabulating {} wind speeds ...", speeds.len());

    let rows: Vec<WindRow> = speeds.par_iter().map(|&u| row(&args, u)).collect();

    eprintln!(
        "\n{:>8} {:>12} {:>12} {:>12} {:>10}",
        "Wind", "PhillipsPk", "PM Pk", "JONSWAP Pk", "ΣA(PM)"
    );
    eprintln!("{}", "-".repeat(58));
    for r in &rows {
        eprintln!(
            "{:>8.1} {:>12} {:>12} {:>12} {:>10.3}",
            r.wind_speed,
            r.phillips.peak_octave,
            r.pierson_moskowitz.peak_octave,
            r.jonswap.peak_octave,
            r.pierson_moskowitz.amplitude_sum,
        );
    }

    let output = Output {
        fetch: args.fetch,
        direction_deg: args.direction,
        gravity: args.gravity,
        octave_wavelengths: (0..NUM_OCTAVES).map(OctaveSpectrum::small_wavelength).collect(),
        rows,
    };

    let path = Path::new(&args.output);
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let json = serde_json::to_string_pretty(&output)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    eprintln!("\nWrote {}", path.display());
    Ok(())
}
