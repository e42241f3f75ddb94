//! Diagnostic visualizer: writes surface debug images to data/debug/.
//! Not part of the main pipeline; no tests, no clippy target.

use std::fs;
use std::path::Path;

use glam::Vec3;
use swell_core::config::{OceanConfig, SpectrumSource, WindParams};
use swell_core::OceanSimulation;

/// Pixels per side.
const N: usize = 512;
/// Metres per pixel.
const SPACING: f32 = 0.25;

// ── Colour helpers ────────────────────────────────────────────────────────────

/// Height → blue ramp: troughs deep navy, crests near white.
fn height_to_rgb(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let r = (20.0 + 200.0 * t * t) as u8;
    let g = (40.0 + 190.0 * t) as u8;
    let b = (90.0 + 160.0 * t) as u8;
    [r, g, b]
}

/// Unit normal → tangent-space style RGB (x, z in red/green, y in blue).
fn normal_to_rgb(n: Vec3) -> [u8; 3] {
    let enc = |v: f32| ((v * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0) as u8;
    [enc(n.x), enc(n.z), enc(n.y)]
}

fn gray(v: f32) -> [u8; 3] {
    let c = (v.clamp(0.0, 1.0) * 255.0) as u8;
    [c, c, c]
}

fn save(img: &image::RgbImage, out_dir: &Path, name: &str) {
    let path = out_dir.join(name);
    img.save(&path).unwrap_or_else(|e| panic!("failed to save {name}: {e}"));
    println!("Wrote {}", path.display());
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() {
    let config = OceanConfig {
        spectrum_source: SpectrumSource::PiersonMoskowitz,
        wind: WindParams { speed: 8.0, direction_deg: 30.0, ..WindParams::default() },
        seed: 42,
        ..OceanConfig::default()
    };

    println!("Building ocean ({N}×{N} at {SPACING} m)…");
    let mut sim = OceanSimulation::new(config).expect("default-derived config must be valid");
    let report = sim.tick(4.0, Vec3::new(0.0, 5.0, 0.0)).expect("tick failed");
    println!(
        "t={:.1}s, {} components, max vertical displacement {:.2} m",
        report.elapsed_time, report.component_count, report.max_displacement.vertical
    );

    let half = N as f32 * SPACING / 2.0;
    let world = |r: usize, c: usize| Vec3::new(c as f32 * SPACING - half, 0.0, r as f32 * SPACING - half);

    let out_dir = Path::new("data/debug");
    fs::create_dir_all(out_dir).expect("cannot create data/debug/");

    // ── 1. height.png ────────────────────────────────────────────────────────
    {
        println!("Sampling heights…");
        let heights: Vec<f32> = (0..N * N).map(|i| sim.height_at(world(i / N, i % N), 0.0)).collect();
        let min_h = heights.iter().copied().fold(f32::INFINITY, f32::min);
        let max_h = heights.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        let range = (max_h - min_h).max(1e-3);
        let mut img = image::RgbImage::new(N as u32, N as u32);
        for (i, &h) in heights.iter().enumerate() {
            let [rv, gv, bv] = height_to_rgb((h - min_h) / range);
            img.put_pixel((i % N) as u32, (i / N) as u32, image::Rgb([rv, gv, bv]));
        }
        save(&img, out_dir, "height.png");
    }

    // ── 2. normal.png ────────────────────────────────────────────────────────
    // Normals are evaluated at the reference position under each pixel.
    {
        let mut img = image::RgbImage::new(N as u32, N as u32);
        for r in 0..N {
            for c in 0..N {
                let reference = sim.invert_to_reference(world(r, c), 0.0);
                let [rv, gv, bv] = normal_to_rgb(sim.normal(reference, 0.0));
                img.put_pixel(c as u32, r as u32, image::Rgb([rv, gv, bv]));
            }
        }
        save(&img, out_dir, "normal.png");
    }

    // ── 3. velocity.png (particle speed, grayscale) ──────────────────────────
    {
        let speeds: Vec<f32> = (0..N * N)
            .map(|i| {
                let reference = sim.invert_to_reference(world(i / N, i % N), 0.0);
                sim.surface_velocity(reference, 0.0).length()
            })
            .collect();
        let max_speed = speeds.iter().copied().fold(0.0f32, f32::max).max(1e-3);
        let mut img = image::RgbImage::new(N as u32, N as u32);
        for (i, &s) in speeds.iter().enumerate() {
            let [rv, gv, bv] = gray(s / max_speed);
            img.put_pixel((i % N) as u32, (i / N) as u32, image::Rgb([rv, gv, bv]));
        }
        save(&img, out_dir, "velocity.png");
    }

    println!("Done.");
}
