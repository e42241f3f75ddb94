//! Cascade batching: partition components across LOD levels by wavelength.
//!
//! LOD `i` carries wavelengths in `[minWL·2^i, minWL·2^(i+1))` where `minWL`
//! is half of LOD 0's geometric threshold. The last LOD absorbs everything
//! from its lower bound up, and the same set is duplicated as a transition
//! batch on the second-to-last LOD so the renderer can cross-fade.

use std::borrow::Cow;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::components::{ComponentSet, WaveComponent};
use crate::error::{Result, SwellError};

/// Hard per-batch capacity.
pub const BATCH_SIZE: usize = 48;
/// Components quieter than this are culled from batches.
pub const MIN_BATCH_AMPLITUDE: f32 = 0.001;

/// Smallest wavelength LOD `lod` can represent with `min_texels_per_wave`
/// texels per wave at the given horizontal scale and vertex density.
pub fn wavelength_threshold(lod: usize, scale: f32, vertex_density: f32, min_texels_per_wave: f32) -> f32 {
    let max_diameter = 4.0 * scale * 2f32.powi(lod as i32);
    let max_texel_size = max_diameter / (4.0 * vertex_density);
    2.0 * max_texel_size * min_texels_per_wave
}

/// One component as baked into an LOD's wave texture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BatchEntry {
    pub wavelength: f32,
    pub amplitude: f32,
    /// Wind direction plus the component's offset, radians.
    pub angle_rad: f32,
    pub phase: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    pub lod: usize,
    /// At most [`BATCH_SIZE`] entries, ascending wavelength.
    pub entries: Vec<BatchEntry>,
    /// Qualifying components beyond capacity.
    pub dropped: usize,
}

/// Parallel fixed-size arrays in the layout the wave shader consumes.
///
/// Each array holds [`BATCH_SIZE`] slots; when the batch is not full the
/// wavelength slot right after the last entry is zero as a terminator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackedBatch {
    pub lod: usize,
    pub count: usize,
    pub wavelengths: Vec<f32>,
    pub amplitudes: Vec<f32>,
    pub angles: Vec<f32>,
    pub phases: Vec<f32>,
}

impl Batch {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn packed(&self) -> PackedBatch {
        let mut packed = PackedBatch {
            lod: self.lod,
            count: self.entries.len(),
            wavelengths: vec![0.0; BATCH_SIZE],
            amplitudes: vec![0.0; BATCH_SIZE],
            angles: vec![0.0; BATCH_SIZE],
            phases: vec![0.0; BATCH_SIZE],
        };
        for (i, e) in self.entries.iter().enumerate() {
            packed.wavelengths[i] = e.wavelength;
            packed.amplitudes[i] = e.amplitude;
            packed.angles[i] = e.angle_rad;
            packed.phases[i] = e.phase;
        }
        packed
    }
}

/// Result of one batching pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CascadeAssignment {
    /// One batch per LOD, index == LOD.
    pub batches: Vec<Batch>,
    /// Copy of the last batch attached to LOD `lod_count - 2`; `None` with a
    /// single LOD.
    pub transition: Option<Batch>,
    /// Components finer than LOD 0 can represent.
    pub skipped_fine: usize,
}

impl CascadeAssignment {
    pub fn dropped_total(&self) -> usize {
        self.batches.iter().map(|b| b.dropped).sum()
    }

    /// Batches with at least one entry, transition last.
    pub fn work_items(&self) -> impl Iterator<Item = &Batch> {
        self.batches
            .iter()
            .chain(self.transition.iter())
            .filter(|b| !b.is_empty())
    }
}

/// Assign `set` to `lod_count` cascades.
///
/// `lod0_threshold` is [`wavelength_threshold`] for LOD 0; the first window
/// starts at half of it. Fails only on caller errors: zero LODs or a
/// non-positive threshold.
pub fn assign(
    set: &ComponentSet,
    wind_angle_deg: f32,
    lod0_threshold: f32,
    lod_count: usize,
) -> Result<CascadeAssignment> {
    if lod_count == 0 {
        return Err(SwellError::InvalidLodCount(lod_count));
    }
    if lod0_threshold.is_nan() || lod0_threshold <= 0.0 {
        return Err(SwellError::config(
            "lod0_threshold",
            format!("must be positive, got {lod0_threshold}"),
        ));
    }

    let ordered: Cow<'_, [WaveComponent]> = if set.is_sorted_by_wavelength() {
        Cow::Borrowed(&set.components)
    } else {
        warn!("component set is not globally sorted by wavelength; sorting before batching");
        let mut sorted = set.components.clone();
        sorted.sort_by(|a, b| a.wavelength.total_cmp(&b.wavelength));
        Cow::Owned(sorted)
    };
    let n = ordered.len();

    let mut min_wl = lod0_threshold / 2.0;
    let mut cursor = 0;
    while cursor < n && ordered[cursor].wavelength < min_wl {
        cursor += 1;
    }
    let skipped_fine = cursor;

    let mut batches = Vec::with_capacity(lod_count);
    for lod in 0..lod_count - 1 {
        let start = cursor;
        while cursor < n && ordered[cursor].wavelength < 2.0 * min_wl {
            cursor += 1;
        }
        batches.push(collect_batch(lod, &ordered[start..cursor], wind_angle_deg));
        min_wl *= 2.0;
    }

    let last = collect_batch(lod_count - 1, &ordered[cursor..], wind_angle_deg);
    let transition = (lod_count >= 2).then(|| Batch { lod: lod_count - 2, ..last.clone() });
    batches.push(last);

    Ok(CascadeAssignment { batches, transition, skipped_fine })
}

fn collect_batch(lod: usize, window: &[WaveComponent], wind_angle_deg: f32) -> Batch {
    let mut entries = Vec::with_capacity(window.len().min(BATCH_SIZE));
    let mut dropped = 0;

    for c in window.iter().filter(|c| c.amplitude >= MIN_BATCH_AMPLITUDE) {
        if entries.len() < BATCH_SIZE {
            entries.push(BatchEntry {
                wavelength: c.wavelength,
                amplitude: c.amplitude,
                angle_rad: (wind_angle_deg + c.direction_offset_deg).to_radians(),
                phase: c.phase,
            });
        } else {
            dropped += 1;
        }
    }

    if dropped > 0 {
        warn!("Gerstner LOD{lod}: batch limit of {BATCH_SIZE} reached, dropped {dropped} wavelengths");
    }

    Batch { lod, entries, dropped }
}
