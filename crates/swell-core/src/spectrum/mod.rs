//! Octave power spectrum: twelve doubling-width wavelength bands, each with a
//! log10 power value, plus the global shaping scalars.
//!
//! Octave `i` spans `[2^(i-2), 2^(i-1))` metres, so the table starts at
//! 0.25 m and its last octave starts at 512 m. The empirical spectra in
//! [`empirical`] fill the table from wind parameters;
//! [`OctaveSpectrum::amplitude`] turns a band's power into the amplitude of
//! one discrete component inside it.

pub mod empirical;

use log::error;
use serde::{Deserialize, Serialize};

use crate::config::{SpectrumSource, WindParams};

/// Number of octaves in the table.
pub const NUM_OCTAVES: usize = 12;
/// log2 of the smallest wavelength (0.25 m).
pub const SMALLEST_WL_POW_2: f32 = -2.0;
pub const MIN_POWER_LOG: f32 = -6.0;
pub const MAX_POWER_LOG: f32 = 3.0;
/// Standard gravity used when no other value is configured.
pub const STANDARD_GRAVITY: f32 = 9.81;

/// Wavelengths at or below this are rejected by [`OctaveSpectrum::amplitude`].
const MIN_QUERY_WAVELENGTH: f32 = 0.001;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctaveSpectrum {
    /// Per-octave power, log10 scale, nominally in [-6, 3].
    pub power_log: [f32; NUM_OCTAVES],
    /// Disabled octaves always yield zero amplitude.
    pub disabled: [bool; NUM_OCTAVES],
    /// Global amplitude multiplier, [0, 1].
    pub weight: f32,
    /// Horizontal displacement scale, [0, 2].
    pub chop: f32,
    pub components_per_octave: usize,
    /// Spread of component directions around the wind, degrees, [0, 180].
    pub direction_variance_deg: f32,
    /// Gravity used by the dispersion relation in [`Self::amplitude`].
    pub gravity: f32,
}

impl Default for OctaveSpectrum {
    fn default() -> Self {
        Self {
            power_log: [MIN_POWER_LOG; NUM_OCTAVES],
            disabled: [false; NUM_OCTAVES],
            weight: 1.0,
            chop: 1.0,
            components_per_octave: 5,
            direction_variance_deg: 90.0,
            gravity: STANDARD_GRAVITY,
        }
    }
}

impl OctaveSpectrum {
    pub fn smallest_wavelength() -> f32 {
        2f32.powf(SMALLEST_WL_POW_2)
    }

    /// Lower wavelength bound of `octave`.
    pub fn small_wavelength(octave: usize) -> f32 {
        2f32.powf(SMALLEST_WL_POW_2 + octave as f32)
    }

    /// Upper (exclusive) wavelength bound of `octave`.
    pub fn large_wavelength(octave: usize) -> f32 {
        2f32.powf(SMALLEST_WL_POW_2 + octave as f32 + 1.0)
    }

    /// Wavelength at which the empirical spectra are sampled for `octave`.
    pub fn representative_wavelength(octave: usize) -> f32 {
        Self::small_wavelength(octave) * 1.5
    }

    /// Octave containing `wavelength`, clamped to the table.
    /// Returns `None` for non-positive or NaN wavelengths.
    pub fn octave_index(wavelength: f32) -> Option<usize> {
        if wavelength.is_nan() || wavelength <= 0.0 {
            return None;
        }
        let wl_pow2 = wavelength
            .log2()
            .clamp(SMALLEST_WL_POW_2, SMALLEST_WL_POW_2 + NUM_OCTAVES as f32 - 1.0);
        Some((wl_pow2 - SMALLEST_WL_POW_2) as usize)
    }

    /// Total number of components synthesized per tick.
    pub fn total_components(&self) -> usize {
        NUM_OCTAVES * self.components_per_octave
    }

    /// Restore the flat, fully-enabled table.
    pub fn reset(&mut self) {
        self.power_log = [MIN_POWER_LOG; NUM_OCTAVES];
        self.disabled = [false; NUM_OCTAVES];
    }

    /// Set one octave's power, clamped to `[MIN_POWER_LOG, MAX_POWER_LOG]`.
    pub fn set_power_log(&mut self, octave: usize, power_log: f32) {
        if let Some(slot) = self.power_log.get_mut(octave) {
            *slot = power_log.clamp(MIN_POWER_LOG, MAX_POWER_LOG);
        }
    }

    pub fn set_octave_enabled(&mut self, octave: usize, enabled: bool) {
        if let Some(slot) = self.disabled.get_mut(octave) {
            *slot = !enabled;
        }
    }

    pub fn set_all_enabled(&mut self, enabled: bool) {
        self.disabled = [!enabled; NUM_OCTAVES];
    }

    pub fn is_enabled(&self, octave: usize) -> bool {
        self.disabled.get(octave).map(|d| !d).unwrap_or(false)
    }

    // ── Empirical spectra ───────────────────────────────────────────────────

    /// Fill the table from the directional Phillips spectrum.
    pub fn apply_phillips(&mut self, wind_speed: f32, wind_direction_deg: f32, gravity: f32) {
        let dir = wind_direction_deg.to_radians();
        let wind_dir = [dir.cos(), dir.sin()];
        self.fill_from(|wl| empirical::phillips(wind_speed, wind_dir, gravity, wl, 0.0));
    }

    pub fn apply_pierson_moskowitz(&mut self, wind_speed: f32, gravity: f32) {
        self.fill_from(|wl| empirical::pierson_moskowitz(gravity, wind_speed, wl));
    }

    pub fn apply_jonswap(&mut self, wind_speed: f32, fetch: f32, gravity: f32) {
        self.fill_from(|wl| empirical::jonswap(gravity, wind_speed, wl, fetch));
    }

    /// Dispatch on a configured source. `Manual` leaves the table untouched.
    pub fn apply(&mut self, source: SpectrumSource, wind: &WindParams, gravity: f32) {
        match source {
            SpectrumSource::Manual => {}
            SpectrumSource::Phillips => self.apply_phillips(wind.speed, wind.direction_deg, gravity),
            SpectrumSource::PiersonMoskowitz => self.apply_pierson_moskowitz(wind.speed, gravity),
            SpectrumSource::Jonswap => self.apply_jonswap(wind.speed, wind.fetch, gravity),
        }
    }

    fn fill_from(&mut self, power_at: impl Fn(f32) -> f32) {
        let floor = 10f32.powf(MIN_POWER_LOG);
        for (octave, slot) in self.power_log.iter_mut().enumerate() {
            let power = power_at(Self::representative_wavelength(octave));
            // f32::max discards NaN, so degenerate inputs land on the floor.
            *slot = power.max(floor).log10();
        }
    }

    // ── Amplitude ───────────────────────────────────────────────────────────

    /// Amplitude of one discrete component of the given wavelength.
    ///
    /// The octave's energy is split over `components_per_octave` components:
    /// `a = weight · √(2 · 10^powerLog · dω)` with `dω` the octave's
    /// angular-frequency span divided by the component count.
    pub fn amplitude(&self, wavelength: f32) -> f32 {
        if wavelength.is_nan() || wavelength <= MIN_QUERY_WAVELENGTH {
            error!("amplitude requested for invalid wavelength {wavelength}");
            return 0.0;
        }

        let wl_pow2 = wavelength
            .log2()
            .clamp(SMALLEST_WL_POW_2, SMALLEST_WL_POW_2 + NUM_OCTAVES as f32 - 1.0);
        let index = (wl_pow2 - SMALLEST_WL_POW_2) as usize;

        let Some(&power_log) = self.power_log.get(index) else {
            error!("octave index {index} out of bounds for wavelength {wavelength}");
            return 0.0;
        };

        if self.disabled[index] {
            return 0.0;
        }

        let wl_lo = 2f32.powf(wl_pow2.floor());
        let wl_hi = 2.0 * wl_lo;
        let omega_lo = empirical::angular_frequency(wl_lo, self.gravity);
        let omega_hi = empirical::angular_frequency(wl_hi, self.gravity);
        let d_omega = (omega_lo - omega_hi) / self.components_per_octave.max(1) as f32;

        let a_2 = 2.0 * 10f32.powf(power_log) * d_omega;
        a_2.sqrt() * self.weight
    }
}
