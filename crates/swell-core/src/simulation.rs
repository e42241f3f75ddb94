//! Per-tick orchestrator: runs every stage of the ocean pipeline in order
//! and answers CPU-side surface queries against the latest state.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::cascade::{assign, wavelength_threshold, Batch, CascadeAssignment, PackedBatch};
use crate::components::{ComponentSet, MaxDisplacement};
use crate::config::{validate_spectrum_shape, OceanConfig, WindParams};
use crate::error::{Result, SwellError};
use crate::evaluator::WaveField;
use crate::lod::{detail_height, update_scale, InstanceWeights, LodScale};
use crate::spectrum::OctaveSpectrum;

// ── Report ────────────────────────────────────────────────────────────────────

/// Summary of one tick, for the geometry collaborator and diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TickReport {
    pub elapsed_time: f32,
    pub lod: LodScale,
    pub max_displacement: MaxDisplacement,
    pub component_count: usize,
    /// Batches (transition included) with at least one entry.
    pub active_batches: usize,
    pub dropped_total: usize,
    pub skipped_fine: usize,
    /// Longest wavelength the outermost LOD is sized for.
    pub max_wavelength: f32,
}

// ── Orchestrator ──────────────────────────────────────────────────────────────

/// Everything rebuilt from scratch on each tick.
struct TickState {
    components: ComponentSet,
    max_displacement: MaxDisplacement,
    lod: LodScale,
    max_wavelength: f32,
    assignment: CascadeAssignment,
    field: WaveField,
}

pub struct OceanSimulation {
    config: OceanConfig,
    spectrum: OctaveSpectrum,
    elapsed_time: f32,
    state: TickState,
}

impl OceanSimulation {
    /// Validate `config`, fill the spectrum from its source and build the
    /// state at time zero for a viewer on the sea surface.
    pub fn new(config: OceanConfig) -> Result<Self> {
        config.validate()?;

        let mut spectrum = config.spectrum.clone();
        spectrum.gravity = config.gravity;
        spectrum.apply(config.spectrum_source, &config.wind, config.gravity);

        let viewer = Vec3::new(0.0, config.sea_level, 0.0);
        let state = build_state(&config, &spectrum, 0.0, viewer)?;
        Ok(Self { config, spectrum, elapsed_time: 0.0, state })
    }

    /// Advance time by `dt` seconds and rebuild all per-tick state.
    pub fn tick(&mut self, dt: f32, viewer_pos: Vec3) -> Result<TickReport> {
        if !dt.is_finite() {
            return Err(SwellError::config("dt", format!("must be finite, got {dt}")));
        }
        let elapsed_time = self.elapsed_time + dt;
        self.state = build_state(&self.config, &self.spectrum, elapsed_time, viewer_pos)?;
        self.elapsed_time = elapsed_time;

        let report = self.report();
        debug!(
            "tick t={:.3}s level={} blend={:.3} batches={} dropped={} skipped_fine={}",
            report.elapsed_time,
            report.lod.level,
            report.lod.blend,
            report.active_batches,
            report.dropped_total,
            report.skipped_fine,
        );
        Ok(report)
    }

    pub fn report(&self) -> TickReport {
        let s = &self.state;
        TickReport {
            elapsed_time: self.elapsed_time,
            lod: s.lod,
            max_displacement: s.max_displacement,
            component_count: s.components.len(),
            active_batches: s.assignment.work_items().count(),
            dropped_total: s.assignment.dropped_total(),
            skipped_fine: s.assignment.skipped_fine,
            max_wavelength: s.max_wavelength,
        }
    }

    // ── State access ──────────────────────────────────────────────────────────

    pub fn config(&self) -> &OceanConfig {
        &self.config
    }

    pub fn spectrum(&self) -> &OctaveSpectrum {
        &self.spectrum
    }

    /// Apply `edit` to a copy of the spectrum and keep it if the result
    /// validates. Changes take effect on the next [`Self::tick`]; on error
    /// the current spectrum is left untouched.
    pub fn edit_spectrum(&mut self, edit: impl FnOnce(&mut OctaveSpectrum)) -> Result<()> {
        let mut edited = self.spectrum.clone();
        edit(&mut edited);
        edited.gravity = self.config.gravity;
        validate_spectrum_shape(&edited)?;
        self.spectrum = edited;
        Ok(())
    }

    /// Replace the wind and refill the spectrum from the configured source.
    /// An invalid wind is rejected and the previous one kept.
    pub fn set_wind(&mut self, wind: WindParams) -> Result<()> {
        wind.validate()?;
        self.config.wind = wind;
        self.spectrum.apply(self.config.spectrum_source, &wind, self.config.gravity);
        Ok(())
    }

    pub fn elapsed_time(&self) -> f32 {
        self.elapsed_time
    }

    pub fn components(&self) -> &ComponentSet {
        &self.state.components
    }

    pub fn assignment(&self) -> &CascadeAssignment {
        &self.state.assignment
    }

    pub fn lod_scale(&self) -> LodScale {
        self.state.lod
    }

    pub fn instance_weights(&self, lod: usize) -> InstanceWeights {
        self.state.lod.instance_weights(lod, self.config.geometry.lod_count)
    }

    /// Packed non-empty batches in LOD order, transition last. Each carries
    /// its target `lod`; LODs with nothing kept do no work and are absent.
    pub fn packed_batches(&self) -> Vec<PackedBatch> {
        self.state.assignment.work_items().map(Batch::packed).collect()
    }

    pub fn field(&self) -> &WaveField {
        &self.state.field
    }

    // ── Queries ───────────────────────────────────────────────────────────────

    pub fn displacement(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        self.state.field.displacement(pos, time_offset)
    }

    pub fn normal(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        self.state.field.normal(pos, time_offset)
    }

    pub fn surface_velocity(&self, pos: Vec3, time_offset: f32) -> Vec3 {
        self.state.field.surface_velocity(pos, time_offset)
    }

    pub fn invert_to_reference(&self, world: Vec3, time_offset: f32) -> Vec3 {
        self.state.field.invert_to_reference(world, time_offset)
    }

    pub fn height_at(&self, world: Vec3, time_offset: f32) -> f32 {
        self.state.field.height_at(world, time_offset)
    }
}

/// Pipeline order:
///   1. Component synthesis and amplitudes
///   2. Maximum displacement
///   3. LOD scale from the viewer's detail height
///   4. Cascade batching
fn build_state(
    config: &OceanConfig,
    spectrum: &OctaveSpectrum,
    elapsed_time: f32,
    viewer_pos: Vec3,
) -> Result<TickState> {
    let geometry = config.geometry;
    let wind_angle = config.wind.direction_deg;

    // ── 1. Synthesis ────────────────────────────────────────────────────────
    let components = ComponentSet::generate(spectrum, config.seed);

    // ── 2. Displacement bound ───────────────────────────────────────────────
    let max_displacement = components.max_displacement(spectrum.chop);

    // ── 3. LOD scale ────────────────────────────────────────────────────────
    let height = detail_height(viewer_pos.y, config.sea_level, max_displacement.vertical);
    let lod = update_scale(height, geometry.min_scale, geometry.max_scale);
    let threshold = |level: usize| {
        wavelength_threshold(level, lod.horizontal_scale, geometry.base_vert_density, geometry.min_texels_per_wave)
    };

    // ── 4. Batching ─────────────────────────────────────────────────────────
    let assignment = assign(&components, wind_angle, threshold(0), geometry.lod_count)?;

    let field = WaveField::from_components(&components, wind_angle, spectrum.chop, config.gravity)
        .at_time(elapsed_time)
        .with_sea_level(config.sea_level);

    Ok(TickState {
        max_wavelength: threshold(geometry.lod_count - 1),
        components,
        max_displacement,
        lod,
        assignment,
        field,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SpectrumSource;
    use crate::spectrum::MIN_POWER_LOG;

    fn windy() -> OceanConfig {
        OceanConfig {
            spectrum_source: SpectrumSource::PiersonMoskowitz,
            wind: WindParams { speed: 10.0, direction_deg: 30.0, fetch: 1000.0 },
            seed: 42,
            ..OceanConfig::default()
        }
    }

    #[test]
    fn invalid_config_is_rejected() {
        let mut c = windy();
        c.geometry.lod_count = 0;
        assert!(matches!(OceanSimulation::new(c), Err(SwellError::InvalidLodCount(0))));
    }

    #[test]
    fn spectrum_source_is_applied_on_construction() {
        let sim = OceanSimulation::new(windy()).unwrap();
        assert!(sim.spectrum().power_log.iter().any(|&p| p > MIN_POWER_LOG));
        let manual = OceanSimulation::new(OceanConfig::default()).unwrap();
        assert_eq!(manual.spectrum().power_log, OceanConfig::default().spectrum.power_log);
    }

    #[test]
    fn tick_advances_time_and_reports_every_lod() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let viewer = Vec3::new(0.0, 5.0, 0.0);
        sim.tick(0.25, viewer).unwrap();
        let r = sim.tick(0.25, viewer).unwrap();
        assert_eq!(r.elapsed_time, 0.5);
        assert_eq!(r.component_count, 60);
        assert_eq!(sim.assignment().batches.len(), 7);
        assert!(sim.assignment().transition.is_some());
        let packed = sim.packed_batches();
        assert_eq!(packed.len(), r.active_batches);
        assert!(packed.iter().all(|b| b.count > 0));
        assert!(r.max_displacement.vertical > 0.0);
        assert_eq!(r.max_wavelength, wavelength_threshold(6, r.lod.horizontal_scale, 32.0, 5.0));
    }

    #[test]
    fn non_finite_dt_is_rejected() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        assert!(sim.tick(f32::NAN, Vec3::ZERO).is_err());
        assert_eq!(sim.elapsed_time(), 0.0);
    }

    #[test]
    fn altitude_raises_the_lod_level() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let low = sim.tick(0.0, Vec3::new(0.0, 0.0, 0.0)).unwrap();
        let high = sim.tick(0.0, Vec3::new(0.0, 200.0, 0.0)).unwrap();
        assert!(high.lod.level > low.lod.level, "{} vs {}", high.lod.level, low.lod.level);
        assert!(high.max_wavelength > low.max_wavelength);
    }

    #[test]
    fn same_config_replays_identically() {
        let mut a = OceanSimulation::new(windy()).unwrap();
        let mut b = OceanSimulation::new(windy()).unwrap();
        for step in 0..5 {
            let viewer = Vec3::new(step as f32, 3.0 + step as f32, 0.0);
            assert_eq!(a.tick(0.1, viewer).unwrap(), b.tick(0.1, viewer).unwrap());
        }
        assert_eq!(a.components(), b.components());
    }

    #[test]
    fn queries_forward_to_the_current_field() {
        let mut sim = OceanSimulation::new(OceanConfig { sea_level: 1.5, ..windy() }).unwrap();
        sim.tick(2.0, Vec3::new(0.0, 10.0, 0.0)).unwrap();
        let expected = WaveField::from_components(sim.components(), 30.0, sim.spectrum().chop, 9.81)
            .at_time(2.0)
            .with_sea_level(1.5);
        let p = Vec3::new(12.0, 0.0, -7.0);
        let close = |a: Vec3, b: Vec3| (a - b).length() < 1e-4;
        assert!(close(sim.displacement(p, 0.0), expected.displacement(p, 0.0)));
        assert!(close(sim.normal(p, 0.3), expected.normal(p, 0.3)));
        assert!(close(sim.surface_velocity(p, 0.0), expected.surface_velocity(p, 0.0)));
        assert!((sim.height_at(p, 0.0) - expected.height_at(p, 0.0)).abs() < 1e-4);
        assert_eq!(sim.invert_to_reference(p, 0.0).y, 1.5);
    }

    #[test]
    fn spectrum_edits_apply_next_tick() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let before = sim.tick(0.0, Vec3::ZERO).unwrap();
        sim.edit_spectrum(|s| s.set_all_enabled(false)).unwrap();
        let after = sim.tick(0.0, Vec3::ZERO).unwrap();
        assert!(before.max_displacement.vertical > 0.0);
        assert_eq!(after.max_displacement.vertical, 0.0);
        assert_eq!(after.active_batches, 0);
        assert!(sim.packed_batches().is_empty(), "silent LODs must not produce work");
    }

    #[test]
    fn invalid_spectrum_edit_keeps_previous_table() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let before = sim.spectrum().clone();
        assert!(sim.edit_spectrum(|s| s.chop = 3.0).is_err());
        assert!(sim.edit_spectrum(|s| s.power_log[2] = f32::NAN).is_err());
        assert!(sim.edit_spectrum(|s| s.components_per_octave = 0).is_err());
        assert_eq!(sim.spectrum(), &before);
    }

    #[test]
    fn invalid_wind_is_rejected_and_old_wind_kept() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let wind = sim.config().wind;
        let power = sim.spectrum().power_log;

        let nan = WindParams { direction_deg: f32::NAN, ..wind };
        assert!(matches!(
            sim.set_wind(nan),
            Err(SwellError::InvalidConfig { field: "wind.direction_deg", .. })
        ));
        assert!(sim.set_wind(WindParams { fetch: -5.0, ..wind }).is_err());
        assert!(sim.set_wind(WindParams { speed: f32::INFINITY, ..wind }).is_err());
        assert_eq!(sim.config().wind, wind);
        assert_eq!(sim.spectrum().power_log, power);

        sim.tick(0.5, Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let h = sim.height_at(Vec3::new(3.0, 0.0, 4.0), 0.0);
        assert!(h.is_finite(), "surface vanished after a rejected wind: {h}");
    }

    #[test]
    fn stronger_wind_builds_bigger_waves() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        let calm = sim.tick(0.0, Vec3::ZERO).unwrap().max_displacement.vertical;
        sim.set_wind(WindParams { speed: 20.0, ..sim.config().wind }).unwrap();
        let rough = sim.tick(0.0, Vec3::ZERO).unwrap().max_displacement.vertical;
        assert!(rough > calm, "{rough} should exceed {calm}");
    }

    /// 60 components × 16 queries must stay well inside a frame.
    #[cfg(not(debug_assertions))]
    #[test]
    fn height_queries_fit_a_frame_budget() {
        let mut sim = OceanSimulation::new(windy()).unwrap();
        sim.tick(0.016, Vec3::new(0.0, 5.0, 0.0)).unwrap();
        let start = std::time::Instant::now();
        for i in 0..16 {
            let _ = sim.height_at(Vec3::new(i as f32 * 3.0, 0.0, 0.0), 0.0);
        }
        let ms = start.elapsed().as_secs_f64() * 1000.0;
        assert!(ms < 5.0, "16 height queries took {ms:.2}ms");
    }
}
